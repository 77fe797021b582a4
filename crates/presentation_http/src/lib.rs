//! Articles HTTP presentation layer
//!
//! This crate provides the HTTP API: the middleware pipeline, the article
//! and admin handlers, and the uniform JSON envelope.

pub mod envelope;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use envelope::{ApiReply, Envelope};
pub use error::{ApiError, ApiRejection};
pub use middleware::{
    ApiKeyAuthLayer, ApiKeyTable, CorsPolicy, PipelineConfig, RateLimiterConfig,
    RateLimiterLayer, RateLimiterState,
};
pub use routes::{create_app, create_router, with_pipeline};
pub use state::AppState;
