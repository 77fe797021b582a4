//! Application layer - Use cases and orchestration
//!
//! Contains the article use cases, the storage port they depend on, and the
//! per-request context threaded through the HTTP pipeline.

pub mod error;
pub mod ports;
pub mod request_context;
pub mod services;

pub use error::ApplicationError;
pub use ports::*;
pub use request_context::RequestContext;
pub use services::*;
