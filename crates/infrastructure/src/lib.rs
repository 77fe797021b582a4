//! Infrastructure layer - Adapters for external systems
//!
//! Implements ports defined in the application layer and loads the
//! application configuration.

pub mod config;
pub mod persistence;
pub mod validation;

pub use config::{
    ApiKeyEntry, AppConfig, Environment, SecurityConfig, ServerConfig, StoreConfig,
};
pub use persistence::InMemoryArticleStore;
pub use validation::{SecurityValidator, SecurityWarning, WarningSeverity};
