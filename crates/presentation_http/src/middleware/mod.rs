//! HTTP middleware components
//!
//! Stages, outermost first: recovery, correlation id, access log, CORS,
//! rate limiting, content type. Authentication is applied per route on
//! the protected subset only.

pub mod access_log;
pub mod auth;
pub mod client_ip;
pub mod content_type;
pub mod cors;
pub mod rate_limit;
pub mod recovery;
pub mod request_id;

pub use access_log::{AccessLogLayer, access_log_layer};
pub use auth::{API_KEY_HEADER, ApiKeyAuth, ApiKeyAuthLayer, ApiKeyTable};
pub use client_ip::ClientIpResolver;
pub use content_type::{ContentTypeGuard, ContentTypeLayer};
pub use cors::{Cors, CorsLayer, CorsPolicy};
pub use rate_limit::{
    RATE_LIMIT_HEADER, RateLimiter, RateLimiterConfig, RateLimiterLayer, RateLimiterState,
    spawn_cleanup_task,
};
pub use recovery::{CorrelationSlot, FaultHeaders, Recovery, RecoveryLayer};
pub use request_id::{REQUEST_ID_HEADER, RequestIdLayer, RequestIdService, request_id_of};

use infrastructure::AppConfig;

/// Settings for the request pipeline, derived from [`AppConfig`]
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Accepted API keys
    pub api_keys: ApiKeyTable,
    /// CORS allow-list
    pub cors: CorsPolicy,
    /// Client identification
    pub client_ip: ClientIpResolver,
    /// Rate limiter settings
    pub rate_limit: RateLimiterConfig,
    /// Maximum accepted request body in bytes
    pub max_body_size_bytes: usize,
}

impl PipelineConfig {
    /// Derive pipeline settings from the application configuration
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        let security = &config.security;
        Self {
            api_keys: ApiKeyTable::from_entries(&security.api_keys),
            cors: CorsPolicy::new(security.allowed_origins.iter().cloned()),
            client_ip: ClientIpResolver::new(security.trusted_proxies.iter().copied()),
            rate_limit: RateLimiterConfig {
                enabled: security.rate_limit_enabled,
                capacity: security.rate_limit_capacity,
                refill_per_minute: security.rate_limit_refill_per_minute,
                max_clients: security.rate_limit_max_clients,
            },
            max_body_size_bytes: config.server.max_body_size_bytes,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from_app_config(&AppConfig::default())
    }
}
