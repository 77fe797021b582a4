//! Application state shared across handlers

use std::sync::Arc;

use application::{ArticleService, ports::ArticleStore};

use crate::middleware::{RateLimiterConfig, RateLimiterState};

/// Shared application state
#[derive(Clone, Debug)]
pub struct AppState {
    /// Article use cases
    pub article_service: Arc<ArticleService>,
    /// Rate limiter buckets, shared with the rate limiting stage
    pub rate_limiter: Arc<RateLimiterState>,
}

impl AppState {
    /// Build the state around an article store
    #[must_use]
    pub fn new(store: Arc<dyn ArticleStore>, rate_limit: &RateLimiterConfig) -> Self {
        Self {
            article_service: Arc::new(ArticleService::new(store)),
            rate_limiter: Arc::new(RateLimiterState::new(rate_limit)),
        }
    }
}
