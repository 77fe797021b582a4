//! Rate limiting middleware
//!
//! Token bucket rate limiter keyed by client IP. Each bucket holds up to
//! `capacity` tokens and refills continuously at `refill_per_minute / 60`
//! tokens per second. A request consumes one token or is rejected with 429.
//!
//! The bucket table is guarded by a read-write lock that is only taken for
//! writing when a client is first seen or entries are evicted; the check
//! itself locks just the one bucket, so different clients never contend.

use std::{
    collections::HashMap,
    future::Future,
    net::IpAddr,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
    time::{Duration, Instant},
};

use application::RequestContext;
use axum::{
    extract::Request,
    http::HeaderValue,
    response::{IntoResponse, Response},
};
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tower::{Layer, Service};
use tracing::{debug, info, warn};

use super::{client_ip::ClientIpResolver, recovery::FaultHeaders};
use crate::error::ApiError;

/// Header advertising the bucket capacity
pub const RATE_LIMIT_HEADER: &str = "X-RateLimit-Limit";

/// Rate limiter configuration
#[derive(Clone, Debug)]
pub struct RateLimiterConfig {
    /// Enable rate limiting
    pub enabled: bool,
    /// Maximum burst per client
    pub capacity: u32,
    /// Tokens restored per minute
    pub refill_per_minute: u32,
    /// Tracked clients before the least recently seen is evicted
    pub max_clients: usize,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: 100,
            refill_per_minute: 100,
            max_clients: 10_000,
        }
    }
}

/// Token bucket entry for a single IP
#[derive(Debug, Clone)]
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    const fn new(max_tokens: f64, now: Instant) -> Self {
        Self {
            tokens: max_tokens,
            last_update: now,
        }
    }

    /// Try to consume a token, returning true if allowed
    fn try_consume(&mut self, now: Instant, tokens_per_second: f64, max_tokens: f64) -> bool {
        let elapsed = now.saturating_duration_since(self.last_update).as_secs_f64();

        // Refill tokens based on elapsed time
        self.tokens = elapsed
            .mul_add(tokens_per_second, self.tokens)
            .min(max_tokens);
        self.last_update = self.last_update.max(now);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

type SharedBucket = Arc<Mutex<TokenBucket>>;

/// Shared rate limiter state
#[derive(Debug)]
pub struct RateLimiterState {
    buckets: RwLock<HashMap<IpAddr, SharedBucket>>,
    capacity: u32,
    tokens_per_second: f64,
    max_tokens: f64,
    max_clients: usize,
}

impl RateLimiterState {
    /// Create a new rate limiter state
    #[must_use]
    pub fn new(config: &RateLimiterConfig) -> Self {
        Self {
            buckets: RwLock::new(HashMap::new()),
            capacity: config.capacity,
            tokens_per_second: f64::from(config.refill_per_minute) / 60.0,
            max_tokens: f64::from(config.capacity),
            max_clients: config.max_clients.max(1),
        }
    }

    /// Configured bucket capacity
    #[must_use]
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Number of clients currently tracked
    #[must_use]
    pub fn tracked_clients(&self) -> usize {
        self.buckets.read().len()
    }

    /// Check if a request from the given IP is allowed
    #[must_use]
    pub fn check(&self, ip: IpAddr) -> bool {
        self.check_at(ip, Instant::now())
    }

    fn check_at(&self, ip: IpAddr, now: Instant) -> bool {
        let bucket = self.bucket_for(ip, now);
        let mut bucket = bucket.lock();
        bucket.try_consume(now, self.tokens_per_second, self.max_tokens)
    }

    fn bucket_for(&self, ip: IpAddr, now: Instant) -> SharedBucket {
        if let Some(bucket) = self.buckets.read().get(&ip) {
            return Arc::clone(bucket);
        }

        let mut buckets = self.buckets.write();
        if let Some(bucket) = buckets.get(&ip) {
            return Arc::clone(bucket);
        }

        if buckets.len() >= self.max_clients {
            evict_least_recent(&mut buckets);
        }

        let bucket = Arc::new(Mutex::new(TokenBucket::new(self.max_tokens, now)));
        buckets.insert(ip, Arc::clone(&bucket));
        bucket
    }

    /// Clean up stale entries older than the specified duration
    ///
    /// Returns the number of removed entries.
    pub fn cleanup(&self, older_than: Duration) -> usize {
        self.cleanup_at(older_than, Instant::now())
    }

    fn cleanup_at(&self, older_than: Duration, now: Instant) -> usize {
        let Some(cutoff) = now.checked_sub(older_than) else {
            return 0;
        };

        let mut buckets = self.buckets.write();
        let before = buckets.len();
        buckets.retain(|_, bucket| bucket.lock().last_update > cutoff);
        before - buckets.len()
    }
}

fn evict_least_recent(buckets: &mut HashMap<IpAddr, SharedBucket>) {
    let oldest = buckets
        .iter()
        .map(|(ip, bucket)| (*ip, bucket.lock().last_update))
        .min_by_key(|(_, last_update)| *last_update)
        .map(|(ip, _)| ip);

    if let Some(ip) = oldest {
        buckets.remove(&ip);
        debug!(client_ip = %ip, "Evicted least recently seen rate limit entry");
    }
}

/// Spawn a background task that periodically drops idle buckets
pub fn spawn_cleanup_task(
    state: Arc<RateLimiterState>,
    interval: Duration,
    max_age: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let removed = state.cleanup(max_age);
            if removed > 0 {
                info!(
                    removed,
                    remaining = state.tracked_clients(),
                    "Cleaned up idle rate limit entries"
                );
            }
        }
    })
}

/// Layer that applies rate limiting
#[derive(Clone, Debug)]
pub struct RateLimiterLayer {
    state: Arc<RateLimiterState>,
    enabled: bool,
}

impl RateLimiterLayer {
    /// Create a new rate limiter layer with its own state
    #[must_use]
    pub fn new(config: &RateLimiterConfig) -> Self {
        Self::from_state(Arc::new(RateLimiterState::new(config)), config.enabled)
    }

    /// Create a layer around existing shared state
    #[must_use]
    pub const fn from_state(state: Arc<RateLimiterState>, enabled: bool) -> Self {
        Self { state, enabled }
    }

    /// Get a reference to the rate limiter state for cleanup tasks
    #[must_use]
    pub fn state(&self) -> Arc<RateLimiterState> {
        Arc::clone(&self.state)
    }
}

impl<S> Layer<S> for RateLimiterLayer {
    type Service = RateLimiter<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimiter {
            inner,
            state: Arc::clone(&self.state),
            enabled: self.enabled,
        }
    }
}

/// Middleware service for rate limiting
#[derive(Clone, Debug)]
pub struct RateLimiter<S> {
    inner: S,
    state: Arc<RateLimiterState>,
    enabled: bool,
}

impl<S> Service<Request> for RateLimiter<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let enabled = self.enabled;
        let state = Arc::clone(&self.state);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            // If rate limiting is disabled, pass through
            if !enabled {
                return inner.call(req).await;
            }

            let (client_ip, request_id) = match req.extensions().get::<RequestContext>() {
                Some(ctx) => (ctx.client_ip(), Some(ctx.request_id())),
                None => (ClientIpResolver::default().resolve(&req), None),
            };

            let limit = HeaderValue::from(state.capacity());
            let mut response = if state.check(client_ip) {
                if let Some(fault_headers) = req.extensions().get::<FaultHeaders>() {
                    fault_headers.record(RATE_LIMIT_HEADER, limit.clone());
                }
                inner.call(req).await?
            } else {
                warn!(client_ip = %client_ip, "Rate limit exceeded");
                ApiError::RateLimited.reject(request_id).into_response()
            };

            response.headers_mut().insert(RATE_LIMIT_HEADER, limit);
            Ok(response)
        })
    }
}
