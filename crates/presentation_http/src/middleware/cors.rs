//! CORS middleware
//!
//! Origins are matched exactly against the configured allow-list. Matching
//! origins are echoed in `Access-Control-Allow-Origin`; the allowed methods
//! and headers are advertised on every response. Preflight (`OPTIONS`)
//! requests are answered here with 204 and never reach later stages, so
//! they are neither rate limited nor authenticated. Other requests record
//! their CORS headers for the recovery stage before going further in.

use std::{
    collections::HashSet,
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use axum::{
    extract::Request,
    http::{
        HeaderMap, HeaderValue, Method, StatusCode,
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, ORIGIN, VARY,
        },
    },
    response::{IntoResponse, Response},
};
use tower::{Layer, Service};

use super::recovery::FaultHeaders;

/// Methods advertised to browsers
pub const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";

/// Request headers advertised to browsers
pub const ALLOWED_HEADERS: &str = "Content-Type, X-API-Key, X-Request-ID";

/// Exact-match origin allow-list
#[derive(Debug, Clone, Default)]
pub struct CorsPolicy {
    allowed_origins: HashSet<String>,
}

impl CorsPolicy {
    /// Create a policy allowing the given origins
    #[must_use]
    pub fn new<I, O>(origins: I) -> Self
    where
        I: IntoIterator<Item = O>,
        O: Into<String>,
    {
        Self {
            allowed_origins: origins.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether the origin is on the allow-list
    #[must_use]
    pub fn allows(&self, origin: &str) -> bool {
        self.allowed_origins.contains(origin)
    }

    fn apply(&self, origin: Option<&HeaderValue>, headers: &mut HeaderMap) {
        if let Some(origin) = origin.filter(|o| o.to_str().is_ok_and(|o| self.allows(o))) {
            headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
        }
        headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        );
        headers.append(VARY, HeaderValue::from_static("Origin"));
    }
}

/// Layer that applies the CORS policy
#[derive(Debug, Clone, Default)]
pub struct CorsLayer {
    policy: Arc<CorsPolicy>,
}

impl CorsLayer {
    /// Create a new CORS layer
    #[must_use]
    pub fn new(policy: CorsPolicy) -> Self {
        Self {
            policy: Arc::new(policy),
        }
    }
}

impl<S> Layer<S> for CorsLayer {
    type Service = Cors<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Cors {
            inner,
            policy: Arc::clone(&self.policy),
        }
    }
}

/// Middleware service applying the CORS policy
#[derive(Debug, Clone)]
pub struct Cors<S> {
    inner: S,
    policy: Arc<CorsPolicy>,
}

impl<S> Service<Request> for Cors<S>
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
        let policy = Arc::clone(&self.policy);
        let origin = req.headers().get(ORIGIN).cloned();
        let preflight = req.method() == Method::OPTIONS;
        let mut inner = self.inner.clone();

        if let Some(fault_headers) = req
            .extensions()
            .get::<FaultHeaders>()
            .filter(|_| !preflight)
        {
            let mut headers = HeaderMap::new();
            policy.apply(origin.as_ref(), &mut headers);
            for (name, value) in &headers {
                fault_headers.record(name.clone(), value.clone());
            }
        }

        Box::pin(async move {
            let mut response = if preflight {
                StatusCode::NO_CONTENT.into_response()
            } else {
                inner.call(req).await?
            };

            policy.apply(origin.as_ref(), response.headers_mut());
            Ok(response)
        })
    }
}
