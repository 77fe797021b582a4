//! Correlation-ID middleware
//!
//! Assigns every request a fresh random id, builds the [`RequestContext`]
//! later stages read, and echoes the id in the `X-Request-ID` response
//! header. Inbound `X-Request-ID` values are ignored so clients cannot
//! choose the id that appears in server logs.

use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use application::RequestContext;
use axum::{extract::Request, http::header::HeaderValue, response::Response};
use tower::{Layer, Service};
use uuid::Uuid;

use super::{client_ip::ClientIpResolver, recovery::CorrelationSlot};

/// The header name for the request ID
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Request id assigned by the correlation stage, if it has run
#[must_use]
pub fn request_id_of(req: &Request) -> Option<Uuid> {
    req.extensions()
        .get::<RequestContext>()
        .map(RequestContext::request_id)
}

/// Layer that adds request ID handling to HTTP services
#[derive(Debug, Clone, Default)]
pub struct RequestIdLayer {
    resolver: Arc<ClientIpResolver>,
}

impl RequestIdLayer {
    /// Create a new request ID layer
    #[must_use]
    pub fn new(resolver: ClientIpResolver) -> Self {
        Self {
            resolver: Arc::new(resolver),
        }
    }
}

impl<S> Layer<S> for RequestIdLayer {
    type Service = RequestIdService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestIdService {
            inner,
            resolver: Arc::clone(&self.resolver),
        }
    }
}

/// Service that generates a request ID and context for each request
#[derive(Debug, Clone)]
pub struct RequestIdService<S> {
    inner: S,
    resolver: Arc<ClientIpResolver>,
}

impl<S> Service<Request> for RequestIdService<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request) -> Self::Future {
        let request_id = Uuid::new_v4();
        let client_ip = self.resolver.resolve(&request);

        if let Some(slot) = request.extensions().get::<CorrelationSlot>() {
            slot.fill(request_id);
        }
        request
            .extensions_mut()
            .insert(RequestContext::new(request_id, client_ip));

        let mut inner = self.inner.clone();

        Box::pin(async move {
            let mut response = inner.call(request).await?;

            if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
                response.headers_mut().insert(REQUEST_ID_HEADER, value);
            }

            Ok(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use axum::{Router, body::Body, extract::Extension, routing::get};
    use tower::ServiceExt;

    use super::*;

    async fn echo_context(Extension(ctx): Extension<RequestContext>) -> String {
        format!("{}|{}", ctx.request_id(), ctx.client_ip())
    }

    fn app() -> Router {
        Router::new()
            .route("/", get(echo_context))
            .layer(RequestIdLayer::default())
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn header_matches_context_id() {
        let response = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let header = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        let body = body_text(response).await;

        assert!(Uuid::parse_str(&header).is_ok());
        assert!(body.starts_with(&header));
    }

    #[tokio::test]
    async fn inbound_request_id_is_not_trusted() {
        let supplied = Uuid::new_v4().to_string();
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(REQUEST_ID_HEADER, &supplied)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let header = response.headers().get(REQUEST_ID_HEADER).unwrap();
        assert_ne!(header.to_str().unwrap(), supplied);
    }

    #[tokio::test]
    async fn ids_are_unique_per_request() {
        let app = app();
        let mut seen = std::collections::HashSet::new();

        for _ in 0..20 {
            let response = app
                .clone()
                .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
                .await
                .unwrap();
            let header = response.headers().get(REQUEST_ID_HEADER).unwrap().clone();
            assert!(seen.insert(header));
        }
    }

    #[tokio::test]
    async fn fills_correlation_slot() {
        let slot = CorrelationSlot::default();
        let mut req = Request::builder().uri("/").body(Body::empty()).unwrap();
        req.extensions_mut().insert(slot.clone());

        let response = app().oneshot(req).await.unwrap();
        let header = response.headers().get(REQUEST_ID_HEADER).unwrap();

        assert_eq!(
            slot.get().map(|id| id.to_string()).as_deref(),
            header.to_str().ok()
        );
    }
}
