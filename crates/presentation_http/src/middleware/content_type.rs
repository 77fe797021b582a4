//! Content-type enforcement
//!
//! Requests that carry a body (`POST`, `PUT`, `PATCH`) must declare a JSON
//! media type. Parameters such as `; charset=utf-8` are allowed. Other
//! methods are not checked.

use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use axum::{
    extract::Request,
    http::{Method, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use tower::{Layer, Service};

use super::request_id::request_id_of;
use crate::error::ApiError;

const JSON_MEDIA_TYPE: &str = "application/json";

fn requires_json(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

fn is_json(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| {
            value
                .trim_start()
                .get(..JSON_MEDIA_TYPE.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(JSON_MEDIA_TYPE))
        })
}

/// Layer that rejects non-JSON bodies
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentTypeLayer;

impl ContentTypeLayer {
    /// Create a new content-type layer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for ContentTypeLayer {
    type Service = ContentTypeGuard<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ContentTypeGuard { inner }
    }
}

/// Middleware service enforcing JSON request bodies
#[derive(Debug, Clone)]
pub struct ContentTypeGuard<S> {
    inner: S,
}

impl<S> Service<Request> for ContentTypeGuard<S>
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
        if requires_json(req.method()) && !is_json(&req) {
            let rejection = ApiError::UnsupportedMediaType(
                "Content type must be application/json".to_string(),
            )
            .reject(request_id_of(&req));
            return Box::pin(async move { Ok(rejection.into_response()) });
        }

        let mut inner = self.inner.clone();
        Box::pin(async move { inner.call(req).await })
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::StatusCode,
        routing::{get, post},
    };
    use tower::ServiceExt;

    use super::*;

    async fn ok() -> &'static str {
        "ok"
    }

    fn app() -> Router {
        Router::new()
            .route("/", get(ok))
            .route("/items", post(ok).put(ok).delete(ok))
            .layer(ContentTypeLayer::new())
    }

    async fn send(method: Method, uri: &str, content_type: Option<&str>) -> StatusCode {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(content_type) = content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        app()
            .oneshot(builder.body(Body::from("{}")).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn accepts_json_variants() {
        for content_type in [
            "application/json",
            "application/json; charset=utf-8",
            "Application/JSON",
        ] {
            assert_eq!(
                send(Method::POST, "/items", Some(content_type)).await,
                StatusCode::OK,
                "{content_type}"
            );
        }
    }

    #[tokio::test]
    async fn rejects_missing_or_other_types() {
        assert_eq!(
            send(Method::POST, "/items", None).await,
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(
            send(Method::PUT, "/items", Some("text/plain")).await,
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(
            send(Method::POST, "/items", Some("application/x-www-form-urlencoded")).await,
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
    }

    #[tokio::test]
    async fn methods_without_body_are_not_checked() {
        assert_eq!(send(Method::GET, "/", None).await, StatusCode::OK);
        assert_eq!(send(Method::DELETE, "/items", None).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn rejection_uses_envelope() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/items")
                    .header(CONTENT_TYPE, "text/plain")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Content type must be application/json");
    }
}
