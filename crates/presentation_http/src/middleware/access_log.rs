//! Access logging
//!
//! Built on tower-http's `TraceLayer`: each request gets an `http_request`
//! span carrying the correlation id, method, path, client address and user
//! agent, and one event is emitted when the response is produced. The
//! event level follows the status: INFO below 400, WARN for 4xx, ERROR for
//! 5xx.

use std::time::Duration;

use application::RequestContext;
use axum::http::{Request, Response, header::USER_AGENT};
use tower_http::trace::{HttpMakeClassifier, MakeSpan, OnResponse, TraceLayer};
use tracing::{Span, error, info, warn};

/// Trace layer configured for access logging
pub type AccessLogLayer =
    TraceLayer<HttpMakeClassifier, AccessLogSpan, (), AccessLogOnResponse, (), (), ()>;

/// Build the access log layer
#[must_use]
pub fn access_log_layer() -> AccessLogLayer {
    TraceLayer::new_for_http()
        .make_span_with(AccessLogSpan)
        .on_request(())
        .on_response(AccessLogOnResponse)
        .on_body_chunk(())
        .on_eos(())
        .on_failure(())
}

/// Creates the per-request span
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessLogSpan;

impl<B> MakeSpan<B> for AccessLogSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let ctx = request.extensions().get::<RequestContext>();
        let request_id = ctx.map(|c| c.request_id().to_string()).unwrap_or_default();
        let client_ip = ctx.map(|c| c.client_ip().to_string()).unwrap_or_default();
        let user_agent = request
            .headers()
            .get(USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("-");

        tracing::info_span!(
            "http_request",
            request_id = %request_id,
            method = %request.method(),
            path = %request.uri().path(),
            client_ip = %client_ip,
            user_agent = %user_agent,
        )
    }
}

/// Emits the completion event
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessLogOnResponse;

impl<B> OnResponse<B> for AccessLogOnResponse {
    fn on_response(self, response: &Response<B>, latency: Duration, _span: &Span) {
        let status = response.status().as_u16();

        if response.status().is_server_error() {
            error!(status, latency = ?latency, "request completed");
        } else if response.status().is_client_error() {
            warn!(status, latency = ?latency, "request completed");
        } else {
            info!(status, latency = ?latency, "request completed");
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{Router, body::Body, http::StatusCode, routing::get};
    use tower::ServiceExt;

    use super::*;

    async fn teapot() -> StatusCode {
        StatusCode::IM_A_TEAPOT
    }

    #[tokio::test]
    async fn layer_does_not_alter_responses() {
        let app = Router::new()
            .route("/tea", get(teapot))
            .layer(access_log_layer());

        let response = app
            .oneshot(
                axum::extract::Request::builder()
                    .uri("/tea")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    }

    #[test]
    fn span_is_built_without_context() {
        let request = Request::builder().uri("/x").body(()).unwrap();
        let _span = AccessLogSpan.make_span(&request);
    }
}
