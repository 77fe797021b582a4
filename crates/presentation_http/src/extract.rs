//! Request extractors
//!
//! - [`Ctx`] hands handlers the [`RequestContext`] built by the pipeline
//! - [`EnvelopeJson`] parses JSON bodies and reports failures as envelopes
//! - [`ArticlePath`] parses the `{id}` path segment

use std::convert::Infallible;

use application::RequestContext;
use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
};
use domain::ArticleId;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiRejection},
    middleware::ClientIpResolver,
};

/// Message for ids that do not name an article
pub const ARTICLE_NOT_FOUND: &str = "article not found";

/// The per-request context
///
/// Falls back to a fresh unauthenticated context when the correlation
/// stage is not installed, as in handler-level tests.
#[derive(Debug, Clone)]
pub struct Ctx(pub RequestContext);

impl<S> FromRequestParts<S> for Ctx
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ctx = parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_else(|| {
                let client_ip =
                    ClientIpResolver::default().resolve_from(&parts.extensions, &parts.headers);
                RequestContext::new(Uuid::new_v4(), client_ip)
            });
        Ok(Self(ctx))
    }
}

/// JSON body extractor with envelope-shaped rejections
///
/// Malformed JSON becomes 400, an oversized body 413, and a missing JSON
/// content type 415, each carrying the request's correlation id.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvelopeJson<T>(pub T);

impl<T, S> FromRequest<S> for EnvelopeJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let request_id = req
            .extensions()
            .get::<RequestContext>()
            .map(RequestContext::request_id);

        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::from(rejection).reject(request_id)),
        }
    }
}

/// Article id taken from the path
///
/// Anything that is not a non-negative integer cannot name an article and
/// is reported as not found.
#[derive(Debug, Clone, Copy)]
pub struct ArticlePath(pub ArticleId);

impl<S> FromRequestParts<S> for ArticlePath
where
    S: Send + Sync,
{
    type Rejection = ApiRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let request_id = parts
            .extensions
            .get::<RequestContext>()
            .map(RequestContext::request_id);
        let not_found = || ApiError::NotFound(ARTICLE_NOT_FOUND.to_string()).reject(request_id);

        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| not_found())?;

        raw.parse::<ArticleId>()
            .map(Self)
            .map_err(|_| not_found())
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{StatusCode, header::CONTENT_TYPE},
        response::IntoResponse,
        routing::{get, post},
    };
    use serde::Deserialize;
    use tower::ServiceExt;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Payload {
        name: String,
    }

    async fn echo(EnvelopeJson(payload): EnvelopeJson<Payload>) -> String {
        payload.name
    }

    async fn article_id(ArticlePath(id): ArticlePath) -> String {
        id.to_string()
    }

    async fn context(Ctx(ctx): Ctx) -> impl IntoResponse {
        ctx.request_id().to_string()
    }

    fn app() -> Router {
        Router::new()
            .route("/echo", post(echo))
            .route("/articles/{id}", get(article_id))
            .route("/ctx", get(context))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(body: &'static str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/echo")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn valid_json_is_extracted() {
        let response = app().oneshot(post_json(r#"{"name":"x"}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request_envelope() {
        let response = app().oneshot(post_json("{not json")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn missing_field_is_bad_request() {
        let response = app().oneshot(post_json("{}")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn numeric_path_is_parsed() {
        let response = app()
            .oneshot(Request::builder().uri("/articles/42").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn non_numeric_path_is_not_found() {
        for uri in ["/articles/abc", "/articles/-1", "/articles/1.5"] {
            let response = app()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
            assert_eq!(body_json(response).await["error"], ARTICLE_NOT_FOUND);
        }
    }

    #[tokio::test]
    async fn ctx_prefers_pipeline_context() {
        let id = Uuid::new_v4();
        let mut req = Request::builder().uri("/ctx").body(Body::empty()).unwrap();
        req.extensions_mut().insert(RequestContext::new(
            id,
            std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
        ));

        let response = app().oneshot(req).await.unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(bytes, id.to_string().as_bytes());
    }
}
