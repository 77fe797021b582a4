//! API error handling
//!
//! Each failure class maps to one status code and renders as a failure
//! envelope. Internal errors never leak details: the envelope always says
//! "internal server error" and the detail goes to the log.

use application::{ApplicationError, RequestContext};
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use domain::DomainError;
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

use crate::envelope::Envelope;

/// Public message for every internal fault
pub const INTERNAL_ERROR_MESSAGE: &str = "internal server error";

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("too many requests, limit exceeded")]
    RateLimited,

    #[error("{0}")]
    UnsupportedMediaType(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status for this error class
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the client
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Internal(_) => INTERNAL_ERROR_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }

    /// Attach a correlation id (if known) so the error can be rendered
    #[must_use]
    pub const fn reject(self, request_id: Option<Uuid>) -> ApiRejection {
        ApiRejection {
            error: self,
            request_id,
        }
    }

    /// Attach the correlation id of the given request
    #[must_use]
    pub fn for_context(self, ctx: &RequestContext) -> ApiRejection {
        self.reject(Some(ctx.request_id()))
    }
}

impl From<ApplicationError> for ApiError {
    fn from(err: ApplicationError) -> Self {
        match err {
            ApplicationError::Domain(DomainError::NotFound { entity_type, .. }) => {
                Self::NotFound(format!("{} not found", entity_type.to_lowercase()))
            },
            ApplicationError::Domain(DomainError::ValidationError(msg)) => Self::BadRequest(msg),
            ApplicationError::Domain(DomainError::NotPermitted(msg)) => Self::Forbidden(msg),
            ApplicationError::Storage(msg) | ApplicationError::Internal(msg) => {
                Self::Internal(msg)
            },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let message = rejection.body_text();
        match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => Self::PayloadTooLarge(message),
            StatusCode::UNSUPPORTED_MEDIA_TYPE => Self::UnsupportedMediaType(message),
            _ => Self::BadRequest(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.reject(None).into_response()
    }
}

/// An `ApiError` paired with the correlation id of the failing request
#[derive(Debug)]
pub struct ApiRejection {
    error: ApiError,
    request_id: Option<Uuid>,
}

impl ApiRejection {
    /// The underlying error
    #[must_use]
    pub const fn error(&self) -> &ApiError {
        &self.error
    }
}

impl IntoResponse for ApiRejection {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self.error {
            error!(
                request_id = ?self.request_id,
                detail = %detail,
                "Internal error while handling request"
            );
        }

        let status = self.error.status_code();
        let envelope = Envelope::failure(self.error.public_message(), self.request_id);
        (status, Json(envelope)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use serde_json::Value;

    use super::*;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn status_codes_match_taxonomy() {
        let cases = [
            (ApiError::BadRequest(String::new()), 400),
            (ApiError::Unauthorized(String::new()), 401),
            (ApiError::Forbidden(String::new()), 403),
            (ApiError::NotFound(String::new()), 404),
            (ApiError::MethodNotAllowed, 405),
            (ApiError::UnsupportedMediaType(String::new()), 415),
            (ApiError::PayloadTooLarge(String::new()), 413),
            (ApiError::RateLimited, 429),
            (ApiError::Internal(String::new()), 500),
        ];

        for (error, expected) in cases {
            assert_eq!(error.status_code().as_u16(), expected, "{error:?}");
        }
    }

    #[test]
    fn not_found_maps_from_domain() {
        let err: ApiError =
            ApplicationError::from(DomainError::not_found("Article", "7")).into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.public_message(), "article not found");
    }

    #[test]
    fn validation_maps_to_bad_request() {
        let err: ApiError =
            ApplicationError::from(DomainError::ValidationError("title: empty".into())).into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "title: empty");
    }

    #[test]
    fn internal_details_are_hidden() {
        let err: ApiError = ApplicationError::Storage("/var/lib/secret.db locked".into()).into();
        assert_eq!(err.public_message(), INTERNAL_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn rejection_renders_failure_envelope_with_request_id() {
        let id = Uuid::new_v4();
        let response = ApiError::Forbidden("admin access required".into())
            .reject(Some(id))
            .into_response();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "admin access required");
        assert_eq!(body["request_id"], id.to_string());
    }

    #[tokio::test]
    async fn bare_error_renders_without_request_id() {
        let response = ApiError::RateLimited.into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let body = body_json(response).await;
        assert_eq!(body["error"], "too many requests, limit exceeded");
        assert!(body.get("request_id").is_none());
    }
}
