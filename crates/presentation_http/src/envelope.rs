//! Uniform JSON response envelope
//!
//! Every response body produced by the service has the same shape:
//! `success`, then exactly one of `data`, `message` or `error`, plus the
//! request's correlation id when one has been assigned.

use application::RequestContext;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Response body shared by all endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Envelope<T = ()> {
    /// Whether the request succeeded
    pub success: bool,
    /// Payload for success-with-data outcomes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Human-readable note for success-with-message outcomes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Human-readable reason for failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Correlation id, identical to the `X-Request-ID` response header
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl<T> Envelope<T> {
    /// Successful outcome carrying a payload
    pub fn data(data: T, request_id: Uuid) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            error: None,
            request_id: Some(request_id.to_string()),
        }
    }
}

impl Envelope {
    /// Successful outcome carrying only a message
    pub fn message(message: impl Into<String>, request_id: Uuid) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
            error: None,
            request_id: Some(request_id.to_string()),
        }
    }

    /// Failed outcome
    pub fn failure(error: impl Into<String>, request_id: Option<Uuid>) -> Self {
        Self {
            success: false,
            data: None,
            message: None,
            error: Some(error.into()),
            request_id: request_id.map(|id| id.to_string()),
        }
    }
}

/// A successful handler result: status code plus envelope
#[derive(Debug)]
pub struct ApiReply<T = ()> {
    status: StatusCode,
    envelope: Envelope<T>,
}

impl<T> ApiReply<T> {
    /// 200 with a payload
    pub fn ok(data: T, ctx: &RequestContext) -> Self {
        Self {
            status: StatusCode::OK,
            envelope: Envelope::data(data, ctx.request_id()),
        }
    }

    /// 201 with the created resource
    pub fn created(data: T, ctx: &RequestContext) -> Self {
        Self {
            status: StatusCode::CREATED,
            envelope: Envelope::data(data, ctx.request_id()),
        }
    }
}

impl ApiReply {
    /// 200 with a message and no payload
    pub fn message(message: impl Into<String>, ctx: &RequestContext) -> Self {
        Self {
            status: StatusCode::OK,
            envelope: Envelope::message(message, ctx.request_id()),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiReply<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self.envelope)).into_response()
    }
}
