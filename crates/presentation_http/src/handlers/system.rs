//! System handlers

use axum::http::Method;

use crate::{
    envelope::ApiReply,
    error::{ApiError, ApiRejection},
    extract::Ctx,
};

/// Liveness check
pub async fn ping(Ctx(ctx): Ctx) -> ApiReply {
    ApiReply::message("pong", &ctx)
}

/// Fallback for unknown routes
pub async fn route_not_found(Ctx(ctx): Ctx, method: Method) -> ApiRejection {
    tracing::debug!(method = %method, "No route matched");
    ApiError::NotFound("route not found".to_string()).for_context(&ctx)
}

/// Fallback for known paths called with an unrouted method
pub async fn method_not_allowed(Ctx(ctx): Ctx, method: Method) -> ApiRejection {
    tracing::debug!(method = %method, "Method not routed for path");
    ApiError::MethodNotAllowed.for_context(&ctx)
}
