//! Admin handlers

use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::{
    envelope::ApiReply,
    error::{ApiError, ApiRejection},
    extract::Ctx,
    state::AppState,
};

/// Service statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsResponse {
    /// Articles currently stored
    pub total_articles: usize,
    /// Seconds since startup
    pub uptime_seconds: u64,
    /// Clients with a live rate limit bucket
    pub tracked_clients: usize,
}

/// Report service statistics; requires the admin role
pub async fn stats(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
) -> Result<ApiReply<StatsResponse>, ApiRejection> {
    if !ctx.is_admin() {
        tracing::warn!(
            request_id = %ctx.request_id(),
            role = ?ctx.role().map(|r| r.as_str()),
            "Non-admin caller denied access to admin stats"
        );
        return Err(ApiError::Forbidden("admin access required".to_string()).for_context(&ctx));
    }

    let stats = state
        .article_service
        .stats()
        .await
        .map_err(|err| ApiError::from(err).for_context(&ctx))?;

    Ok(ApiReply::ok(
        StatsResponse {
            total_articles: stats.total_articles,
            uptime_seconds: stats.uptime_seconds,
            tracked_clients: state.rate_limiter.tracked_clients(),
        },
        &ctx,
    ))
}
