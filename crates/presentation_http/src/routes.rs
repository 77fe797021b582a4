//! Route definitions and pipeline assembly

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};

use crate::{
    handlers,
    middleware::{
        ApiKeyAuthLayer, ApiKeyTable, ContentTypeLayer, CorsLayer, PipelineConfig,
        RateLimiterLayer, RateLimiterState, RecoveryLayer, RequestIdLayer, access_log_layer,
    },
    state::AppState,
};

/// Create the router with all routes but without the global middleware
///
/// Mutating article routes and the admin route require an API key. A known
/// path called with an unrouted method answers 405 before authentication.
pub fn create_router(state: AppState, api_keys: ApiKeyTable) -> Router {
    let public = Router::new()
        .route("/ping", get(handlers::system::ping))
        .route("/articles", get(handlers::articles::list_articles))
        .route("/articles/{id}", get(handlers::articles::get_article));

    let protected = Router::new()
        .route("/articles", post(handlers::articles::create_article))
        .route(
            "/articles/{id}",
            put(handlers::articles::update_article).delete(handlers::articles::delete_article),
        )
        .route("/admin/stats", get(handlers::admin::stats))
        .route_layer(ApiKeyAuthLayer::new(api_keys));

    public
        .merge(protected)
        .method_not_allowed_fallback(handlers::system::method_not_allowed)
        .fallback(handlers::system::route_not_found)
        .with_state(state)
}

/// Wrap a router in the request pipeline
///
/// Layers wrap outward, so the last one added runs first: recovery,
/// correlation id, access log, CORS, rate limiting, content type.
pub fn with_pipeline(
    router: Router,
    rate_limiter: Arc<RateLimiterState>,
    pipeline: &PipelineConfig,
) -> Router {
    router
        .layer(DefaultBodyLimit::max(pipeline.max_body_size_bytes))
        .layer(ContentTypeLayer::new())
        .layer(RateLimiterLayer::from_state(
            rate_limiter,
            pipeline.rate_limit.enabled,
        ))
        .layer(CorsLayer::new(pipeline.cors.clone()))
        .layer(access_log_layer())
        .layer(RequestIdLayer::new(pipeline.client_ip.clone()))
        .layer(RecoveryLayer::new())
}

/// Create the complete application
pub fn create_app(state: AppState, pipeline: &PipelineConfig) -> Router {
    let rate_limiter = Arc::clone(&state.rate_limiter);
    with_pipeline(
        create_router(state, pipeline.api_keys.clone()),
        rate_limiter,
        pipeline,
    )
}
