//! Article handlers
//!
//! Reads are public. Create, update and delete sit behind API key
//! authentication, which is applied by the router.

use application::{ApplicationError, RequestContext};
use axum::extract::State;
use domain::{Article, ArticleDraft, ArticlePatch};

use crate::{
    envelope::ApiReply,
    error::{ApiError, ApiRejection},
    extract::{ArticlePath, Ctx, EnvelopeJson},
    state::AppState,
};

fn reject(ctx: &RequestContext) -> impl Fn(ApplicationError) -> ApiRejection + '_ {
    move |err| ApiError::from(err).for_context(ctx)
}

/// List all articles
pub async fn list_articles(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
) -> Result<ApiReply<Vec<Article>>, ApiRejection> {
    let articles = state.article_service.list().await.map_err(reject(&ctx))?;
    Ok(ApiReply::ok(articles, &ctx))
}

/// Get a single article
pub async fn get_article(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    ArticlePath(id): ArticlePath,
) -> Result<ApiReply<Article>, ApiRejection> {
    let article = state.article_service.get(id).await.map_err(reject(&ctx))?;
    Ok(ApiReply::ok(article, &ctx))
}

/// Create an article
pub async fn create_article(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    EnvelopeJson(draft): EnvelopeJson<ArticleDraft>,
) -> Result<ApiReply<Article>, ApiRejection> {
    let article = state
        .article_service
        .create(draft)
        .await
        .map_err(reject(&ctx))?;
    Ok(ApiReply::created(article, &ctx))
}

/// Update the fields present in the body
pub async fn update_article(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    ArticlePath(id): ArticlePath,
    EnvelopeJson(patch): EnvelopeJson<ArticlePatch>,
) -> Result<ApiReply<Article>, ApiRejection> {
    let article = state
        .article_service
        .update(id, patch)
        .await
        .map_err(reject(&ctx))?;
    Ok(ApiReply::ok(article, &ctx))
}

/// Delete an article
pub async fn delete_article(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    ArticlePath(id): ArticlePath,
) -> Result<ApiReply, ApiRejection> {
    state
        .article_service
        .delete(id)
        .await
        .map_err(reject(&ctx))?;
    Ok(ApiReply::message("article deleted", &ctx))
}
