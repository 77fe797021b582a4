//! Article use cases
//!
//! Thin orchestration over the `ArticleStore` port: delegates CRUD,
//! logs mutations, and computes service statistics.

use std::{sync::Arc, time::Instant};

use domain::{Article, ArticleDraft, ArticleId, ArticlePatch};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::{error::ApplicationError, ports::ArticleStore};

/// Aggregate numbers reported on the admin statistics endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleStats {
    /// Articles currently stored
    pub total_articles: usize,
    /// Seconds since the service was constructed
    pub uptime_seconds: u64,
}

/// Service for managing articles
#[derive(Clone)]
pub struct ArticleService {
    store: Arc<dyn ArticleStore>,
    started_at: Instant,
}

impl std::fmt::Debug for ArticleService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArticleService")
            .field("started_at", &self.started_at)
            .finish_non_exhaustive()
    }
}

impl ArticleService {
    /// Create a new article service over the given store
    pub fn new(store: Arc<dyn ArticleStore>) -> Self {
        Self {
            store,
            started_at: Instant::now(),
        }
    }

    /// List all articles
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Article>, ApplicationError> {
        let articles = self.store.list().await?;
        debug!(count = articles.len(), "Listed articles");
        Ok(articles)
    }

    /// Get a single article
    #[instrument(skip(self))]
    pub async fn get(&self, id: ArticleId) -> Result<Article, ApplicationError> {
        self.store.get(id).await
    }

    /// Create an article from a draft
    #[instrument(skip(self, draft))]
    pub async fn create(&self, draft: ArticleDraft) -> Result<Article, ApplicationError> {
        let article = self.store.create(draft).await?;
        info!(article_id = %article.id, author = %article.author, "Article created");
        Ok(article)
    }

    /// Partially update an article
    #[instrument(skip(self, patch))]
    pub async fn update(
        &self,
        id: ArticleId,
        patch: ArticlePatch,
    ) -> Result<Article, ApplicationError> {
        let article = self.store.update(id, patch).await?;
        info!(article_id = %article.id, "Article updated");
        Ok(article)
    }

    /// Delete an article
    #[instrument(skip(self))]
    pub async fn delete(&self, id: ArticleId) -> Result<(), ApplicationError> {
        self.store.delete(id).await?;
        info!(article_id = %id, "Article deleted");
        Ok(())
    }

    /// Compute current statistics
    pub async fn stats(&self) -> Result<ArticleStats, ApplicationError> {
        Ok(ArticleStats {
            total_articles: self.store.count().await?,
            uptime_seconds: self.started_at.elapsed().as_secs(),
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use domain::DomainError;

    use super::*;
    use crate::ports::MockArticleStore;

    fn article(id: u64) -> Article {
        Article::from_draft(
            ArticleId::new(id),
            ArticleDraft::new("Title", "Body", "Author"),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn list_delegates_to_store() {
        let mut store = MockArticleStore::new();
        store
            .expect_list()
            .times(1)
            .returning(|| Ok(vec![article(1), article(2)]));

        let service = ArticleService::new(Arc::new(store));
        let articles = service.list().await.unwrap();

        assert_eq!(articles.len(), 2);
    }

    #[tokio::test]
    async fn get_propagates_not_found() {
        let mut store = MockArticleStore::new();
        store
            .expect_get()
            .returning(|id| Err(DomainError::not_found("Article", id.to_string()).into()));

        let service = ArticleService::new(Arc::new(store));
        let err = service.get(ArticleId::new(9)).await.unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn create_returns_stored_article() {
        let mut store = MockArticleStore::new();
        store
            .expect_create()
            .withf(|draft| draft.title == "Title")
            .returning(|_| Ok(article(3)));

        let service = ArticleService::new(Arc::new(store));
        let created = service
            .create(ArticleDraft::new("Title", "Body", "Author"))
            .await
            .unwrap();

        assert_eq!(created.id, ArticleId::new(3));
    }

    #[tokio::test]
    async fn update_passes_patch_through() {
        let mut store = MockArticleStore::new();
        store
            .expect_update()
            .withf(|id, patch| *id == ArticleId::new(1) && patch.title.as_deref() == Some("New"))
            .returning(|id, _| {
                let mut a = article(id.value());
                a.title = "New".to_string();
                Ok(a)
            });

        let service = ArticleService::new(Arc::new(store));
        let patch = ArticlePatch {
            title: Some("New".to_string()),
            ..ArticlePatch::default()
        };
        let updated = service.update(ArticleId::new(1), patch).await.unwrap();

        assert_eq!(updated.title, "New");
    }

    #[tokio::test]
    async fn delete_propagates_not_found() {
        let mut store = MockArticleStore::new();
        store
            .expect_delete()
            .returning(|id| Err(DomainError::not_found("Article", id.to_string()).into()));

        let service = ArticleService::new(Arc::new(store));
        assert!(service.delete(ArticleId::new(5)).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn stats_reports_store_count() {
        let mut store = MockArticleStore::new();
        store.expect_count().returning(|| Ok(4));

        let service = ArticleService::new(Arc::new(store));
        let stats = service.stats().await.unwrap();

        assert_eq!(stats.total_articles, 4);
        assert_eq!(stats.uptime_seconds, 0);
    }

    #[test]
    fn stats_serialize_with_expected_keys() {
        let stats = ArticleStats {
            total_articles: 2,
            uptime_seconds: 10,
        };
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["total_articles"], 2);
        assert_eq!(json["uptime_seconds"], 10);
    }
}
