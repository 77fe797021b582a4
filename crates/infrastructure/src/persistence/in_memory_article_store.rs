//! In-memory article store
//!
//! The collection and the next-identifier counter live behind a single
//! `RwLock`, so identifier assignment and insertion happen atomically and
//! readers never observe a half-applied mutation. Readers share the lock;
//! writers are exclusive. The lock is never held across an `.await`.

use application::{ApplicationError, ports::ArticleStore};
use async_trait::async_trait;
use chrono::Utc;
use domain::{Article, ArticleDraft, ArticleId, ArticlePatch, DomainError};
use parking_lot::RwLock;
use tracing::debug;

const ENTITY: &str = "Article";

#[derive(Debug)]
struct Inner {
    articles: Vec<Article>,
    next_id: ArticleId,
}

/// Article store backed by a process-local vector
#[derive(Debug)]
pub struct InMemoryArticleStore {
    inner: RwLock<Inner>,
}

impl Default for InMemoryArticleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryArticleStore {
    /// Create an empty store; the first article gets id 1
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                articles: Vec::new(),
                next_id: ArticleId::FIRST,
            }),
        }
    }

    /// Create a store holding the two demo articles (ids 1 and 2)
    #[must_use]
    pub fn with_demo_articles() -> Self {
        let store = Self::new();
        {
            let mut inner = store.inner.write();
            let seeded = demo_drafts()
                .into_iter()
                .filter_map(|draft| insert(&mut inner, draft).ok())
                .count();
            debug!(seeded, "Seeded demo articles");
        }
        store
    }
}

fn demo_drafts() -> [ArticleDraft; 2] {
    [
        ArticleDraft::new(
            "Getting Started with Go",
            "Go is a programming language...",
            "John Doe",
        ),
        ArticleDraft::new(
            "Web Development with Gin",
            "Gin is a web framework...",
            "Jane Smith",
        ),
    ]
}

fn insert(inner: &mut Inner, draft: ArticleDraft) -> Result<Article, ApplicationError> {
    let id = inner.next_id;
    inner.next_id = id
        .next()
        .ok_or_else(|| ApplicationError::Storage("article identifiers exhausted".to_string()))?;

    let article = Article::from_draft(id, draft, Utc::now());
    inner.articles.push(article.clone());
    Ok(article)
}

fn not_found(id: ArticleId) -> ApplicationError {
    DomainError::not_found(ENTITY, id.to_string()).into()
}

#[async_trait]
impl ArticleStore for InMemoryArticleStore {
    async fn list(&self) -> Result<Vec<Article>, ApplicationError> {
        Ok(self.inner.read().articles.clone())
    }

    async fn get(&self, id: ArticleId) -> Result<Article, ApplicationError> {
        self.inner
            .read()
            .articles
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    async fn create(&self, draft: ArticleDraft) -> Result<Article, ApplicationError> {
        let draft = draft.validated()?;

        let article = insert(&mut self.inner.write(), draft)?;
        debug!(article_id = %article.id, "Stored article");
        Ok(article)
    }

    async fn update(
        &self,
        id: ArticleId,
        patch: ArticlePatch,
    ) -> Result<Article, ApplicationError> {
        let mut inner = self.inner.write();
        let article = inner
            .articles
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| not_found(id))?;

        // Existence is checked first so an unknown id reports 404 even with a bad body
        let patch = patch.validated()?;
        article.apply(patch, Utc::now());
        Ok(article.clone())
    }

    async fn delete(&self, id: ArticleId) -> Result<(), ApplicationError> {
        let mut inner = self.inner.write();
        let index = inner
            .articles
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| not_found(id))?;

        inner.articles.remove(index);
        debug!(article_id = %id, "Removed article");
        Ok(())
    }

    async fn count(&self) -> Result<usize, ApplicationError> {
        Ok(self.inner.read().articles.len())
    }
}
