//! Article storage port
//!
//! Defines the persistence interface the article use cases depend on.
//! Adapters decide how records are held; every adapter must serialize
//! mutations so that no partially written article is ever observable.

use async_trait::async_trait;
use domain::{Article, ArticleDraft, ArticleId, ArticlePatch};
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for article persistence
///
/// Implementations own identifier assignment: identifiers are unique,
/// strictly increasing and never reused, even under concurrent `create`
/// calls.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Return every stored article in insertion order
    async fn list(&self) -> Result<Vec<Article>, ApplicationError>;

    /// Get a single article
    ///
    /// # Errors
    /// `DomainError::NotFound` if no article has this identifier.
    async fn get(&self, id: ArticleId) -> Result<Article, ApplicationError>;

    /// Validate and store a new article
    ///
    /// Assigns the next identifier and stamps both timestamps. A validation
    /// failure leaves the collection unchanged.
    async fn create(&self, draft: ArticleDraft) -> Result<Article, ApplicationError>;

    /// Apply a partial update to an existing article
    ///
    /// # Errors
    /// `DomainError::NotFound` if absent, `DomainError::ValidationError` if a
    /// present field is empty.
    async fn update(&self, id: ArticleId, patch: ArticlePatch)
    -> Result<Article, ApplicationError>;

    /// Remove an article
    ///
    /// # Errors
    /// `DomainError::NotFound` if absent.
    async fn delete(&self, id: ArticleId) -> Result<(), ApplicationError>;

    /// Number of stored articles
    async fn count(&self) -> Result<usize, ApplicationError>;
}
