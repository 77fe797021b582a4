//! Article entity

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{errors::DomainError, value_objects::ArticleId};

/// A published article
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// Store-assigned identifier
    pub id: ArticleId,
    /// Headline
    pub title: String,
    /// Body text
    pub content: String,
    /// Author display name
    pub author: String,
    /// When the article was created; never changes afterwards
    pub created_at: DateTime<Utc>,
    /// When the article was last modified
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an article
///
/// Missing fields deserialize as empty strings so they are reported by
/// validation rather than as a JSON shape error. Client-supplied `id` and
/// timestamps are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ArticleDraft {
    #[serde(default)]
    #[validate(length(min = 1, message = "must not be empty"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "must not be empty"))]
    pub content: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "must not be empty"))]
    pub author: String,
}

/// Partial update for an existing article
///
/// Fields left out keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ArticlePatch {
    #[serde(default)]
    #[validate(length(min = 1, message = "must not be empty"))]
    pub title: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, message = "must not be empty"))]
    pub content: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, message = "must not be empty"))]
    pub author: Option<String>,
}

impl ArticleDraft {
    /// Create a draft from its three required fields
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            author: author.into(),
        }
    }

    /// Validate required fields, returning the draft unchanged on success
    pub fn validated(self) -> Result<Self, DomainError> {
        self.validate()?;
        Ok(self)
    }
}

impl ArticlePatch {
    /// Validate present fields, returning the patch unchanged on success
    pub fn validated(self) -> Result<Self, DomainError> {
        self.validate()?;
        Ok(self)
    }

    /// Check whether the patch carries no changes at all
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.author.is_none()
    }
}

impl Article {
    /// Materialize a validated draft under the given identifier
    #[must_use]
    pub fn from_draft(id: ArticleId, draft: ArticleDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: draft.title,
            content: draft.content,
            author: draft.author,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a validated patch and refresh `updated_at`
    ///
    /// `updated_at` always moves strictly forward, even when the clock has
    /// not advanced since the previous mutation.
    pub fn apply(&mut self, patch: ArticlePatch, now: DateTime<Utc>) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(author) = patch.author {
            self.author = author;
        }

        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + TimeDelta::microseconds(1)
        };
    }
}
