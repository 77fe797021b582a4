//! Domain entities

mod article;

pub use article::{Article, ArticleDraft, ArticlePatch};
