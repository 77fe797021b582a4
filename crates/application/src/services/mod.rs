//! Application services - use case implementations

mod article_service;

pub use article_service::{ArticleService, ArticleStats};
