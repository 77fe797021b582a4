//! Port definitions for application layer
//!
//! Ports are interfaces that define how the application interacts with
//! external systems. Adapters in the infrastructure layer implement these ports.

mod article_store;

pub use article_store::ArticleStore;
#[cfg(test)]
pub use article_store::MockArticleStore;
