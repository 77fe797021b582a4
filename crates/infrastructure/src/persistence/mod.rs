//! Persistence module
//!
//! In-memory storage for articles. Durable storage is out of scope; any
//! other backend plugs in behind the `ArticleStore` port.

pub mod in_memory_article_store;

pub use in_memory_article_store::InMemoryArticleStore;
