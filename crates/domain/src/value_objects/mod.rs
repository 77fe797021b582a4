//! Value objects - immutable objects defined by their attributes

mod article_id;
mod role;

pub use article_id::ArticleId;
pub use role::Role;
