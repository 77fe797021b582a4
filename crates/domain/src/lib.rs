//! Domain layer for the articles service
//!
//! Contains the article entity, its value objects, and domain errors.
//! This layer knows nothing about HTTP, locking, or storage.

pub mod entities;
pub mod errors;
pub mod value_objects;

pub use entities::*;
pub use errors::DomainError;
pub use value_objects::*;
