//! Domain-level errors

use thiserror::Error;
use validator::ValidationErrors;

/// Errors that can occur in the domain layer
#[derive(Debug, Error)]
pub enum DomainError {
    /// Entity not found
    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: String, id: String },

    /// Validation failed
    #[error("Validation failed: {0}")]
    ValidationError(String),

    /// Operation not permitted
    #[error("Operation not permitted: {0}")]
    NotPermitted(String),
}

impl DomainError {
    /// Create a not found error
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    /// Check whether this error signals a missing entity
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<ValidationErrors> for DomainError {
    fn from(errors: ValidationErrors) -> Self {
        // Sorted so the message is stable regardless of hash map order
        let mut messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors
                    .iter()
                    .map(|error| {
                        format!(
                            "{}: {}",
                            field,
                            error
                                .message
                                .as_ref()
                                .map_or_else(|| error.code.to_string(), ToString::to_string)
                        )
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        messages.sort();

        Self::ValidationError(messages.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_creates_correct_error() {
        let err = DomainError::not_found("Article", "42");
        match err {
            DomainError::NotFound { entity_type, id } => {
                assert_eq!(entity_type, "Article");
                assert_eq!(id, "42");
            },
            _ => unreachable!("Expected NotFound error"),
        }
    }

    #[test]
    fn not_found_error_message_is_correct() {
        let err = DomainError::not_found("Article", "42");
        assert_eq!(err.to_string(), "Article not found: 42");
        assert!(err.is_not_found());
    }

    #[test]
    fn validation_error_message() {
        let err = DomainError::ValidationError("title: must not be empty".to_string());
        assert_eq!(
            err.to_string(),
            "Validation failed: title: must not be empty"
        );
        assert!(!err.is_not_found());
    }

    #[test]
    fn not_permitted_error_message() {
        let err = DomainError::NotPermitted("admin only".to_string());
        assert_eq!(err.to_string(), "Operation not permitted: admin only");
    }
}
