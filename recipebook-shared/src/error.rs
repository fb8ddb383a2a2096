/// Domain error type shared by the model layer
///
/// Operations that enforce business rules (recipe validation, relation
/// toggles, subscriptions, avatars) return `ServiceResult<T>`. The API
/// crate maps each variant onto an HTTP status.
///
/// # Taxonomy
///
/// - `Validation`: malformed input or a business rule violation, keyed by field
/// - `Conflict`: a relation already exists (or is missing on removal)
/// - `NotFound`: a referenced entity does not exist
/// - `Forbidden`: the acting user may not touch the entity
/// - `Database` / `Media`: infrastructure failures

use crate::media::MediaError;

/// Result alias for domain operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Domain error
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Field-keyed validation failure
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    /// Relation state conflicts with the request
    #[error("{0}")]
    Conflict(String),

    /// Referenced entity is missing
    #[error("{0}")]
    NotFound(String),

    /// Acting user is not allowed to perform the operation
    #[error("{0}")]
    Forbidden(String),

    /// Database failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Media storage failure
    #[error("Media storage error: {0}")]
    Media(#[from] MediaError),
}

impl ServiceError {
    /// Builds a validation error for a single field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ServiceError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Returns true if this error is a validation failure
    pub fn is_validation(&self) -> bool {
        matches!(self, ServiceError::Validation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display_is_field_keyed() {
        let err = ServiceError::validation("ingredients", "At least one ingredient is required");
        assert_eq!(err.to_string(), "ingredients: At least one ingredient is required");
        assert!(err.is_validation());
    }

    #[test]
    fn test_not_found_is_not_validation() {
        let err = ServiceError::NotFound("Recipe not found".to_string());
        assert!(!err.is_validation());
    }
}
