//! Error types for yanote operations

use crate::EntityType;
use thiserror::Error;
use uuid::Uuid;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Entity not found: {entity_type:?} with id {id}")]
    NotFound { entity_type: EntityType, id: Uuid },

    /// Uniqueness violation on `notes.slug`.
    #[error("Slug already taken: {slug}")]
    SlugTaken { slug: String },

    /// Uniqueness violation on `users.username`.
    #[error("Username already taken: {username}")]
    UsernameTaken { username: String },

    #[error("Insert failed for {entity_type:?}: {reason}")]
    InsertFailed { entity_type: EntityType, reason: String },

    #[error("Backend error: {reason}")]
    Backend { reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Validation errors raised while building entities.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Field {field} is longer than {max} characters")]
    TooLong { field: String, max: usize },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all yanote errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum YanoteError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for yanote operations.
pub type YanoteResult<T> = Result<T, YanoteError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display_not_found() {
        let err = StorageError::NotFound {
            entity_type: EntityType::Note,
            id: Uuid::nil(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Entity not found"));
        assert!(msg.contains("Note"));
        assert!(msg.contains("00000000-0000-0000-0000-000000000000"));
    }

    #[test]
    fn test_storage_error_display_slug_taken() {
        let err = StorageError::SlugTaken {
            slug: "address_slug".to_string(),
        };
        assert_eq!(err.to_string(), "Slug already taken: address_slug");
    }

    #[test]
    fn test_validation_error_display_too_long() {
        let err = ValidationError::TooLong {
            field: "title".to_string(),
            max: 100,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("title"));
        assert!(msg.contains("100"));
    }

    #[test]
    fn test_config_error_display_invalid_value() {
        let err = ConfigError::InvalidValue {
            field: "port".to_string(),
            value: "abc".to_string(),
            reason: "must be a number".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("port"));
        assert!(msg.contains("abc"));
        assert!(msg.contains("must be a number"));
    }

    #[test]
    fn test_yanote_error_from_variants() {
        let storage = YanoteError::from(StorageError::LockPoisoned);
        assert!(matches!(storage, YanoteError::Storage(_)));

        let validation = YanoteError::from(ValidationError::RequiredFieldMissing {
            field: "title".to_string(),
        });
        assert!(matches!(validation, YanoteError::Validation(_)));

        let config = YanoteError::from(ConfigError::MissingRequired {
            field: "jwt_secret".to_string(),
        });
        assert!(matches!(config, YanoteError::Config(_)));
    }
}
