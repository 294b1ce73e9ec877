//! HTTP errors.
//!
//! Handlers return [`ApiResult`]. Every failure becomes an [`ApiError`]
//! serialized as `{"code", "message", "details"?}` with the status its
//! [`ErrorCode`] maps to. Rejected forms travel back in `details.form`.

use axum::{
    extract::rejection::FormRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use yanote_core::{
    AccountFormView, ConfigError, EntityType, NoteFormView, StorageError, ValidationError,
    YanoteError,
};

// ============================================================================
// ERROR CODES
// ============================================================================

/// Machine-readable failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // 401
    InvalidToken,
    TokenExpired,

    // 400
    /// A submitted form did not validate; `details.form` has the errors.
    ValidationFailed,
    InvalidInput,

    // 404
    /// Unknown slug, or a note that belongs to someone else.
    NoteNotFound,
    EntityNotFound,

    // 409
    /// Lost a race for a slug after the form check passed.
    SlugAlreadyExists,
    UsernameAlreadyExists,

    // 5xx
    InternalError,
    DatabaseError,
    ServiceUnavailable,
}

impl ErrorCode {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidToken | ErrorCode::TokenExpired => StatusCode::UNAUTHORIZED,
            ErrorCode::ValidationFailed | ErrorCode::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorCode::NoteNotFound | ErrorCode::EntityNotFound => StatusCode::NOT_FOUND,
            ErrorCode::SlugAlreadyExists | ErrorCode::UsernameAlreadyExists => {
                StatusCode::CONFLICT
            }
            ErrorCode::InternalError | ErrorCode::DatabaseError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR
// ============================================================================

/// JSON error body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(self, details: serde_json::Value) -> Self {
        Self {
            details: Some(details),
            ..self
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidToken, message)
    }

    pub fn token_expired() -> Self {
        Self::new(ErrorCode::TokenExpired, "Session has expired")
    }

    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message)
    }

    /// A rejected note form, echoed back with its field errors.
    pub fn invalid_note_form(form: NoteFormView) -> Self {
        Self::validation_failed("The note form contains errors")
            .with_details(serde_json::json!({ "form": form }))
    }

    /// A rejected login or signup form. Passwords are not echoed.
    pub fn invalid_account_form(form: AccountFormView) -> Self {
        Self::validation_failed("The form contains errors")
            .with_details(serde_json::json!({ "form": form }))
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Missing note, or a note owned by another user. The body is the same
    /// for both and names neither the slug nor the id.
    pub fn note_not_found() -> Self {
        Self::new(ErrorCode::NoteNotFound, "Note not found")
    }

    pub fn slug_already_exists(slug: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::SlugAlreadyExists,
            format!("Slug {} is already in use", slug),
        )
    }

    pub fn username_already_exists(username: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::UsernameAlreadyExists,
            format!("Username {} is already taken", username),
        )
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn database_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}

// ============================================================================
// CONVERSIONS
// ============================================================================

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound {
                entity_type: EntityType::Note,
                ..
            } => ApiError::note_not_found(),
            StorageError::NotFound { entity_type, id } => ApiError::new(
                ErrorCode::EntityNotFound,
                format!("{:?} {} not found", entity_type, id),
            ),
            StorageError::SlugTaken { slug } => ApiError::slug_already_exists(slug),
            StorageError::UsernameTaken { username } => ApiError::username_already_exists(username),
            StorageError::InsertFailed {
                entity_type,
                reason,
            } => {
                tracing::error!(entity = ?entity_type, reason = %reason, "Insert failed");
                ApiError::database_error(format!("Could not save {:?}", entity_type))
            }
            StorageError::Backend { reason } => {
                tracing::error!(reason = %reason, "Storage backend error");
                ApiError::database_error("Database operation failed")
            }
            StorageError::LockPoisoned => {
                tracing::error!("Storage lock poisoned");
                ApiError::internal_error("Storage unavailable")
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation_failed(err.to_string())
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        tracing::error!(error = %err, "Configuration error");
        ApiError::internal_error("Server misconfigured")
    }
}

impl From<YanoteError> for ApiError {
    fn from(err: YanoteError) -> Self {
        match err {
            YanoteError::Storage(e) => e.into(),
            YanoteError::Validation(e) => e.into(),
            YanoteError::Config(e) => e.into(),
        }
    }
}

// An unreadable body answers 400 whatever status axum would have chosen.
impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        tracing::debug!(status = %rejection.status(), "Form rejected");
        ApiError::invalid_input(rejection.body_text())
    }
}

// Driver errors are logged in full and answered generically.
impl From<tokio_postgres::Error> for ApiError {
    fn from(err: tokio_postgres::Error) -> Self {
        tracing::error!(error = ?err, "Postgres error");
        ApiError::database_error("Database operation failed")
    }
}

impl From<deadpool_postgres::PoolError> for ApiError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        tracing::error!(error = ?err, "Pool error");
        match err {
            deadpool_postgres::PoolError::Timeout(_) => {
                ApiError::service_unavailable("No database connection available")
            }
            deadpool_postgres::PoolError::Closed => {
                ApiError::service_unavailable("Database pool is closed")
            }
            _ => ApiError::database_error("Could not connect to the database"),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
