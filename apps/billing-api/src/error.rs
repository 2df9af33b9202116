//! Error types for the billing services.
//!
//! ```text
//! ┌──────────────────────────┐     ┌────────────────────────────────────┐
//! │ CoreError                │     │ ApiError            status         │
//! │  ProductNotFound ────────┼────►│  NotFound           404            │
//! │  ReceiptNotFound ────────┼────►│  NotFound           404            │
//! │  InvalidQuantity ────────┼────►│  Validation         400            │
//! │  InvalidDateFormat ──────┼────►│  Validation         400            │
//! │  Validation ─────────────┼────►│  Validation         400            │
//! ├──────────────────────────┤     │                                    │
//! │ DbError                  │     │                                    │
//! │  NotFound ───────────────┼────►│  NotFound           404            │
//! │  UniqueViolation ────────┼────►│  Conflict           409            │
//! │  ForeignKeyViolation ────┼────►│  Conflict           409            │
//! │  Core(e) ────────────────┼────►│  (as CoreError)                    │
//! │  everything else ────────┼────►│  Persistence        500 (generic)  │
//! └──────────────────────────┘     └────────────────────────────────────┘
//! ```

use billing_core::{CoreError, ValidationError};
use billing_db::DbError;
use tracing::error;

/// Message shown to callers for any storage failure.
pub const PERSISTENCE_MESSAGE: &str = "A database error occurred. Please try again later.";

/// Caller-facing service errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("Authentication failed: {0}")]
    Unauthenticated(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Storage failure. The detail is logged, never shown.
    #[error("{}", PERSISTENCE_MESSAGE)]
    Persistence(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP-style status code for a router to use.
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Validation(_) => 400,
            ApiError::Unauthenticated(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::Persistence(_) | ApiError::Internal(_) => 500,
        }
    }

    pub fn admin_required() -> Self {
        ApiError::Forbidden("Admin access required".to_string())
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        if err.is_not_found() {
            ApiError::NotFound(err.to_string())
        } else {
            ApiError::Validation(err.to_string())
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, .. } => ApiError::NotFound(format!("{entity} not found")),
            DbError::UniqueViolation { field, .. } => {
                // SQLite reports "table.column"
                let column = field.rsplit_once('.').map_or(field.as_str(), |(_, column)| column);
                ApiError::Conflict(format!("{column} already exists"))
            }
            DbError::ForeignKeyViolation { .. } => {
                ApiError::Conflict("Referenced record does not exist".to_string())
            }
            DbError::Core(core) => core.into(),
            other => {
                error!(error = %other, "Persistence failure");
                ApiError::Persistence(other.to_string())
            }
        }
    }
}

/// Result type for service operations.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_mapping() {
        let err: ApiError = CoreError::ProductNotFound("p-1".into()).into();
        assert_eq!(err.status_code(), 404);

        let err: ApiError = CoreError::InvalidDateFormat {
            field: "start_date".into(),
        }
        .into();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_string(), "Invalid start_date format. Use YYYY-MM-DD");
    }

    #[test]
    fn test_db_mapping_hides_details() {
        let err: ApiError = DbError::QueryFailed("no such table: receipts".into()).into();
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.to_string(), PERSISTENCE_MESSAGE);

        let err: ApiError = DbError::duplicate("email", "a@example.com").into();
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.to_string(), "Conflict: email already exists");

        let err: ApiError = DbError::duplicate("users.email", "unknown").into();
        assert_eq!(err.to_string(), "Conflict: email already exists");

        let err: ApiError = DbError::Core(CoreError::ReceiptNotFound("r".into())).into();
        assert_eq!(err.status_code(), 404);

        let err: ApiError = DbError::not_found("Receipt", "r-1").into();
        assert_eq!(err.to_string(), "Receipt not found");
    }
}
