//! # Error Types
//!
//! Domain-specific error types for billing-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  billing-core errors (this file)                                       │
//! │  ├── CoreError        - Pricing / lookup / date failures               │
//! │  └── ValidationError  - Malformed caller input                         │
//! │                                                                         │
//! │  billing-db errors                                                     │
//! │  └── DbError          - Store failures (wraps CoreError in a write)    │
//! │                                                                         │
//! │  billing-api errors                                                    │
//! │  └── ApiError         - What the caller sees (status + message)        │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → caller       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! An empty dashboard is NOT an error: see
//! [`DashboardOutcome::NoData`](crate::dashboard::DashboardOutcome).

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be resolved in the active catalog.
    ///
    /// ## When This Occurs
    /// - Product ID doesn't exist
    /// - Product was soft-deleted before the receipt was priced
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Receipt cannot be found (absent or already soft-deleted).
    #[error("Receipt not found: {0}")]
    ReceiptNotFound(String),

    /// A receipt line carries a zero or negative quantity.
    #[error("Invalid quantity {quantity} for product {product_id}: must be a positive integer")]
    InvalidQuantity { product_id: String, quantity: i64 },

    /// A date bound could not be parsed.
    ///
    /// ## User Workflow
    /// ```text
    /// GET dashboard?period=custom&start_date=2025/09/01
    ///      │
    ///      ▼
    /// parse_date_bound("start_date", "2025/09/01")
    ///      │
    ///      ▼
    /// InvalidDateFormat { field: "start_date" }
    ///      │
    ///      ▼
    /// "Invalid start_date format. Use YYYY-MM-DD"
    /// ```
    #[error("Invalid {field} format. Use YYYY-MM-DD")]
    InvalidDateFormat { field: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// True when the error describes a missing entity rather than bad input.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CoreError::ProductNotFound(_) | CoreError::ReceiptNotFound(_)
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value or collection size is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, malformed amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value in a request (e.g., the same product twice).
    #[error("{field} '{value}' appears more than once")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_date_message() {
        let err = CoreError::InvalidDateFormat {
            field: "start_date".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid start_date format. Use YYYY-MM-DD");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "recipient_name".to_string(),
        };
        assert_eq!(err.to_string(), "recipient_name is required");

        let err = ValidationError::Duplicate {
            field: "prod_id".to_string(),
            value: "p-1".to_string(),
        };
        assert_eq!(err.to_string(), "prod_id 'p-1' appears more than once");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::Required {
            field: "items".to_string(),
        }
        .into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert!(!core_err.is_not_found());
        assert!(CoreError::ReceiptNotFound("r".into()).is_not_found());
    }
}
