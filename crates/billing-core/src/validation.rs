//! # Validation Module
//!
//! Input validation for users, products and receipt requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Service call (billing-api)                                   │
//! │  └── THIS MODULE: shape and business rules, before any I/O             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Pricing (billing-core::pricing)                              │
//! │  └── Catalog resolution, quantity > 0                                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── UNIQUE (email, receipt_number)                                    │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use billing_core::validation::{validate_email, validate_quantity};
//!
//! validate_email("staff@example.com").unwrap();
//! assert!(validate_quantity(0).is_err());
//! ```

use std::collections::HashSet;

use crate::error::ValidationError;
use crate::money::Money;
use crate::pricing::NewReceipt;
use crate::{MAX_ITEM_QUANTITY, MAX_PRICE_CENTS, MAX_RECEIPT_ITEMS, STANDARD_PACKAGE};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

fn required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn max_len(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.trim().chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

// =============================================================================
// User Validators
// =============================================================================

/// Validates a user display name.
///
/// ## Rules
/// - 2 to 100 characters after trimming
/// - Letters, digits, spaces, `_` and `-` only
pub fn validate_user_name(name: &str) -> ValidationResult<()> {
    required("user_name", name)?;
    let name = name.trim();

    if name.chars().count() < 2 {
        return Err(ValidationError::TooShort {
            field: "user_name".to_string(),
            min: 2,
        });
    }
    max_len("user_name", name, 100)?;

    if !name
        .chars()
        .all(|c| c.is_alphanumeric() || c == ' ' || c == '_' || c == '-')
    {
        return Err(ValidationError::InvalidFormat {
            field: "user_name".to_string(),
            reason: "must contain only letters, numbers, spaces, underscores and hyphens"
                .to_string(),
        });
    }

    Ok(())
}

/// Validates a plaintext password before hashing (6 to 50 characters).
pub fn validate_password(password: &str) -> ValidationResult<()> {
    let len = password.chars().count();
    if len < 6 {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: 6,
        });
    }
    if len > 50 {
        return Err(ValidationError::TooLong {
            field: "password".to_string(),
            max: 50,
        });
    }
    Ok(())
}

/// Validates an email address (one `@`, a dotted domain, no whitespace).
pub fn validate_email(email: &str) -> ValidationResult<()> {
    required("email", email)?;
    let email = email.trim();
    max_len("email", email, 120)?;

    let invalid = || ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: "must be a valid email address".to_string(),
    };

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || email.chars().any(char::is_whitespace)
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
    {
        return Err(invalid());
    }

    Ok(())
}

// =============================================================================
// Product Validators
// =============================================================================

/// Validates a product name (1 to 200 characters).
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    required("name", name)?;
    max_len("name", name, 200)
}

/// Validates a catalog unit price: positive and at most MAX_PRICE_CENTS.
pub fn validate_unit_price(price: Money) -> ValidationResult<()> {
    if !price.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "unit_price".to_string(),
        });
    }
    max_price("unit_price", price)
}

fn max_price(field: &str, price: Money) -> ValidationResult<()> {
    if price.cents() > MAX_PRICE_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }
    Ok(())
}

// =============================================================================
// Receipt Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a receipt creation request.
///
/// ## Rules
/// ```text
/// recipient_name      required, ≤ 50 chars
/// recipient_number    optional, ≤ 20 chars
/// payment_mode        required, ≤ 20 chars
/// transaction_number  optional, ≤ 50 chars
/// items               1..=MAX_RECEIPT_ITEMS, no product twice
/// each item           quantity 1..=MAX_ITEM_QUANTITY, vendor price 0..=MAX_PRICE_CENTS
/// package             "Standard" or the bundle name
/// bundle mode         package_amt present, 1..=MAX_PRICE_CENTS
/// ```
///
/// Rejecting duplicate products here is the single policy for the whole
/// backend; pricing itself tolerates them.
pub fn validate_new_receipt(request: &NewReceipt, bundle_name: &str) -> ValidationResult<()> {
    required("recipient_name", &request.recipient_name)?;
    max_len("recipient_name", &request.recipient_name, 50)?;

    if let Some(number) = &request.recipient_number {
        max_len("recipient_number", number, 20)?;
    }

    required("payment_mode", &request.payment_mode)?;
    max_len("payment_mode", &request.payment_mode, 20)?;

    if let Some(txn) = &request.transaction_number {
        max_len("transaction_number", txn, 50)?;
    }

    if request.items.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }
    if request.items.len() > MAX_RECEIPT_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_RECEIPT_ITEMS as i64,
        });
    }

    let mut seen = HashSet::new();
    for item in &request.items {
        required("prod_id", &item.prod_id)?;
        if !seen.insert(item.prod_id.as_str()) {
            return Err(ValidationError::Duplicate {
                field: "prod_id".to_string(),
                value: item.prod_id.clone(),
            });
        }
        validate_quantity(item.quantity)?;
        if item.vendor_price.is_negative() || item.vendor_price.cents() > MAX_PRICE_CENTS {
            return Err(ValidationError::OutOfRange {
                field: "vendor_price".to_string(),
                min: 0,
                max: MAX_PRICE_CENTS,
            });
        }
    }

    let package = request.package.trim();
    if package != STANDARD_PACKAGE && package != bundle_name {
        return Err(ValidationError::InvalidFormat {
            field: "package".to_string(),
            reason: format!("must be '{}' or '{}'", STANDARD_PACKAGE, bundle_name),
        });
    }
    if package == bundle_name {
        match request.package_amt {
            None => {
                return Err(ValidationError::Required {
                    field: "package_amt".to_string(),
                })
            }
            Some(amount) if !amount.is_positive() => {
                return Err(ValidationError::MustBePositive {
                    field: "package_amt".to_string(),
                })
            }
            Some(amount) => max_price("package_amt", amount)?,
        }
    }

    Ok(())
}

// =============================================================================
// Misc Validators
// =============================================================================

/// Validates a search query.
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();
    max_len("query", query, 100)?;
    Ok(query.to_string())
}

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use billing_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    required("id", id)?;

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
