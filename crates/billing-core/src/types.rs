//! # Domain Types
//!
//! Core domain types used throughout the billing backend.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      User       │   │     Product     │   │     Receipt     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  user_id        │◄──│  created_by     │   │  receipt_id     │       │
//! │  │  email (unique) │   │  prod_id        │   │  receipt_number │       │
//! │  │  is_admin       │   │  unit_price     │   │  package        │       │
//! │  └─────────────────┘   └────────┬────────┘   │  gross_amount   │       │
//! │                                 │            └────────┬────────┘       │
//! │                                 │                     │ 1..N           │
//! │                                 │            ┌────────▼────────┐       │
//! │                                 └───────────►│   ReceiptItem   │       │
//! │                                              │  is_free        │       │
//! │                                              │  std / vend     │       │
//! │                                              │  (snapshots)    │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Soft Delete
//! Every entity carries `deleted_at`. Rows are never removed; an entity is
//! live exactly when [`is_active`](Product::is_active) returns true.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000, so the configured fraction `0.10`
/// is 1000 bps and tax math stays in integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Parses a decimal fraction such as `"0.10"` or `"0.0825"`.
    ///
    /// ## Example
    /// ```rust
    /// use billing_core::types::TaxRate;
    ///
    /// assert_eq!(TaxRate::parse_fraction("0.10").unwrap().bps(), 1000);
    /// assert_eq!(TaxRate::parse_fraction("0.0825").unwrap().bps(), 825);
    /// assert!(TaxRate::parse_fraction("1.5").is_err());
    /// ```
    pub fn parse_fraction(s: &str) -> Result<Self, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "tax_rate".to_string(),
            reason: reason.to_string(),
        };

        let s = s.trim();
        let (whole, frac) = s.split_once('.').unwrap_or((s, ""));

        if whole.is_empty() && frac.is_empty() {
            return Err(invalid("must be a decimal fraction like 0.10"));
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid("must be a decimal fraction like 0.10"));
        }
        if frac.len() > 4 {
            return Err(invalid("at most 4 decimal places"));
        }

        let whole: u32 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid("value is too large"))?
        };
        let padded = format!("{:0<4}", frac);
        let frac: u32 = padded
            .parse()
            .map_err(|_| invalid("must be a decimal fraction like 0.10"))?;

        let bps = whole
            .checked_mul(10_000)
            .and_then(|b| b.checked_add(frac))
            .ok_or_else(|| invalid("value is too large"))?;

        if bps > 10_000 {
            return Err(ValidationError::OutOfRange {
                field: "tax_rate".to_string(),
                min: 0,
                max: 1,
            });
        }

        Ok(TaxRate(bps))
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate(crate::DEFAULT_TAX_RATE_BPS)
    }
}

// =============================================================================
// User
// =============================================================================

/// A staff or admin account.
///
/// The password is only ever held as an argon2 PHC string and is never
/// serialized.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub user_id: String,
    pub user_name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password_hash: String,
    pub is_admin: bool,
    /// Admin who created this account (None for the bootstrap admin).
    pub created_by: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

// =============================================================================
// Product
// =============================================================================

/// A catalog entry with its current standard unit price.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub prod_id: String,
    pub name: String,
    /// Current standard price. Receipts copy it at creation time.
    pub unit_price: Money,
    pub created_by: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Product {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

// =============================================================================
// Receipt
// =============================================================================

/// A receipt header with its frozen monetary rollups.
///
/// ## Gross Invariant
/// ```text
/// package == "Standard"   → gross_amount = total_vend_amount + tax_amount
/// package == bundle name  → gross_amount = package_amt   (tax-inclusive)
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Receipt {
    pub receipt_id: String,
    /// `IN-DDMMYYYY-XXXXXXXX`, unique across all receipts ever created.
    pub receipt_number: String,
    pub recipient_name: String,
    pub recipient_number: Option<String>,
    /// "Standard" or the configured bundle name.
    pub package: String,
    /// Bundle price; zero for Standard receipts.
    pub package_amt: Money,
    pub total_std_amount: Money,
    pub total_vend_amount: Money,
    pub tax_amount: Money,
    pub gross_amount: Money,
    pub payment_mode: String,
    pub transaction_number: Option<String>,
    pub created_by: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Receipt {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// Whether this receipt was charged as the given bundle.
    #[inline]
    pub fn is_bundle(&self, bundle_name: &str) -> bool {
        self.package == bundle_name
    }
}

// =============================================================================
// Receipt Item
// =============================================================================

/// A line item on a receipt.
/// Uses snapshot pattern to freeze prices at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ReceiptItem {
    pub item_id: String,
    pub receipt_id: String,
    pub prod_id: String,
    /// Product display name, joined from the catalog on read.
    pub product_name: String,
    pub is_free: bool,
    pub quantity: i64,
    /// Catalog unit price at time of sale (zero when free).
    pub std_price: Money,
    /// Vendor unit price at time of sale (zero when free).
    pub vendor_price: Money,
    pub total_std_price: Money,
    pub total_vend_price: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ReceiptItem {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

// =============================================================================
// Aggregation Input
// =============================================================================

/// Who created a receipt, as needed by search.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreatorRef {
    pub user_id: String,
    pub email: String,
    pub user_name: String,
}

/// A receipt with its items and creator, the unit the dashboard engine
/// consumes.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReceiptRecord {
    pub receipt: Receipt,
    pub items: Vec<ReceiptItem>,
    pub creator: Option<CreatorRef>,
}

// =============================================================================
// Identity
// =============================================================================

/// The verified caller, decoded from an access token by the API layer.
///
/// The core trusts this as already authenticated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Identity {
    pub user_id: String,
    pub email: String,
    pub is_admin: bool,
}

// =============================================================================
// Pagination
// =============================================================================

/// Requested page (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    /// Largest page size a caller may ask for.
    pub const MAX_PER_PAGE: u32 = 100;

    pub fn new(page: u32, per_page: u32) -> Self {
        PageRequest { page, per_page }
    }

    /// Rejects page 0 and page sizes outside 1..=100.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.page < 1 {
            return Err(ValidationError::MustBePositive {
                field: "page".to_string(),
            });
        }
        if self.per_page < 1 || self.per_page > Self::MAX_PER_PAGE {
            return Err(ValidationError::OutOfRange {
                field: "per_page".to_string(),
                min: 1,
                max: Self::MAX_PER_PAGE as i64,
            });
        }
        Ok(())
    }

    /// Row offset for SQL `OFFSET`.
    #[inline]
    pub fn offset(&self) -> i64 {
        (self.page.saturating_sub(1) as i64) * self.per_page as i64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest {
            page: 1,
            per_page: 10,
        }
    }
}

/// One page of results plus navigation metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
    pub pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: i64) -> Self {
        let per_page = request.per_page.max(1) as i64;
        let pages = (total + per_page - 1) / per_page;
        Page {
            items,
            page: request.page,
            per_page: request.per_page,
            total,
            pages,
            has_next: (request.page as i64) < pages,
            has_prev: request.page > 1,
        }
    }

    /// Slices an in-memory, already ordered list.
    pub fn from_vec(all: Vec<T>, request: PageRequest) -> Self {
        let total = all.len() as i64;
        let items = all
            .into_iter()
            .skip(request.offset().max(0) as usize)
            .take(request.per_page as usize)
            .collect();
        Page::new(items, request, total)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
            pages: self.pages,
            has_next: self.has_next,
            has_prev: self.has_prev,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_rate_parse_fraction() {
        assert_eq!(TaxRate::parse_fraction("0.10").unwrap().bps(), 1000);
        assert_eq!(TaxRate::parse_fraction("0.1").unwrap().bps(), 1000);
        assert_eq!(TaxRate::parse_fraction(".18").unwrap().bps(), 1800);
        assert_eq!(TaxRate::parse_fraction("0").unwrap().bps(), 0);
        assert_eq!(TaxRate::parse_fraction("1").unwrap().bps(), 10_000);

        assert!(TaxRate::parse_fraction("").is_err());
        assert!(TaxRate::parse_fraction("ten").is_err());
        assert!(TaxRate::parse_fraction("0.12345").is_err());
        assert!(TaxRate::parse_fraction("1.01").is_err());
    }

    #[test]
    fn test_tax_rate_default() {
        assert_eq!(TaxRate::default().bps(), 1000);
        assert!((TaxRate::default().percentage() - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_page_metadata() {
        let page = Page::new(vec![1, 2, 3], PageRequest::new(2, 3), 8);
        assert_eq!(page.pages, 3);
        assert!(page.has_next);
        assert!(page.has_prev);

        let last = Page::new(vec![7, 8], PageRequest::new(3, 3), 8);
        assert!(!last.has_next);
    }

    #[test]
    fn test_page_from_vec() {
        let page = Page::from_vec((1..=25).collect::<Vec<_>>(), PageRequest::new(3, 10));
        assert_eq!(page.items, vec![21, 22, 23, 24, 25]);
        assert_eq!(page.total, 25);
        assert_eq!(page.pages, 3);
    }

    #[test]
    fn test_page_request_validate() {
        assert!(PageRequest::new(1, 10).validate().is_ok());
        assert!(PageRequest::new(0, 10).validate().is_err());
        assert!(PageRequest::new(1, 0).validate().is_err());
        assert!(PageRequest::new(1, 101).validate().is_err());
    }

    #[test]
    fn test_user_hash_not_serialized() {
        let now = Utc::now();
        let user = User {
            user_id: "u-1".into(),
            user_name: "Admin".into(),
            email: "admin@example.com".into(),
            password_hash: "$argon2id$secret".into(),
            is_admin: true,
            created_by: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2"));
        assert!(user.is_active());
    }
}
