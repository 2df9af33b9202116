//! # billing-core: Receipt Pricing and Dashboard Engine
//!
//! This crate holds the only non-trivial logic of the billing backend: how a
//! receipt's totals are computed and how historical receipts are folded into
//! dashboard reports. Everything here is a pure function over in-memory data.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Billing Backend Architecture                       │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 billing-api (services, scheduler, export)       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ billing-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  pricing  │  │ dashboard │  │ validation│  │   │
//! │  │   │  Receipt  │  │ totals,   │  │ series,   │  │  request  │  │   │
//! │  │   │  Product  │  │ tax, gross│  │ trends    │  │  rules    │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                billing-db (SQLite repositories)                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain entities (Product, Receipt, ReceiptItem, User)
//! - [`money`] - Fixed-point money in minor units
//! - [`pricing`] - Receipt totals, tax and bundle pricing
//! - [`dashboard`] - Aggregation engine (series, summary, trends, search)
//! - [`validation`] - Request validation rules
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use billing_core::money::Money;
//! use billing_core::types::TaxRate;
//!
//! let vendor_subtotal = Money::from_cents(27_000); // 270.00
//! let tax = vendor_subtotal.calculate_tax(TaxRate::from_bps(1000));
//! assert_eq!(tax.cents(), 2_700);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod dashboard;
pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pricing::{price_receipt, PricingPolicy, ReceiptTotals};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Package value for receipts priced line by line.
pub const STANDARD_PACKAGE: &str = "Standard";

/// Bundle name used when configuration does not supply one.
pub const DEFAULT_BUNDLE_NAME: &str = "Full Package";

/// Currency symbol used when configuration does not supply one.
pub const DEFAULT_CURRENCY_SYMBOL: &str = "₿";

/// Default tax rate in basis points (0.10).
pub const DEFAULT_TAX_RATE_BPS: u32 = 1000;

/// Maximum quantity of a single receipt line.
///
/// ## Business Reason
/// Catches typing mistakes such as 1000 instead of 10.
pub const MAX_ITEM_QUANTITY: i64 = 9_999;

/// Maximum lines accepted on one receipt.
pub const MAX_RECEIPT_ITEMS: usize = 100;

/// Largest unit price, vendor price or bundle amount accepted, in cents
/// (one billion in major units).
///
/// With MAX_ITEM_QUANTITY and MAX_RECEIPT_ITEMS this keeps every receipt
/// total far inside `i64`.
pub const MAX_PRICE_CENTS: i64 = 100_000_000_000;
