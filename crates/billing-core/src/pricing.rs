//! # Pricing Module
//!
//! Computes a receipt's monetary totals from its requested lines.
//!
//! ## Pricing Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        price_receipt()                                  │
//! │                                                                         │
//! │  for each LineRequest                                                  │
//! │     │                                                                   │
//! │     ├── quantity <= 0 ? ──────────────► InvalidQuantity                │
//! │     ├── catalog.find_active(prod_id) ─► ProductNotFound                │
//! │     │                                                                   │
//! │     ├── is_free ─► all four prices = 0                                 │
//! │     └── else    ─► std  = catalog price  × qty                         │
//! │                    vend = vendor price   × qty                         │
//! │                                                                         │
//! │  Σ std, Σ vend                                                          │
//! │     │                                                                   │
//! │     ├── Standard: tax   = round(Σ vend × rate)                         │
//! │     │             gross = Σ vend + tax                                 │
//! │     │                                                                   │
//! │     └── Bundle:   tax   = round(package_amt × rate)  (reporting only)  │
//! │                   gross = package_amt                (tax-inclusive)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any total that would overflow `i64` cents is reported as
//! `ValidationError::OutOfRange` for that field.
//!
//! The function is pure: the caller resolves a catalog snapshot (inside its
//! write transaction) and persists the result.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Product, TaxRate};

// =============================================================================
// Requests
// =============================================================================

/// One requested receipt line.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineRequest {
    pub prod_id: String,
    pub quantity: i64,
    #[serde(default)]
    pub is_free: bool,
    /// Vendor unit price supplied by the caller. Ignored for free lines.
    pub vendor_price: Money,
}

/// A receipt creation request.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewReceipt {
    pub recipient_name: String,
    pub recipient_number: Option<String>,
    /// "Standard" or the configured bundle name.
    pub package: String,
    pub package_amt: Option<Money>,
    pub payment_mode: String,
    pub transaction_number: Option<String>,
    pub items: Vec<LineRequest>,
}

// =============================================================================
// Policy & Catalog
// =============================================================================

/// Process-wide pricing settings, supplied by configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingPolicy {
    pub tax_rate: TaxRate,
    pub bundle_name: String,
}

impl PricingPolicy {
    pub fn new(tax_rate: TaxRate, bundle_name: impl Into<String>) -> Self {
        PricingPolicy {
            tax_rate,
            bundle_name: bundle_name.into(),
        }
    }

    #[inline]
    pub fn is_bundle(&self, package: &str) -> bool {
        package.trim() == self.bundle_name
    }
}

impl Default for PricingPolicy {
    fn default() -> Self {
        PricingPolicy::new(TaxRate::default(), crate::DEFAULT_BUNDLE_NAME)
    }
}

/// Resolves product references to active catalog entries.
pub trait Catalog {
    fn find_active(&self, prod_id: &str) -> Option<&Product>;
}

impl Catalog for HashMap<String, Product> {
    fn find_active(&self, prod_id: &str) -> Option<&Product> {
        self.get(prod_id).filter(|p| p.is_active())
    }
}

impl Catalog for [Product] {
    fn find_active(&self, prod_id: &str) -> Option<&Product> {
        self.iter().find(|p| p.prod_id == prod_id && p.is_active())
    }
}

impl Catalog for Vec<Product> {
    fn find_active(&self, prod_id: &str) -> Option<&Product> {
        self.as_slice().find_active(prod_id)
    }
}

// =============================================================================
// Results
// =============================================================================

/// A priced line, ready to be stored as a ReceiptItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PricedLine {
    pub prod_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub is_free: bool,
    pub std_price: Money,
    pub vendor_price: Money,
    pub total_std_price: Money,
    pub total_vend_price: Money,
}

/// Receipt-level totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReceiptTotals {
    pub lines: Vec<PricedLine>,
    pub total_std_amount: Money,
    pub total_vend_amount: Money,
    pub tax_amount: Money,
    pub gross_amount: Money,
    pub package: String,
    /// Zero for Standard receipts.
    pub package_amt: Money,
    pub is_bundle: bool,
}

// =============================================================================
// Pricing
// =============================================================================

/// Prices one line against the catalog.
fn price_line(line: &LineRequest, catalog: &(impl Catalog + ?Sized)) -> CoreResult<PricedLine> {
    if line.quantity <= 0 {
        return Err(CoreError::InvalidQuantity {
            product_id: line.prod_id.clone(),
            quantity: line.quantity,
        });
    }

    let product = catalog
        .find_active(&line.prod_id)
        .ok_or_else(|| CoreError::ProductNotFound(line.prod_id.clone()))?;

    let (std_price, vendor_price) = if line.is_free {
        (Money::zero(), Money::zero())
    } else {
        (product.unit_price, line.vendor_price)
    };

    Ok(PricedLine {
        prod_id: product.prod_id.clone(),
        product_name: product.name.clone(),
        quantity: line.quantity,
        is_free: line.is_free,
        std_price,
        vendor_price,
        total_std_price: std_price
            .checked_multiply_quantity(line.quantity)
            .ok_or_else(|| overflow("total_std_price"))?,
        total_vend_price: vendor_price
            .checked_multiply_quantity(line.quantity)
            .ok_or_else(|| overflow("total_vend_price"))?,
    })
}

fn overflow(field: &str) -> CoreError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: i64::MAX,
    }
    .into()
}

fn checked_sum(mut amounts: impl Iterator<Item = Money>, field: &str) -> CoreResult<Money> {
    amounts.try_fold(Money::zero(), |acc, m| acc.checked_add(m).ok_or_else(|| overflow(field)))
}

/// Computes per-line and receipt-level totals.
///
/// ## Arguments
/// * `items` - Requested lines; duplicates of one product are priced as
///   separate lines
/// * `package` - "Standard" or the bundle name
/// * `package_amount` - Bundle price (required in bundle mode)
/// * `policy` - Tax rate and bundle name
/// * `catalog` - Active products, read fresh for this receipt
///
/// ## Example
/// ```rust
/// use billing_core::pricing::{price_receipt, LineRequest, PricingPolicy};
/// use billing_core::{Money, Product};
///
/// let now = chrono::Utc::now();
/// let catalog = vec![Product {
///     prod_id: "a".into(),
///     name: "Consultation".into(),
///     unit_price: Money::from_cents(10_000),
///     created_by: None,
///     created_at: now,
///     updated_at: now,
///     deleted_at: None,
/// }];
/// let lines = [LineRequest {
///     prod_id: "a".into(),
///     quantity: 3,
///     is_free: false,
///     vendor_price: Money::from_cents(9_000),
/// }];
///
/// let totals = price_receipt(&lines, "Standard", None, &PricingPolicy::default(), &catalog)
///     .unwrap();
/// assert_eq!(totals.gross_amount.cents(), 29_700);
/// ```
pub fn price_receipt(
    items: &[LineRequest],
    package: &str,
    package_amount: Option<Money>,
    policy: &PricingPolicy,
    catalog: &(impl Catalog + ?Sized),
) -> CoreResult<ReceiptTotals> {
    let lines = items
        .iter()
        .map(|line| price_line(line, catalog))
        .collect::<CoreResult<Vec<_>>>()?;

    let total_std_amount = checked_sum(lines.iter().map(|l| l.total_std_price), "total_std_amount")?;
    let total_vend_amount = checked_sum(lines.iter().map(|l| l.total_vend_price), "total_vend_amount")?;

    let is_bundle = policy.is_bundle(package);
    let (package_amt, tax_amount, gross_amount) = if is_bundle {
        let amount = package_amount.ok_or_else(|| ValidationError::Required {
            field: "package_amt".to_string(),
        })?;
        (amount, amount.calculate_tax(policy.tax_rate), amount)
    } else {
        let tax = total_vend_amount.calculate_tax(policy.tax_rate);
        let gross = total_vend_amount
            .checked_add(tax)
            .ok_or_else(|| overflow("gross_amount"))?;
        (Money::zero(), tax, gross)
    };

    Ok(ReceiptTotals {
        lines,
        total_std_amount,
        total_vend_amount,
        tax_amount,
        gross_amount,
        package: package.trim().to_string(),
        package_amt,
        is_bundle,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
