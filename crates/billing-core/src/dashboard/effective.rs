//! Bundle substitution: the one place a receipt is turned into the lines
//! every report counts.
//!
//! ```text
//! Standard receipt            Bundle receipt (package_amt = 500.00)
//! ┌──────────────────────┐    ┌──────────────────────┐
//! │ A  x3   270.00       │    │ A  x2   180.00       │  (kept for audit,
//! │ B  x1     0.00 free  │    │ B  x1    40.00       │   never counted)
//! └──────────┬───────────┘    └──────────┬───────────┘
//!            ▼                           ▼
//!   A x3 270.00, B x1 0.00      "Full Package" x1 500.00
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::ReceiptRecord;

/// A line as the dashboard counts it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveLine {
    pub receipt_id: String,
    pub receipt_number: String,
    pub created_at: DateTime<Utc>,
    /// None for the synthetic bundle line.
    pub prod_id: Option<String>,
    pub product_name: String,
    pub quantity: i64,
    pub is_free: bool,
    pub std_price: Money,
    pub vend_price: Money,
    pub total_std_price: Money,
    pub total_vend_price: Money,
}

/// The lines of one receipt after bundle substitution.
///
/// A bundle receipt yields exactly one line named after the bundle, carrying
/// `package_amt` in all four price fields. Other receipts yield their
/// active items unchanged.
pub fn effective_lines(record: &ReceiptRecord, bundle_name: &str) -> Vec<EffectiveLine> {
    let receipt = &record.receipt;

    if receipt.is_bundle(bundle_name) {
        let amount = receipt.package_amt;
        return vec![EffectiveLine {
            receipt_id: receipt.receipt_id.clone(),
            receipt_number: receipt.receipt_number.clone(),
            created_at: receipt.created_at,
            prod_id: None,
            product_name: bundle_name.to_string(),
            quantity: 1,
            is_free: false,
            std_price: amount,
            vend_price: amount,
            total_std_price: amount,
            total_vend_price: amount,
        }];
    }

    record
        .items
        .iter()
        .filter(|item| item.is_active())
        .map(|item| EffectiveLine {
            receipt_id: receipt.receipt_id.clone(),
            receipt_number: receipt.receipt_number.clone(),
            created_at: receipt.created_at,
            prod_id: Some(item.prod_id.clone()),
            product_name: item.product_name.clone(),
            quantity: item.quantity,
            is_free: item.is_free,
            std_price: item.std_price,
            vend_price: item.vendor_price,
            total_std_price: item.total_std_price,
            total_vend_price: item.total_vend_price,
        })
        .collect()
}

/// Effective lines of every active record, in input order.
pub fn flatten(records: &[ReceiptRecord], bundle_name: &str) -> Vec<EffectiveLine> {
    records
        .iter()
        .filter(|r| r.receipt.is_active())
        .flat_map(|r| effective_lines(r, bundle_name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::test_support::{bundle_receipt, item, standard_receipt};

    #[test]
    fn test_bundle_becomes_single_line() {
        let record = bundle_receipt(
            "IN-01092025-AAAAAAAA",
            "2025-09-01T10:00:00Z",
            50_000,
            vec![item("a", "Product A", 2, false, 10_000, 9_000), item("b", "Product B", 1, false, 5_000, 4_000)],
        );

        let lines = effective_lines(&record, "Full Package");
        assert_eq!(lines.len(), 1);
        let line = &lines[0];
        assert_eq!(line.product_name, "Full Package");
        assert_eq!(line.quantity, 1);
        assert!(line.prod_id.is_none());
        assert_eq!(line.total_vend_price.cents(), 50_000);
        assert_eq!(line.std_price.cents(), 50_000);
    }

    #[test]
    fn test_standard_keeps_items() {
        let record = standard_receipt(
            "IN-01092025-BBBBBBBB",
            "2025-09-01T10:00:00Z",
            vec![item("a", "Product A", 3, false, 10_000, 9_000), item("b", "Product B", 1, true, 0, 0)],
        );
        let lines = effective_lines(&record, "Full Package");
        assert_eq!(lines.len(), 2);
        assert!(lines[1].is_free);
        assert_eq!(lines[0].total_vend_price.cents(), 27_000);
    }

    #[test]
    fn test_flatten_skips_deleted_receipts() {
        let mut gone = standard_receipt(
            "IN-01092025-CCCCCCCC",
            "2025-09-01T10:00:00Z",
            vec![item("a", "Product A", 1, false, 10_000, 9_000)],
        );
        gone.receipt.deleted_at = Some(Utc::now());
        let kept = standard_receipt(
            "IN-01092025-DDDDDDDD",
            "2025-09-01T11:00:00Z",
            vec![item("a", "Product A", 1, false, 10_000, 9_000)],
        );

        let lines = flatten(&[gone, kept], "Full Package");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].receipt_number, "IN-01092025-DDDDDDDD");
    }
}
