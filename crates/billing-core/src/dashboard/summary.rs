//! Period summary: headline totals, per-product breakdown and the price
//! variance table.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::effective::{effective_lines, EffectiveLine};
use super::window::DateWindow;
use crate::money::Money;
use crate::types::ReceiptRecord;

/// Quantity and revenue of one product over the period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductBreakdown {
    pub product_name: String,
    pub quantity: i64,
    pub revenue: Money,
}

/// Catalog price versus what was actually charged, per product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PriceVariance {
    pub product_name: String,
    /// Mean standard unit price.
    pub std_price: Money,
    /// Mean vendor unit price.
    pub vend_price: Money,
    pub difference: Money,
    /// `difference / std × 100`, two decimals; 0 when std is 0.
    pub variance_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Summary {
    pub total_receipts: i64,
    pub total_revenue: Money,
    pub total_standard_revenue: Money,
    pub total_quantity: i64,
    pub unique_product_count: i64,
    pub product_breakdown: Vec<ProductBreakdown>,
    pub price_variance: Vec<PriceVariance>,
}

impl Summary {
    pub fn is_empty(&self) -> bool {
        self.total_receipts == 0
    }
}

/// Builds the summary of the active receipts inside `window`
/// (all of them when `window` is None).
pub fn summarize(records: &[ReceiptRecord], window: Option<&DateWindow>, bundle_name: &str) -> Summary {
    let in_scope: Vec<&ReceiptRecord> = records
        .iter()
        .filter(|r| r.receipt.is_active())
        .filter(|r| window.map_or(true, |w| w.contains(r.receipt.created_at)))
        .collect();

    let lines: Vec<EffectiveLine> = in_scope
        .iter()
        .flat_map(|r| effective_lines(r, bundle_name))
        .collect();

    let unique: HashSet<&str> = lines.iter().map(|l| l.product_name.as_str()).collect();

    Summary {
        total_receipts: in_scope.len() as i64,
        total_revenue: lines.iter().map(|l| l.total_vend_price).sum(),
        total_standard_revenue: lines.iter().map(|l| l.total_std_price).sum(),
        total_quantity: lines.iter().map(|l| l.quantity).sum(),
        unique_product_count: unique.len() as i64,
        product_breakdown: product_breakdown(&lines),
        price_variance: price_variance(&lines),
    }
}

/// Groups lines by product name; revenue descending, then name.
pub fn product_breakdown(lines: &[EffectiveLine]) -> Vec<ProductBreakdown> {
    let mut grouped: BTreeMap<&str, (i64, Money)> = BTreeMap::new();
    for line in lines {
        let entry = grouped.entry(line.product_name.as_str()).or_default();
        entry.0 += line.quantity;
        entry.1 += line.total_vend_price;
    }

    let mut rows: Vec<ProductBreakdown> = grouped
        .into_iter()
        .map(|(name, (quantity, revenue))| ProductBreakdown {
            product_name: name.to_string(),
            quantity,
            revenue,
        })
        .collect();
    rows.sort_by(|a, b| {
        b.revenue
            .cmp(&a.revenue)
            .then_with(|| a.product_name.cmp(&b.product_name))
    });
    rows
}

/// Mean std vs mean vend unit price per product, sorted by name.
///
/// Free lines carry zero prices and are left out so they do not drag the
/// means down.
pub fn price_variance(lines: &[EffectiveLine]) -> Vec<PriceVariance> {
    #[derive(Default)]
    struct Acc {
        std: Money,
        vend: Money,
        count: usize,
    }

    let mut grouped: BTreeMap<&str, Acc> = BTreeMap::new();
    for line in lines.iter().filter(|l| !l.is_free) {
        let acc = grouped.entry(line.product_name.as_str()).or_default();
        acc.std += line.std_price;
        acc.vend += line.vend_price;
        acc.count += 1;
    }

    grouped
        .into_iter()
        .map(|(name, acc)| {
            let std_price = Money::mean(acc.std, acc.count);
            let vend_price = Money::mean(acc.vend, acc.count);
            let difference = std_price - vend_price;
            let variance_pct = if std_price.is_zero() {
                0.0
            } else {
                round2(difference.cents() as f64 / std_price.cents() as f64 * 100.0)
            };
            PriceVariance {
                product_name: name.to_string(),
                std_price,
                vend_price,
                difference,
                variance_pct,
            }
        })
        .collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
