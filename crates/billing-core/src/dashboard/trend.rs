//! Period-over-period comparison.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::summary::{ProductBreakdown, Summary};
use crate::money::Money;

/// Percentage change from `previous` to `current`; 0 when `previous` is 0.
pub fn trend_pct(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        0.0
    } else {
        (current - previous) / previous * 100.0
    }
}

/// Formats a percentage as a signed string with one decimal.
///
/// ```rust
/// use billing_core::dashboard::format_trend;
///
/// assert_eq!(format_trend(50.0), "+50.0%");
/// assert_eq!(format_trend(-12.345), "-12.3%");
/// assert_eq!(format_trend(-0.01), "+0.0%");
/// ```
pub fn format_trend(pct: f64) -> String {
    let rounded = (pct * 10.0).round() / 10.0;
    // avoid "-0.0%"
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{:+.1}%", rounded)
}

/// `calc_trend(150, 100) == "+50.0%"`, `calc_trend(5, 0) == "+0.0%"`.
pub fn calc_trend(current: f64, previous: f64) -> String {
    format_trend(trend_pct(current, previous))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MetricTrend {
    pub current: f64,
    pub previous: f64,
    pub pct: f64,
    /// e.g. `+12.5%`
    pub label: String,
}

impl MetricTrend {
    pub fn new(current: f64, previous: f64) -> Self {
        let pct = trend_pct(current, previous);
        MetricTrend {
            current,
            previous,
            pct,
            label: format_trend(pct),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TrendReport {
    pub revenue: MetricTrend,
    pub receipts: MetricTrend,
    pub quantity: MetricTrend,
    pub unique_products: MetricTrend,
    /// Mean of the four percentages, formatted like the others.
    pub growth_trend: String,
}

/// Compares two period summaries metric by metric.
pub fn compare_summaries(current: &Summary, previous: &Summary) -> TrendReport {
    let revenue = MetricTrend::new(
        current.total_revenue.to_major_f64(),
        previous.total_revenue.to_major_f64(),
    );
    let receipts = MetricTrend::new(current.total_receipts as f64, previous.total_receipts as f64);
    let quantity = MetricTrend::new(current.total_quantity as f64, previous.total_quantity as f64);
    let unique_products = MetricTrend::new(
        current.unique_product_count as f64,
        previous.unique_product_count as f64,
    );

    let growth = (revenue.pct + receipts.pct + quantity.pct + unique_products.pct) / 4.0;

    TrendReport {
        revenue,
        receipts,
        quantity,
        unique_products,
        growth_trend: format_trend(growth),
    }
}

/// One product's figures in both periods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductComparison {
    pub product_name: String,
    pub current_quantity: i64,
    pub previous_quantity: i64,
    pub current_revenue: Money,
    pub previous_revenue: Money,
    pub revenue_trend: String,
    pub quantity_trend: String,
}

/// Outer join of two breakdowns by product name, sorted by name.
pub fn compare_products(current: &[ProductBreakdown], previous: &[ProductBreakdown]) -> Vec<ProductComparison> {
    let mut joined: BTreeMap<&str, (Option<&ProductBreakdown>, Option<&ProductBreakdown>)> = BTreeMap::new();
    for row in current {
        joined.entry(row.product_name.as_str()).or_default().0 = Some(row);
    }
    for row in previous {
        joined.entry(row.product_name.as_str()).or_default().1 = Some(row);
    }

    joined
        .into_iter()
        .map(|(name, (cur, prev))| {
            let current_quantity = cur.map_or(0, |r| r.quantity);
            let previous_quantity = prev.map_or(0, |r| r.quantity);
            let current_revenue = cur.map_or(Money::zero(), |r| r.revenue);
            let previous_revenue = prev.map_or(Money::zero(), |r| r.revenue);
            ProductComparison {
                product_name: name.to_string(),
                current_quantity,
                previous_quantity,
                current_revenue,
                previous_revenue,
                revenue_trend: calc_trend(current_revenue.to_major_f64(), previous_revenue.to_major_f64()),
                quantity_trend: calc_trend(current_quantity as f64, previous_quantity as f64),
            }
        })
        .collect()
}
