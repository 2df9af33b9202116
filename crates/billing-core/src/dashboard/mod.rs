//! # Dashboard Aggregation Engine
//!
//! Folds a batch of receipts into the dashboard report and its export
//! tables. Every stage works on typed records; nothing here touches the
//! store.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         build_dashboard()                               │
//! │                                                                         │
//! │  ReceiptRecord[] (current window)      ReceiptRecord[] (previous)       │
//! │        │                                      │                         │
//! │        ▼                                      ▼                         │
//! │  effective_lines()  ── bundle substitution ── effective_lines()        │
//! │        │                                      │                         │
//! │        ├──► aggregate()     → SeriesPoint[]   │                         │
//! │        ├──► summarize()     → Summary ◄───────┴── summarize()          │
//! │        │                         │                                      │
//! │        │                         ▼                                      │
//! │        │              compare_summaries() → TrendReport                 │
//! │        │              compare_products()  → ProductComparison[]         │
//! │        │                                                                │
//! │        └──► quantity/revenue pivots, daily product matrix (export)     │
//! │                                                                         │
//! │  no receipts in the current window → DashboardOutcome::NoData           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod daily;
pub mod effective;
pub mod pivot;
pub mod receipt_stats;
pub mod search;
pub mod series;
pub mod summary;
pub mod trend;
pub mod window;

#[cfg(test)]
pub(crate) mod test_support;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use daily::{group_by_day, DayGroup, DayReceipt, DaySummary};
pub use effective::{effective_lines, flatten, EffectiveLine};
pub use pivot::{quantity_pivot, revenue_pivot, DailyProductMatrix, ReceiptPivot};
pub use receipt_stats::{receipt_product_breakdown, receipt_statistics, ReceiptProductLine, ReceiptStatistics};
pub use search::search_receipts;
pub use series::{aggregate, bucket_key, Granularity, SeriesPoint};
pub use summary::{summarize, PriceVariance, ProductBreakdown, Summary};
pub use trend::{calc_trend, compare_products, compare_summaries, format_trend, ProductComparison, TrendReport};
pub use window::{parse_date_bound, parse_date_range, DashboardPeriod, DateWindow};

use crate::money::Money;
use crate::types::ReceiptRecord;

/// Shown when the selected window holds no receipts.
pub const NO_DATA_MESSAGE: &str = "No receipts found for the selected time period";

// =============================================================================
// Query
// =============================================================================

/// A resolved dashboard request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardQuery {
    pub period: DashboardPeriod,
    /// None for `all`.
    pub window: Option<DateWindow>,
    pub granularity: Granularity,
    pub bundle_name: String,
    pub currency: String,
}

impl DashboardQuery {
    /// Resolves `period` against `now`, picking a series granularity that
    /// fits the window.
    pub fn new(
        period: DashboardPeriod,
        now: DateTime<Utc>,
        bundle_name: impl Into<String>,
        currency: impl Into<String>,
    ) -> Self {
        let window = period.window(now);
        DashboardQuery {
            period,
            granularity: Granularity::for_window(window.as_ref()),
            window,
            bundle_name: bundle_name.into(),
            currency: currency.into(),
        }
    }

    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    /// The comparison window; None when the current one is unbounded.
    pub fn previous_window(&self) -> Option<DateWindow> {
        self.window.as_ref().map(DateWindow::previous)
    }

    pub fn period_label(&self) -> String {
        match (&self.period, &self.window) {
            (DashboardPeriod::Today, Some(w)) => format!("Today ({})", w.label()),
            (DashboardPeriod::Last7Days, _) => "Last 7 days".to_string(),
            (DashboardPeriod::Last30Days, _) => "Last 30 days".to_string(),
            (_, Some(w)) => w.label(),
            (_, None) => "All time".to_string(),
        }
    }
}

// =============================================================================
// Report
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardReport {
    pub period_label: String,
    pub window: Option<DateWindow>,
    pub previous_window: Option<DateWindow>,
    pub granularity: Granularity,
    pub currency: String,
    pub bundle_name: String,
    pub summary: Summary,
    pub trends: TrendReport,
    pub series: Vec<SeriesPoint>,
    pub product_comparison: Vec<ProductComparison>,
    pub daily_products: DailyProductMatrix,
    pub quantity_pivot: ReceiptPivot<i64>,
    pub revenue_pivot: ReceiptPivot<Money>,
    /// Effective lines behind the report.
    pub total_records: i64,
}

/// Result of a dashboard request. An empty window is an outcome, not an
/// error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DashboardOutcome {
    NoData { message: String },
    Report(Box<DashboardReport>),
}

impl DashboardOutcome {
    pub fn report(&self) -> Option<&DashboardReport> {
        match self {
            DashboardOutcome::Report(report) => Some(report),
            DashboardOutcome::NoData { .. } => None,
        }
    }
}

/// Builds the dashboard from the receipts of the current and previous
/// windows.
///
/// Records outside their window are ignored, so callers may pass a wider
/// batch than needed.
pub fn build_dashboard(
    current: &[ReceiptRecord],
    previous: &[ReceiptRecord],
    query: &DashboardQuery,
) -> DashboardOutcome {
    let bundle = query.bundle_name.as_str();
    let previous_window = query.previous_window();

    let in_window = |records: &[ReceiptRecord], window: Option<&DateWindow>| -> Vec<ReceiptRecord> {
        records
            .iter()
            .filter(|r| r.receipt.is_active())
            .filter(|r| window.map_or(true, |w| w.contains(r.receipt.created_at)))
            .cloned()
            .collect()
    };
    let current = in_window(current, query.window.as_ref());
    // "all" has nothing to compare against
    let previous = match previous_window.as_ref() {
        Some(w) => in_window(previous, Some(w)),
        None => Vec::new(),
    };

    let summary = summarize(&current, None, bundle);
    if summary.is_empty() {
        return DashboardOutcome::NoData {
            message: NO_DATA_MESSAGE.to_string(),
        };
    }
    let previous_summary = summarize(&previous, None, bundle);

    let lines = flatten(&current, bundle);

    DashboardOutcome::Report(Box::new(DashboardReport {
        period_label: query.period_label(),
        window: query.window,
        previous_window,
        granularity: query.granularity,
        currency: query.currency.clone(),
        bundle_name: query.bundle_name.clone(),
        trends: compare_summaries(&summary, &previous_summary),
        product_comparison: compare_products(&summary.product_breakdown, &previous_summary.product_breakdown),
        series: aggregate(&current, query.granularity, bundle),
        daily_products: DailyProductMatrix::build(&lines, bundle),
        quantity_pivot: quantity_pivot(&lines, bundle),
        revenue_pivot: revenue_pivot(&lines, bundle),
        total_records: lines.len() as i64,
        summary,
    }))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use super::test_support::{at, bundle_receipt, item, standard_receipt};

    fn query(period: DashboardPeriod, now: &str) -> DashboardQuery {
        DashboardQuery::new(period, at(now), "Full Package", "₿")
    }

    #[test]
    fn test_empty_window_is_no_data() {
        let outcome = build_dashboard(&[], &[], &query(DashboardPeriod::Last7Days, "2025-09-10T12:00:00Z"));
        match outcome {
            DashboardOutcome::NoData { message } => assert_eq!(message, NO_DATA_MESSAGE),
            DashboardOutcome::Report(_) => panic!("expected NoData"),
        }
    }

    #[test]
    fn test_receipts_outside_window_are_no_data() {
        let old = standard_receipt("IN-OLD", "2025-01-01T10:00:00Z", vec![item("a", "A", 1, false, 100, 100)]);
        let outcome = build_dashboard(&[old], &[], &query(DashboardPeriod::Today, "2025-09-10T12:00:00Z"));
        assert!(outcome.report().is_none());
    }

    #[test]
    fn test_report_with_trends() {
        let current = vec![
            standard_receipt("IN-1", "2025-09-10T09:00:00Z", vec![item("a", "A", 3, false, 10_000, 9_000)]),
            bundle_receipt("IN-2", "2025-09-10T10:00:00Z", 50_000, vec![item("a", "A", 2, false, 10_000, 9_000)]),
        ];
        let previous = vec![standard_receipt(
            "IN-0",
            "2025-09-09T09:00:00Z",
            vec![item("a", "A", 1, false, 10_000, 9_000)],
        )];

        let q = query(DashboardPeriod::Today, "2025-09-10T12:00:00Z");
        assert_eq!(q.granularity, Granularity::Hour);

        let outcome = build_dashboard(&current, &previous, &q);
        let report = outcome.report().expect("report");

        assert_eq!(report.period_label, "Today (2025-09-10)");
        assert_eq!(report.summary.total_receipts, 2);
        assert_eq!(report.summary.total_revenue.cents(), 27_000 + 50_000);
        // 2 receipts vs 1
        assert_eq!(report.trends.receipts.label, "+100.0%");
        assert_eq!(report.series.len(), 2);
        assert_eq!(report.quantity_pivot.products, vec!["A", "Full Package"]);
        assert_eq!(report.total_records, 2);

        let a = report
            .product_comparison
            .iter()
            .find(|p| p.product_name == "A")
            .unwrap();
        assert_eq!(a.current_quantity, 3);
        assert_eq!(a.previous_quantity, 1);
    }

    #[test]
    fn test_all_period_has_flat_trends() {
        let current = vec![standard_receipt("IN-1", "2024-02-01T09:00:00Z", vec![item("a", "A", 1, false, 100, 100)])];
        let q = query(DashboardPeriod::All, "2025-09-10T12:00:00Z");
        let outcome = build_dashboard(&current, &current, &q);
        let report = outcome.report().unwrap();
        assert_eq!(report.period_label, "All time");
        assert!(report.previous_window.is_none());
        assert_eq!(report.trends.growth_trend, "+0.0%");
        assert_eq!(report.granularity, Granularity::Month);
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let outcome = DashboardOutcome::NoData {
            message: NO_DATA_MESSAGE.to_string(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "no_data");
    }
}
