//! Time-bucketed revenue series.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::effective::effective_lines;
use super::window::DateWindow;
use crate::error::ValidationError;
use crate::money::Money;
use crate::types::ReceiptRecord;

/// Bucket size of a revenue series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Granularity {
    /// `YYYY-MM-DD HH:MM`, truncated to the minute.
    Hour,
    /// `YYYY-MM-DD`
    Day,
    /// ISO week, `YYYY-Www`
    Week,
    /// `YYYY-MM`
    Month,
}

impl Granularity {
    /// Picks a bucket size that keeps a chart readable for the window.
    ///
    /// ```text
    /// ≤ 1 day    → Hour
    /// ≤ 31 days  → Day
    /// ≤ 183 days → Week
    /// longer/all → Month
    /// ```
    pub fn for_window(window: Option<&DateWindow>) -> Self {
        let Some(window) = window else {
            return Granularity::Month;
        };
        let length = window.duration();
        if length <= Duration::days(1) {
            Granularity::Hour
        } else if length <= Duration::days(31) {
            Granularity::Day
        } else if length <= Duration::days(183) {
            Granularity::Week
        } else {
            Granularity::Month
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Hour => "hour",
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hour" => Ok(Granularity::Hour),
            "day" => Ok(Granularity::Day),
            "week" => Ok(Granularity::Week),
            "month" => Ok(Granularity::Month),
            other => Err(ValidationError::InvalidFormat {
                field: "granularity".to_string(),
                reason: format!("'{}' is not one of hour, day, week, month", other),
            }),
        }
    }
}

/// The bucket label a timestamp falls into.
///
/// Labels sort lexicographically in time order for every granularity.
pub fn bucket_key(at: DateTime<Utc>, granularity: Granularity) -> String {
    match granularity {
        Granularity::Hour => at.format("%Y-%m-%d %H:%M").to_string(),
        Granularity::Day => at.format("%Y-%m-%d").to_string(),
        Granularity::Week => {
            let week = at.iso_week();
            format!("{}-W{:02}", week.year(), week.week())
        }
        Granularity::Month => at.format("%Y-%m").to_string(),
    }
}

/// One bucket of the revenue series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SeriesPoint {
    pub bucket_key: String,
    /// Sum of effective vendor totals.
    pub revenue: Money,
    /// Distinct receipts in the bucket.
    pub receipt_count: i64,
}

#[derive(Default)]
struct Bucket<'a> {
    revenue: Money,
    receipts: HashSet<&'a str>,
}

/// Folds receipts into revenue buckets, ascending by key.
pub fn aggregate(records: &[ReceiptRecord], granularity: Granularity, bundle_name: &str) -> Vec<SeriesPoint> {
    let mut buckets: BTreeMap<String, Bucket<'_>> = BTreeMap::new();

    for record in records.iter().filter(|r| r.receipt.is_active()) {
        let receipt = &record.receipt;
        let bucket = buckets
            .entry(bucket_key(receipt.created_at, granularity))
            .or_default();
        bucket.receipts.insert(receipt.receipt_number.as_str());
        bucket.revenue += effective_lines(record, bundle_name)
            .iter()
            .map(|line| line.total_vend_price)
            .sum::<Money>();
    }

    buckets
        .into_iter()
        .map(|(bucket_key, bucket)| SeriesPoint {
            bucket_key,
            revenue: bucket.revenue,
            receipt_count: bucket.receipts.len() as i64,
        })
        .collect()
}
