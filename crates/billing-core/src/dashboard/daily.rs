//! Receipts grouped by calendar day, for the "today" and "all receipts"
//! listings.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Receipt, ReceiptRecord};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DaySummary {
    pub total_receipts: i64,
    /// Σ gross
    pub total_amount: Money,
    pub total_tax: Money,
    pub total_items: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DayReceipt {
    #[serde(flatten)]
    pub receipt: Receipt,
    pub items_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DayGroup {
    /// `dd-mm-YYYY`
    pub date: String,
    /// e.g. `Monday`
    pub day_name: String,
    pub receipts: Vec<DayReceipt>,
    pub day_summary: DaySummary,
}

/// Groups active receipts by the UTC day they were created on.
///
/// Days are newest first, and so are receipts within a day.
pub fn group_by_day(records: &[ReceiptRecord]) -> Vec<DayGroup> {
    let mut days: BTreeMap<NaiveDate, Vec<&ReceiptRecord>> = BTreeMap::new();
    for record in records.iter().filter(|r| r.receipt.is_active()) {
        days.entry(record.receipt.created_at.date_naive())
            .or_default()
            .push(record);
    }

    days.into_iter()
        .rev()
        .map(|(date, mut day)| {
            day.sort_by(|a, b| b.receipt.created_at.cmp(&a.receipt.created_at));

            let mut day_summary = DaySummary::default();
            let receipts = day
                .into_iter()
                .map(|record| {
                    let items_count = record.items.iter().filter(|i| i.is_active()).count() as i64;
                    day_summary.total_receipts += 1;
                    day_summary.total_amount += record.receipt.gross_amount;
                    day_summary.total_tax += record.receipt.tax_amount;
                    day_summary.total_items += items_count;
                    DayReceipt {
                        receipt: record.receipt.clone(),
                        items_count,
                    }
                })
                .collect();

            DayGroup {
                date: date.format("%d-%m-%Y").to_string(),
                day_name: date.format("%A").to_string(),
                receipts,
                day_summary,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::test_support::{item, standard_receipt};

    #[test]
    fn test_group_by_day() {
        let records = vec![
            standard_receipt("IN-1", "2025-09-01T08:00:00Z", vec![item("a", "A", 3, false, 10_000, 9_000)]),
            standard_receipt(
                "IN-2",
                "2025-09-01T18:00:00Z",
                vec![item("a", "A", 1, false, 1_000, 1_000), item("b", "B", 1, true, 0, 0)],
            ),
            standard_receipt("IN-3", "2025-09-02T09:00:00Z", vec![item("a", "A", 1, false, 1_000, 1_000)]),
        ];

        let groups = group_by_day(&records);
        assert_eq!(groups.len(), 2);

        assert_eq!(groups[0].date, "02-09-2025");
        assert_eq!(groups[0].day_name, "Tuesday");

        let monday = &groups[1];
        assert_eq!(monday.date, "01-09-2025");
        assert_eq!(monday.day_name, "Monday");
        assert_eq!(monday.receipts[0].receipt.receipt_number, "IN-2");
        assert_eq!(monday.day_summary.total_receipts, 2);
        assert_eq!(monday.day_summary.total_items, 3);
        // 297.00 + 11.00
        assert_eq!(monday.day_summary.total_amount.cents(), 30_800);
        assert_eq!(monday.day_summary.total_tax.cents(), 2_800);
    }

    #[test]
    fn test_empty_batch() {
        assert!(group_by_day(&[]).is_empty());
    }
}
