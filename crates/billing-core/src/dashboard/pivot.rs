//! Receipt × product and day × product matrices used by the spreadsheet
//! export.
//!
//! ```text
//!                  ┌────────── product columns (by name, bundle last) ──┐
//! receipt_number │ created_at │ Oil │ Towel │ ... │ Full Package │
//! IN-...-0001    │ 2025-09-01 │  3  │   0   │     │      0       │
//! IN-...-0002    │ 2025-09-01 │  0  │   1   │     │      1       │
//! ```

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::effective::EffectiveLine;
use crate::money::Money;

/// Distinct product names, sorted, with the bundle moved to the end.
pub fn product_columns(lines: &[EffectiveLine], bundle_name: &str) -> Vec<String> {
    let names: BTreeSet<&str> = lines.iter().map(|l| l.product_name.as_str()).collect();
    let mut columns: Vec<String> = names
        .into_iter()
        .filter(|n| *n != bundle_name)
        .map(str::to_string)
        .collect();
    if lines.iter().any(|l| l.product_name == bundle_name) {
        columns.push(bundle_name.to_string());
    }
    columns
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotRow<T> {
    pub receipt_number: String,
    pub created_at: DateTime<Utc>,
    /// One value per entry of [`ReceiptPivot::products`].
    pub values: Vec<T>,
}

/// Per-receipt totals laid out by product column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptPivot<T> {
    pub products: Vec<String>,
    pub rows: Vec<PivotRow<T>>,
}

impl<T> ReceiptPivot<T>
where
    T: Copy + Default + std::ops::AddAssign,
{
    /// Builds a pivot, reading each line's contribution with `value`.
    ///
    /// Rows are ordered by creation time, oldest first.
    pub fn build(lines: &[EffectiveLine], bundle_name: &str, value: impl Fn(&EffectiveLine) -> T) -> Self {
        let products = product_columns(lines, bundle_name);
        let index: BTreeMap<&str, usize> = products
            .iter()
            .enumerate()
            .map(|(i, p)| (p.as_str(), i))
            .collect();

        let mut rows: Vec<PivotRow<T>> = Vec::new();
        let mut row_of: BTreeMap<&str, usize> = BTreeMap::new();
        for line in lines {
            let row = *row_of.entry(line.receipt_id.as_str()).or_insert_with(|| {
                rows.push(PivotRow {
                    receipt_number: line.receipt_number.clone(),
                    created_at: line.created_at,
                    values: vec![T::default(); products.len()],
                });
                rows.len() - 1
            });
            if let Some(&col) = index.get(line.product_name.as_str()) {
                rows[row].values[col] += value(line);
            }
        }

        rows.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.receipt_number.cmp(&b.receipt_number))
        });
        ReceiptPivot { products, rows }
    }

    /// Column totals, aligned with `products`.
    pub fn totals(&self) -> Vec<T> {
        let mut totals = vec![T::default(); self.products.len()];
        for row in &self.rows {
            for (total, value) in totals.iter_mut().zip(&row.values) {
                *total += *value;
            }
        }
        totals
    }
}

/// Units sold per receipt and product.
pub fn quantity_pivot(lines: &[EffectiveLine], bundle_name: &str) -> ReceiptPivot<i64> {
    ReceiptPivot::build(lines, bundle_name, |l| l.quantity)
}

/// Vendor revenue per receipt and product.
pub fn revenue_pivot(lines: &[EffectiveLine], bundle_name: &str) -> ReceiptPivot<Money> {
    ReceiptPivot::build(lines, bundle_name, |l| l.total_vend_price)
}

// =============================================================================
// Daily product matrix
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCell {
    pub quantity: i64,
    pub revenue: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyProductRow {
    pub date: NaiveDate,
    pub cells: Vec<DailyCell>,
}

impl DailyProductRow {
    pub fn total_revenue(&self) -> Money {
        self.cells.iter().map(|c| c.revenue).sum()
    }
}

/// Quantity and revenue per day and product, days ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyProductMatrix {
    pub products: Vec<String>,
    pub rows: Vec<DailyProductRow>,
}

impl DailyProductMatrix {
    pub fn build(lines: &[EffectiveLine], bundle_name: &str) -> Self {
        let products = product_columns(lines, bundle_name);
        let index: BTreeMap<&str, usize> = products
            .iter()
            .enumerate()
            .map(|(i, p)| (p.as_str(), i))
            .collect();

        let mut days: BTreeMap<NaiveDate, Vec<DailyCell>> = BTreeMap::new();
        for line in lines {
            let cells = days
                .entry(line.created_at.date_naive())
                .or_insert_with(|| vec![DailyCell::default(); products.len()]);
            if let Some(&col) = index.get(line.product_name.as_str()) {
                cells[col].quantity += line.quantity;
                cells[col].revenue += line.total_vend_price;
            }
        }

        DailyProductMatrix {
            products,
            rows: days
                .into_iter()
                .map(|(date, cells)| DailyProductRow { date, cells })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::effective::flatten;
    use crate::dashboard::test_support::{bundle_receipt, item, standard_receipt};

    fn lines() -> Vec<EffectiveLine> {
        let records = vec![
            standard_receipt(
                "IN-2",
                "2025-09-02T09:00:00Z",
                vec![item("z", "Zinc", 2, false, 1_000, 1_000), item("a", "Aloe", 1, false, 500, 400)],
            ),
            bundle_receipt("IN-3", "2025-09-02T12:00:00Z", 50_000, vec![item("a", "Aloe", 9, false, 500, 400)]),
            standard_receipt("IN-1", "2025-09-01T09:00:00Z", vec![item("a", "Aloe", 3, false, 500, 400)]),
        ];
        flatten(&records, "Full Package")
    }

    #[test]
    fn test_columns_sorted_with_bundle_last() {
        assert_eq!(product_columns(&lines(), "Full Package"), vec!["Aloe", "Zinc", "Full Package"]);
    }

    #[test]
    fn test_quantity_pivot() {
        let pivot = quantity_pivot(&lines(), "Full Package");
        let numbers: Vec<_> = pivot.rows.iter().map(|r| r.receipt_number.as_str()).collect();
        assert_eq!(numbers, vec!["IN-1", "IN-2", "IN-3"]);
        assert_eq!(pivot.rows[0].values, vec![3, 0, 0]);
        assert_eq!(pivot.rows[1].values, vec![1, 2, 0]);
        assert_eq!(pivot.rows[2].values, vec![0, 0, 1]);
        assert_eq!(pivot.totals(), vec![4, 2, 1]);
    }

    #[test]
    fn test_revenue_pivot_totals() {
        let pivot = revenue_pivot(&lines(), "Full Package");
        let totals: Vec<i64> = pivot.totals().iter().map(Money::cents).collect();
        assert_eq!(totals, vec![1_600, 2_000, 50_000]);
    }

    #[test]
    fn test_daily_matrix() {
        let matrix = DailyProductMatrix::build(&lines(), "Full Package");
        assert_eq!(matrix.rows.len(), 2);
        assert_eq!(matrix.rows[0].date.to_string(), "2025-09-01");
        assert_eq!(matrix.rows[0].cells[0].quantity, 3);
        assert_eq!(matrix.rows[1].cells[2].revenue.cents(), 50_000);
        assert_eq!(matrix.rows[1].total_revenue().cents(), 400 + 2_000 + 50_000);
    }
}
