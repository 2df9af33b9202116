//! Statistics for a single receipt's items.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::pricing::Catalog;
use crate::types::ReceiptItem;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ItemHighlight {
    pub product_name: String,
    pub quantity: i64,
    pub total_amount: Money,
}

impl From<&ReceiptItem> for ItemHighlight {
    fn from(item: &ReceiptItem) -> Self {
        ItemHighlight {
            product_name: item.product_name.clone(),
            quantity: item.quantity,
            total_amount: item.total_vend_price,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReceiptStatistics {
    pub total_items: i64,
    pub total_quantity: i64,
    /// Σ vendor line totals
    pub subtotal: Money,
    pub average_item_price: Money,
    pub most_expensive_item: Option<ItemHighlight>,
    pub most_quantity_item: Option<ItemHighlight>,
}

/// Summarizes the active items of one receipt. An empty receipt yields
/// zeros and no highlights.
pub fn receipt_statistics(items: &[ReceiptItem]) -> ReceiptStatistics {
    let active: Vec<&ReceiptItem> = items.iter().filter(|i| i.is_active()).collect();
    let subtotal: Money = active.iter().map(|i| i.total_vend_price).sum();

    ReceiptStatistics {
        total_items: active.len() as i64,
        total_quantity: active.iter().map(|i| i.quantity).sum(),
        subtotal,
        average_item_price: Money::mean(subtotal, active.len()),
        // first of equals wins
        most_expensive_item: active
            .iter()
            .copied()
            .reduce(|best, i| if i.total_vend_price > best.total_vend_price { i } else { best })
            .map(ItemHighlight::from),
        most_quantity_item: active
            .iter()
            .copied()
            .reduce(|best, i| if i.quantity > best.quantity { i } else { best })
            .map(ItemHighlight::from),
    }
}

/// Items of one receipt grouped by product, compared with today's catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReceiptProductLine {
    pub prod_id: String,
    pub product_name: String,
    /// Standard unit price frozen on the receipt.
    pub item_unit_price: Money,
    /// None when the product has since been deleted.
    pub current_unit_price: Option<Money>,
    pub price_difference: Option<Money>,
    pub total_quantity: i64,
    pub total_amount: Money,
    pub line_items: i64,
}

pub fn receipt_product_breakdown(items: &[ReceiptItem], catalog: &(impl Catalog + ?Sized)) -> Vec<ReceiptProductLine> {
    let mut grouped: BTreeMap<&str, ReceiptProductLine> = BTreeMap::new();

    for item in items.iter().filter(|i| i.is_active()) {
        let entry = grouped.entry(item.prod_id.as_str()).or_insert_with(|| {
            let current_unit_price = catalog.find_active(&item.prod_id).map(|p| p.unit_price);
            ReceiptProductLine {
                prod_id: item.prod_id.clone(),
                product_name: item.product_name.clone(),
                item_unit_price: item.std_price,
                current_unit_price,
                price_difference: current_unit_price.map(|c| c - item.std_price),
                total_quantity: 0,
                total_amount: Money::zero(),
                line_items: 0,
            }
        });
        entry.total_quantity += item.quantity;
        entry.total_amount += item.total_vend_price;
        entry.line_items += 1;
    }

    let mut lines: Vec<_> = grouped.into_values().collect();
    lines.sort_by(|a, b| a.product_name.cmp(&b.product_name));
    lines
}
