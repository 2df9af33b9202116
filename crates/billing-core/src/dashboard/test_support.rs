//! Fixture builders shared by the dashboard tests.

use chrono::{DateTime, Utc};

use crate::money::Money;
use crate::types::{CreatorRef, Receipt, ReceiptItem, ReceiptRecord, TaxRate};

pub fn at(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

pub fn item(prod_id: &str, name: &str, quantity: i64, is_free: bool, std_cents: i64, vend_cents: i64) -> ReceiptItem {
    let std_price = Money::from_cents(std_cents);
    let vendor_price = Money::from_cents(vend_cents);
    ReceiptItem {
        item_id: format!("item-{prod_id}-{quantity}"),
        receipt_id: String::new(),
        prod_id: prod_id.to_string(),
        product_name: name.to_string(),
        is_free,
        quantity,
        std_price,
        vendor_price,
        total_std_price: std_price.multiply_quantity(quantity),
        total_vend_price: vendor_price.multiply_quantity(quantity),
        created_at: Utc::now(),
        deleted_at: None,
    }
}

fn record(number: &str, created_at: &str, package: &str, package_cents: i64, mut items: Vec<ReceiptItem>) -> ReceiptRecord {
    let created_at = at(created_at);
    let receipt_id = format!("r-{number}");
    for it in &mut items {
        it.receipt_id = receipt_id.clone();
        it.created_at = created_at;
    }

    let total_std_amount: Money = items.iter().map(|i| i.total_std_price).sum();
    let total_vend_amount: Money = items.iter().map(|i| i.total_vend_price).sum();
    let rate = TaxRate::default();
    let package_amt = Money::from_cents(package_cents);
    let (tax_amount, gross_amount) = if package_cents > 0 {
        (package_amt.calculate_tax(rate), package_amt)
    } else {
        let tax = total_vend_amount.calculate_tax(rate);
        (tax, total_vend_amount + tax)
    };

    ReceiptRecord {
        receipt: Receipt {
            receipt_id,
            receipt_number: number.to_string(),
            recipient_name: "Jane Customer".to_string(),
            recipient_number: None,
            package: package.to_string(),
            package_amt,
            total_std_amount,
            total_vend_amount,
            tax_amount,
            gross_amount,
            payment_mode: "Cash".to_string(),
            transaction_number: None,
            created_by: "u-1".to_string(),
            created_at,
            updated_at: created_at,
            deleted_at: None,
        },
        items,
        creator: Some(CreatorRef {
            user_id: "u-1".to_string(),
            email: "staff@example.com".to_string(),
            user_name: "Front Desk".to_string(),
        }),
    }
}

pub fn standard_receipt(number: &str, created_at: &str, items: Vec<ReceiptItem>) -> ReceiptRecord {
    record(number, created_at, crate::STANDARD_PACKAGE, 0, items)
}

pub fn bundle_receipt(number: &str, created_at: &str, package_cents: i64, items: Vec<ReceiptItem>) -> ReceiptRecord {
    record(number, created_at, crate::DEFAULT_BUNDLE_NAME, package_cents, items)
}

pub fn with_creator(mut record: ReceiptRecord, email: &str, user_name: &str) -> ReceiptRecord {
    record.creator = Some(CreatorRef {
        user_id: format!("u-{user_name}"),
        email: email.to_string(),
        user_name: user_name.to_string(),
    });
    record
}
