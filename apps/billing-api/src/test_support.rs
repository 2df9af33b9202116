//! Fixtures shared by the service and scheduler tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::auth::{hash_password, identity_of};
use crate::config::AppConfig;
use crate::error::ApiResult;
use crate::notifier::{DailyFigures, Notifier};
use crate::AppState;
use billing_core::dashboard::{build_dashboard, DashboardPeriod, DashboardQuery, DashboardReport};
use billing_core::{CreatorRef, Identity, Money, Receipt, ReceiptItem, ReceiptRecord, TaxRate, STANDARD_PACKAGE};
use billing_db::{Database, DbConfig, NewProduct, NewUser};

pub const TEST_PASSWORD: &str = "secret123";

/// Default configuration over a fresh in-memory database.
pub async fn test_state() -> Arc<AppState> {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let config = AppConfig::from_toml("currency_symbol = \"Rs\"").unwrap();
    Arc::new(AppState::new(db, config, Arc::new(RecordingNotifier::default())))
}

/// Inserts an account with [`TEST_PASSWORD`] and returns its identity.
pub async fn account(state: &AppState, email: &str, is_admin: bool) -> Identity {
    let user = state
        .db
        .users()
        .insert(
            &NewUser {
                user_name: if is_admin { "Admin" } else { "Staff" }.to_string(),
                email: email.to_string(),
                password_hash: hash_password(TEST_PASSWORD).unwrap(),
                is_admin,
            },
            None,
        )
        .await
        .unwrap();
    identity_of(&user)
}

/// Inserts a staff user and a 100.00 product; returns their ids.
pub async fn seed_catalog(db: &Database) -> (String, String) {
    let user = db
        .users()
        .insert(
            &NewUser {
                user_name: "Front Desk".to_string(),
                email: format!("desk-{}@example.com", Uuid::new_v4().simple()),
                password_hash: "!locked".to_string(),
                is_admin: false,
            },
            None,
        )
        .await
        .unwrap();
    let product = db
        .products()
        .insert(
            &NewProduct {
                name: format!("Consult {}", &Uuid::new_v4().simple().to_string()[..6]),
                unit_price: Money::from_cents(10_000),
            },
            Some(&user.user_id),
        )
        .await
        .unwrap();
    (user.user_id, product.prod_id)
}

/// What a [`RecordingNotifier`] was asked to send.
#[derive(Debug, Clone, PartialEq)]
pub enum SentNotification {
    NoReceipts {
        recipients: Vec<String>,
        date: NaiveDate,
    },
    Summary {
        date: NaiveDate,
        figures: DailyFigures,
        currency: String,
    },
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentNotification>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_no_receipts_alert(&self, recipients: &[String], date: NaiveDate) -> ApiResult<()> {
        self.sent.lock().unwrap().push(SentNotification::NoReceipts {
            recipients: recipients.to_vec(),
            date,
        });
        Ok(())
    }

    async fn send_daily_summary(
        &self,
        _recipients: &[String],
        date: NaiveDate,
        figures: DailyFigures,
        currency: &str,
    ) -> ApiResult<()> {
        self.sent.lock().unwrap().push(SentNotification::Summary {
            date,
            figures,
            currency: currency.to_string(),
        });
        Ok(())
    }
}

fn at(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

fn line(receipt_id: &str, name: &str, quantity: i64, std_cents: i64, vend_cents: i64, created_at: DateTime<Utc>) -> ReceiptItem {
    let std_price = Money::from_cents(std_cents);
    let vendor_price = Money::from_cents(vend_cents);
    ReceiptItem {
        item_id: Uuid::new_v4().to_string(),
        receipt_id: receipt_id.to_string(),
        prod_id: format!("p-{name}"),
        product_name: name.to_string(),
        is_free: false,
        quantity,
        std_price,
        vendor_price,
        total_std_price: std_price.multiply_quantity(quantity),
        total_vend_price: vendor_price.multiply_quantity(quantity),
        created_at,
        deleted_at: None,
    }
}

fn standard_record(number: &str, created_at: &str, lines: &[(&str, i64, i64, i64)]) -> ReceiptRecord {
    let created_at = at(created_at);
    let receipt_id = format!("r-{number}");
    let items: Vec<ReceiptItem> = lines
        .iter()
        .map(|(name, qty, std, vend)| line(&receipt_id, name, *qty, *std, *vend, created_at))
        .collect();
    let total_std_amount: Money = items.iter().map(|i| i.total_std_price).sum();
    let total_vend_amount: Money = items.iter().map(|i| i.total_vend_price).sum();
    let tax_amount = total_vend_amount.calculate_tax(TaxRate::default());

    ReceiptRecord {
        receipt: Receipt {
            receipt_id,
            receipt_number: number.to_string(),
            recipient_name: "Jane Customer".to_string(),
            recipient_number: None,
            package: STANDARD_PACKAGE.to_string(),
            package_amt: Money::zero(),
            total_std_amount,
            total_vend_amount,
            tax_amount,
            gross_amount: total_vend_amount + tax_amount,
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
            email: "desk@example.com".to_string(),
            user_name: "Front Desk".to_string(),
        }),
    }
}

/// A two-day, two-product dashboard report.
pub fn sample_report() -> DashboardReport {
    let current = vec![
        standard_record("IN-1", "2025-09-08T09:00:00Z", &[("Checkup", 2, 10_000, 9_000), ("X-Ray", 1, 25_000, 30_000)]),
        standard_record("IN-2", "2025-09-09T14:30:00Z", &[("Checkup", 1, 10_000, 7_500)]),
    ];
    let query = DashboardQuery::new(DashboardPeriod::Last7Days, at("2025-09-10T12:00:00Z"), "Full Package", "Rs");
    build_dashboard(&current, &[], &query)
        .report()
        .cloned()
        .expect("sample receipts fall inside the window")
}
