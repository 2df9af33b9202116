//! # Receipt Repository
//!
//! Receipts and their items.
//!
//! ## Receipt Creation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     create(): one transaction                          │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    │                                                                    │
//! │    ├── SELECT active products WHERE prod_id IN (requested ids)         │
//! │    │      (read inside the tx: no stale cross-request cache)           │
//! │    │                                                                    │
//! │    ├── billing_core::price_receipt(lines, package, amount, policy)     │
//! │    │      └── error? ──► tx dropped ──► ROLLBACK                       │
//! │    │                                                                    │
//! │    ├── INSERT receipts (IN-DDMMYYYY-XXXXXXXX)                          │
//! │    │      └── number collision? ──► new suffix, insert again           │
//! │    │                                                                    │
//! │    ├── INSERT receipt_items  (price snapshots)                         │
//! │    │                                                                    │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use billing_core::dashboard::DateWindow;
use billing_core::pricing::NewReceipt;
use billing_core::{
    price_receipt, CreatorRef, Money, Page, PageRequest, PricingPolicy, Product, Receipt, ReceiptItem,
    ReceiptRecord,
};

/// Attempts at finding a free receipt number before giving up.
const RECEIPT_NUMBER_ATTEMPTS: usize = 5;

/// Which receipts to load for aggregation.
#[derive(Debug, Clone, Default)]
pub struct ReceiptFilter {
    /// Half-open creation window; None means all time.
    pub window: Option<DateWindow>,
    /// Restrict to one creator.
    pub created_by: Option<String>,
}

impl ReceiptFilter {
    pub fn window(window: DateWindow) -> Self {
        ReceiptFilter {
            window: Some(window),
            created_by: None,
        }
    }

    pub fn all() -> Self {
        ReceiptFilter::default()
    }
}

/// A receipt header joined with its creator.
#[derive(Debug, sqlx::FromRow)]
struct ReceiptRow {
    #[sqlx(flatten)]
    receipt: Receipt,
    creator_email: Option<String>,
    creator_name: Option<String>,
}

impl ReceiptRow {
    fn into_record(self, items: Vec<ReceiptItem>) -> ReceiptRecord {
        let creator = match (self.creator_email, self.creator_name) {
            (Some(email), Some(user_name)) => Some(CreatorRef {
                user_id: self.receipt.created_by.clone(),
                email,
                user_name,
            }),
            _ => None,
        };
        ReceiptRecord {
            receipt: self.receipt,
            items,
            creator,
        }
    }
}

const RECEIPT_SELECT: &str = r#"
    SELECT r.receipt_id, r.receipt_number, r.recipient_name, r.recipient_number,
           r.package, r.package_amt, r.total_std_amount, r.total_vend_amount,
           r.tax_amount, r.gross_amount, r.payment_mode, r.transaction_number,
           r.created_by, r.created_at, r.updated_at, r.deleted_at,
           u.email AS creator_email, u.user_name AS creator_name
    FROM receipts r
    LEFT JOIN users u ON u.user_id = r.created_by
"#;

const ITEM_SELECT: &str = r#"
    SELECT i.item_id, i.receipt_id, i.prod_id, p.name AS product_name,
           i.is_free, i.quantity, i.std_price, i.vendor_price,
           i.total_std_price, i.total_vend_price, i.created_at, i.deleted_at
    FROM receipt_items i
    JOIN products p ON p.prod_id = i.prod_id
    JOIN receipts r ON r.receipt_id = i.receipt_id
"#;

/// Repository for receipt database operations.
#[derive(Debug, Clone)]
pub struct ReceiptRepository {
    pool: SqlitePool,
}

impl ReceiptRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReceiptRepository { pool }
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Prices and stores a receipt atomically.
    ///
    /// ## Returns
    /// * `Ok(ReceiptRecord)` - the stored receipt with items and creator
    /// * `Err(DbError::Core(ProductNotFound))` - unknown or deleted product
    /// * `Err(DbError::Core(InvalidQuantity))` - quantity ≤ 0
    ///
    /// Nothing is written when an error is returned.
    pub async fn create(
        &self,
        request: &NewReceipt,
        created_by: &str,
        policy: &PricingPolicy,
    ) -> DbResult<ReceiptRecord> {
        let mut tx = self.pool.begin().await?;

        let catalog = load_catalog(&mut tx, request).await?;
        let totals = price_receipt(
            &request.items,
            &request.package,
            request.package_amt,
            policy,
            &catalog,
        )?;

        let now = Utc::now();
        let receipt_id = Uuid::new_v4().to_string();
        let mut receipt = Receipt {
            receipt_id: receipt_id.clone(),
            receipt_number: String::new(),
            recipient_name: request.recipient_name.trim().to_string(),
            recipient_number: trimmed(&request.recipient_number),
            package: totals.package.clone(),
            package_amt: totals.package_amt,
            total_std_amount: totals.total_std_amount,
            total_vend_amount: totals.total_vend_amount,
            tax_amount: totals.tax_amount,
            gross_amount: totals.gross_amount,
            payment_mode: request.payment_mode.trim().to_string(),
            transaction_number: trimmed(&request.transaction_number),
            created_by: created_by.to_string(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        receipt.receipt_number = insert_header(&mut tx, &receipt, generate_receipt_number).await?;

        for line in &totals.lines {
            sqlx::query(
                r#"
                INSERT INTO receipt_items (
                    item_id, receipt_id, prod_id, is_free, quantity,
                    std_price, vendor_price, total_std_price, total_vend_price,
                    created_at, updated_at, deleted_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10, NULL)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&receipt_id)
            .bind(&line.prod_id)
            .bind(line.is_free)
            .bind(line.quantity)
            .bind(line.std_price)
            .bind(line.vendor_price)
            .bind(line.total_std_price)
            .bind(line.total_vend_price)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            receipt_number = %receipt.receipt_number,
            package = %receipt.package,
            gross = %receipt.gross_amount,
            items = totals.lines.len(),
            "Receipt created"
        );

        self.get_by_id(&receipt_id)
            .await?
            .ok_or_else(|| DbError::not_found("Receipt", receipt_id))
    }

    /// Soft-deletes a receipt and its items in one transaction.
    ///
    /// Deleting an already deleted receipt is NotFound.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(receipt_id = %id, "Soft-deleting receipt");

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE receipts SET deleted_at = ?2, updated_at = ?2
            WHERE receipt_id = ?1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Receipt", id));
        }

        sqlx::query(
            r#"
            UPDATE receipt_items SET deleted_at = ?2, updated_at = ?2
            WHERE receipt_id = ?1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets an active receipt with items and creator.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<ReceiptRecord>> {
        let row = sqlx::query_as::<_, ReceiptRow>(&format!(
            "{RECEIPT_SELECT} WHERE r.receipt_id = ?1 AND r.deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let items = self.items(&row.receipt.receipt_id).await?;
                Ok(Some(row.into_record(items)))
            }
            None => Ok(None),
        }
    }

    /// Gets an active receipt by its printed number.
    pub async fn get_by_number(&self, receipt_number: &str) -> DbResult<Option<ReceiptRecord>> {
        let row = sqlx::query_as::<_, ReceiptRow>(&format!(
            "{RECEIPT_SELECT} WHERE r.receipt_number = ?1 AND r.deleted_at IS NULL"
        ))
        .bind(receipt_number.trim())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let items = self.items(&row.receipt.receipt_id).await?;
                Ok(Some(row.into_record(items)))
            }
            None => Ok(None),
        }
    }

    /// Active items of one receipt, in insertion order.
    pub async fn items(&self, receipt_id: &str) -> DbResult<Vec<ReceiptItem>> {
        let items = sqlx::query_as::<_, ReceiptItem>(&format!(
            "{ITEM_SELECT} WHERE i.receipt_id = ?1 AND i.deleted_at IS NULL ORDER BY i.rowid"
        ))
        .bind(receipt_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Lists active receipt headers, newest first.
    pub async fn list(&self, page: PageRequest, created_by: Option<&str>) -> DbResult<Page<Receipt>> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM receipts
            WHERE deleted_at IS NULL AND (?1 IS NULL OR created_by = ?1)
            "#,
        )
        .bind(created_by)
        .fetch_one(&self.pool)
        .await?;

        let receipts = sqlx::query_as::<_, Receipt>(
            r#"
            SELECT receipt_id, receipt_number, recipient_name, recipient_number,
                   package, package_amt, total_std_amount, total_vend_amount,
                   tax_amount, gross_amount, payment_mode, transaction_number,
                   created_by, created_at, updated_at, deleted_at
            FROM receipts
            WHERE deleted_at IS NULL AND (?1 IS NULL OR created_by = ?1)
            ORDER BY created_at DESC, receipt_number DESC
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(created_by)
        .bind(page.per_page as i64)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(receipts, page, total))
    }

    /// Loads active receipts with items and creators, newest first.
    ///
    /// This is the batch the dashboard engine aggregates.
    pub async fn find_receipts(&self, filter: &ReceiptFilter) -> DbResult<Vec<ReceiptRecord>> {
        let start: Option<DateTime<Utc>> = filter.window.map(|w| w.start);
        let end: Option<DateTime<Utc>> = filter.window.map(|w| w.end);
        let created_by = filter.created_by.as_deref();

        let conditions = r#"
            WHERE r.deleted_at IS NULL
              AND (?1 IS NULL OR r.created_at >= ?1)
              AND (?2 IS NULL OR r.created_at < ?2)
              AND (?3 IS NULL OR r.created_by = ?3)
        "#;

        let rows = sqlx::query_as::<_, ReceiptRow>(&format!(
            "{RECEIPT_SELECT} {conditions} ORDER BY r.created_at DESC, r.receipt_number DESC"
        ))
        .bind(start)
        .bind(end)
        .bind(created_by)
        .fetch_all(&self.pool)
        .await?;

        let items = sqlx::query_as::<_, ReceiptItem>(&format!(
            "{ITEM_SELECT} {conditions} AND i.deleted_at IS NULL ORDER BY i.rowid"
        ))
        .bind(start)
        .bind(end)
        .bind(created_by)
        .fetch_all(&self.pool)
        .await?;

        let mut by_receipt: HashMap<String, Vec<ReceiptItem>> = HashMap::new();
        for item in items {
            by_receipt.entry(item.receipt_id.clone()).or_default().push(item);
        }

        debug!(receipts = rows.len(), "Loaded receipts for aggregation");

        Ok(rows
            .into_iter()
            .map(|row| {
                let items = by_receipt.remove(&row.receipt.receipt_id).unwrap_or_default();
                row.into_record(items)
            })
            .collect())
    }

    /// Active receipts created on one UTC calendar day.
    pub async fn receipts_on(&self, date: NaiveDate) -> DbResult<Vec<ReceiptRecord>> {
        self.find_receipts(&ReceiptFilter::window(DateWindow::for_day(date)))
            .await
    }

    /// Counts active receipts.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM receipts WHERE deleted_at IS NULL")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Transaction helpers
// =============================================================================

/// Reads the requested products inside the open transaction.
async fn load_catalog(conn: &mut SqliteConnection, request: &NewReceipt) -> DbResult<Vec<Product>> {
    if request.items.is_empty() {
        return Ok(Vec::new());
    }

    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
        r#"
        SELECT prod_id, name, unit_price, created_by, created_at, updated_at, deleted_at
        FROM products
        WHERE deleted_at IS NULL AND prod_id IN (
        "#,
    );
    let mut ids = query.separated(", ");
    for line in &request.items {
        ids.push_bind(line.prod_id.as_str());
    }
    ids.push_unseparated(")");

    let products = query.build_query_as::<Product>().fetch_all(&mut *conn).await?;
    Ok(products)
}

/// Inserts the header, drawing a fresh number from `next_number` on collision.
///
/// Numbers of soft-deleted receipts stay taken: the UNIQUE constraint
/// covers every row.
pub(crate) async fn insert_header(
    conn: &mut SqliteConnection,
    receipt: &Receipt,
    mut next_number: impl FnMut(DateTime<Utc>) -> String,
) -> DbResult<String> {
    for attempt in 1..=RECEIPT_NUMBER_ATTEMPTS {
        let receipt_number = next_number(receipt.created_at);

        let result = sqlx::query(
            r#"
            INSERT INTO receipts (
                receipt_id, receipt_number, recipient_name, recipient_number,
                package, package_amt, total_std_amount, total_vend_amount,
                tax_amount, gross_amount, payment_mode, transaction_number,
                created_by, created_at, updated_at, deleted_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, NULL)
            "#,
        )
        .bind(&receipt.receipt_id)
        .bind(&receipt_number)
        .bind(&receipt.recipient_name)
        .bind(&receipt.recipient_number)
        .bind(&receipt.package)
        .bind(receipt.package_amt)
        .bind(receipt.total_std_amount)
        .bind(receipt.total_vend_amount)
        .bind(receipt.tax_amount)
        .bind(receipt.gross_amount)
        .bind(&receipt.payment_mode)
        .bind(&receipt.transaction_number)
        .bind(&receipt.created_by)
        .bind(receipt.created_at)
        .bind(receipt.updated_at)
        .execute(&mut *conn)
        .await;

        match result.map_err(DbError::from) {
            Ok(_) => return Ok(receipt_number),
            Err(err) if err.is_unique_violation_on("receipts.receipt_number") => {
                warn!(attempt, receipt_number = %receipt_number, "Receipt number collision, retrying");
            }
            Err(err) => return Err(err),
        }
    }

    Err(DbError::duplicate("receipts.receipt_number", "exhausted retries"))
}

fn trimmed(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Generates a receipt number: `IN-DDMMYYYY-XXXXXXXX`.
///
/// ## Format
/// - `DDMMYYYY`: creation date (UTC)
/// - `XXXXXXXX`: first 8 hex digits of a random UUID, uppercase
///
/// ## Example
/// `IN-26092025-3F9A1C2B`
pub fn generate_receipt_number(at: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string()[..8].to_uppercase();
    format!("IN-{}-{}", at.format("%d%m%Y"), suffix)
}

/// Sums gross amounts, used by the daily alert summary.
pub fn total_gross(records: &[ReceiptRecord]) -> Money {
    records.iter().map(|r| r.receipt.gross_amount).sum()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::product::NewProduct;
    use crate::repository::user::NewUser;
    use crate::{Database, DbConfig};
    use billing_core::pricing::LineRequest;
    use billing_core::CoreError;

    struct Fixture {
        db: Database,
        user_id: String,
        product_a: String,
        product_b: String,
    }

    async fn fixture() -> Fixture {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let user = db
            .users()
            .insert(
                &NewUser {
                    user_name: "Front Desk".into(),
                    email: "desk@example.com".into(),
                    password_hash: "hash".into(),
                    is_admin: false,
                },
                None,
            )
            .await
            .unwrap();
        let a = db
            .products()
            .insert(
                &NewProduct {
                    name: "Product A".into(),
                    unit_price: Money::from_cents(10_000),
                },
                Some(&user.user_id),
            )
            .await
            .unwrap();
        let b = db
            .products()
            .insert(
                &NewProduct {
                    name: "Product B".into(),
                    unit_price: Money::from_cents(5_000),
                },
                Some(&user.user_id),
            )
            .await
            .unwrap();

        Fixture {
            db,
            user_id: user.user_id,
            product_a: a.prod_id,
            product_b: b.prod_id,
        }
    }

    fn request(package: &str, package_amt: Option<Money>, items: Vec<LineRequest>) -> NewReceipt {
        NewReceipt {
            recipient_name: "Jane Customer".into(),
            recipient_number: Some(" 0300-1234567 ".into()),
            package: package.into(),
            package_amt,
            payment_mode: "Cash".into(),
            transaction_number: Some("".into()),
            items,
        }
    }

    fn line(prod_id: &str, quantity: i64, is_free: bool, vendor_cents: i64) -> LineRequest {
        LineRequest {
            prod_id: prod_id.to_string(),
            quantity,
            is_free,
            vendor_price: Money::from_cents(vendor_cents),
        }
    }

    fn is_receipt_number(s: &str) -> bool {
        let parts: Vec<&str> = s.split('-').collect();
        parts.len() == 3
            && parts[0] == "IN"
            && parts[1].len() == 8
            && parts[1].chars().all(|c| c.is_ascii_digit())
            && parts[2].len() == 8
            && parts[2].chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
    }

    #[tokio::test]
    async fn test_create_standard_receipt() {
        let f = fixture().await;
        let record = f
            .db
            .receipts()
            .create(
                &request(
                    "Standard",
                    None,
                    vec![line(&f.product_a, 3, false, 9_000), line(&f.product_b, 1, true, 4_000)],
                ),
                &f.user_id,
                &PricingPolicy::default(),
            )
            .await
            .unwrap();

        let receipt = &record.receipt;
        assert!(is_receipt_number(&receipt.receipt_number), "{}", receipt.receipt_number);
        assert_eq!(receipt.total_vend_amount.cents(), 27_000);
        assert_eq!(receipt.tax_amount.cents(), 2_700);
        assert_eq!(receipt.gross_amount.cents(), 29_700);
        assert_eq!(receipt.recipient_number.as_deref(), Some("0300-1234567"));
        assert_eq!(receipt.transaction_number, None);

        assert_eq!(record.items.len(), 2);
        assert_eq!(record.items[0].product_name, "Product A");
        assert!(record.items[1].is_free);
        assert!(record.items[1].total_vend_price.is_zero());
        assert_eq!(record.creator.as_ref().unwrap().email, "desk@example.com");

        let by_number = f
            .db
            .receipts()
            .get_by_number(&receipt.receipt_number)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_number.receipt.receipt_id, receipt.receipt_id);
    }

    #[tokio::test]
    async fn test_create_bundle_receipt() {
        let f = fixture().await;
        let record = f
            .db
            .receipts()
            .create(
                &request(
                    "Full Package",
                    Some(Money::from_cents(50_000)),
                    vec![line(&f.product_a, 2, false, 9_000)],
                ),
                &f.user_id,
                &PricingPolicy::default(),
            )
            .await
            .unwrap();

        assert_eq!(record.receipt.gross_amount.cents(), 50_000);
        assert_eq!(record.receipt.package_amt.cents(), 50_000);
        assert_eq!(record.receipt.tax_amount.cents(), 5_000);
    }

    #[tokio::test]
    async fn test_failed_pricing_writes_nothing() {
        let f = fixture().await;
        f.db.products().soft_delete(&f.product_b).await.unwrap();

        let err = f
            .db
            .receipts()
            .create(
                &request(
                    "Standard",
                    None,
                    vec![line(&f.product_a, 1, false, 100), line(&f.product_b, 1, false, 100)],
                ),
                &f.user_id,
                &PricingPolicy::default(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Core(CoreError::ProductNotFound(_))));
        assert_eq!(f.db.receipts().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_soft_delete_twice_is_not_found() {
        let f = fixture().await;
        let repo = f.db.receipts();
        let record = repo
            .create(
                &request("Standard", None, vec![line(&f.product_a, 1, false, 100)]),
                &f.user_id,
                &PricingPolicy::default(),
            )
            .await
            .unwrap();
        let id = record.receipt.receipt_id;

        repo.soft_delete(&id).await.unwrap();
        assert!(repo.get_by_id(&id).await.unwrap().is_none());
        assert!(repo.items(&id).await.unwrap().is_empty());
        assert!(matches!(repo.soft_delete(&id).await, Err(DbError::NotFound { .. })));
    }

    async fn standard_receipt(f: &Fixture) -> Receipt {
        f.db.receipts()
            .create(
                &request("Standard", None, vec![line(&f.product_a, 1, false, 100)]),
                &f.user_id,
                &PricingPolicy::default(),
            )
            .await
            .unwrap()
            .receipt
    }

    fn second_header(template: &Receipt) -> Receipt {
        Receipt {
            receipt_id: Uuid::new_v4().to_string(),
            ..template.clone()
        }
    }

    #[tokio::test]
    async fn test_deleted_receipt_number_stays_taken() {
        let f = fixture().await;
        let deleted = standard_receipt(&f).await;
        f.db.receipts().soft_delete(&deleted.receipt_id).await.unwrap();

        let taken = deleted.receipt_number.clone();
        let mut conn = f.db.pool().acquire().await.unwrap();
        let err = insert_header(&mut conn, &second_header(&deleted), |_| taken.clone())
            .await
            .unwrap_err();

        assert!(err.is_unique_violation_on("receipts.receipt_number"), "{err:?}");
    }

    #[tokio::test]
    async fn test_receipt_number_collision_retries() {
        let f = fixture().await;
        let existing = standard_receipt(&f).await;

        let mut numbers = vec![existing.receipt_number.clone(), "IN-01012030-0000000A".to_string()].into_iter();
        let mut calls = 0;
        let mut conn = f.db.pool().acquire().await.unwrap();
        let number = insert_header(&mut conn, &second_header(&existing), |at| {
            calls += 1;
            numbers.next().unwrap_or_else(|| generate_receipt_number(at))
        })
        .await
        .unwrap();
        drop(conn);

        assert_eq!(number, "IN-01012030-0000000A");
        assert_eq!(calls, 2);
        assert!(f.db.receipts().get_by_number(&number).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_find_receipts_by_window() {
        let f = fixture().await;
        let repo = f.db.receipts();
        for qty in 1..=3 {
            repo.create(
                &request("Standard", None, vec![line(&f.product_a, qty, false, 1_000)]),
                &f.user_id,
                &PricingPolicy::default(),
            )
            .await
            .unwrap();
        }

        let today = Utc::now().date_naive();
        let records = repo.receipts_on(today).await.unwrap();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.items.len() == 1));
        // newest first
        assert!(records[0].receipt.created_at >= records[2].receipt.created_at);
        assert_eq!(total_gross(&records).cents(), 6_600);

        let yesterday = today.pred_opt().unwrap();
        assert!(repo.receipts_on(yesterday).await.unwrap().is_empty());

        let mine = repo
            .find_receipts(&ReceiptFilter {
                window: None,
                created_by: Some(f.user_id.clone()),
            })
            .await
            .unwrap();
        assert_eq!(mine.len(), 3);

        let page = repo.list(PageRequest::new(1, 2), None).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 2);
    }

    #[test]
    fn test_receipt_number_format_and_uniqueness() {
        let at = Utc::now();
        let numbers: std::collections::HashSet<String> =
            (0..1_000).map(|_| generate_receipt_number(at)).collect();
        assert_eq!(numbers.len(), 1_000);
        assert!(numbers.iter().all(|n| is_receipt_number(n)));
        let expected_prefix = format!("IN-{}-", at.format("%d%m%Y"));
        assert!(numbers.iter().all(|n| n.starts_with(&expected_prefix)));
    }
}
