//! Receipt service implementation.
//!
//! ```text
//! create(caller, NewReceipt)
//!      │
//!      ├── validate_new_receipt()      400 on bad shape, duplicate products
//!      │
//!      ▼
//! receipts().create()                  one transaction: price + insert
//!      │
//!      └── ProductNotFound ──► 404     nothing written
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::AppState;
use billing_core::dashboard::{
    group_by_day, parse_date_range, receipt_product_breakdown, receipt_statistics, search_receipts,
    DateWindow, DayGroup, ReceiptProductLine, ReceiptStatistics,
};
use billing_core::pricing::NewReceipt;
use billing_core::validation::{validate_new_receipt, validate_search_query};
use billing_core::{Identity, Page, PageRequest, Receipt, ReceiptItem, ReceiptRecord};
use billing_db::ReceiptFilter;

pub struct ReceiptService {
    state: Arc<AppState>,
}

impl ReceiptService {
    pub fn new(state: Arc<AppState>) -> Self {
        ReceiptService { state }
    }

    // =========================================================================
    // Writes
    // =========================================================================

    pub async fn create(&self, caller: &Identity, request: NewReceipt) -> ApiResult<ReceiptRecord> {
        validate_new_receipt(&request, &self.state.policy.bundle_name)?;

        let record = self
            .state
            .db
            .receipts()
            .create(&request, &caller.user_id, &self.state.policy)
            .await?;

        info!(
            receipt_number = %record.receipt.receipt_number,
            gross = %record.receipt.gross_amount,
            created_by = %caller.user_id,
            "Receipt created"
        );
        Ok(record)
    }

    /// Soft-deletes a receipt and its items. A second delete is NotFound.
    pub async fn delete(&self, receipt_id: &str) -> ApiResult<()> {
        self.state.db.receipts().soft_delete(receipt_id).await?;
        info!(receipt_id = %receipt_id, "Receipt deleted");
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Receipt headers, newest first. `created_by` narrows to one creator.
    pub async fn list(&self, page: PageRequest, created_by: Option<&str>) -> ApiResult<Page<Receipt>> {
        page.validate()?;
        Ok(self.state.db.receipts().list(page, created_by).await?)
    }

    pub async fn get(&self, receipt_id: &str) -> ApiResult<ReceiptRecord> {
        self.state
            .db
            .receipts()
            .get_by_id(receipt_id)
            .await?
            .ok_or_else(not_found)
    }

    pub async fn get_by_number(&self, receipt_number: &str) -> ApiResult<ReceiptRecord> {
        self.state
            .db
            .receipts()
            .get_by_number(receipt_number)
            .await?
            .ok_or_else(not_found)
    }

    pub async fn items(&self, receipt_id: &str) -> ApiResult<Vec<ReceiptItem>> {
        Ok(self.get(receipt_id).await?.items)
    }

    pub async fn statistics(&self, receipt_id: &str) -> ApiResult<ReceiptStatistics> {
        Ok(receipt_statistics(&self.get(receipt_id).await?.items))
    }

    /// Items grouped by product and compared with the current catalog price.
    pub async fn product_breakdown(&self, receipt_id: &str) -> ApiResult<Vec<ReceiptProductLine>> {
        let record = self.get(receipt_id).await?;
        let catalog = self.state.db.products().list_active().await?;
        Ok(receipt_product_breakdown(&record.items, &catalog))
    }

    /// Free-text search over number, creator and product names, optionally
    /// bounded by `YYYY-MM-DD` dates (end inclusive).
    pub async fn search(
        &self,
        query: &str,
        start_date: Option<&str>,
        end_date: Option<&str>,
        page: PageRequest,
    ) -> ApiResult<Page<ReceiptRecord>> {
        let query = validate_search_query(query)?;
        page.validate()?;
        let records = self.load_range(start_date, end_date).await?;
        Ok(search_receipts(&records, &query, page, &self.state.policy.bundle_name))
    }

    /// Today's receipts grouped by day.
    pub async fn today(&self, now: DateTime<Utc>) -> ApiResult<Vec<DayGroup>> {
        let window = DateWindow::for_day(now.date_naive());
        let records = self
            .state
            .db
            .receipts()
            .find_receipts(&ReceiptFilter::window(window))
            .await?;
        Ok(group_by_day(&records))
    }

    /// All receipts in the optional date range grouped by day, newest first.
    pub async fn by_day(&self, start_date: Option<&str>, end_date: Option<&str>) -> ApiResult<Vec<DayGroup>> {
        let records = self.load_range(start_date, end_date).await?;
        Ok(group_by_day(&records))
    }

    async fn load_range(&self, start_date: Option<&str>, end_date: Option<&str>) -> ApiResult<Vec<ReceiptRecord>> {
        let (start, end) = parse_date_range(start_date, end_date)?;

        let filter = match (start, end) {
            (Some(start), Some(end)) => ReceiptFilter::window(DateWindow::new(start, end)),
            _ => ReceiptFilter::all(),
        };
        let mut records = self.state.db.receipts().find_receipts(&filter).await?;

        // one open side
        records.retain(|r| {
            start.map_or(true, |s| r.receipt.created_at >= s) && end.map_or(true, |e| r.receipt.created_at < e)
        });
        Ok(records)
    }
}

fn not_found() -> ApiError {
    ApiError::NotFound("Receipt not found".to_string())
}
