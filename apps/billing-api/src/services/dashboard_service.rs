//! Dashboard service implementation.
//!
//! ```text
//! period, start_date?, end_date?, aggregate?
//!      │
//!      ▼
//! DashboardPeriod::parse ──► DashboardQuery (window, granularity)
//!                            aggregate overrides the automatic bucket size
//!      │
//!      ├── find_receipts(current window)
//!      ├── find_receipts(previous window)      skipped for "all"
//!      ▼
//! build_dashboard() ──► DashboardOutcome ──► render_workbook() (export)
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::ApiResult;
use crate::export::{render_workbook, ExportedReport};
use crate::AppState;
use billing_core::dashboard::{
    build_dashboard, DashboardOutcome, DashboardPeriod, DashboardQuery, Granularity,
};
use billing_db::ReceiptFilter;

/// Result of an export request.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExportOutcome {
    NoData { message: String },
    Workbook(ExportedReport),
}

pub struct DashboardService {
    state: Arc<AppState>,
}

impl DashboardService {
    pub fn new(state: Arc<AppState>) -> Self {
        DashboardService { state }
    }

    /// Builds the dashboard for `period` (`today`, `7`, `30`, `custom`, `all`)
    /// as seen at `now`.
    ///
    /// `aggregate` (`hour`, `day`, `week`, `month`) fixes the series bucket
    /// size; without it the size follows the window length.
    pub async fn dashboard(
        &self,
        period: &str,
        start_date: Option<&str>,
        end_date: Option<&str>,
        aggregate: Option<&str>,
        now: DateTime<Utc>,
    ) -> ApiResult<DashboardOutcome> {
        let period = DashboardPeriod::parse(period, start_date, end_date)?;
        let mut query = DashboardQuery::new(
            period,
            now,
            self.state.config.bundle_name.clone(),
            self.state.config.currency_symbol.clone(),
        );
        if let Some(aggregate) = aggregate {
            query = query.with_granularity(aggregate.parse::<Granularity>()?);
        }

        let receipts = self.state.db.receipts();
        let current = match query.window {
            Some(window) => receipts.find_receipts(&ReceiptFilter::window(window)).await?,
            None => receipts.find_receipts(&ReceiptFilter::all()).await?,
        };
        let previous = match query.previous_window() {
            Some(window) => receipts.find_receipts(&ReceiptFilter::window(window)).await?,
            None => Vec::new(),
        };

        debug!(
            period = %query.period_label(),
            current = current.len(),
            previous = previous.len(),
            "Building dashboard"
        );
        Ok(build_dashboard(&current, &previous, &query))
    }

    /// The dashboard for `period` rendered as an xlsx workbook.
    pub async fn export(
        &self,
        period: &str,
        start_date: Option<&str>,
        end_date: Option<&str>,
        aggregate: Option<&str>,
        now: DateTime<Utc>,
    ) -> ApiResult<ExportOutcome> {
        match self.dashboard(period, start_date, end_date, aggregate, now).await? {
            DashboardOutcome::NoData { message } => Ok(ExportOutcome::NoData { message }),
            DashboardOutcome::Report(report) => {
                let workbook = render_workbook(&report, &self.state.config.currency_symbol)?;
                info!(period = %report.period_label, receipts = report.summary.total_receipts, "Dashboard exported");
                Ok(ExportOutcome::Workbook(workbook))
            }
        }
    }
}
