//! Alert delivery.
//!
//! The scheduler talks to a [`Notifier`]; [`LogNotifier`] renders the
//! messages and emits them as tracing events.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::error::ApiResult;
use billing_core::Money;

/// Figures reported in the daily summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyFigures {
    pub total_receipts: i64,
    pub total_revenue: Money,
}

/// A rendered plain-text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub subject: String,
    pub body: String,
}

/// Outbound alert channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_no_receipts_alert(&self, recipients: &[String], date: NaiveDate) -> ApiResult<()>;

    async fn send_daily_summary(
        &self,
        recipients: &[String],
        date: NaiveDate,
        figures: DailyFigures,
        currency: &str,
    ) -> ApiResult<()>;
}

fn long_date(date: NaiveDate) -> String {
    date.format("%B %d, %Y").to_string()
}

pub fn no_receipts_message(date: NaiveDate) -> Message {
    let date_str = long_date(date);
    Message {
        subject: format!("No Receipts Generated - {date_str}"),
        body: format!(
            "No Receipt Alert\n\nDate: {date_str} ({})\n\nNo receipts were generated for this day.\n",
            date.format("%A")
        ),
    }
}

pub fn daily_summary_message(date: NaiveDate, figures: DailyFigures, currency: &str) -> Message {
    let date_str = long_date(date);
    let average = Money::mean(figures.total_revenue, figures.total_receipts.max(0) as usize);
    Message {
        subject: format!("Daily Summary - {date_str}"),
        body: format!(
            "Daily Summary Report\n\nDate: {date_str} ({})\n\nTotal Receipts: {}\nTotal Revenue: {}\nAvg / Receipt: {}\n",
            date.format("%A"),
            figures.total_receipts,
            figures.total_revenue.format_with(currency),
            average.format_with(currency),
        ),
    }
}

/// Writes alerts to the log instead of sending mail.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_no_receipts_alert(&self, recipients: &[String], date: NaiveDate) -> ApiResult<()> {
        let message = no_receipts_message(date);
        info!(
            recipients = %recipients.join(","),
            subject = %message.subject,
            body = %message.body,
            "Alert notification"
        );
        Ok(())
    }

    async fn send_daily_summary(
        &self,
        recipients: &[String],
        date: NaiveDate,
        figures: DailyFigures,
        currency: &str,
    ) -> ApiResult<()> {
        let message = daily_summary_message(date, figures, currency);
        info!(
            recipients = %recipients.join(","),
            subject = %message.subject,
            total_receipts = figures.total_receipts,
            body = %message.body,
            "Summary notification"
        );
        Ok(())
    }
}
