//! # Scheduled Alert Checker
//!
//! Once a day, on configured weekdays, looks at the previous business day's
//! receipts and tells the [`Notifier`] about it.
//!
//! ## Timeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  start() ──► tokio task                                                 │
//! │               │                                                         │
//! │               ├── next_run(now): next HH:MM (UTC) on a check day        │
//! │               ├── select! { sleep(until next_run), stop signal }        │
//! │               │        │                       │                        │
//! │               │        ▼                       ▼                        │
//! │               │  check_daily_receipts(now)   exit                       │
//! │               └── loop                                                  │
//! │                                                                         │
//! │  check_daily_receipts(now):                                             │
//! │    weekday(now) ∉ check_days ──► Skipped                                │
//! │    target = yesterday  (Monday: previous Friday)                        │
//! │    receipts(target) empty ──► send_no_receipts_alert                    │
//! │    otherwise, always_send_summary ──► send_daily_summary                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The check only reads. Running it twice for the same `now` sends the same
//! notifications twice and changes nothing else.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::SchedulerConfig;
use crate::error::ApiResult;
use crate::notifier::{DailyFigures, Notifier};
use billing_db::{total_gross, Database};

/// What one check did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CheckOutcome {
    /// Today is not a check day.
    Skipped { weekday: u32 },
    /// No receipts on the target date.
    NoReceipts { date: NaiveDate, notified: bool },
    /// Receipts exist on the target date.
    Receipts {
        date: NaiveDate,
        figures: DailyFigures,
        summary_sent: bool,
    },
}

/// Snapshot for the status call.
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub running: bool,
    pub recipients: Vec<String>,
    pub check_days: Vec<u32>,
    pub check_time: String,
    pub next_run: Option<DateTime<Utc>>,
}

struct RunningTask {
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Weekday index with Monday = 0.
pub fn weekday_index(at: DateTime<Utc>) -> u32 {
    at.weekday().num_days_from_monday()
}

/// The business day a check at `now` reports on.
pub fn target_date(now: DateTime<Utc>) -> NaiveDate {
    let back = if now.weekday() == Weekday::Mon { 3 } else { 1 };
    now.date_naive() - Duration::days(back)
}

/// First check time strictly after `now`, or None when no day is configured.
pub fn next_run(now: DateTime<Utc>, config: &SchedulerConfig) -> Option<DateTime<Utc>> {
    (0..=7).find_map(|offset| {
        let date = now.date_naive() + Duration::days(offset);
        if !config.check_days.contains(&date.weekday().num_days_from_monday()) {
            return None;
        }
        let at = date
            .and_hms_opt(config.check_hour, config.check_minute, 0)?
            .and_utc();
        (at > now).then_some(at)
    })
}

/// Daily receipt alert scheduler.
pub struct AlertScheduler {
    db: Database,
    notifier: Arc<dyn Notifier>,
    config: SchedulerConfig,
    currency: String,
    task: Mutex<Option<RunningTask>>,
}

impl std::fmt::Debug for AlertScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertScheduler")
            .field("config", &self.config)
            .field("currency", &self.currency)
            .finish_non_exhaustive()
    }
}

impl AlertScheduler {
    pub fn new(
        db: Database,
        notifier: Arc<dyn Notifier>,
        config: SchedulerConfig,
        currency: impl Into<String>,
    ) -> Self {
        AlertScheduler {
            db,
            notifier,
            config,
            currency: currency.into(),
            task: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Runs one check as if the clock read `now`.
    pub async fn check_daily_receipts(&self, now: DateTime<Utc>) -> ApiResult<CheckOutcome> {
        let weekday = weekday_index(now);
        if !self.config.check_days.contains(&weekday) {
            info!(weekday, "Skipping receipt check (not a check day)");
            return Ok(CheckOutcome::Skipped { weekday });
        }

        let date = target_date(now);
        let receipts = self.db.receipts().receipts_on(date).await?;
        let recipients = &self.config.recipients;

        if receipts.is_empty() {
            if recipients.is_empty() {
                warn!(%date, "No receipts found and no alert recipients configured");
                return Ok(CheckOutcome::NoReceipts { date, notified: false });
            }

            info!(%date, "No receipts found, sending alert");
            self.notifier.send_no_receipts_alert(recipients, date).await?;
            info!(recipients = recipients.len(), "Alert sent");
            return Ok(CheckOutcome::NoReceipts { date, notified: true });
        }

        let figures = DailyFigures {
            total_receipts: receipts.len() as i64,
            total_revenue: total_gross(&receipts),
        };
        info!(%date, total_receipts = figures.total_receipts, "Receipts found");

        let summary_sent = self.config.always_send_summary && !recipients.is_empty();
        if summary_sent {
            self.notifier
                .send_daily_summary(recipients, date, figures, &self.currency)
                .await?;
            info!("Daily summary sent");
        }

        Ok(CheckOutcome::Receipts {
            date,
            figures,
            summary_sent,
        })
    }

    /// Runs the check immediately for the current time.
    pub async fn trigger_check_now(&self) -> ApiResult<CheckOutcome> {
        info!("Manually triggering daily receipt check");
        self.check_daily_receipts(Utc::now()).await
    }

    /// Spawns the background task. Returns false when it was not started.
    pub async fn start(self: &Arc<Self>) -> bool {
        if self.config.recipients.is_empty() {
            warn!("No alert recipients configured, scheduler not started");
            return false;
        }
        if self.config.check_days.is_empty() {
            warn!("No check days configured, scheduler not started");
            return false;
        }

        let mut task = self.task.lock().await;
        if task.as_ref().is_some_and(|t| !t.handle.is_finished()) {
            return true;
        }

        let (stop, mut stop_rx) = watch::channel(false);
        let scheduler = Arc::clone(self);

        let handle = tokio::spawn(async move {
            loop {
                let now = Utc::now();
                let Some(next) = next_run(now, &scheduler.config) else {
                    break;
                };
                let wait = (next - now).to_std().unwrap_or_default();

                tokio::select! {
                    _ = tokio::time::sleep(wait) => {
                        if let Err(e) = scheduler.check_daily_receipts(Utc::now()).await {
                            warn!(error = %e, "Daily receipt check failed");
                        }
                    }
                    _ = stop_rx.changed() => break,
                }
            }
        });

        *task = Some(RunningTask { stop, handle });

        info!(
            check_time = %self.check_time(),
            check_days = ?self.config.check_days,
            "Scheduler started"
        );
        true
    }

    /// Signals the task to exit and waits for it.
    pub async fn stop(&self) {
        let running = self.task.lock().await.take();
        if let Some(task) = running {
            let _ = task.stop.send(true);
            let _ = task.handle.await;
            info!("Scheduler stopped");
        }
    }

    pub async fn is_running(&self) -> bool {
        self.task
            .lock()
            .await
            .as_ref()
            .is_some_and(|t| !t.handle.is_finished())
    }

    pub async fn status(&self) -> SchedulerStatus {
        let running = self.is_running().await;
        SchedulerStatus {
            running,
            recipients: self.config.recipients.clone(),
            check_days: self.config.check_days.clone(),
            check_time: self.check_time(),
            next_run: if running {
                next_run(Utc::now(), &self.config)
            } else {
                None
            },
        }
    }

    fn check_time(&self) -> String {
        format!("{:02}:{:02}", self.config.check_hour, self.config.check_minute)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::DailyFigures;
    use crate::test_support::{seed_catalog, RecordingNotifier, SentNotification};
    use billing_core::pricing::{LineRequest, NewReceipt};
    use billing_core::{Money, PricingPolicy};
    use billing_db::DbConfig;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn config(always_send_summary: bool) -> SchedulerConfig {
        SchedulerConfig {
            recipients: vec!["ops@example.com".to_string()],
            always_send_summary,
            ..SchedulerConfig::default()
        }
    }

    async fn scheduler(
        config: SchedulerConfig,
    ) -> (Arc<AlertScheduler>, Arc<RecordingNotifier>, Database) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let scheduler = Arc::new(AlertScheduler::new(db.clone(), notifier.clone(), config, "Rs"));
        (scheduler, notifier, db)
    }

    /// Creates a 270.00 + 10% receipt and moves it to `created_at`.
    async fn receipt_at(db: &Database, created_at: DateTime<Utc>) {
        let (user_id, prod_id) = seed_catalog(db).await;
        let record = db
            .receipts()
            .create(
                &NewReceipt {
                    recipient_name: "Jane".into(),
                    recipient_number: None,
                    package: "Standard".into(),
                    package_amt: None,
                    payment_mode: "Cash".into(),
                    transaction_number: None,
                    items: vec![LineRequest {
                        prod_id,
                        quantity: 3,
                        is_free: false,
                        vendor_price: Money::from_cents(9_000),
                    }],
                },
                &user_id,
                &PricingPolicy::default(),
            )
            .await
            .unwrap();
        sqlx::query("UPDATE receipts SET created_at = ?2 WHERE receipt_id = ?1")
            .bind(&record.receipt.receipt_id)
            .bind(created_at)
            .execute(db.pool())
            .await
            .unwrap();
    }

    #[test]
    fn test_target_date() {
        // Monday looks back to Friday
        assert_eq!(
            target_date(at("2025-09-29T23:30:00Z")),
            NaiveDate::from_ymd_opt(2025, 9, 26).unwrap()
        );
        // Wednesday looks back one day
        assert_eq!(
            target_date(at("2025-10-01T23:30:00Z")),
            NaiveDate::from_ymd_opt(2025, 9, 30).unwrap()
        );
    }

    #[test]
    fn test_next_run() {
        let weekdays = SchedulerConfig {
            check_days: vec![0, 1, 2, 3, 4],
            ..SchedulerConfig::default()
        };
        // Friday 23:45 is past the slot; next is Monday 23:30
        assert_eq!(
            next_run(at("2025-09-26T23:45:00Z"), &weekdays),
            Some(at("2025-09-29T23:30:00Z"))
        );
        // Same day, before the slot
        assert_eq!(
            next_run(at("2025-09-26T08:00:00Z"), &weekdays),
            Some(at("2025-09-26T23:30:00Z"))
        );
        let none = SchedulerConfig {
            check_days: vec![],
            ..SchedulerConfig::default()
        };
        assert_eq!(next_run(at("2025-09-26T08:00:00Z"), &none), None);
    }

    #[tokio::test]
    async fn test_skips_days_not_configured() {
        let (scheduler, notifier, _db) = scheduler(SchedulerConfig {
            check_days: vec![0],
            ..config(false)
        })
        .await;

        // Wednesday
        let outcome = scheduler
            .check_daily_receipts(at("2025-10-01T23:30:00Z"))
            .await
            .unwrap();
        assert_eq!(outcome, CheckOutcome::Skipped { weekday: 2 });
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_alerts_when_no_receipts() {
        let (scheduler, notifier, _db) = scheduler(config(false)).await;

        let outcome = scheduler
            .check_daily_receipts(at("2025-09-29T23:30:00Z"))
            .await
            .unwrap();

        let friday = NaiveDate::from_ymd_opt(2025, 9, 26).unwrap();
        assert_eq!(
            outcome,
            CheckOutcome::NoReceipts {
                date: friday,
                notified: true
            }
        );
        assert_eq!(
            notifier.sent(),
            vec![SentNotification::NoReceipts {
                recipients: vec!["ops@example.com".to_string()],
                date: friday
            }]
        );
    }

    #[tokio::test]
    async fn test_summary_for_previous_day() {
        let (scheduler, notifier, db) = scheduler(config(true)).await;
        receipt_at(&db, at("2025-09-30T10:15:00Z")).await;

        let outcome = scheduler
            .check_daily_receipts(at("2025-10-01T23:30:00Z"))
            .await
            .unwrap();

        let figures = DailyFigures {
            total_receipts: 1,
            total_revenue: Money::from_cents(29_700),
        };
        let tuesday = NaiveDate::from_ymd_opt(2025, 9, 30).unwrap();
        assert_eq!(
            outcome,
            CheckOutcome::Receipts {
                date: tuesday,
                figures,
                summary_sent: true
            }
        );
        assert_eq!(
            notifier.sent(),
            vec![SentNotification::Summary {
                date: tuesday,
                figures,
                currency: "Rs".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_quiet_when_receipts_and_no_summary() {
        let (scheduler, notifier, db) = scheduler(config(false)).await;
        receipt_at(&db, at("2025-09-30T10:15:00Z")).await;

        let first = scheduler
            .check_daily_receipts(at("2025-10-01T23:30:00Z"))
            .await
            .unwrap();
        let second = scheduler
            .check_daily_receipts(at("2025-10-01T23:30:00Z"))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert!(notifier.sent().is_empty());
        assert_eq!(db.receipts().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_start_stop_status() {
        let (scheduler, _notifier, _db) = scheduler(config(false)).await;

        assert!(!scheduler.status().await.running);
        assert!(scheduler.start().await);

        let status = scheduler.status().await;
        assert!(status.running);
        assert_eq!(status.check_time, "23:30");
        assert!(status.next_run.is_some());

        scheduler.stop().await;
        assert!(!scheduler.is_running().await);
    }

    #[tokio::test]
    async fn test_not_started_without_recipients() {
        let (scheduler, _notifier, _db) = scheduler(SchedulerConfig::default()).await;
        assert!(!scheduler.start().await);
        assert!(!scheduler.is_running().await);
    }
}
