//! Date windows, dashboard periods and date-bound parsing.
//!
//! ## Windows
//! A [`DateWindow`] is half-open: `[start, end)`. The comparison window for
//! trends is the one immediately before it with the same length:
//! ```text
//!            previous                 current
//!   ├──────────────────────┼──────────────────────┤
//! start-d                start                   end        d = end - start
//! ```
//! A window shorter than one day ("today so far", or a zero-length range)
//! is compared against the full day before it.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};

/// Date format accepted for `start_date` / `end_date`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// =============================================================================
// DateWindow
// =============================================================================

/// A half-open time range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        DateWindow { start, end }
    }

    /// The whole calendar day `[date 00:00, date+1 00:00)`.
    pub fn for_day(date: NaiveDate) -> Self {
        let start = start_of_day(date);
        DateWindow {
            start,
            end: start + Duration::days(1),
        }
    }

    /// Calendar days `first..=last`, both inclusive.
    pub fn for_days(first: NaiveDate, last: NaiveDate) -> Self {
        DateWindow {
            start: start_of_day(first),
            end: start_of_day(last) + Duration::days(1),
        }
    }

    #[inline]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at < self.end
    }

    #[inline]
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// The preceding window of identical length, at least one day long.
    ///
    /// ## Example
    /// ```rust
    /// use billing_core::dashboard::DateWindow;
    /// use chrono::NaiveDate;
    ///
    /// let d = |day| NaiveDate::from_ymd_opt(2025, 9, day).unwrap();
    /// let week = DateWindow::for_days(d(8), d(14));
    /// assert_eq!(week.previous(), DateWindow::for_days(d(1), d(7)));
    /// ```
    pub fn previous(&self) -> DateWindow {
        let length = self.duration().max(Duration::days(1));
        DateWindow {
            start: self.start - length,
            end: self.start,
        }
    }

    /// Human label such as `2025-09-01 to 2025-09-07`.
    pub fn label(&self) -> String {
        let first = self.start.date_naive();
        // end is exclusive; step back to the last covered instant
        let last = (self.end - Duration::seconds(1)).date_naive().max(first);
        if first == last {
            first.format(DATE_FORMAT).to_string()
        } else {
            format!("{} to {}", first.format(DATE_FORMAT), last.format(DATE_FORMAT))
        }
    }
}

/// Midnight UTC at the start of `date`.
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

// =============================================================================
// Parsing
// =============================================================================

/// Parses a `YYYY-MM-DD` bound, naming the field on failure.
pub fn parse_date_bound(field: &str, value: &str) -> CoreResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| CoreError::InvalidDateFormat {
        field: field.to_string(),
    })
}

/// Parses optional `start_date` / `end_date` strings into a window.
///
/// The end date is inclusive (the window runs to the following midnight).
/// A missing bound leaves that side open, represented by `None` in the
/// returned pair.
pub fn parse_date_range(
    start_date: Option<&str>,
    end_date: Option<&str>,
) -> CoreResult<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)> {
    let start = start_date
        .filter(|s| !s.trim().is_empty())
        .map(|s| parse_date_bound("start_date", s))
        .transpose()?
        .map(start_of_day);
    let end = end_date
        .filter(|s| !s.trim().is_empty())
        .map(|s| parse_date_bound("end_date", s))
        .transpose()?
        .map(|d| start_of_day(d) + Duration::days(1));
    Ok((start, end))
}

// =============================================================================
// Dashboard Period
// =============================================================================

/// The `period` selector of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardPeriod {
    /// Midnight to now.
    Today,
    /// The last 7 × 24 hours.
    Last7Days,
    /// The last 30 × 24 hours.
    Last30Days,
    /// Calendar days `start..=end`.
    Custom { start: NaiveDate, end: NaiveDate },
    /// Every receipt ever created.
    All,
}

impl DashboardPeriod {
    /// Parses the `period` value (`today`, `7`, `30`, `custom`, `all`).
    ///
    /// `custom` requires both dates.
    pub fn parse(period: &str, start_date: Option<&str>, end_date: Option<&str>) -> CoreResult<Self> {
        match period.trim().to_lowercase().as_str() {
            "today" => Ok(DashboardPeriod::Today),
            "7" => Ok(DashboardPeriod::Last7Days),
            "30" => Ok(DashboardPeriod::Last30Days),
            "" | "all" => Ok(DashboardPeriod::All),
            "custom" => {
                let start = start_date.ok_or_else(|| ValidationError::Required {
                    field: "start_date".to_string(),
                })?;
                let end = end_date.ok_or_else(|| ValidationError::Required {
                    field: "end_date".to_string(),
                })?;
                let start = parse_date_bound("start_date", start)?;
                let end = parse_date_bound("end_date", end)?;
                if end < start {
                    return Err(ValidationError::InvalidFormat {
                        field: "end_date".to_string(),
                        reason: "must not be before start_date".to_string(),
                    }
                    .into());
                }
                Ok(DashboardPeriod::Custom { start, end })
            }
            other => Err(ValidationError::InvalidFormat {
                field: "period".to_string(),
                reason: format!("'{}' is not one of today, 7, 30, custom, all", other),
            }
            .into()),
        }
    }

    /// Resolves the period against the current time. `All` has no window.
    pub fn window(&self, now: DateTime<Utc>) -> Option<DateWindow> {
        match self {
            DashboardPeriod::Today => Some(DateWindow::new(start_of_day(now.date_naive()), now)),
            DashboardPeriod::Last7Days => Some(DateWindow::new(now - Duration::days(7), now)),
            DashboardPeriod::Last30Days => Some(DateWindow::new(now - Duration::days(30), now)),
            DashboardPeriod::Custom { start, end } => Some(DateWindow::for_days(*start, *end)),
            DashboardPeriod::All => None,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_previous_window_same_length() {
        let window = DateWindow::new(at("2025-09-10T00:00:00Z"), at("2025-09-20T00:00:00Z"));
        let prev = window.previous();
        assert_eq!(prev.start, at("2025-08-31T00:00:00Z"));
        assert_eq!(prev.end, window.start);
    }

    #[test]
    fn test_previous_window_zero_length_is_one_day() {
        let instant = at("2025-09-26T00:00:00Z");
        let prev = DateWindow::new(instant, instant).previous();
        assert_eq!(prev.start, at("2025-09-25T00:00:00Z"));
        assert_eq!(prev.end, instant);
    }

    #[test]
    fn test_today_compares_against_yesterday() {
        let now = at("2025-09-26T14:30:00Z");
        let today = DashboardPeriod::Today.window(now).unwrap();
        assert_eq!(today.start, at("2025-09-26T00:00:00Z"));
        assert_eq!(today.previous(), DateWindow::for_day(date(2025, 9, 25)));
    }

    #[test]
    fn test_contains_is_half_open() {
        let day = DateWindow::for_day(date(2025, 9, 26));
        assert!(day.contains(at("2025-09-26T00:00:00Z")));
        assert!(day.contains(at("2025-09-26T23:59:59Z")));
        assert!(!day.contains(at("2025-09-27T00:00:00Z")));
    }

    #[test]
    fn test_parse_date_bound() {
        assert_eq!(parse_date_bound("start_date", "2025-09-26").unwrap(), date(2025, 9, 26));

        let err = parse_date_bound("end_date", "26/09/2025").unwrap_err();
        assert_eq!(err.to_string(), "Invalid end_date format. Use YYYY-MM-DD");
    }

    #[test]
    fn test_parse_date_range_end_inclusive() {
        let (start, end) = parse_date_range(Some("2025-09-01"), Some("2025-09-01")).unwrap();
        assert_eq!(start, Some(at("2025-09-01T00:00:00Z")));
        assert_eq!(end, Some(at("2025-09-02T00:00:00Z")));

        assert_eq!(parse_date_range(None, Some("")).unwrap(), (None, None));
        assert!(parse_date_range(Some("bad"), None).is_err());
    }

    #[test]
    fn test_period_parse() {
        assert_eq!(DashboardPeriod::parse("today", None, None).unwrap(), DashboardPeriod::Today);
        assert_eq!(DashboardPeriod::parse("7", None, None).unwrap(), DashboardPeriod::Last7Days);
        assert_eq!(DashboardPeriod::parse("all", None, None).unwrap(), DashboardPeriod::All);
        assert_eq!(
            DashboardPeriod::parse("custom", Some("2025-09-01"), Some("2025-09-07")).unwrap(),
            DashboardPeriod::Custom {
                start: date(2025, 9, 1),
                end: date(2025, 9, 7)
            }
        );

        assert!(DashboardPeriod::parse("custom", Some("2025-09-01"), None).is_err());
        assert!(DashboardPeriod::parse("custom", Some("2025-09-07"), Some("2025-09-01")).is_err());
        assert!(matches!(
            DashboardPeriod::parse("custom", Some("x"), Some("2025-09-01")),
            Err(CoreError::InvalidDateFormat { field }) if field == "start_date"
        ));
        assert!(DashboardPeriod::parse("weekly", None, None).is_err());
    }

    #[test]
    fn test_window_label() {
        assert_eq!(DateWindow::for_day(date(2025, 9, 26)).label(), "2025-09-26");
        assert_eq!(
            DateWindow::for_days(date(2025, 9, 1), date(2025, 9, 7)).label(),
            "2025-09-01 to 2025-09-07"
        );
    }
}
