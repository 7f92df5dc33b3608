//! Period windows and the pure arithmetic behind report metrics.
//!
//! Window rules differ per period token and are not interchangeable:
//! `this_month` and `this_year` compare calendar units, while `3_months` and
//! `6_months` compare rolling spans ending now. All windows filter on
//! `submitted_at` in UTC and are half-open.

use chrono::{Datelike, Duration, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::lifecycle::ComplaintStatus;
use crate::types::{DbId, StatusId, Timestamp};

/// Number of months in the charting series.
pub const MONTHLY_SERIES_LEN: u32 = 6;

/// Name reported when a period has no complaints.
pub const NO_DATA_LABEL: &str = "No data";

/// Calendar years accepted in caller-supplied dates.
pub const MIN_YEAR: i32 = 1900;
pub const MAX_YEAR: i32 = 9999;

// ---------------------------------------------------------------------------
// Periods and windows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PeriodToken {
    #[default]
    #[serde(rename = "this_month")]
    ThisMonth,
    #[serde(rename = "3_months")]
    ThreeMonths,
    #[serde(rename = "6_months")]
    SixMonths,
    #[serde(rename = "this_year")]
    ThisYear,
}

impl PeriodToken {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ThisMonth => "this_month",
            Self::ThreeMonths => "3_months",
            Self::SixMonths => "6_months",
            Self::ThisYear => "this_year",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "this_month" => Ok(Self::ThisMonth),
            "3_months" => Ok(Self::ThreeMonths),
            "6_months" => Ok(Self::SixMonths),
            "this_year" => Ok(Self::ThisYear),
            other => Err(CoreError::Validation(format!(
                "Unknown period '{other}'. Must be one of: this_month, 3_months, 6_months, this_year"
            ))),
        }
    }
}

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, CoreError> {
        check_year("start_date", start)?;
        check_year("end_date", end)?;
        if start > end {
            return Err(CoreError::Validation(format!(
                "start_date {start} must not be after end_date {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// The same range as a half-open timestamp window.
    pub fn window(self) -> Window {
        Window {
            start: midnight(self.start),
            end: Some(midnight(self.end + Duration::days(1))),
        }
    }
}

/// Reject dates outside `MIN_YEAR..=MAX_YEAR`. Window arithmetic on such
/// dates can leave chrono's range.
pub fn check_year(field: &str, date: NaiveDate) -> Result<NaiveDate, CoreError> {
    if (MIN_YEAR..=MAX_YEAR).contains(&date.year()) {
        Ok(date)
    } else {
        Err(CoreError::Validation(format!(
            "{field} {date} must fall between years {MIN_YEAR} and {MAX_YEAR}"
        )))
    }
}

/// What a report covers: a named period or explicit dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportPeriod {
    Token(PeriodToken),
    Range(DateRange),
}

impl Default for ReportPeriod {
    fn default() -> Self {
        Self::Token(PeriodToken::default())
    }
}

/// Half-open `[start, end)` window over `submitted_at`. `end = None` is
/// unbounded above.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    pub start: Timestamp,
    pub end: Option<Timestamp>,
}

impl Window {
    pub fn contains(&self, at: Timestamp) -> bool {
        at >= self.start && self.end.map_or(true, |end| at < end)
    }
}

/// The current window and the immediately preceding one it is compared to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WindowPair {
    pub current: Window,
    pub previous: Window,
}

pub fn windows(period: ReportPeriod, now: Timestamp) -> WindowPair {
    match period {
        ReportPeriod::Token(PeriodToken::ThisMonth) => {
            let start = month_start(now.date_naive());
            let next = start + Months::new(1);
            let prev = start - Months::new(1);
            WindowPair {
                current: bounded(start, next),
                previous: bounded(prev, start),
            }
        }
        ReportPeriod::Token(PeriodToken::ThreeMonths) => rolling(now, 3),
        ReportPeriod::Token(PeriodToken::SixMonths) => rolling(now, 6),
        ReportPeriod::Token(PeriodToken::ThisYear) => {
            let start = year_start(now.date_naive());
            let next = start + Months::new(12);
            let prev = start - Months::new(12);
            WindowPair {
                current: bounded(start, next),
                previous: bounded(prev, start),
            }
        }
        ReportPeriod::Range(range) => {
            let current = range.window();
            let length = range.end - range.start + Duration::days(1);
            let previous = DateRange {
                start: range.start - length,
                end: range.start - Duration::days(1),
            };
            WindowPair {
                current,
                previous: previous.window(),
            }
        }
    }
}

fn rolling(now: Timestamp, months: u32) -> WindowPair {
    let current_start = now - Months::new(months);
    let previous_start = now - Months::new(months * 2);
    WindowPair {
        current: Window {
            start: current_start,
            end: None,
        },
        previous: Window {
            start: previous_start,
            end: Some(current_start),
        },
    }
}

fn bounded(start: NaiveDate, end: NaiveDate) -> Window {
    Window {
        start: midnight(start),
        end: Some(midnight(end)),
    }
}

fn midnight(date: NaiveDate) -> Timestamp {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn year_start(date: NaiveDate) -> NaiveDate {
    date.with_ordinal(1).unwrap_or(date)
}

fn month_end(date: NaiveDate) -> NaiveDate {
    month_start(date) + Months::new(1) - Duration::days(1)
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl ReportKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            other => Err(CoreError::Validation(format!(
                "Unknown report kind '{other}'. Must be one of: daily, weekly, monthly, yearly"
            ))),
        }
    }

    /// The calendar unit containing `today` (weeks run Monday to Sunday).
    pub fn natural_range(self, today: NaiveDate) -> DateRange {
        match self {
            Self::Daily => DateRange {
                start: today,
                end: today,
            },
            Self::Weekly => {
                let start =
                    today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
                DateRange {
                    start,
                    end: start + Duration::days(6),
                }
            }
            Self::Monthly => DateRange {
                start: month_start(today),
                end: month_end(today),
            },
            Self::Yearly => {
                let start = year_start(today);
                DateRange {
                    start,
                    end: start + Months::new(12) - Duration::days(1),
                }
            }
        }
    }
}

/// Dates recorded on a snapshot.
///
/// Explicit dates win; a period token maps to whole months ending with the
/// current one; with neither, the kind's own calendar unit is used.
pub fn snapshot_range(kind: ReportKind, period: Option<ReportPeriod>, now: Timestamp) -> DateRange {
    let today = now.date_naive();
    match period {
        Some(ReportPeriod::Range(range)) => range,
        Some(ReportPeriod::Token(token)) => {
            let end = month_end(today);
            let start = match token {
                PeriodToken::ThisMonth => month_start(today),
                PeriodToken::ThreeMonths => month_start(today - Months::new(3)),
                PeriodToken::SixMonths => month_start(today - Months::new(6)),
                PeriodToken::ThisYear => year_start(today),
            };
            let end = match token {
                PeriodToken::ThisYear => start + Months::new(12) - Duration::days(1),
                _ => end,
            };
            DateRange { start, end }
        }
        None => kind.natural_range(today),
    }
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Round half away from zero to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn percent(part: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    round1(part as f64 / total as f64 * 100.0)
}

pub fn completion_rate(completed: i64, total: i64) -> f64 {
    percent(completed, total)
}

/// Share of complaints that reached any terminal outcome.
pub fn efficiency(completed: i64, rejected: i64, total: i64) -> f64 {
    percent(completed + rejected, total)
}

/// Mean of whole-day durations given their sum and count.
pub fn average_days(sum_days: i64, count: i64) -> f64 {
    if count <= 0 {
        return 0.0;
    }
    round1(sum_days as f64 / count as f64)
}

/// Complaint counts by status group over one window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub total: i64,
    pub waiting: i64,
    pub in_progress: i64,
    pub completed: i64,
    pub rejected: i64,
}

impl StatusCounts {
    /// Fold `(status_id, count)` rows into status groups. Unknown ids only
    /// add to `total`.
    pub fn tally(rows: &[(StatusId, i64)]) -> Self {
        rows.iter().fold(Self::default(), |mut acc, (id, n)| {
            acc.total += n;
            match ComplaintStatus::from_id(*id) {
                Some(ComplaintStatus::Waiting) => acc.waiting += n,
                Some(ComplaintStatus::Completed) => acc.completed += n,
                Some(ComplaintStatus::Rejected) => acc.rejected += n,
                Some(status) if ComplaintStatus::IN_PROGRESS_GROUP.contains(&status) => {
                    acc.in_progress += n
                }
                _ => {}
            }
            acc
        })
    }

    pub fn completion_rate(&self) -> f64 {
        completion_rate(self.completed, self.total)
    }

    pub fn efficiency(&self) -> f64 {
        efficiency(self.completed, self.rejected, self.total)
    }

    pub fn breakdown(&self) -> StatusBreakdown {
        StatusBreakdown {
            completed: Share::of(self.completed, self.total),
            in_progress: Share::of(self.in_progress, self.total),
            waiting: Share::of(self.waiting, self.total),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Share {
    pub count: i64,
    pub percent: f64,
}

impl Share {
    fn of(count: i64, total: i64) -> Self {
        Self {
            count,
            percent: percent(count, total),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatusBreakdown {
    pub completed: Share,
    pub in_progress: Share,
    pub waiting: Share,
}

// ---------------------------------------------------------------------------
// Trending category
// ---------------------------------------------------------------------------

/// Per-category complaint count inside a window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCount {
    pub category_id: DbId,
    pub name: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendingCategory {
    pub category_id: Option<DbId>,
    pub name: String,
    pub total: i64,
}

impl TrendingCategory {
    pub fn no_data() -> Self {
        Self {
            category_id: None,
            name: NO_DATA_LABEL.to_string(),
            total: 0,
        }
    }
}

/// Highest count wins; ties go to the lowest category id.
pub fn trending_category(counts: &[CategoryCount]) -> TrendingCategory {
    counts
        .iter()
        .filter(|c| c.count > 0)
        .min_by(|a, b| b.count.cmp(&a.count).then(a.category_id.cmp(&b.category_id)))
        .map(|c| TrendingCategory {
            category_id: Some(c.category_id),
            name: c.name.clone(),
            total: c.count,
        })
        .unwrap_or_else(TrendingCategory::no_data)
}

// ---------------------------------------------------------------------------
// Trends
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendDelta {
    pub current: f64,
    pub previous: f64,
    pub delta_percent: f64,
    pub direction: TrendDirection,
}

/// Relative change from `previous` to `current`, in percent.
///
/// A zero `previous` yields a zero delta (and so `Stable`), matching how an
/// empty preceding period is shown.
pub fn trend(current: f64, previous: f64) -> TrendDelta {
    let delta_percent = if previous == 0.0 {
        0.0
    } else {
        round1((current - previous) / previous * 100.0)
    };
    let direction = if delta_percent > 0.0 {
        TrendDirection::Up
    } else if delta_percent < 0.0 {
        TrendDirection::Down
    } else {
        TrendDirection::Stable
    };
    TrendDelta {
        current,
        previous,
        delta_percent,
        direction,
    }
}

// ---------------------------------------------------------------------------
// Monthly series
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyPoint {
    /// Short month name, e.g. `"Jan"`.
    pub month: String,
    pub year: i32,
    /// Full label, e.g. `"January 2026"`.
    pub label: String,
    pub total: i64,
}

/// Start of the oldest month in the series ending with the month of `now`.
pub fn monthly_series_start(now: Timestamp) -> Timestamp {
    midnight(month_start(now.date_naive()) - Months::new(MONTHLY_SERIES_LEN - 1))
}

/// Build the fixed-length series, oldest first. `counts` holds
/// `(year, month, total)` for months that had complaints; others are zero.
pub fn monthly_series(now: Timestamp, counts: &[(i32, u32, i64)]) -> Vec<MonthlyPoint> {
    let first = month_start(now.date_naive()) - Months::new(MONTHLY_SERIES_LEN - 1);
    (0..MONTHLY_SERIES_LEN)
        .map(|offset| {
            let month = first + Months::new(offset);
            let total = counts
                .iter()
                .filter(|(y, m, _)| *y == month.year() && *m == month.month())
                .map(|(_, _, n)| n)
                .sum();
            MonthlyPoint {
                month: month.format("%b").to_string(),
                year: month.year(),
                label: month.format("%B %Y").to_string(),
                total,
            }
        })
        .collect()
}
