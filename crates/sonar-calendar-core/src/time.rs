//! Calendar arithmetic for view filtering and month navigation.
//!
//! Views compare events against wall-clock windows in the reference date's
//! timezone: a "day" is the local calendar day, not the 24 hours following
//! the reference instant. [`TimeWindow`] therefore works on naive local
//! datetimes.

use chrono::{
    DateTime, Datelike, Days, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, Offset,
    TimeZone, Utc,
};
use serde::{Deserialize, Serialize};

/// A half-open `[start, end)` interval of local wall-clock time.
///
/// Windows touching the end of chrono's range are truncated at
/// `NaiveDateTime::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Start of the window (inclusive).
    pub start: NaiveDateTime,
    /// End of the window (exclusive).
    pub end: NaiveDateTime,
}

impl TimeWindow {
    /// Creates a new window, or `None` if `start` is after `end`.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    fn spanning(start: NaiveDateTime, days: u64) -> Self {
        let end = start
            .checked_add_days(Days::new(days))
            .unwrap_or(NaiveDateTime::MAX);
        Self { start, end }
    }

    /// The calendar day containing `date`.
    pub fn day(date: NaiveDate) -> Self {
        Self::spanning(date.and_time(NaiveTime::MIN), 1)
    }

    /// The Sunday-based week containing `date`.
    pub fn week(date: NaiveDate) -> Self {
        Self::spanning(start_of_week(date).and_time(NaiveTime::MIN), 7)
    }

    /// The calendar month containing `date`.
    pub fn month(date: NaiveDate) -> Self {
        let first = date.with_day(1).unwrap_or(date);
        let end = first
            .checked_add_months(Months::new(1))
            .map_or(NaiveDateTime::MAX, |next| next.and_time(NaiveTime::MIN));
        Self {
            start: first.and_time(NaiveTime::MIN),
            end,
        }
    }

    /// Returns the duration of this window.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Checks if a local datetime falls within this window.
    pub fn contains(&self, dt: NaiveDateTime) -> bool {
        self.start <= dt && dt < self.end
    }
}

/// Rolls `date` back to the most recent Sunday (itself if already Sunday).
///
/// Saturates at `NaiveDate::MIN`.
pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    let back = u64::from(date.weekday().num_days_from_sunday());
    date.checked_sub_days(Days::new(back))
        .unwrap_or(NaiveDate::MIN)
}

/// Converts an instant to wall-clock time in `tz`.
///
/// Returns `None` when the local time falls outside chrono's range, which
/// happens for instants at the very edge of it.
pub fn to_local<Tz: TimeZone>(instant: &DateTime<Utc>, tz: &Tz) -> Option<NaiveDateTime> {
    let utc = instant.naive_utc();
    let offset = tz.offset_from_utc_datetime(&utc).fix();
    utc.checked_add_signed(Duration::seconds(i64::from(offset.local_minus_utc())))
}

/// Moves `dt` by `months` calendar months, keeping the time of day.
///
/// The day of month is clamped to the last day of the target month
/// (Jan 31 + 1 month is Feb 28/29). Returns `None` when the result is out of
/// range or falls into a local time gap.
pub fn add_months<Tz: TimeZone>(dt: &DateTime<Tz>, months: i32) -> Option<DateTime<Tz>> {
    let step = Months::new(months.unsigned_abs());
    if months >= 0 {
        dt.clone().checked_add_months(step)
    } else {
        dt.clone().checked_sub_months(step)
    }
}
