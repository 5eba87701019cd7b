//! Half-open time windows and the user-facing strings that produce them.

use chrono::{DateTime, Days, Local, Months, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DailyError;

/// A `[from, to)` window in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    from: DateTime<Utc>,
    to: DateTime<Utc>,
}

impl TimeWindow {
    /// Creates a window from explicit bounds.
    #[must_use]
    pub const fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    /// Covers one calendar day in the local time zone, starting at local
    /// midnight and lasting 24 hours.
    ///
    /// # Errors
    ///
    /// Returns [`DailyError::InvalidDate`] when the day has no successor in
    /// the supported calendar range.
    pub fn for_day(date: NaiveDate) -> Result<Self, DailyError> {
        let out_of_range = || DailyError::InvalidDate {
            value: date.to_string(),
        };
        date.succ_opt().ok_or_else(out_of_range)?;
        let midnight = date.and_time(NaiveTime::MIN);
        let from = Local
            .from_local_datetime(&midnight)
            .earliest()
            .map_or_else(
                || Utc.from_utc_datetime(&midnight),
                |local| local.with_timezone(&Utc),
            );
        let to = from
            .checked_add_signed(TimeDelta::days(1))
            .ok_or_else(out_of_range)?;
        Ok(Self { from, to })
    }

    /// Inclusive lower bound.
    #[must_use]
    pub const fn from(&self) -> DateTime<Utc> {
        self.from
    }

    /// Exclusive upper bound.
    #[must_use]
    pub const fn to(&self) -> DateTime<Utc> {
        self.to
    }

    /// Returns true when `instant` lies inside the window.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.from <= instant && instant < self.to
    }

    /// Returns true when the window spans exactly one day.
    #[must_use]
    pub fn is_single_day(&self) -> bool {
        self.to - self.from == TimeDelta::days(1)
    }
}

/// Parses a `--date` value relative to `today`.
///
/// # Errors
///
/// Returns [`DailyError::InvalidDate`] for anything other than `today`,
/// `yesterday`, or an ISO `YYYY-MM-DD` date.
pub fn parse_date(value: &str, today: NaiveDate) -> Result<NaiveDate, DailyError> {
    let invalid = || DailyError::InvalidDate {
        value: value.to_owned(),
    };
    match value.trim() {
        "today" => Ok(today),
        "yesterday" => today.pred_opt().ok_or_else(invalid),
        other => NaiveDate::parse_from_str(other, "%Y-%m-%d").map_err(|_| invalid()),
    }
}

/// Parses a `--since` value such as `3h`, `1d`, `2w`, or `1m` into the
/// window ending at `now`.
///
/// # Errors
///
/// Returns [`DailyError::InvalidSince`] when the value is malformed, uses an
/// unknown unit, or reaches before the representable date range.
pub fn parse_since(value: &str, now: DateTime<Utc>) -> Result<TimeWindow, DailyError> {
    let invalid = || DailyError::InvalidSince {
        value: value.to_owned(),
    };
    let trimmed = value.trim();
    let unit = trimmed.chars().last().ok_or_else(invalid)?;
    let digits = trimmed.strip_suffix(unit).ok_or_else(invalid)?;
    if digits.is_empty() || !digits.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(invalid());
    }
    let amount: u32 = digits.parse().map_err(|_| invalid())?;

    let from = match unit {
        'h' => TimeDelta::try_hours(i64::from(amount))
            .and_then(|delta| now.checked_sub_signed(delta)),
        'd' => now.checked_sub_days(Days::new(u64::from(amount))),
        'w' => now.checked_sub_days(Days::new(u64::from(amount).saturating_mul(7))),
        'm' => now.checked_sub_months(Months::new(amount)),
        _ => None,
    }
    .ok_or_else(invalid)?;

    Ok(TimeWindow::new(from, now))
}
