//! Search query construction for the GitHub search API.

use chrono::{TimeDelta, TimeZone};

use crate::activity::TimeWindow;

/// Date qualifier for `created:` and `committer-date:` searches.
///
/// A one-day window yields its date; anything else yields `from..to` with
/// the inclusive last day. Dates are rendered in `zone`.
pub(super) fn date_qualifier<Tz: TimeZone>(window: &TimeWindow, zone: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let from = window.from().with_timezone(zone).format("%Y-%m-%d");
    if window.is_single_day() {
        return from.to_string();
    }
    let end = window.to();
    let last_second = end.checked_sub_signed(TimeDelta::seconds(1)).unwrap_or(end);
    let to = last_second.with_timezone(zone).format("%Y-%m-%d");
    format!("{from}..{to}")
}

/// Joins search terms and appends the configured filter, if any.
pub(super) fn with_filter(terms: &str, filter: Option<&str>) -> String {
    filter
        .map(str::trim)
        .filter(|extra| !extra.is_empty())
        .map_or_else(|| terms.to_owned(), |extra| format!("{terms} {extra}"))
}
