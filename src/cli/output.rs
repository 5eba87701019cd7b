//! Output formatting utilities shared by the command handlers.

use std::fmt::Display;
use std::io::{self, Write};

use chrono::{DateTime, TimeZone, Utc};
use daily::{DailyError, ProviderError, ProviderOutcome, WorkItem};
use serde::Serialize;

/// Width of the rule printed under section headings.
const RULE_WIDTH: usize = 60;
const DETAIL_INDENT: &str = "         ";

/// A provider failure as it appears in JSON output.
#[derive(Debug, Serialize)]
pub struct FailureReport<'a> {
    /// Provider name.
    pub provider: &'static str,
    /// The failure the provider reported.
    pub error: &'a ProviderError,
}

/// Collects the failures from a run's provider outcomes.
pub fn failure_reports(outcomes: &[ProviderOutcome]) -> Vec<FailureReport<'_>> {
    outcomes
        .iter()
        .filter_map(|outcome| match outcome {
            ProviderOutcome::Failed { provider, error } => Some(FailureReport {
                provider: *provider,
                error,
            }),
            ProviderOutcome::Skipped { .. } | ProviderOutcome::Completed { .. } => None,
        })
        .collect()
}

/// Writes `value` as pretty-printed JSON followed by a newline.
pub fn write_json_to<W, T>(writer: &mut W, value: &T) -> Result<(), DailyError>
where
    W: Write,
    T: Serialize,
{
    serde_json::to_writer_pretty(&mut *writer, value).map_err(|error| DailyError::Io {
        message: error.to_string(),
    })?;
    writeln!(writer).map_err(|e| io_error(&e))
}

/// Writes a section heading and the rule beneath it.
pub fn write_heading<W: Write>(writer: &mut W, heading: &str) -> Result<(), DailyError> {
    writeln!(writer, "{heading}").map_err(|e| io_error(&e))?;
    writeln!(writer, "{}", "─".repeat(RULE_WIDTH)).map_err(|e| io_error(&e))
}

/// Writes an item's description, URL, and tags on indented lines, skipping
/// whichever are empty.
pub fn write_item_details<W: Write>(writer: &mut W, item: &WorkItem) -> Result<(), DailyError> {
    if !item.description.is_empty() {
        writeln!(writer, "{DETAIL_INDENT}{}", item.description).map_err(|e| io_error(&e))?;
    }
    if let Some(url) = &item.url {
        writeln!(writer, "{DETAIL_INDENT}{url}").map_err(|e| io_error(&e))?;
    }
    if !item.tags.is_empty() {
        writeln!(writer, "{DETAIL_INDENT}tags: {}", item.tags.join(", "))
            .map_err(|e| io_error(&e))?;
    }
    Ok(())
}

/// Writes one indented detail line.
pub fn write_detail_line<W: Write>(writer: &mut W, line: &str) -> Result<(), DailyError> {
    writeln!(writer, "{DETAIL_INDENT}{line}").map_err(|e| io_error(&e))
}

/// Formats `instant` in `zone` with a `chrono` format string.
pub fn format_in<Tz>(instant: DateTime<Utc>, zone: &Tz, pattern: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    instant.with_timezone(zone).format(pattern).to_string()
}

/// Converts an I/O error to a [`DailyError::Io`].
pub fn io_error(error: &io::Error) -> DailyError {
    DailyError::Io {
        message: error.to_string(),
    }
}
