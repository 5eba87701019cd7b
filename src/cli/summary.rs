//! Activity summary for a time window.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::io::{self, Write};

use chrono::{Local, TimeZone};
use daily::{Aggregation, DailyConfig, DailyError, OutputFormat, Summary, TimeWindow, WorkItem};
use serde::Serialize;

use super::output::{
    FailureReport, failure_reports, format_in, io_error, write_heading, write_item_details,
    write_json_to,
};
use super::providers::{Providers, telemetry_sink};

/// Aggregates activity for the configured window and writes it to stdout.
///
/// # Errors
///
/// Returns [`DailyError`] when the window cannot be parsed, a provider
/// cannot be built, or output cannot be written. Provider failures during
/// aggregation are reported in the output instead.
pub async fn run(config: &DailyConfig, format: OutputFormat) -> Result<(), DailyError> {
    let window = config.summary_window(Local::now())?;
    let providers = Providers::from_config(config)?;
    let aggregation = providers
        .aggregator(telemetry_sink(config.verbose))
        .collect(window)
        .await;

    let mut stdout = io::stdout().lock();
    match format {
        OutputFormat::Json => write_summary_json_to(&mut stdout, &aggregation),
        OutputFormat::Text if config.compact => {
            write_compact_summary_to(&mut stdout, &aggregation.summary, &Local)
        }
        OutputFormat::Text => write_summary_to(&mut stdout, &aggregation.summary, &Local),
    }
}

/// Summary counts included in JSON output.
#[derive(Debug, Serialize)]
struct Totals<'a> {
    total: usize,
    by_platform: BTreeMap<&'a str, usize>,
    by_kind: BTreeMap<&'static str, usize>,
}

#[derive(Debug, Serialize)]
struct SummaryReport<'a> {
    window: &'a TimeWindow,
    items: &'a [WorkItem],
    totals: Totals<'a>,
    failures: Vec<FailureReport<'a>>,
}

/// Writes the aggregation as pretty-printed JSON.
pub fn write_summary_json_to<W: Write>(
    writer: &mut W,
    aggregation: &Aggregation,
) -> Result<(), DailyError> {
    let summary = &aggregation.summary;
    let totals = Totals {
        total: summary.len(),
        by_platform: summary
            .group_by_platform()
            .into_iter()
            .map(|(platform, items)| (platform, items.len()))
            .collect(),
        by_kind: summary
            .group_by_kind()
            .into_iter()
            .map(|(kind, items)| (kind.as_str(), items.len()))
            .collect(),
    };
    let report = SummaryReport {
        window: summary.window(),
        items: summary.items(),
        totals,
        failures: failure_reports(&aggregation.outcomes),
    };
    write_json_to(writer, &report)
}

/// Writes the summary grouped by platform, one block per item.
pub fn write_summary_to<W, Tz>(
    writer: &mut W,
    summary: &Summary,
    zone: &Tz,
) -> Result<(), DailyError>
where
    W: Write,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    writeln!(writer, "{}", title(summary.window(), zone)).map_err(|e| io_error(&e))?;
    if summary.is_empty() {
        writeln!(writer, "No activity found in this window.").map_err(|e| io_error(&e))?;
        return Ok(());
    }

    let groups = summary.group_by_platform();
    writeln!(
        writer,
        "Found {} items across {} platforms",
        summary.len(),
        groups.len()
    )
    .map_err(|e| io_error(&e))?;

    for (platform, mut items) in groups {
        items.sort_by_key(|item| item.updated_at);
        writeln!(writer).map_err(|e| io_error(&e))?;
        write_heading(writer, &format!("{platform} ({})", items.len()))?;
        for item in items {
            writeln!(
                writer,
                "  {}  [{}] {}",
                format_in(item.updated_at, zone, "%H:%M"),
                item.kind.as_str(),
                item.title
            )
            .map_err(|e| io_error(&e))?;
            write_item_details(writer, item)?;
        }
    }
    Ok(())
}

/// Writes one line per item in time order.
pub fn write_compact_summary_to<W, Tz>(
    writer: &mut W,
    summary: &Summary,
    zone: &Tz,
) -> Result<(), DailyError>
where
    W: Write,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    writeln!(
        writer,
        "{} - {} items",
        title(summary.window(), zone),
        summary.len()
    )
    .map_err(|e| io_error(&e))?;

    let mut items: Vec<&WorkItem> = summary.items().iter().collect();
    items.sort_by_key(|item| item.updated_at);
    for item in items {
        writeln!(
            writer,
            "{} {} {} {}",
            format_in(item.updated_at, zone, "%H:%M"),
            item.platform,
            item.kind.as_str(),
            item.title
        )
        .map_err(|e| io_error(&e))?;
    }
    Ok(())
}

fn title<Tz>(window: &TimeWindow, zone: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if window.is_single_day() {
        return format!(
            "Daily summary for {}",
            format_in(window.from(), zone, "%Y-%m-%d")
        );
    }
    format!(
        "Summary from {} to {}",
        format_in(window.from(), zone, "%Y-%m-%d %H:%M"),
        format_in(window.to(), zone, "%Y-%m-%d %H:%M")
    )
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeDelta, TimeZone, Utc};
    use daily::{
        ActivityKind, Aggregation, ProviderError, ProviderOutcome, Summary, TimeWindow, WorkItem,
    };
    use rstest::{fixture, rstest};
    use serde_json::Value;

    use super::{write_compact_summary_to, write_summary_json_to, write_summary_to};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 4, hour, 0, 0)
            .single()
            .expect("valid time")
    }

    #[fixture]
    fn summary() -> Summary {
        let window = TimeWindow::new(at(0), at(0) + TimeDelta::days(1));
        Summary::new(
            window,
            vec![
                WorkItem::new("github-pr-7", ActivityKind::PullRequest, "github", "Fix", at(15))
                    .with_url("https://github.com/octo/repo/pull/7"),
                WorkItem::new("github-commit-a", ActivityKind::Commit, "github", "Init", at(9)),
                WorkItem::new("jira-OPS-1", ActivityKind::JiraTicket, "jira", "OPS-1", at(11))
                    .with_description("Status: Done"),
            ],
        )
    }

    fn render<F>(write: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> Result<(), daily::DailyError>,
    {
        let mut buffer = Vec::new();
        write(&mut buffer).expect("should write output");
        String::from_utf8(buffer).expect("output should be valid UTF-8")
    }

    #[rstest]
    fn groups_by_platform_in_time_order(summary: Summary) {
        let output = render(|buffer| write_summary_to(buffer, &summary, &Utc));

        assert!(output.starts_with("Daily summary for 2025-03-04\n"), "{output}");
        assert!(output.contains("Found 3 items across 2 platforms"), "{output}");
        let commit = output.find("09:00  [commit] Init").expect("commit line");
        let pull = output.find("15:00  [pull_request] Fix").expect("pull request line");
        let jira = output.find("jira (1)").expect("jira heading");
        assert!(commit < pull && pull < jira, "{output}");
        assert!(output.contains("         Status: Done\n"), "{output}");
        assert!(output.contains("https://github.com/octo/repo/pull/7"), "{output}");
    }

    #[rstest]
    fn compact_output_is_one_line_per_item(summary: Summary) {
        let output = render(|buffer| write_compact_summary_to(buffer, &summary, &Utc));

        let lines: Vec<_> = output.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Daily summary for 2025-03-04 - 3 items",
                "09:00 github commit Init",
                "11:00 jira jira_ticket OPS-1",
                "15:00 github pull_request Fix",
            ]
        );
    }

    #[rstest]
    fn empty_summary_says_so() {
        let window = TimeWindow::new(at(0), at(6));
        let empty = Summary::new(window, Vec::new());

        let output = render(|buffer| write_summary_to(buffer, &empty, &Utc));

        assert_eq!(
            output,
            "Summary from 2025-03-04 00:00 to 2025-03-04 06:00\nNo activity found in this window.\n"
        );
    }

    #[rstest]
    fn json_reports_totals_and_failures(summary: Summary) {
        let aggregation = Aggregation {
            summary,
            outcomes: vec![ProviderOutcome::Failed {
                provider: "confluence",
                error: ProviderError::Authentication {
                    message: "bad token".to_owned(),
                },
            }],
        };

        let output = render(|buffer| write_summary_json_to(buffer, &aggregation));

        let json: Value = serde_json::from_str(&output).expect("output should be JSON");
        assert_eq!(json["totals"]["total"], 3);
        assert_eq!(json["totals"]["by_platform"]["github"], 2);
        assert_eq!(json["totals"]["by_kind"]["jira_ticket"], 1);
        assert_eq!(json["failures"][0]["provider"], "confluence");
        assert_eq!(json["failures"][0]["error"]["kind"], "authentication");
        assert_eq!(json["items"][0]["id"], "github-pr-7");
    }
}
