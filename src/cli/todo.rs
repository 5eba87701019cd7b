//! Outstanding work across every todo-capable provider.

use std::fmt::Display;
use std::io::{self, Write};

use chrono::{Local, TimeZone};
use daily::{DailyConfig, DailyError, OutputFormat, ProviderOutcome, TodoBoard, TodoSection};
use serde::Serialize;

use super::output::{
    FailureReport, failure_reports, format_in, io_error, write_heading, write_item_details,
    write_json_to,
};
use super::providers::{Providers, telemetry_sink};

/// Collects the todo board and writes it to stdout.
///
/// # Errors
///
/// Returns [`DailyError`] when a provider cannot be built or output cannot
/// be written. Failing sources are reported in the output instead.
pub async fn run(config: &DailyConfig, format: OutputFormat) -> Result<(), DailyError> {
    let providers = Providers::from_config(config)?;
    let (board, outcomes) = providers
        .todo_collector(telemetry_sink(config.verbose))
        .collect()
        .await;

    let mut stdout = io::stdout().lock();
    match format {
        OutputFormat::Json => write_todo_json_to(&mut stdout, &board, &outcomes),
        OutputFormat::Text => write_todo_to(&mut stdout, &board, config.compact, &Local),
    }
}

#[derive(Debug, Serialize)]
struct TodoReport<'a> {
    sections: &'a [TodoSection],
    total: usize,
    failures: Vec<FailureReport<'a>>,
}

/// Writes the board as pretty-printed JSON.
pub fn write_todo_json_to<W: Write>(
    writer: &mut W,
    board: &TodoBoard,
    outcomes: &[ProviderOutcome],
) -> Result<(), DailyError> {
    let report = TodoReport {
        sections: &board.sections,
        total: board.item_count(),
        failures: failure_reports(outcomes),
    };
    write_json_to(writer, &report)
}

/// Writes each non-empty section with its items, most recently updated
/// first. Compact output drops the per-item detail lines.
pub fn write_todo_to<W, Tz>(
    writer: &mut W,
    board: &TodoBoard,
    compact: bool,
    zone: &Tz,
) -> Result<(), DailyError>
where
    W: Write,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    writeln!(writer, "Todo").map_err(|e| io_error(&e))?;
    if board.is_empty() {
        writeln!(writer, "No pending items found.").map_err(|e| io_error(&e))?;
        return Ok(());
    }
    writeln!(writer, "Found {} pending items", board.item_count()).map_err(|e| io_error(&e))?;

    for section in board.sections.iter().filter(|section| !section.items.is_empty()) {
        writeln!(writer).map_err(|e| io_error(&e))?;
        write_heading(
            writer,
            &format!(
                "{}: {} ({})",
                section.source,
                section.title,
                section.items.len()
            ),
        )?;
        let mut items: Vec<_> = section.items.iter().collect();
        items.sort_by(|left, right| right.updated_at.cmp(&left.updated_at));
        for item in items {
            writeln!(
                writer,
                "  {}  {}",
                format_in(item.updated_at, zone, "%b %d %H:%M"),
                item.title
            )
            .map_err(|e| io_error(&e))?;
            if !compact {
                write_item_details(writer, item)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use daily::{ActivityKind, ProviderError, ProviderOutcome, TodoBoard, TodoSection, WorkItem};
    use rstest::{fixture, rstest};
    use serde_json::Value;

    use super::{write_todo_json_to, write_todo_to};

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, 9, 30, 0)
            .single()
            .expect("valid time")
    }

    #[fixture]
    fn board() -> TodoBoard {
        let older = WorkItem::new("github-pr-1", ActivityKind::PullRequest, "github", "Old", at(1))
            .with_description("octo/repo");
        let newer = WorkItem::new("github-pr-2", ActivityKind::PullRequest, "github", "New", at(3));
        TodoBoard {
            sections: vec![
                TodoSection::new("github", "Open pull requests", vec![older, newer]),
                TodoSection::new("github", "Pending reviews", Vec::new()),
            ],
        }
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
    fn lists_newest_items_first(board: TodoBoard) {
        let output = render(|buffer| write_todo_to(buffer, &board, false, &Utc));

        assert!(output.contains("Found 2 pending items"), "{output}");
        assert!(output.contains("github: Open pull requests (2)"), "{output}");
        assert!(!output.contains("Pending reviews"), "{output}");
        let newer = output.find("Mar 03 09:30  New").expect("newer item");
        let older = output.find("Mar 01 09:30  Old").expect("older item");
        assert!(newer < older, "{output}");
        assert!(output.contains("         octo/repo\n"), "{output}");
    }

    #[rstest]
    fn compact_output_drops_details(board: TodoBoard) {
        let output = render(|buffer| write_todo_to(buffer, &board, true, &Utc));

        assert!(!output.contains("octo/repo"), "{output}");
    }

    #[rstest]
    fn empty_board_says_so() {
        let output = render(|buffer| write_todo_to(buffer, &TodoBoard::default(), false, &Utc));

        assert_eq!(output, "Todo\nNo pending items found.\n");
    }

    #[rstest]
    fn json_includes_total_and_failures(board: TodoBoard) {
        let outcomes = vec![ProviderOutcome::Failed {
            provider: "jira",
            error: ProviderError::not_configured("jira"),
        }];

        let output = render(|buffer| write_todo_json_to(buffer, &board, &outcomes));

        let json: Value = serde_json::from_str(&output).expect("output should be JSON");
        assert_eq!(json["total"], 2);
        assert_eq!(json["sections"][0]["title"], "Open pull requests");
        assert_eq!(json["failures"][0]["provider"], "jira");
    }
}
