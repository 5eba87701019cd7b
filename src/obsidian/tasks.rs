//! Open-task extraction from Markdown notes.
//!
//! A task is a list item whose checkbox is empty (`[ ]`) or in progress
//! (`[/]`). Bullets may be `-`, `*`, or `+`, or a number followed by a dot.
//! Lines inside fenced code blocks and block quotes never count.

use std::sync::LazyLock;

use regex::Regex;

/// Bulleted or numbered list item with an empty or in-progress checkbox.
#[expect(clippy::expect_used, reason = "literal pattern is exercised by unit tests")]
static OPEN_TASK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[-*+]|\d+\.)\s*\[(?:\s|/)\]\s*(.+)$").expect("valid task pattern")
});

#[expect(clippy::expect_used, reason = "literal pattern is exercised by unit tests")]
static HASHTAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#([A-Za-z0-9_-]+)").expect("valid hashtag pattern"));

/// One open task found in a note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct OpenTask {
    /// One-based line number of the task.
    pub(super) line: usize,
    /// Task text with surrounding whitespace removed.
    pub(super) text: String,
}

/// Returns every open task in `content`, in line order.
pub(super) fn open_tasks(content: &str) -> Vec<OpenTask> {
    let mut in_code_block = false;
    let mut tasks = Vec::new();
    for (offset, line) in content.lines().enumerate() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") {
            in_code_block = !in_code_block;
            continue;
        }
        if in_code_block || trimmed.starts_with('>') {
            continue;
        }
        if let Some(text) = task_text(line) {
            tasks.push(OpenTask {
                line: offset.saturating_add(1),
                text: text.to_owned(),
            });
        }
    }
    tasks
}

/// Text of an open task, or `None` when the line is not one.
fn task_text(line: &str) -> Option<&str> {
    let text = OPEN_TASK.captures(line)?.get(1)?.as_str().trim();
    (!text.is_empty()).then_some(text)
}

/// Tags derived from a task's text.
///
/// Hashtags come first in order of appearance, followed by `high-priority`
/// (🔥 or the word "urgent"), `starred` (⭐), and `scheduled` (📅, ⏰, 🕐).
pub(super) fn task_tags(text: &str) -> Vec<String> {
    let mut tags: Vec<String> = HASHTAG
        .captures_iter(text)
        .filter_map(|found| found.get(1))
        .map(|tag| tag.as_str().to_owned())
        .collect();
    if text.contains('🔥') || text.contains("urgent") {
        tags.push("high-priority".to_owned());
    }
    if text.contains('⭐') {
        tags.push("starred".to_owned());
    }
    if ['📅', '⏰', '🕐'].iter().any(|marker| text.contains(*marker)) {
        tags.push("scheduled".to_owned());
    }
    tags
}
