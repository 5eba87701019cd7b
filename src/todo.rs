//! Pending work gathered from every todo-capable provider.
//!
//! Todo collection follows the aggregator's rules: unconfigured sources are
//! skipped, a failing source contributes nothing, and sections keep source
//! registration order.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::activity::WorkItem;
use crate::provider::{ProviderError, ProviderOutcome};
use crate::telemetry::{NoopTelemetrySink, TelemetryEvent, TelemetrySink};

/// A titled group of pending items from one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TodoSection {
    /// Name of the source that produced the section.
    pub source: String,
    /// Heading, e.g. `Open pull requests`.
    pub title: String,
    /// Items in the order the source returned them.
    pub items: Vec<WorkItem>,
}

impl TodoSection {
    /// Creates a section.
    #[must_use]
    pub fn new(source: &str, title: &str, items: Vec<WorkItem>) -> Self {
        Self {
            source: source.to_owned(),
            title: title.to_owned(),
            items,
        }
    }
}

/// A provider that can list outstanding work.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TodoSource: Send + Sync {
    /// Short lowercase name, e.g. `jira`.
    fn name(&self) -> &'static str;

    /// Returns true when the source has everything it needs to run.
    fn is_configured(&self) -> bool;

    /// Lists the source's pending items grouped into sections.
    async fn todo_sections(&self) -> Result<Vec<TodoSection>, ProviderError>;
}

/// Every section gathered in one todo run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TodoBoard {
    /// Sections in source registration order.
    pub sections: Vec<TodoSection>,
}

impl TodoBoard {
    /// Total number of items across sections.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.sections.iter().map(|section| section.items.len()).sum()
    }

    /// Returns true when no section has any items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.item_count() == 0
    }
}

/// Queries todo sources in order and merges their sections.
pub struct TodoCollector {
    sources: Vec<Box<dyn TodoSource>>,
    sink: Arc<dyn TelemetrySink>,
}

impl Default for TodoCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl TodoCollector {
    /// Creates a collector with no sources.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            sink: Arc::new(NoopTelemetrySink),
        }
    }

    /// Replaces the telemetry sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.sink = sink;
        self
    }

    /// Registers a source after those already registered.
    #[must_use]
    pub fn with_source(mut self, source: Box<dyn TodoSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Registers a source after those already registered.
    pub fn add_source(&mut self, source: Box<dyn TodoSource>) {
        self.sources.push(source);
    }

    /// Builds the board and the outcome for each source.
    pub async fn collect(&self) -> (TodoBoard, Vec<ProviderOutcome>) {
        let mut board = TodoBoard::default();
        let mut outcomes = Vec::with_capacity(self.sources.len());

        for source in &self.sources {
            let name = source.name();
            if !source.is_configured() {
                tracing::debug!(provider = name, "todo source not configured, skipping");
                self.sink.record(TelemetryEvent::ProviderSkipped {
                    provider: name.to_owned(),
                });
                outcomes.push(ProviderOutcome::Skipped { provider: name });
                continue;
            }

            match source.todo_sections().await {
                Ok(sections) => {
                    let items = sections.iter().map(|section| section.items.len()).sum();
                    tracing::debug!(provider = name, items, "todo source returned items");
                    self.sink.record(TelemetryEvent::ProviderCompleted {
                        provider: name.to_owned(),
                        items,
                    });
                    board.sections.extend(sections);
                    outcomes.push(ProviderOutcome::Completed {
                        provider: name,
                        items,
                    });
                }
                Err(error) => {
                    tracing::warn!(provider = name, %error, "todo source failed");
                    self.sink.record(TelemetryEvent::ProviderFailed {
                        provider: name.to_owned(),
                        reason: error.to_string(),
                    });
                    outcomes.push(ProviderOutcome::Failed {
                        provider: name,
                        error,
                    });
                }
            }
        }

        (board, outcomes)
    }
}
