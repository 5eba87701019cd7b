//! Provider construction from configuration.

use std::sync::Arc;

use daily::{
    Aggregator, ConfluenceProvider, DailyConfig, DailyError, GitHubProvider, JiraProvider,
    NoopTelemetrySink, ObsidianProvider, StderrJsonlTelemetrySink, TelemetrySink, TodoCollector,
};

/// Every provider the CLI knows about, built from one configuration.
///
/// Disabled or incomplete providers are still built; they report
/// themselves as unconfigured and are skipped by the collectors.
pub struct Providers {
    /// GitHub activity, todos, and review requests.
    pub github: GitHubProvider,
    /// Jira tickets.
    pub jira: JiraProvider,
    /// Obsidian notes and tasks.
    pub obsidian: ObsidianProvider,
    /// Confluence contributions and mentions.
    pub confluence: ConfluenceProvider,
}

impl Providers {
    /// Builds every provider from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`DailyError::Provider`] when an enabled provider has a URL
    /// that cannot be used.
    pub fn from_config(config: &DailyConfig) -> Result<Self, DailyError> {
        Ok(Self {
            github: GitHubProvider::new(config.github_settings())?,
            jira: JiraProvider::new(config.jira_settings())?,
            obsidian: ObsidianProvider::new(config.obsidian_settings()),
            confluence: ConfluenceProvider::new(config.confluence_settings())?,
        })
    }

    /// Aggregator querying GitHub, Jira, Obsidian, then Confluence.
    pub fn aggregator(&self, sink: Arc<dyn TelemetrySink>) -> Aggregator {
        Aggregator::new()
            .with_sink(sink)
            .with_provider(Box::new(self.github.clone()))
            .with_provider(Box::new(self.jira.clone()))
            .with_provider(Box::new(self.obsidian.clone()))
            .with_provider(Box::new(self.confluence.clone()))
    }

    /// Todo collector over the same providers, in the same order.
    pub fn todo_collector(&self, sink: Arc<dyn TelemetrySink>) -> TodoCollector {
        TodoCollector::new()
            .with_sink(sink)
            .with_source(Box::new(self.github.clone()))
            .with_source(Box::new(self.jira.clone()))
            .with_source(Box::new(self.obsidian.clone()))
            .with_source(Box::new(self.confluence.clone()))
    }
}

/// Telemetry sink for the run: JSON lines on stderr when verbose.
pub fn telemetry_sink(verbose: bool) -> Arc<dyn TelemetrySink> {
    if verbose {
        Arc::new(StderrJsonlTelemetrySink)
    } else {
        Arc::new(NoopTelemetrySink)
    }
}
