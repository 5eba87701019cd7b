//! Daily library crate aggregating work activity across services.
//!
//! Providers for GitHub, Jira, Confluence, and an Obsidian vault map their
//! records into normalised [`WorkItem`]s. The [`Aggregator`] merges them
//! into a [`Summary`] for a time window, the [`TodoCollector`] builds the
//! outstanding-work board, and the [`ReviewCollector`] lists pending review
//! requests enriched with CI status and diff statistics by a rate-limited
//! [`EnrichmentPool`]. A failing provider or enrichment call degrades the
//! output instead of aborting it.

pub mod activity;
pub mod config;
pub mod confluence;
pub mod error;
pub mod github;
pub mod jira;
pub mod obsidian;
pub mod provider;
pub mod review;
pub mod telemetry;
pub mod todo;

pub use activity::{ActivityKind, Summary, TimeWindow, WorkItem};
pub use config::{DailyConfig, OperationMode, OutputFormat};
pub use confluence::{ConfluenceProvider, ConfluenceSettings};
pub use error::DailyError;
pub use github::{GitHubProvider, GitHubSettings};
pub use jira::{JiraProvider, JiraSettings};
pub use obsidian::{ObsidianProvider, ObsidianSettings};
pub use provider::{Aggregation, Aggregator, Provider, ProviderError, ProviderOutcome};
pub use review::{
    EnrichedReview, EnrichmentOutcome, EnrichmentPool, EnrichmentSettings, ReviewBoard,
    ReviewCollector,
};
pub use telemetry::{NoopTelemetrySink, StderrJsonlTelemetrySink, TelemetryEvent, TelemetrySink};
pub use todo::{TodoBoard, TodoCollector, TodoSection, TodoSource};
