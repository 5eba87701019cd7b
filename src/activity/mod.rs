//! Normalised work items and the per-window summaries built from them.
//!
//! Every provider maps its own records into [`WorkItem`]s so that the
//! aggregation pipeline and the renderers never need to know which service
//! an item came from.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod window;

pub use window::{TimeWindow, parse_date, parse_since};

/// Category of a work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    /// A commit authored by the user.
    Commit,
    /// A pull request authored by or requested from the user.
    PullRequest,
    /// A generic issue.
    Issue,
    /// A Jira ticket.
    JiraTicket,
    /// A note edited in a notes vault.
    Note,
    /// An open task found in a notes vault.
    Task,
    /// A Confluence page the user contributed to.
    ConfluenceContribution,
    /// A page or comment mentioning the user.
    Mention,
}

impl ActivityKind {
    /// Returns the serialised name of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Commit => "commit",
            Self::PullRequest => "pull_request",
            Self::Issue => "issue",
            Self::JiraTicket => "jira_ticket",
            Self::Note => "note",
            Self::Task => "task",
            Self::ConfluenceContribution => "confluence_contribution",
            Self::Mention => "mention",
        }
    }
}

/// One unit of work, normalised across providers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Provider-scoped identifier, e.g. `github-pr-42`.
    pub id: String,
    /// Item category.
    pub kind: ActivityKind,
    /// Name of the platform that produced the item.
    pub platform: String,
    /// Short human-readable title.
    pub title: String,
    /// Longer description, possibly empty.
    pub description: String,
    /// Link to the item, when the platform has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Last time the item changed.
    pub updated_at: DateTime<Utc>,
    /// Ordered labels attached by the provider.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl WorkItem {
    /// Creates an item with an empty description, no URL, and no tags.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        kind: ActivityKind,
        platform: &str,
        title: impl Into<String>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            platform: platform.to_owned(),
            title: title.into(),
            description: String::new(),
            url: None,
            updated_at,
            tags: Vec::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Replaces the tag list.
    #[must_use]
    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Work items gathered from every provider for one time window.
///
/// Items keep provider registration order, then the order each provider
/// returned them in. A summary is built once per aggregation and not
/// modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    window: TimeWindow,
    items: Vec<WorkItem>,
}

impl Summary {
    /// Creates a summary for the window from already-merged items.
    #[must_use]
    pub const fn new(window: TimeWindow, items: Vec<WorkItem>) -> Self {
        Self { window, items }
    }

    /// The window the summary covers.
    #[must_use]
    pub const fn window(&self) -> &TimeWindow {
        &self.window
    }

    /// All items, in insertion order.
    #[must_use]
    pub fn items(&self) -> &[WorkItem] {
        &self.items
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true when no provider contributed anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Groups items by platform name, keeping insertion order in each group.
    #[must_use]
    pub fn group_by_platform(&self) -> BTreeMap<&str, Vec<&WorkItem>> {
        let mut groups: BTreeMap<&str, Vec<&WorkItem>> = BTreeMap::new();
        for item in &self.items {
            groups.entry(item.platform.as_str()).or_default().push(item);
        }
        groups
    }

    /// Groups items by kind, keeping insertion order in each group.
    #[must_use]
    pub fn group_by_kind(&self) -> BTreeMap<ActivityKind, Vec<&WorkItem>> {
        let mut groups: BTreeMap<ActivityKind, Vec<&WorkItem>> = BTreeMap::new();
        for item in &self.items {
            groups.entry(item.kind).or_default().push(item);
        }
        groups
    }
}
