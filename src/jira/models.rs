//! Jira search response shapes and timestamp handling.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::activity::{ActivityKind, WorkItem};

pub(super) const PLATFORM: &str = "jira";

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiSearchResults {
    #[serde(default)]
    pub(super) issues: Vec<ApiIssue>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiIssue {
    pub(super) key: String,
    pub(super) fields: ApiIssueFields,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiIssueFields {
    #[serde(default)]
    pub(super) summary: String,
    /// Kept as text: Jira mixes `+0200` and `Z` offsets.
    #[serde(default)]
    pub(super) updated: String,
    pub(super) status: Option<ApiStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiStatus {
    pub(super) name: String,
}

impl ApiIssue {
    pub(super) fn updated_at(&self) -> Option<DateTime<Utc>> {
        parse_jira_timestamp(&self.fields.updated)
    }

    fn status_name(&self) -> &str {
        self.fields
            .status
            .as_ref()
            .map_or("Unknown", |status| status.name.as_str())
    }

    pub(super) fn into_work_item(self, base_url: &str, updated_at: DateTime<Utc>) -> WorkItem {
        let status = self.status_name().to_owned();
        WorkItem::new(
            format!("jira-{}", self.key),
            ActivityKind::JiraTicket,
            PLATFORM,
            format!("{}: {}", self.key, self.fields.summary),
            updated_at,
        )
        .with_description(format!("Status: {status}"))
        .with_url(format!("{base_url}/browse/{}", self.key))
        .with_tags([self.key, status])
    }
}

/// Parses the timestamp formats Jira emits.
///
/// Accepts `2025-08-20T18:41:17.540+0200` as well as RFC 3339 forms such as
/// `2025-08-20T18:41:17Z`.
pub(super) fn parse_jira_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.3f%z")
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}
