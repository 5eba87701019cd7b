//! Jira integration over the REST search API.
//!
//! Activities are tickets assigned to the current user that were updated
//! inside the window; the todo list is every assigned ticket that is not
//! finished yet.

mod models;

use async_trait::async_trait;
use chrono::{Local, TimeZone, Utc};

use crate::activity::{TimeWindow, WorkItem};
use crate::provider::{BasicAuthClient, Provider, ProviderError};
use crate::todo::{TodoSection, TodoSource};

use models::{ApiIssue, ApiSearchResults, PLATFORM};

const SEARCH_PATH: &str = "/rest/api/3/search";
const SEARCH_FIELDS: &str = "key,summary,status,updated,assignee";
const TODO_PAGE_SIZE: &str = "50";
const OPEN_TICKETS_JQL: &str =
    "assignee = currentUser() AND status NOT IN (Done, Closed, Resolved)";

/// Connection settings for [`JiraProvider`].
#[derive(Clone, Default)]
pub struct JiraSettings {
    /// Whether the integration is switched on.
    pub enabled: bool,
    /// Site URL, e.g. `https://acme.atlassian.net`.
    pub url: Option<String>,
    /// Account email used for basic authentication.
    pub email: Option<String>,
    /// API token paired with `email`.
    pub token: Option<String>,
    /// Extra JQL `AND`-ed onto every query, e.g. `project = OPS`.
    pub filter: Option<String>,
}

/// Jira provider for summaries and todos.
#[derive(Debug, Clone)]
pub struct JiraProvider {
    client: Option<BasicAuthClient>,
    filter: Option<String>,
}

impl JiraProvider {
    /// Creates a provider from `settings`.
    ///
    /// The provider is unconfigured unless it is enabled and has a URL, an
    /// email, and a token.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::InvalidUrl` when the configured URL is not
    /// absolute.
    pub fn new(settings: JiraSettings) -> Result<Self, ProviderError> {
        let url = non_blank(settings.url);
        let email = non_blank(settings.email);
        let token = non_blank(settings.token);
        let client = match (settings.enabled, url, email, token) {
            (true, Some(base), Some(user), Some(secret)) => {
                Some(BasicAuthClient::new(&base, &user, &secret)?)
            }
            _ => None,
        };
        Ok(Self {
            client,
            filter: non_blank(settings.filter),
        })
    }

    fn client(&self) -> Result<&BasicAuthClient, ProviderError> {
        self.client
            .as_ref()
            .ok_or_else(|| ProviderError::not_configured(PLATFORM))
    }

    async fn search(
        &self,
        operation: &str,
        jql: &str,
        max_results: Option<&str>,
    ) -> Result<Vec<ApiIssue>, ProviderError> {
        let client = self.client()?;
        let mut query = vec![("jql", jql), ("fields", SEARCH_FIELDS)];
        if let Some(limit) = max_results {
            query.push(("maxResults", limit));
        }
        let results: ApiSearchResults = client.get_json(operation, SEARCH_PATH, &query).await?;
        Ok(results.issues)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

/// JQL for tickets assigned to the current user and updated in `window`.
///
/// Bounds are rendered to the minute in `zone`; results are re-checked
/// against the exact window after parsing.
fn activity_jql<Tz: TimeZone>(window: &TimeWindow, zone: &Tz, filter: Option<&str>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let from = window.from().with_timezone(zone).format("%Y-%m-%d %H:%M");
    let to = window.to().with_timezone(zone).format("%Y-%m-%d %H:%M");
    let base =
        format!("assignee = currentUser() AND updated >= \"{from}\" AND updated < \"{to}\"");
    order_by_updated(&with_filter(&base, filter))
}

fn todo_jql(filter: Option<&str>) -> String {
    order_by_updated(&with_filter(OPEN_TICKETS_JQL, filter))
}

fn with_filter(jql: &str, filter: Option<&str>) -> String {
    filter
        .map(str::trim)
        .filter(|extra| !extra.is_empty())
        .map_or_else(|| jql.to_owned(), |extra| format!("{jql} AND ({extra})"))
}

fn order_by_updated(jql: &str) -> String {
    format!("{jql} ORDER BY updated DESC")
}

#[async_trait]
impl Provider for JiraProvider {
    fn name(&self) -> &'static str {
        PLATFORM
    }

    fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    /// Assigned tickets updated in `window`. Tickets whose timestamp cannot
    /// be parsed are skipped.
    async fn activities(&self, window: &TimeWindow) -> Result<Vec<WorkItem>, ProviderError> {
        let client = self.client()?;
        let jql = activity_jql(window, &Local, self.filter.as_deref());
        let issues = self.search("search updated issues", &jql, None).await?;
        Ok(issues
            .into_iter()
            .filter_map(|issue| {
                let Some(updated_at) = issue.updated_at() else {
                    tracing::debug!(key = %issue.key, "skipping issue with unparsable timestamp");
                    return None;
                };
                window
                    .contains(updated_at)
                    .then(|| issue.into_work_item(client.base_url(), updated_at))
            })
            .collect())
    }
}

#[async_trait]
impl TodoSource for JiraProvider {
    fn name(&self) -> &'static str {
        PLATFORM
    }

    fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    /// Assigned tickets not in a Done, Closed, or Resolved state.
    async fn todo_sections(&self) -> Result<Vec<TodoSection>, ProviderError> {
        let client = self.client()?;
        let jql = todo_jql(self.filter.as_deref());
        let issues = self
            .search("search assigned tickets", &jql, Some(TODO_PAGE_SIZE))
            .await?;
        let now = Utc::now();
        let items = issues
            .into_iter()
            .map(|issue| {
                let updated_at = issue.updated_at().unwrap_or(now);
                issue.into_work_item(client.base_url(), updated_at)
            })
            .collect();
        Ok(vec![TodoSection::new(PLATFORM, "Assigned tickets", items)])
    }
}
