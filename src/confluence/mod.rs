//! Confluence integration over the CQL search API.
//!
//! Summaries list pages the user contributed to inside the window. The todo
//! list holds recent mentions of the user, with comments flagged `high`
//! because they usually want an answer.

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone, Utc};
use serde::Deserialize;

use crate::activity::{ActivityKind, TimeWindow, WorkItem};
use crate::provider::{BasicAuthClient, Provider, ProviderError};
use crate::todo::{TodoSection, TodoSource};

const PLATFORM: &str = "confluence";
const SEARCH_PATH: &str = "/wiki/rest/api/search";
const SEARCH_LIMIT: &str = "50";
const MENTIONS_CQL: &str = "mention = currentUser() AND lastModified >= now(\"-7d\")";

/// Connection settings for [`ConfluenceProvider`].
#[derive(Clone, Default)]
pub struct ConfluenceSettings {
    /// Whether the integration is switched on.
    pub enabled: bool,
    /// Site URL; `https://` is assumed when no scheme is given.
    pub url: Option<String>,
    /// Account email used for basic authentication.
    pub email: Option<String>,
    /// API token paired with `email`.
    pub token: Option<String>,
}

/// Confluence provider for summaries and todos.
#[derive(Debug, Clone)]
pub struct ConfluenceProvider {
    client: Option<BasicAuthClient>,
}

#[derive(Debug, Deserialize)]
struct ApiSearchResults {
    #[serde(default)]
    results: Vec<ApiSearchResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiSearchResult {
    content: ApiContent,
    #[serde(default)]
    url: String,
    last_modified: Option<String>,
}

impl ApiSearchResult {
    fn modified_at(&self) -> Option<DateTime<Utc>> {
        self.last_modified
            .as_deref()
            .and_then(|stamp| DateTime::parse_from_rfc3339(stamp).ok())
            .map(|parsed| parsed.with_timezone(&Utc))
    }
}

#[derive(Debug, Deserialize)]
struct ApiContent {
    id: String,
    title: String,
    #[serde(rename = "type")]
    content_type: String,
}

impl ConfluenceProvider {
    /// Creates a provider from `settings`.
    ///
    /// The provider is unconfigured unless it is enabled and has a URL, an
    /// email, and a token.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::InvalidUrl` when the URL cannot be parsed even
    /// after `https://` is assumed.
    pub fn new(settings: ConfluenceSettings) -> Result<Self, ProviderError> {
        let url = non_blank(settings.url);
        let email = non_blank(settings.email);
        let token = non_blank(settings.token);
        let client = match (settings.enabled, url, email, token) {
            (true, Some(base), Some(user), Some(secret)) => Some(BasicAuthClient::new(
                &with_default_scheme(&base),
                &user,
                &secret,
            )?),
            _ => None,
        };
        Ok(Self { client })
    }

    fn client(&self) -> Result<&BasicAuthClient, ProviderError> {
        self.client
            .as_ref()
            .ok_or_else(|| ProviderError::not_configured(PLATFORM))
    }

    async fn search(
        &self,
        operation: &str,
        cql: &str,
    ) -> Result<Vec<ApiSearchResult>, ProviderError> {
        let results: ApiSearchResults = self
            .client()?
            .get_json(operation, SEARCH_PATH, &[("cql", cql), ("limit", SEARCH_LIMIT)])
            .await?;
        Ok(results.results)
    }

    fn page_url(&self, relative: &str) -> Option<String> {
        let client = self.client.as_ref()?;
        (!relative.is_empty()).then(|| format!("{}/wiki{relative}", client.base_url()))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

fn with_default_scheme(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_owned()
    } else {
        format!("https://{trimmed}")
    }
}

fn contributions_cql<Tz: TimeZone>(window: &TimeWindow, zone: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let from = window.from().with_timezone(zone).format("%Y-%m-%d %H:%M");
    let to = window.to().with_timezone(zone).format("%Y-%m-%d %H:%M");
    format!(
        "contributor = currentUser() AND lastModified >= \"{from}\" AND lastModified < \"{to}\""
    )
}

fn capitalised(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[async_trait]
impl Provider for ConfluenceProvider {
    fn name(&self) -> &'static str {
        PLATFORM
    }

    fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    /// Pages the user contributed to inside `window`.
    ///
    /// Results without a `lastModified` stamp are dated at the end of the
    /// window; stamped results outside it are dropped.
    async fn activities(&self, window: &TimeWindow) -> Result<Vec<WorkItem>, ProviderError> {
        let cql = contributions_cql(window, &Local);
        let results = self.search("search contributions", &cql).await?;
        let fallback = window.to();
        Ok(results
            .into_iter()
            .filter_map(|result| {
                let modified_at = result.modified_at();
                if modified_at.is_some_and(|at| !window.contains(at)) {
                    return None;
                }
                let kind = result.content.content_type.to_lowercase();
                let mut item = WorkItem::new(
                    format!("confluence-{}", result.content.id),
                    ActivityKind::ConfluenceContribution,
                    PLATFORM,
                    result.content.title,
                    modified_at.unwrap_or(fallback),
                )
                .with_description(format!("Modified {kind}"))
                .with_tags([result.content.content_type]);
                item.url = self.page_url(&result.url);
                Some(item)
            })
            .collect())
    }
}

#[async_trait]
impl TodoSource for ConfluenceProvider {
    fn name(&self) -> &'static str {
        PLATFORM
    }

    fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    /// Mentions of the user from the last seven days.
    async fn todo_sections(&self) -> Result<Vec<TodoSection>, ProviderError> {
        let results = self.search("search mentions", MENTIONS_CQL).await?;
        let now = Utc::now();
        let items = results
            .into_iter()
            .map(|result| {
                let priority = if result.content.content_type == "comment" {
                    "high"
                } else {
                    "normal"
                };
                let modified_at = result.modified_at().unwrap_or(now);
                let description = format!("Type: {}", capitalised(&result.content.content_type));
                let mut item = WorkItem::new(
                    format!("confluence-{}", result.content.id),
                    ActivityKind::Mention,
                    PLATFORM,
                    result.content.title,
                    modified_at,
                )
                .with_description(description)
                .with_tags([priority]);
                item.url = self.page_url(&result.url);
                item
            })
            .collect();
        Ok(vec![TodoSection::new(PLATFORM, "Mentions", items)])
    }
}
