//! GitHub integration backed by Octocrab.
//!
//! One [`GitHubProvider`] serves every GitHub-facing capability: activity
//! listing for summaries, open pull requests and pending reviews for the
//! todo list, review-request listing, and the per-pull-request detail calls
//! used during enrichment. Octocrab errors are mapped into
//! [`ProviderError`] so callers never see Octocrab internals.

mod client;
mod error_mapping;
mod models;
mod query;

use async_trait::async_trait;
use chrono::Local;
use octocrab::Octocrab;
use serde::de::DeserializeOwned;

use crate::activity::{TimeWindow, WorkItem};
use crate::provider::{Provider, ProviderError};
use crate::review::{
    ChangeStats, CheckStatus, ReviewCandidate, ReviewDetailSource, ReviewRequestSource,
};
use crate::todo::{TodoSection, TodoSource};

use client::build_octocrab_client;
use error_mapping::map_octocrab_error;
use models::{
    ApiCheckRuns, ApiCommitItem, ApiIssueItem, ApiPullRequest, ApiSearchResults, ApiTeam,
    PLATFORM,
};
use query::{date_qualifier, with_filter};

/// Public GitHub API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const SEARCH_PAGE_SIZE: u32 = 50;
const TEAM_SEARCH_PAGE_SIZE: u32 = 20;

/// Connection settings for [`GitHubProvider`].
#[derive(Clone, Default)]
pub struct GitHubSettings {
    /// Whether the integration is switched on.
    pub enabled: bool,
    /// Personal access token.
    pub token: Option<String>,
    /// Login whose activity is reported.
    pub username: Option<String>,
    /// Extra search qualifiers appended to every query, e.g. `org:acme`.
    pub filter: Option<String>,
    /// API base URL; defaults to [`DEFAULT_API_URL`].
    pub api_url: Option<String>,
}

/// GitHub provider for summaries, todos, and review requests.
#[derive(Clone)]
pub struct GitHubProvider {
    client: Option<Octocrab>,
    username: String,
    filter: Option<String>,
}

impl GitHubProvider {
    /// Creates a provider from `settings`.
    ///
    /// A provider that is disabled or lacks a token or username is created
    /// unconfigured; no client is built for it.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::InvalidUrl` or `ProviderError::Api` when the
    /// Octocrab client cannot be built for a configured provider.
    pub fn new(settings: GitHubSettings) -> Result<Self, ProviderError> {
        let token = non_blank(settings.token);
        let username = non_blank(settings.username);
        let api_url = non_blank(settings.api_url);
        let client = match (settings.enabled, token, &username) {
            (true, Some(token_value), Some(_)) => Some(build_octocrab_client(
                &token_value,
                api_url.as_deref().unwrap_or(DEFAULT_API_URL),
            )?),
            _ => None,
        };
        Ok(Self {
            client,
            username: username.unwrap_or_default(),
            filter: non_blank(settings.filter),
        })
    }

    fn client(&self) -> Result<&Octocrab, ProviderError> {
        self.client
            .as_ref()
            .ok_or_else(|| ProviderError::not_configured(PLATFORM))
    }

    async fn search<T>(
        &self,
        operation: &str,
        route: &str,
        query: &str,
        sort: &str,
        per_page: u32,
    ) -> Result<Vec<T>, ProviderError>
    where
        T: DeserializeOwned + Send,
    {
        let page_size = per_page.to_string();
        let params = [
            ("q", query),
            ("sort", sort),
            ("order", "desc"),
            ("per_page", page_size.as_str()),
        ];
        tracing::debug!(operation, query, "searching GitHub");
        self.client()?
            .get::<ApiSearchResults<T>, _, _>(route, Some(&params))
            .await
            .map(|results| results.items)
            .map_err(|error| map_octocrab_error(operation, &error))
    }

    async fn commits(&self, window: &TimeWindow) -> Result<Vec<WorkItem>, ProviderError> {
        let terms = format!(
            "author:{} committer-date:{}",
            self.username,
            date_qualifier(window, &Local)
        );
        let query = with_filter(&terms, self.filter.as_deref());
        let found: Vec<ApiCommitItem> = self
            .search(
                "search commits",
                "/search/commits",
                &query,
                "committer-date",
                SEARCH_PAGE_SIZE,
            )
            .await?;
        Ok(found
            .into_iter()
            .filter_map(|commit| {
                let committed_at = commit.committed_at()?;
                window
                    .contains(committed_at)
                    .then(|| commit.into_work_item(committed_at))
            })
            .collect())
    }

    async fn created_pull_requests(
        &self,
        window: &TimeWindow,
    ) -> Result<Vec<WorkItem>, ProviderError> {
        let terms = format!(
            "author:{} created:{} type:pr",
            self.username,
            date_qualifier(window, &Local)
        );
        let query = with_filter(&terms, self.filter.as_deref());
        let found: Vec<ApiIssueItem> = self
            .search(
                "search pull requests",
                "/search/issues",
                &query,
                "created",
                SEARCH_PAGE_SIZE,
            )
            .await?;
        Ok(found
            .into_iter()
            .filter(|issue| window.contains(issue.created_at))
            .map(ApiIssueItem::into_created_pull_request)
            .collect())
    }

    async fn open_pull_requests(&self) -> Result<Vec<WorkItem>, ProviderError> {
        let terms = format!("author:{} state:open type:pr", self.username);
        let query = with_filter(&terms, self.filter.as_deref());
        let found: Vec<ApiIssueItem> = self
            .search(
                "search open pull requests",
                "/search/issues",
                &query,
                "updated",
                SEARCH_PAGE_SIZE,
            )
            .await?;
        Ok(found
            .into_iter()
            .map(ApiIssueItem::into_open_pull_request)
            .collect())
    }

    async fn pending_reviews(&self) -> Result<Vec<WorkItem>, ProviderError> {
        let terms = format!("review-requested:{} state:open type:pr", self.username);
        let query = with_filter(&terms, self.filter.as_deref());
        let found: Vec<ApiIssueItem> = self
            .search(
                "search pending reviews",
                "/search/issues",
                &query,
                "updated",
                SEARCH_PAGE_SIZE,
            )
            .await?;
        Ok(found
            .into_iter()
            .map(ApiIssueItem::into_pending_review)
            .collect())
    }

    async fn review_candidates(
        &self,
        operation: &str,
        terms: &str,
        per_page: u32,
    ) -> Result<Vec<ReviewCandidate>, ProviderError> {
        let query = with_filter(terms, self.filter.as_deref());
        let found: Vec<ApiIssueItem> = self
            .search(operation, "/search/issues", &query, "updated", per_page)
            .await?;
        Ok(found
            .into_iter()
            .map(ApiIssueItem::into_review_candidate)
            .collect())
    }

    async fn teams(&self) -> Result<Vec<ApiTeam>, ProviderError> {
        self.client()?
            .get::<Vec<ApiTeam>, _, _>("/user/teams", None::<&()>)
            .await
            .map_err(|error| map_octocrab_error("list teams", &error))
    }

    async fn pull_request(
        &self,
        repository: &str,
        number: u64,
    ) -> Result<ApiPullRequest, ProviderError> {
        validate_target(repository, number)?;
        self.client()?
            .get::<ApiPullRequest, _, _>(
                format!("/repos/{repository}/pulls/{number}"),
                None::<&()>,
            )
            .await
            .map_err(|error| map_octocrab_error("pull request", &error))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

fn validate_target(repository: &str, number: u64) -> Result<(), ProviderError> {
    if repository.is_empty() || number == 0 {
        return Err(ProviderError::InvalidRequest {
            message: "repository and pull request number are required".to_owned(),
        });
    }
    Ok(())
}

#[async_trait]
impl Provider for GitHubProvider {
    fn name(&self) -> &'static str {
        PLATFORM
    }

    fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    /// Commits authored and pull requests created inside `window`.
    ///
    /// The two searches fail independently; a failure is logged and the
    /// other search still contributes. Only when both fail is the commit
    /// search error returned.
    async fn activities(&self, window: &TimeWindow) -> Result<Vec<WorkItem>, ProviderError> {
        self.client()?;
        let (commits, pull_requests) =
            tokio::join!(self.commits(window), self.created_pull_requests(window));

        match (commits, pull_requests) {
            (Ok(mut items), Ok(created)) => {
                items.extend(created);
                Ok(items)
            }
            (Ok(items), Err(error)) => {
                tracing::warn!(%error, "GitHub pull request search failed");
                Ok(items)
            }
            (Err(error), Ok(items)) => {
                tracing::warn!(%error, "GitHub commit search failed");
                Ok(items)
            }
            (Err(error), Err(other)) => {
                tracing::warn!(error = %other, "GitHub pull request search failed");
                Err(error)
            }
        }
    }
}

#[async_trait]
impl TodoSource for GitHubProvider {
    fn name(&self) -> &'static str {
        PLATFORM
    }

    fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    async fn todo_sections(&self) -> Result<Vec<TodoSection>, ProviderError> {
        let open = self.open_pull_requests().await?;
        let reviews = self.pending_reviews().await?;
        Ok(vec![
            TodoSection::new(PLATFORM, "Open pull requests", open),
            TodoSection::new(PLATFORM, "Pending reviews", reviews),
        ])
    }
}

#[async_trait]
impl ReviewRequestSource for GitHubProvider {
    async fn user_review_requests(&self) -> Result<Vec<ReviewCandidate>, ProviderError> {
        let terms = format!(
            "review-requested:{} state:open type:pr -is:draft",
            self.username
        );
        self.review_candidates("search user review requests", &terms, SEARCH_PAGE_SIZE)
            .await
    }

    /// Review requests for each of the user's teams.
    ///
    /// Teams whose search fails are skipped. Each returned candidate is
    /// tagged `team:<org>/<slug>`.
    async fn team_review_requests(&self) -> Result<Vec<ReviewCandidate>, ProviderError> {
        let teams = self.teams().await?;
        let mut candidates = Vec::new();
        for team in teams {
            let name = team.qualified_name();
            let terms = format!("team-review-requested:{name} state:open type:pr -is:draft");
            match self
                .review_candidates("search team review requests", &terms, TEAM_SEARCH_PAGE_SIZE)
                .await
            {
                Ok(found) => {
                    candidates.extend(found.into_iter().map(|mut candidate| {
                        candidate.item.tags.push(format!("team:{name}"));
                        candidate
                    }));
                }
                Err(error) => {
                    tracing::warn!(team = %name, %error, "skipping team review requests");
                }
            }
        }
        Ok(candidates)
    }
}

#[async_trait]
impl ReviewDetailSource for GitHubProvider {
    async fn check_status(
        &self,
        repository: &str,
        number: u64,
    ) -> Result<CheckStatus, ProviderError> {
        let pull_request = self.pull_request(repository, number).await?;
        let sha = pull_request.head.sha;
        self.client()?
            .get::<ApiCheckRuns, _, _>(
                format!("/repos/{repository}/commits/{sha}/check-runs"),
                None::<&()>,
            )
            .await
            .map(CheckStatus::from)
            .map_err(|error| map_octocrab_error("check runs", &error))
    }

    async fn change_stats(
        &self,
        repository: &str,
        number: u64,
    ) -> Result<ChangeStats, ProviderError> {
        self.pull_request(repository, number)
            .await
            .map(ChangeStats::from)
    }
}
