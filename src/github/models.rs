//! GitHub REST response shapes.
//!
//! Types prefixed with `Api` are deserialisation targets only. They convert
//! into work items, review candidates, and detail structures.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::activity::{ActivityKind, WorkItem};
use crate::review::{ChangeStats, CheckRun, CheckStatus, ReviewCandidate};

pub(super) const PLATFORM: &str = "github";

#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub(super) struct ApiSearchResults<T> {
    #[serde(default = "Vec::new")]
    pub(super) items: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiCommitItem {
    pub(super) sha: String,
    pub(super) commit: ApiCommitDetail,
    pub(super) repository: ApiRepository,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiCommitDetail {
    pub(super) message: String,
    pub(super) committer: Option<ApiCommitSignature>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiCommitSignature {
    pub(super) date: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiRepository {
    pub(super) name: String,
    pub(super) full_name: String,
    pub(super) html_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiIssueItem {
    pub(super) number: u64,
    pub(super) title: String,
    pub(super) html_url: String,
    pub(super) state: Option<String>,
    pub(super) created_at: DateTime<Utc>,
    pub(super) updated_at: DateTime<Utc>,
    pub(super) repository_url: Option<String>,
    pub(super) user: Option<ApiUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiUser {
    pub(super) login: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiTeam {
    pub(super) slug: String,
    pub(super) organization: ApiOrganization,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiOrganization {
    pub(super) login: String,
}

impl ApiTeam {
    /// `org/slug`, the form accepted by `team-review-requested:`.
    pub(super) fn qualified_name(&self) -> String {
        format!("{}/{}", self.organization.login, self.slug)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiPullRequest {
    pub(super) head: ApiPullRequestHead,
    #[serde(default)]
    pub(super) additions: u64,
    #[serde(default)]
    pub(super) deletions: u64,
    #[serde(default)]
    pub(super) changed_files: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiPullRequestHead {
    pub(super) sha: String,
}

impl From<ApiPullRequest> for ChangeStats {
    fn from(value: ApiPullRequest) -> Self {
        Self {
            additions: value.additions,
            deletions: value.deletions,
            changed_files: value.changed_files,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiCheckRuns {
    pub(super) total_count: u64,
    #[serde(default)]
    pub(super) check_runs: Vec<ApiCheckRun>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiCheckRun {
    pub(super) name: String,
    pub(super) status: String,
    pub(super) conclusion: Option<String>,
    pub(super) html_url: Option<String>,
}

impl From<ApiCheckRun> for CheckRun {
    fn from(value: ApiCheckRun) -> Self {
        Self {
            name: value.name,
            status: value.status,
            conclusion: value.conclusion,
            url: value.html_url,
        }
    }
}

impl From<ApiCheckRuns> for CheckStatus {
    fn from(value: ApiCheckRuns) -> Self {
        let checks = value.check_runs.into_iter().map(CheckRun::from).collect();
        Self::from_runs(value.total_count, checks)
    }
}

impl ApiCommitItem {
    pub(super) fn committed_at(&self) -> Option<DateTime<Utc>> {
        self.commit.committer.as_ref().map(|committer| committer.date)
    }

    pub(super) fn into_work_item(self, committed_at: DateTime<Utc>) -> WorkItem {
        let title = self
            .commit
            .message
            .lines()
            .next()
            .unwrap_or_default()
            .to_owned();
        WorkItem::new(
            format!("github-commit-{}", self.sha),
            ActivityKind::Commit,
            PLATFORM,
            title,
            committed_at,
        )
        .with_description(format!("Commit in {}", self.repository.full_name))
        .with_url(format!("{}/commit/{}", self.repository.html_url, self.sha))
        .with_tags([self.repository.name])
    }
}

impl ApiIssueItem {
    /// `owner/name` of the repository the issue belongs to.
    ///
    /// Uses `repository_url` when present and falls back to the first two
    /// path segments of `html_url`. Returns `None` when neither works.
    pub(super) fn repository(&self) -> Option<String> {
        self.repository_url
            .as_deref()
            .and_then(repository_from_api_url)
            .or_else(|| repository_from_html_url(&self.html_url))
    }

    /// Repository label for display, `PR #<n>` when the repository is unknown.
    fn repository_label(&self) -> String {
        self.repository()
            .unwrap_or_else(|| format!("PR #{}", self.number))
    }

    pub(super) fn into_created_pull_request(self) -> WorkItem {
        let label = self.repository_label();
        let state = self.state.as_deref().unwrap_or("open");
        WorkItem::new(
            format!("github-pr-{}", self.number),
            ActivityKind::PullRequest,
            PLATFORM,
            self.title.as_str(),
            self.created_at,
        )
        .with_description(format!("Pull request: {state}"))
        .with_url(self.html_url)
        .with_tags([label])
    }

    pub(super) fn into_open_pull_request(self) -> WorkItem {
        let label = self.repository_label();
        WorkItem::new(
            format!("github-pr-{}", self.number),
            ActivityKind::PullRequest,
            PLATFORM,
            self.title.as_str(),
            self.updated_at,
        )
        .with_description(format!("Open PR in {label}"))
        .with_url(self.html_url)
        .with_tags([label, "open".to_owned()])
    }

    pub(super) fn into_pending_review(self) -> WorkItem {
        let label = self.repository_label();
        WorkItem::new(
            format!("github-review-{}", self.number),
            ActivityKind::PullRequest,
            PLATFORM,
            self.title.as_str(),
            self.updated_at,
        )
        .with_description(format!("Review requested in {label}"))
        .with_url(self.html_url)
        .with_tags([label, "review-requested".to_owned()])
    }

    pub(super) fn into_review_candidate(self) -> ReviewCandidate {
        let label = self.repository_label();
        let repository = self.repository().unwrap_or_default();
        let description = self
            .user
            .as_ref()
            .and_then(|user| user.login.as_deref())
            .map_or_else(
                || format!("Review requested in {label}"),
                |login| format!("Review requested in {label} (by {login})"),
            );
        let item = WorkItem::new(
            format!("github-review-{}", self.number),
            ActivityKind::PullRequest,
            PLATFORM,
            self.title.as_str(),
            self.updated_at,
        )
        .with_description(description)
        .with_url(self.html_url)
        .with_tags([label, "review-requested".to_owned()]);
        ReviewCandidate::new(item, repository, self.number)
    }
}

/// `https://api.github.com/repos/owner/name` → `owner/name`.
fn repository_from_api_url(url: &str) -> Option<String> {
    let (_, tail) = url.split_once("/repos/")?;
    owner_and_name(tail.split('/'))
}

/// `https://github.com/owner/name/pull/7` → `owner/name`.
fn repository_from_html_url(html_url: &str) -> Option<String> {
    let parsed = Url::parse(html_url).ok()?;
    let segments = parsed.path_segments()?;
    owner_and_name(segments)
}

fn owner_and_name<'a>(mut segments: impl Iterator<Item = &'a str>) -> Option<String> {
    let owner = segments.next().filter(|segment| !segment.is_empty())?;
    let name = segments.next().filter(|segment| !segment.is_empty())?;
    Some(format!("{owner}/{name}"))
}
