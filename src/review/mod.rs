//! Review requests and their enrichment with CI and diff detail.
//!
//! A [`ReviewCandidate`] is a pull request waiting on the user's review. The
//! [`EnrichmentPool`] fetches check-run status and change statistics for a
//! batch of candidates with bounded concurrency and a shared rate gate, and
//! returns one [`EnrichedReview`] per candidate in input order. Detail
//! failures degrade the affected item rather than the batch.

mod assembler;
mod board;
mod detail;
mod pool;
mod rate_limit;

pub use assembler::{AssemblyError, JobOutcome, JobResult, ResultAssembler};
pub use board::{ReviewBoard, ReviewCollector};
pub use detail::{DetailFetch, fetch_details};
pub use pool::{EnrichmentPool, EnrichmentSettings};
pub use rate_limit::PermitSource;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::activity::WorkItem;
use crate::provider::ProviderError;

/// A pull request awaiting review, with the routing data needed to enrich it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewCandidate {
    /// The listed work item.
    #[serde(flatten)]
    pub item: WorkItem,
    /// Repository in `owner/name` form.
    pub repository: String,
    /// Pull request number within the repository.
    pub number: u64,
}

impl ReviewCandidate {
    /// Creates a candidate for `repository#number`.
    #[must_use]
    pub fn new(item: WorkItem, repository: impl Into<String>, number: u64) -> Self {
        Self {
            item,
            repository: repository.into(),
            number,
        }
    }
}

/// Overall CI state of a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckState {
    /// Every check concluded successfully.
    Success,
    /// At least one check failed or was cancelled.
    Failure,
    /// At least one check is queued or running.
    Pending,
    /// No checks were reported.
    Unknown,
}

impl CheckState {
    /// Derives the overall state from individual check runs.
    ///
    /// A failed or cancelled run outranks a pending one, which outranks
    /// success. No runs at all is [`CheckState::Unknown`].
    #[must_use]
    pub fn from_runs(runs: &[CheckRun]) -> Self {
        if runs.is_empty() {
            return Self::Unknown;
        }
        let failed = runs.iter().any(|run| {
            matches!(
                run.conclusion.as_deref(),
                Some("failure" | "cancelled")
            )
        });
        if failed {
            return Self::Failure;
        }
        let pending = runs
            .iter()
            .any(|run| matches!(run.status.as_str(), "queued" | "in_progress"));
        if pending { Self::Pending } else { Self::Success }
    }

    /// Returns the lowercase label used in rendered output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Pending => "pending",
            Self::Unknown => "unknown",
        }
    }
}

/// One check run reported against a pull request's head commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckRun {
    /// Check name.
    pub name: String,
    /// Run status, e.g. `completed` or `in_progress`.
    pub status: String,
    /// Conclusion once completed, e.g. `success`.
    pub conclusion: Option<String>,
    /// Link to the run.
    pub url: Option<String>,
}

/// Aggregated CI status for a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckStatus {
    /// Overall state.
    pub state: CheckState,
    /// Total number of checks reported by the service.
    pub total_count: u64,
    /// Individual check runs in service order.
    pub checks: Vec<CheckRun>,
}

impl CheckStatus {
    /// Builds a status from its runs, deriving the overall state.
    #[must_use]
    pub fn from_runs(total_count: u64, checks: Vec<CheckRun>) -> Self {
        Self {
            state: CheckState::from_runs(&checks),
            total_count,
            checks,
        }
    }
}

/// Diff size of a pull request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChangeStats {
    /// Added lines.
    pub additions: u64,
    /// Deleted lines.
    pub deletions: u64,
    /// Number of files touched.
    pub changed_files: u64,
}

/// Why an item came back without enrichment.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum EnrichmentFailure {
    /// A detail call failed; this is the first error seen for the item.
    #[error(transparent)]
    Detail(ProviderError),
    /// The pass was cancelled before the item's detail calls completed.
    #[error("enrichment cancelled")]
    Cancelled,
    /// The worker handling the item stopped without reporting a result.
    #[error("worker handling item {index} stopped unexpectedly")]
    WorkerLost {
        /// Input position of the affected item.
        index: usize,
    },
}

/// Per-item enrichment outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EnrichmentOutcome {
    /// Both detail calls succeeded.
    Enriched,
    /// Enrichment was skipped at the caller's request.
    NotRequested,
    /// Enrichment failed; the item carries identity fields only.
    Degraded {
        /// Captured failure.
        failure: EnrichmentFailure,
    },
}

/// A review candidate with whatever detail could be fetched for it.
///
/// The candidate is never modified: enrichment only fills the optional
/// detail fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichedReview {
    #[serde(flatten)]
    candidate: ReviewCandidate,
    #[serde(skip_serializing_if = "Option::is_none")]
    check_status: Option<CheckStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    change_stats: Option<ChangeStats>,
    outcome: EnrichmentOutcome,
}

impl EnrichedReview {
    /// Wraps a fully enriched candidate.
    #[must_use]
    pub const fn enriched(
        candidate: ReviewCandidate,
        check_status: CheckStatus,
        change_stats: ChangeStats,
    ) -> Self {
        Self {
            candidate,
            check_status: Some(check_status),
            change_stats: Some(change_stats),
            outcome: EnrichmentOutcome::Enriched,
        }
    }

    /// Builds the fallback item: identity fields only, tagged with `failure`.
    #[must_use]
    pub const fn fallback(candidate: ReviewCandidate, failure: EnrichmentFailure) -> Self {
        Self {
            candidate,
            check_status: None,
            change_stats: None,
            outcome: EnrichmentOutcome::Degraded { failure },
        }
    }

    /// Wraps a candidate whose enrichment was not requested.
    #[must_use]
    pub const fn unenriched(candidate: ReviewCandidate) -> Self {
        Self {
            candidate,
            check_status: None,
            change_stats: None,
            outcome: EnrichmentOutcome::NotRequested,
        }
    }

    /// The candidate as listed.
    #[must_use]
    pub const fn candidate(&self) -> &ReviewCandidate {
        &self.candidate
    }

    /// The underlying work item.
    #[must_use]
    pub const fn item(&self) -> &WorkItem {
        &self.candidate.item
    }

    /// CI status, when it was fetched.
    #[must_use]
    pub const fn check_status(&self) -> Option<&CheckStatus> {
        self.check_status.as_ref()
    }

    /// Diff statistics, when they were fetched.
    #[must_use]
    pub const fn change_stats(&self) -> Option<&ChangeStats> {
        self.change_stats.as_ref()
    }

    /// How enrichment went for this item.
    #[must_use]
    pub const fn outcome(&self) -> &EnrichmentOutcome {
        &self.outcome
    }

    /// Returns the captured failure for degraded items.
    #[must_use]
    pub const fn failure(&self) -> Option<&EnrichmentFailure> {
        match &self.outcome {
            EnrichmentOutcome::Degraded { failure } => Some(failure),
            EnrichmentOutcome::Enriched | EnrichmentOutcome::NotRequested => None,
        }
    }
}

/// Per-pull-request detail calls used by the enrichment pool.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReviewDetailSource: Send + Sync {
    /// Fetches check-run status for the pull request's head commit.
    async fn check_status(&self, repository: &str, number: u64)
    -> Result<CheckStatus, ProviderError>;

    /// Fetches additions, deletions, and changed-file count.
    async fn change_stats(&self, repository: &str, number: u64)
    -> Result<ChangeStats, ProviderError>;
}

/// Listing of pull requests awaiting the user's review.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReviewRequestSource: Send + Sync {
    /// Pull requests where the user was asked to review directly.
    async fn user_review_requests(&self) -> Result<Vec<ReviewCandidate>, ProviderError>;

    /// Pull requests where one of the user's teams was asked to review.
    async fn team_review_requests(&self) -> Result<Vec<ReviewCandidate>, ProviderError>;
}
