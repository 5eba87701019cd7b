//! Review requests listed for the user and their teams.

use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::pool::EnrichmentPool;
use super::{EnrichedReview, ReviewCandidate, ReviewRequestSource};
use crate::provider::ProviderError;

/// Pull requests awaiting review, split by how the request was made.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReviewBoard {
    /// Requests addressed to the user directly.
    pub user_requests: Vec<EnrichedReview>,
    /// Requests addressed to one of the user's teams.
    pub team_requests: Vec<EnrichedReview>,
}

impl ReviewBoard {
    /// Total number of requests on the board.
    #[must_use]
    pub fn len(&self) -> usize {
        self.user_requests.len() + self.team_requests.len()
    }

    /// Returns true when nothing awaits review.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.user_requests.is_empty() && self.team_requests.is_empty()
    }
}

/// Lists review requests and enriches them through an [`EnrichmentPool`].
pub struct ReviewCollector {
    requests: Arc<dyn ReviewRequestSource>,
    pool: EnrichmentPool,
    skip_details: bool,
}

impl ReviewCollector {
    /// Creates a collector that enriches every listed request.
    #[must_use]
    pub fn new(requests: Arc<dyn ReviewRequestSource>, pool: EnrichmentPool) -> Self {
        Self {
            requests,
            pool,
            skip_details: false,
        }
    }

    /// Skips enrichment; listed requests are returned as-is.
    #[must_use]
    pub const fn skip_details(mut self, skip: bool) -> Self {
        self.skip_details = skip;
        self
    }

    /// Builds the review board.
    ///
    /// # Errors
    ///
    /// Returns the listing error when either the user or the team request
    /// listing fails. Enrichment failures never fail the board.
    pub async fn collect(
        &self,
        cancel: &CancellationToken,
    ) -> Result<ReviewBoard, ProviderError> {
        let user = self.requests.user_review_requests().await?;
        let team = self.requests.team_review_requests().await?;
        tracing::debug!(
            user = user.len(),
            team = team.len(),
            skip_details = self.skip_details,
            "listed review requests"
        );

        Ok(ReviewBoard {
            user_requests: self.enrich(user, cancel).await,
            team_requests: self.enrich(team, cancel).await,
        })
    }

    async fn enrich(
        &self,
        candidates: Vec<ReviewCandidate>,
        cancel: &CancellationToken,
    ) -> Vec<EnrichedReview> {
        if self.skip_details {
            return candidates
                .into_iter()
                .map(EnrichedReview::unenriched)
                .collect();
        }
        self.pool.enrich(&candidates, cancel).await
    }
}
