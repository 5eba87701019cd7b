//! The two detail calls made for each review candidate.

use super::{
    ChangeStats, CheckStatus, EnrichedReview, EnrichmentFailure, ReviewCandidate,
    ReviewDetailSource,
};
use crate::provider::ProviderError;

/// Results of both detail calls for one candidate.
///
/// The calls are independent, so one may succeed while the other fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailFetch {
    /// Check-run status result.
    pub check_status: Result<CheckStatus, ProviderError>,
    /// Change statistics result.
    pub change_stats: Result<ChangeStats, ProviderError>,
}

impl DetailFetch {
    /// Returns the first error, checking check status before change stats.
    #[must_use]
    pub const fn first_error(&self) -> Option<&ProviderError> {
        match (&self.check_status, &self.change_stats) {
            (Err(error), _) | (Ok(_), Err(error)) => Some(error),
            (Ok(_), Ok(_)) => None,
        }
    }

    /// Converts the fetch into the pool's per-item result.
    ///
    /// Any failed call turns the item into a fallback carrying identity
    /// fields only, tagged with the first error. Detail from the call that
    /// succeeded is discarded.
    #[must_use]
    pub fn into_review(self, candidate: ReviewCandidate) -> EnrichedReview {
        match (self.check_status, self.change_stats) {
            (Ok(checks), Ok(stats)) => EnrichedReview::enriched(candidate, checks, stats),
            (Err(error), _) | (Ok(_), Err(error)) => {
                EnrichedReview::fallback(candidate, EnrichmentFailure::Detail(error))
            }
        }
    }
}

/// Runs both detail calls for `candidate` concurrently.
pub async fn fetch_details(
    source: &dyn ReviewDetailSource,
    candidate: &ReviewCandidate,
) -> DetailFetch {
    let repository = candidate.repository.as_str();
    let (check_status, change_stats) = tokio::join!(
        source.check_status(repository, candidate.number),
        source.change_stats(repository, candidate.number),
    );
    DetailFetch {
        check_status,
        change_stats,
    }
}
