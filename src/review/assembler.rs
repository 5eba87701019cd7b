//! Index-preserving reassembly of pool results.

use thiserror::Error;

use super::{EnrichedReview, EnrichmentFailure, ReviewCandidate};

/// How a job finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    /// Both detail calls succeeded.
    Enriched,
    /// The item carries a captured failure.
    Degraded,
}

/// A worker's report for one job, tagged with the job's input position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobResult {
    /// Position of the candidate in the pool's input.
    pub index: usize,
    /// The enriched or fallback item.
    pub review: EnrichedReview,
}

impl JobResult {
    /// Tags `review` with its input position.
    #[must_use]
    pub const fn new(index: usize, review: EnrichedReview) -> Self {
        Self { index, review }
    }

    /// Classifies the result for counting.
    #[must_use]
    pub const fn outcome(&self) -> JobOutcome {
        if self.review.failure().is_some() {
            JobOutcome::Degraded
        } else {
            JobOutcome::Enriched
        }
    }
}

/// Structural errors while placing results. These indicate a pool bug.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AssemblyError {
    /// A result referenced a slot past the end of the output.
    #[error("result index {index} is out of range for {len} slots")]
    IndexOutOfRange {
        /// Offending index.
        index: usize,
        /// Number of slots.
        len: usize,
    },
    /// Two results claimed the same slot.
    #[error("result index {index} was reported twice")]
    DuplicateResult {
        /// Offending index.
        index: usize,
    },
}

/// Pre-sized output that receives results by index.
///
/// The assembler is the single writer for the pool's output. Results may
/// arrive in any order; [`ResultAssembler::finish`] returns them in input
/// order.
#[derive(Debug)]
pub struct ResultAssembler {
    slots: Vec<Option<EnrichedReview>>,
    filled: usize,
    degraded: usize,
}

impl ResultAssembler {
    /// Creates an assembler expecting `len` results.
    #[must_use]
    pub fn with_len(len: usize) -> Self {
        Self {
            slots: vec![None; len],
            filled: 0,
            degraded: 0,
        }
    }

    /// Writes `result` into its slot.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError`] when the index is out of range or its slot
    /// is already filled; the output is left unchanged.
    pub fn place(&mut self, result: JobResult) -> Result<(), AssemblyError> {
        let len = self.slots.len();
        let outcome = result.outcome();
        let JobResult { index, review } = result;
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(AssemblyError::IndexOutOfRange { index, len })?;
        if slot.is_some() {
            return Err(AssemblyError::DuplicateResult { index });
        }
        *slot = Some(review);
        self.filled += 1;
        if outcome == JobOutcome::Degraded {
            self.degraded += 1;
        }
        Ok(())
    }

    /// Returns true once every slot has a result.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.filled == self.slots.len()
    }

    /// Number of slots still waiting for a result.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.slots.len().saturating_sub(self.filled)
    }

    /// Number of results placed that carry a failure.
    #[must_use]
    pub const fn degraded(&self) -> usize {
        self.degraded
    }

    /// Number of results placed without a failure.
    #[must_use]
    pub const fn succeeded(&self) -> usize {
        self.filled.saturating_sub(self.degraded)
    }

    /// Returns the results in input order.
    ///
    /// Any slot that never received a result is filled with a fallback for
    /// the matching candidate, marked [`EnrichmentFailure::WorkerLost`], so
    /// the output always matches `candidates` in length.
    #[must_use]
    pub fn finish(self, candidates: &[ReviewCandidate]) -> Vec<EnrichedReview> {
        self.slots
            .into_iter()
            .zip(candidates)
            .enumerate()
            .map(|(index, (slot, candidate))| {
                slot.unwrap_or_else(|| {
                    tracing::error!(index, "no result reported; using fallback");
                    EnrichedReview::fallback(
                        candidate.clone(),
                        EnrichmentFailure::WorkerLost { index },
                    )
                })
            })
            .collect()
    }
}
