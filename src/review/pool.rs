//! Bounded, rate-limited enrichment of review candidates.
//!
//! A fixed set of workers takes jobs from a shared queue. Before each job a
//! worker waits on the pool-wide [`PermitSource`], so adding workers raises
//! how many detail calls overlap but not how often new ones start. Workers
//! report index-tagged results to a single collector, which rebuilds the
//! input order.

use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::assembler::{JobResult, ResultAssembler};
use super::detail::{DetailFetch, fetch_details};
use super::rate_limit::PermitSource;
use super::{EnrichedReview, EnrichmentFailure, ReviewCandidate, ReviewDetailSource};
use crate::telemetry::{NoopTelemetrySink, TelemetryEvent, TelemetrySink};

const LOG_TITLE_CHARS: usize = 50;

/// Concurrency and pacing for an enrichment pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrichmentSettings {
    workers: NonZeroUsize,
    rate_interval: Duration,
}

impl EnrichmentSettings {
    /// Default pool size.
    pub const DEFAULT_WORKERS: NonZeroUsize = NonZeroUsize::MIN.saturating_add(4);

    /// Default spacing between detail-fetch dispatches.
    pub const DEFAULT_RATE_INTERVAL: Duration = Duration::from_millis(200);

    /// Creates settings with an explicit pool size and dispatch interval.
    #[must_use]
    pub const fn new(workers: NonZeroUsize, rate_interval: Duration) -> Self {
        Self {
            workers,
            rate_interval,
        }
    }

    /// Maximum number of concurrent workers.
    #[must_use]
    pub const fn workers(&self) -> NonZeroUsize {
        self.workers
    }

    /// Minimum spacing between dispatches across the whole pool.
    #[must_use]
    pub const fn rate_interval(&self) -> Duration {
        self.rate_interval
    }
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WORKERS, Self::DEFAULT_RATE_INTERVAL)
    }
}

/// Enriches review candidates through a [`ReviewDetailSource`].
pub struct EnrichmentPool {
    source: Arc<dyn ReviewDetailSource>,
    settings: EnrichmentSettings,
    sink: Arc<dyn TelemetrySink>,
}

impl EnrichmentPool {
    /// Creates a pool that records no telemetry.
    #[must_use]
    pub fn new(source: Arc<dyn ReviewDetailSource>, settings: EnrichmentSettings) -> Self {
        Self {
            source,
            settings,
            sink: Arc::new(NoopTelemetrySink),
        }
    }

    /// Records the completion event for each pass on `sink`.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.sink = sink;
        self
    }

    /// The settings this pool runs with.
    #[must_use]
    pub const fn settings(&self) -> &EnrichmentSettings {
        &self.settings
    }

    /// Enriches every candidate and returns the results in input order.
    ///
    /// The output always has one entry per candidate. Items whose detail
    /// calls fail, or that were not reached before `cancel` fired, come
    /// back with their identity fields and a captured failure.
    pub async fn enrich(
        &self,
        candidates: &[ReviewCandidate],
        cancel: &CancellationToken,
    ) -> Vec<EnrichedReview> {
        if candidates.is_empty() {
            return Vec::new();
        }

        let total = candidates.len();
        let worker_count = self.settings.workers.get().min(total);
        let jobs: VecDeque<Job> = candidates
            .iter()
            .cloned()
            .enumerate()
            .map(|(index, candidate)| Job { index, candidate })
            .collect();
        let queue = Arc::new(Mutex::new(jobs));
        let permits = Arc::new(PermitSource::new(self.settings.rate_interval));
        let (results, mut received) = mpsc::channel(total);

        tracing::debug!(
            candidates = total,
            workers = worker_count,
            interval_ms = self.settings.rate_interval.as_millis(),
            "starting review enrichment"
        );

        let mut workers = JoinSet::new();
        for id in 0..worker_count {
            let worker = Worker {
                id,
                queue: Arc::clone(&queue),
                permits: Arc::clone(&permits),
                source: Arc::clone(&self.source),
                cancel: cancel.clone(),
                results: results.clone(),
            };
            workers.spawn(worker.run());
        }
        drop(results);

        let mut assembler = ResultAssembler::with_len(total);
        while !assembler.is_complete() {
            let Some(result) = received.recv().await else {
                break;
            };
            if let Err(error) = assembler.place(result) {
                tracing::error!(%error, "discarding enrichment result");
            }
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(error) = joined {
                tracing::error!(%error, "enrichment worker stopped abnormally");
            }
        }

        let succeeded = assembler.succeeded();
        let degraded = assembler.degraded() + assembler.remaining();
        tracing::info!(
            successful = succeeded,
            failed = degraded,
            "review enrichment finished"
        );
        self.sink
            .record(TelemetryEvent::EnrichmentCompleted { succeeded, degraded });

        assembler.finish(candidates)
    }
}

/// A candidate tagged with its input position.
struct Job {
    index: usize,
    candidate: ReviewCandidate,
}

struct Worker {
    id: usize,
    queue: Arc<Mutex<VecDeque<Job>>>,
    permits: Arc<PermitSource>,
    source: Arc<dyn ReviewDetailSource>,
    cancel: CancellationToken,
    results: mpsc::Sender<JobResult>,
}

impl Worker {
    async fn run(self) {
        while let Some(job) = self.next_job() {
            let result = self.process(job).await;
            if self.results.send(result).await.is_err() {
                break;
            }
        }
    }

    fn next_job(&self) -> Option<Job> {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    async fn process(&self, job: Job) -> JobResult {
        let Job { index, candidate } = job;
        let fetched = self.dispatch(index, &candidate).await;
        let review = match fetched {
            Ok(fetch) => fetch.into_review(candidate),
            Err(failure) => EnrichedReview::fallback(candidate, failure),
        };
        if let Some(failure) = review.failure() {
            tracing::warn!(worker = self.id, index, %failure, "review enrichment degraded");
        }
        JobResult::new(index, review)
    }

    async fn dispatch(
        &self,
        index: usize,
        candidate: &ReviewCandidate,
    ) -> Result<DetailFetch, EnrichmentFailure> {
        if self.cancel.is_cancelled() {
            return Err(EnrichmentFailure::Cancelled);
        }
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => return Err(EnrichmentFailure::Cancelled),
            () = self.permits.acquire() => {}
        }

        tracing::debug!(
            worker = self.id,
            index,
            number = candidate.number,
            title = %truncate(&candidate.item.title, LOG_TITLE_CHARS),
            "fetching review details"
        );

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(EnrichmentFailure::Cancelled),
            fetch = fetch_details(self.source.as_ref(), candidate) => Ok(fetch),
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
