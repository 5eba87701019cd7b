//! Unit tests for the enrichment pool.

use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rstest::rstest;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::{EnrichmentPool, EnrichmentSettings};
use crate::activity::{ActivityKind, WorkItem};
use crate::provider::ProviderError;
use crate::review::{
    ChangeStats, CheckRun, CheckState, CheckStatus, EnrichedReview, EnrichmentFailure,
    MockReviewDetailSource, ReviewCandidate, ReviewDetailSource,
};
use crate::telemetry::TelemetryEvent;
use crate::telemetry::test_support::RecordingSink;

fn candidates(count: u64) -> Vec<ReviewCandidate> {
    let at = Utc
        .with_ymd_and_hms(2025, 3, 4, 9, 0, 0)
        .single()
        .expect("valid time");
    (1..=count)
        .map(|number| {
            let item = WorkItem::new(
                format!("github-pr-{number}"),
                ActivityKind::PullRequest,
                "github",
                format!("Change {number}"),
                at,
            )
            .with_url(format!("https://github.com/octo/repo/pull/{number}"));
            ReviewCandidate::new(item, "octo/repo", number)
        })
        .collect()
}

fn settings(workers: usize, interval_ms: u64) -> EnrichmentSettings {
    EnrichmentSettings::new(
        NonZeroUsize::new(workers).expect("non-zero worker count"),
        Duration::from_millis(interval_ms),
    )
}

fn passing_status() -> CheckStatus {
    CheckStatus::from_runs(
        1,
        vec![CheckRun {
            name: "build".to_owned(),
            status: "completed".to_owned(),
            conclusion: Some("success".to_owned()),
            url: None,
        }],
    )
}

/// Detail source with a fixed latency that tracks concurrent calls.
///
/// Numbers listed in `failing` fail both calls; numbers in `panicking`
/// panic inside the check-status call.
#[derive(Default)]
struct TrackingSource {
    latency: Duration,
    failing: HashSet<u64>,
    panicking: HashSet<u64>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

impl TrackingSource {
    fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReviewDetailSource for TrackingSource {
    async fn check_status(
        &self,
        _repository: &str,
        number: u64,
    ) -> Result<CheckStatus, ProviderError> {
        if self.panicking.contains(&number) {
            panic!("detail source crashed on #{number}");
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.latency).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if self.failing.contains(&number) {
            return Err(ProviderError::Network {
                message: format!("timeout fetching checks for #{number}"),
            });
        }
        Ok(passing_status())
    }

    async fn change_stats(
        &self,
        _repository: &str,
        number: u64,
    ) -> Result<ChangeStats, ProviderError> {
        if self.failing.contains(&number) {
            return Err(ProviderError::Api {
                message: format!("pull request #{number} not found"),
            });
        }
        Ok(ChangeStats {
            additions: number * 10,
            deletions: number,
            changed_files: 1,
        })
    }
}

fn titles(reviews: &[EnrichedReview]) -> Vec<String> {
    reviews
        .iter()
        .map(|review| review.item().title.clone())
        .collect()
}

#[tokio::test]
async fn empty_input_returns_immediately_without_calls() {
    let mut source = MockReviewDetailSource::new();
    source.expect_check_status().never();
    source.expect_change_stats().never();
    let pool = EnrichmentPool::new(Arc::new(source), settings(5, 200));

    let output = pool.enrich(&[], &CancellationToken::new()).await;

    assert!(output.is_empty());
}

#[tokio::test(start_paused = true)]
async fn three_candidates_respect_global_rate_interval() {
    let source = Arc::new(TrackingSource::default());
    let pool = EnrichmentPool::new(source, settings(5, 200));
    let input = candidates(3);
    let started = Instant::now();

    let output = pool.enrich(&input, &CancellationToken::new()).await;

    assert!(
        started.elapsed() >= Duration::from_millis(400),
        "elapsed {:?}",
        started.elapsed()
    );
    assert_eq!(output.len(), 3);
    assert_eq!(titles(&output), vec!["Change 1", "Change 2", "Change 3"]);
}

#[rstest]
#[case::fewer_workers_than_jobs(3, 12)]
#[case::single_worker(1, 4)]
#[case::more_workers_than_jobs(8, 2)]
#[tokio::test(start_paused = true)]
async fn never_exceeds_worker_bound(#[case] workers: usize, #[case] count: u64) {
    let source = Arc::new(TrackingSource::with_latency(Duration::from_millis(500)));
    let pool = EnrichmentPool::new(source.clone(), settings(workers, 10));

    let output = pool.enrich(&candidates(count), &CancellationToken::new()).await;

    assert_eq!(output.len(), usize::try_from(count).expect("small count"));
    assert!(source.peak() >= 1);
    assert!(
        source.peak() <= workers,
        "peak {} exceeded {workers} workers",
        source.peak()
    );
}

#[tokio::test(start_paused = true)]
async fn preserves_order_when_completions_are_shuffled() {
    let source = Arc::new(TrackingSource::with_latency(Duration::from_millis(50)));
    let pool = EnrichmentPool::new(source, settings(4, 0));
    let input = candidates(9);

    let output = pool.enrich(&input, &CancellationToken::new()).await;

    for (review, candidate) in output.iter().zip(&input) {
        assert_eq!(review.candidate(), candidate);
        assert_eq!(
            review.check_status().map(|status| status.state),
            Some(CheckState::Success)
        );
    }
}

#[tokio::test(start_paused = true)]
async fn failed_detail_calls_fall_back_to_identity_fields() {
    let source = Arc::new(TrackingSource {
        failing: HashSet::from([2]),
        ..TrackingSource::default()
    });
    let pool = EnrichmentPool::new(source, settings(2, 0));
    let input = candidates(3);

    let output = pool.enrich(&input, &CancellationToken::new()).await;

    let failed = output.get(1).expect("second result");
    assert_eq!(failed.candidate(), input.get(1).expect("second candidate"));
    assert!(failed.check_status().is_none());
    assert!(failed.change_stats().is_none());
    assert_eq!(
        failed.failure(),
        Some(&EnrichmentFailure::Detail(ProviderError::Network {
            message: "timeout fetching checks for #2".to_owned(),
        }))
    );

    let neighbour = output.get(2).expect("third result");
    assert!(neighbour.failure().is_none());
    assert_eq!(
        neighbour.change_stats(),
        Some(&ChangeStats {
            additions: 30,
            deletions: 3,
            changed_files: 1,
        })
    );
}

#[tokio::test]
async fn one_failing_call_discards_the_other_detail() {
    let mut source = MockReviewDetailSource::new();
    source
        .expect_check_status()
        .returning(|_, _| Ok(CheckStatus::from_runs(0, Vec::new())));
    source.expect_change_stats().returning(|_, _| {
        Err(ProviderError::RateLimitExceeded {
            message: "secondary rate limit".to_owned(),
        })
    });
    let pool = EnrichmentPool::new(Arc::new(source), settings(1, 0));

    let output = pool.enrich(&candidates(1), &CancellationToken::new()).await;

    let review = output.first().expect("one result");
    assert!(review.check_status().is_none());
    assert!(review.change_stats().is_none());
    assert_eq!(review.candidate(), candidates(1).first().expect("one candidate"));
    assert!(matches!(
        review.failure(),
        Some(EnrichmentFailure::Detail(ProviderError::RateLimitExceeded { .. }))
    ));
}

#[tokio::test]
async fn cancelled_before_start_degrades_every_item() {
    let mut source = MockReviewDetailSource::new();
    source.expect_check_status().never();
    source.expect_change_stats().never();
    let pool = EnrichmentPool::new(Arc::new(source), settings(2, 0));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let output = pool.enrich(&candidates(4), &cancel).await;

    assert_eq!(output.len(), 4);
    assert!(
        output
            .iter()
            .all(|review| review.failure() == Some(&EnrichmentFailure::Cancelled))
    );
}

#[tokio::test(start_paused = true)]
async fn cancellation_mid_flight_still_yields_every_item() {
    let source = Arc::new(TrackingSource::with_latency(Duration::from_secs(30)));
    let pool = EnrichmentPool::new(source.clone(), settings(2, 100));
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        trigger.cancel();
    });

    let output = pool.enrich(&candidates(5), &cancel).await;

    assert_eq!(output.len(), 5);
    assert_eq!(titles(&output).first().map(String::as_str), Some("Change 1"));
    assert!(
        output
            .iter()
            .all(|review| review.failure() == Some(&EnrichmentFailure::Cancelled))
    );
    assert_eq!(source.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn crashed_worker_leaves_a_worker_lost_fallback() {
    let source = Arc::new(TrackingSource {
        panicking: HashSet::from([1]),
        ..TrackingSource::default()
    });
    let pool = EnrichmentPool::new(source, settings(2, 0));

    let output = pool.enrich(&candidates(3), &CancellationToken::new()).await;

    assert_eq!(output.len(), 3);
    assert_eq!(
        output.first().and_then(EnrichedReview::failure),
        Some(&EnrichmentFailure::WorkerLost { index: 0 })
    );
    assert!(output.iter().skip(1).all(|review| review.failure().is_none()));
}

#[tokio::test(start_paused = true)]
async fn records_completion_counts() {
    let sink = Arc::new(RecordingSink::default());
    let source = Arc::new(TrackingSource {
        failing: HashSet::from([1, 3]),
        ..TrackingSource::default()
    });
    let pool = EnrichmentPool::new(source, settings(5, 0)).with_sink(sink.clone());

    let _output = pool.enrich(&candidates(4), &CancellationToken::new()).await;

    assert_eq!(
        sink.take(),
        vec![TelemetryEvent::EnrichmentCompleted {
            succeeded: 2,
            degraded: 2,
        }]
    );
}

#[test]
fn default_settings_match_reference_pool() {
    let defaults = EnrichmentSettings::default();

    assert_eq!(defaults.workers().get(), 5);
    assert_eq!(defaults.rate_interval(), Duration::from_millis(200));
}
