//! Review requests with CI status and diff statistics.

use std::io::{self, Write};
use std::sync::Arc;

use daily::review::EnrichmentFailure;
use daily::{
    DailyConfig, DailyError, EnrichedReview, EnrichmentPool, OutputFormat, Provider,
    ProviderError, ReviewBoard, ReviewCollector, TelemetryEvent, TelemetrySink,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::output::{io_error, write_detail_line, write_heading, write_item_details, write_json_to};
use super::providers::{Providers, telemetry_sink};

/// Lists and enriches review requests, then writes them to stdout.
///
/// Ctrl-C cancels outstanding enrichment; requests that were not enriched
/// in time are still listed. An unconfigured GitHub integration or a failed
/// listing renders an empty board and is reported on stderr only.
///
/// # Errors
///
/// Returns [`DailyError::Configuration`] for invalid provider or pool
/// settings and [`DailyError::Io`] when output cannot be written.
pub async fn run(config: &DailyConfig, format: OutputFormat) -> Result<(), DailyError> {
    let providers = Providers::from_config(config)?;
    let sink = telemetry_sink(config.verbose);
    let reviews = if Provider::is_configured(&providers.github) {
        let provider = Provider::name(&providers.github);
        let github = Arc::new(providers.github);
        let pool = EnrichmentPool::new(github.clone(), config.enrichment_settings()?)
            .with_sink(Arc::clone(&sink));
        let collector = ReviewCollector::new(github, pool).skip_details(config.skip_details);

        let cancel = CancellationToken::new();
        let interrupt = cancel_on_interrupt(cancel.clone());
        let listed = collector.collect(&cancel).await;
        interrupt.abort();
        board_or_empty(provider, listed, sink.as_ref())
    } else {
        tracing::info!("github is not configured; no review requests to list");
        sink.record(TelemetryEvent::ProviderSkipped {
            provider: Provider::name(&providers.github).to_owned(),
        });
        ReviewBoard::default()
    };

    let mut stdout = io::stdout().lock();
    match format {
        OutputFormat::Json => write_reviews_json_to(&mut stdout, &reviews),
        OutputFormat::Text => write_reviews_to(&mut stdout, &reviews, config.compact),
    }
}

/// Falls back to an empty board when the review requests cannot be listed.
fn board_or_empty(
    provider: &str,
    listed: Result<ReviewBoard, ProviderError>,
    sink: &dyn TelemetrySink,
) -> ReviewBoard {
    listed.unwrap_or_else(|error| {
        tracing::warn!(provider, %error, "listing review requests failed");
        sink.record(TelemetryEvent::ProviderFailed {
            provider: provider.to_owned(),
            reason: error.to_string(),
        });
        ReviewBoard::default()
    })
}

fn cancel_on_interrupt(cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling review enrichment");
            cancel.cancel();
        }
    })
}

#[derive(Debug, Serialize)]
struct ReviewReport<'a> {
    #[serde(flatten)]
    board: &'a ReviewBoard,
    total: usize,
}

/// Writes the board as pretty-printed JSON.
pub fn write_reviews_json_to<W: Write>(
    writer: &mut W,
    board: &ReviewBoard,
) -> Result<(), DailyError> {
    write_json_to(
        writer,
        &ReviewReport {
            board,
            total: board.len(),
        },
    )
}

/// Writes user requests, then team requests. Compact output keeps only the
/// CI and diff line under each request.
pub fn write_reviews_to<W: Write>(
    writer: &mut W,
    board: &ReviewBoard,
    compact: bool,
) -> Result<(), DailyError> {
    writeln!(writer, "Review requests ({})", board.len()).map_err(|e| io_error(&e))?;
    if board.is_empty() {
        writeln!(writer, "Nothing awaits your review.").map_err(|e| io_error(&e))?;
        return Ok(());
    }
    write_group(writer, "Requested from you", &board.user_requests, compact)?;
    write_group(writer, "Requested from your teams", &board.team_requests, compact)
}

fn write_group<W: Write>(
    writer: &mut W,
    heading: &str,
    reviews: &[EnrichedReview],
    compact: bool,
) -> Result<(), DailyError> {
    if reviews.is_empty() {
        return Ok(());
    }
    writeln!(writer).map_err(|e| io_error(&e))?;
    write_heading(writer, &format!("{heading} ({})", reviews.len()))?;
    for review in reviews {
        let candidate = review.candidate();
        writeln!(
            writer,
            "  {}#{}  {}",
            candidate.repository,
            candidate.number,
            review.item().title
        )
        .map_err(|e| io_error(&e))?;
        if let Some(line) = detail_line(review) {
            write_detail_line(writer, &line)?;
        }
        if compact {
            continue;
        }
        write_item_details(writer, review.item())?;
        if let Some(failure) = review.failure() {
            write_detail_line(writer, &failure_line(failure))?;
        }
    }
    Ok(())
}

/// `CI: <state> (<n> checks)  +adds -dels in <n> files`, from whichever
/// details were fetched.
fn detail_line(review: &EnrichedReview) -> Option<String> {
    let checks = review
        .check_status()
        .map(|status| format!("CI: {} ({} checks)", status.state.as_str(), status.total_count));
    let stats = review.change_stats().map(|stats| {
        format!(
            "+{} -{} in {} files",
            stats.additions, stats.deletions, stats.changed_files
        )
    });
    match (checks, stats) {
        (Some(ci), Some(diff)) => Some(format!("{ci}  {diff}")),
        (Some(line), None) | (None, Some(line)) => Some(line),
        (None, None) => None,
    }
}

fn failure_line(failure: &EnrichmentFailure) -> String {
    format!("details unavailable: {failure}")
}
