//! A single permit stream shared by every enrichment worker.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Instant, sleep_until};

/// Hands out at most one permit per interval across all callers.
///
/// The first permit is immediate. Each later permit is released no sooner
/// than `interval` after the previous one, whichever worker asks for it.
/// Callers queue on the internal lock, so permits are granted one at a time.
#[derive(Debug)]
pub struct PermitSource {
    interval: Duration,
    next: Mutex<Option<Instant>>,
}

impl PermitSource {
    /// Creates a permit source releasing one permit per `interval`.
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            next: Mutex::const_new(None),
        }
    }

    /// Spacing between permits.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Waits for the next permit.
    ///
    /// Dropping the returned future before it completes releases the queue
    /// position without consuming a permit.
    pub async fn acquire(&self) {
        let mut next = self.next.lock().await;
        if let Some(at) = *next {
            sleep_until(at).await;
        }
        *next = Some(Instant::now() + self.interval);
    }
}
