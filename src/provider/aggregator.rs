//! Sequential fan-out over providers with per-provider failure isolation.

use std::sync::Arc;

use crate::activity::{Summary, TimeWindow, WorkItem};
use crate::telemetry::{NoopTelemetrySink, TelemetryEvent, TelemetrySink};

use super::{Provider, ProviderError};

/// What happened to one provider during an aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderOutcome {
    /// The provider is not configured and was not called.
    Skipped {
        /// Provider name.
        provider: &'static str,
    },
    /// The provider failed and contributed nothing.
    Failed {
        /// Provider name.
        provider: &'static str,
        /// The failure it reported.
        error: ProviderError,
    },
    /// The provider returned `items` work items.
    Completed {
        /// Provider name.
        provider: &'static str,
        /// Number of items contributed.
        items: usize,
    },
}

/// A summary together with the per-provider outcomes that produced it.
#[derive(Debug, Clone)]
pub struct Aggregation {
    /// The merged summary.
    pub summary: Summary,
    /// One outcome per registered provider, in registration order.
    pub outcomes: Vec<ProviderOutcome>,
}

impl Aggregation {
    /// Returns the failures recorded during the aggregation.
    pub fn failures(&self) -> impl Iterator<Item = (&'static str, &ProviderError)> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            ProviderOutcome::Failed { provider, error } => Some((*provider, error)),
            ProviderOutcome::Skipped { .. } | ProviderOutcome::Completed { .. } => None,
        })
    }
}

/// Collects work items from multiple providers.
///
/// Providers are queried one after another in registration order. An
/// unconfigured provider is skipped silently and a failing provider
/// contributes zero items; neither stops the remaining providers.
pub struct Aggregator {
    providers: Vec<Box<dyn Provider>>,
    sink: Arc<dyn TelemetrySink>,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl Aggregator {
    /// Creates an aggregator with no providers and a no-op telemetry sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            sink: Arc::new(NoopTelemetrySink),
        }
    }

    /// Replaces the telemetry sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.sink = sink;
        self
    }

    /// Registers a provider after those already registered.
    #[must_use]
    pub fn with_provider(mut self, provider: Box<dyn Provider>) -> Self {
        self.add_provider(provider);
        self
    }

    /// Registers a provider after those already registered.
    pub fn add_provider(&mut self, provider: Box<dyn Provider>) {
        self.providers.push(provider);
    }

    /// Names of the registered providers, in registration order.
    #[must_use]
    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|provider| provider.name()).collect()
    }

    /// Builds the summary for `window`.
    pub async fn aggregate(&self, window: TimeWindow) -> Summary {
        self.collect(window).await.summary
    }

    /// Builds the summary for `window` and reports what each provider did.
    pub async fn collect(&self, window: TimeWindow) -> Aggregation {
        let mut items: Vec<WorkItem> = Vec::new();
        let mut outcomes = Vec::with_capacity(self.providers.len());

        for provider in &self.providers {
            let outcome = self.query(provider.as_ref(), &window, &mut items).await;
            outcomes.push(outcome);
        }

        tracing::debug!(total = items.len(), "aggregation finished");
        Aggregation {
            summary: Summary::new(window, items),
            outcomes,
        }
    }

    async fn query(
        &self,
        provider: &dyn Provider,
        window: &TimeWindow,
        items: &mut Vec<WorkItem>,
    ) -> ProviderOutcome {
        let name = provider.name();
        if !provider.is_configured() {
            tracing::debug!(provider = name, "provider not configured, skipping");
            self.sink.record(TelemetryEvent::ProviderSkipped {
                provider: name.to_owned(),
            });
            return ProviderOutcome::Skipped { provider: name };
        }

        tracing::debug!(provider = name, "querying provider");
        match provider.activities(window).await {
            Ok(returned) => {
                let count = returned.len();
                tracing::debug!(provider = name, items = count, "provider returned items");
                self.sink.record(TelemetryEvent::ProviderCompleted {
                    provider: name.to_owned(),
                    items: count,
                });
                items.extend(returned);
                ProviderOutcome::Completed {
                    provider: name,
                    items: count,
                }
            }
            Err(error) => {
                tracing::warn!(provider = name, %error, "provider failed");
                self.sink.record(TelemetryEvent::ProviderFailed {
                    provider: name.to_owned(),
                    reason: error.to_string(),
                });
                ProviderOutcome::Failed {
                    provider: name,
                    error,
                }
            }
        }
    }
}
