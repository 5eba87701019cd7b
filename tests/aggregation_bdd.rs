//! Behavioural tests for activity aggregation.

mod support {
    #[path = "../support/runtime.rs"]
    pub mod runtime;
}

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeDelta, TimeZone, Utc};
use daily::telemetry::test_support::RecordingSink;
use daily::{
    ActivityKind, Aggregator, Provider, ProviderError, Summary, TelemetryEvent, TimeWindow,
    WorkItem,
};
use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::{ScenarioState, given, scenario, then, when};
use support::runtime::{SharedRuntime, ensure_runtime};

/// A provider whose behaviour is scripted by the scenario.
#[derive(Clone)]
struct ScriptedProvider {
    name: &'static str,
    configured: bool,
    result: Result<usize, ProviderError>,
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn activities(&self, window: &TimeWindow) -> Result<Vec<WorkItem>, ProviderError> {
        let count = self.result.clone()?;
        Ok((1..=count)
            .map(|index| {
                WorkItem::new(
                    format!("{}-{index}", self.name),
                    ActivityKind::Issue,
                    self.name,
                    format!("item {index}"),
                    window.from(),
                )
            })
            .collect())
    }
}

#[derive(ScenarioState, Default)]
struct AggregationState {
    runtime: Slot<SharedRuntime>,
    providers: Slot<Vec<ScriptedProvider>>,
    sink: Slot<Arc<RecordingSink>>,
    summary: Slot<Summary>,
}

#[fixture]
fn aggregation_state() -> AggregationState {
    AggregationState::default()
}

fn provider_name(name: &str) -> Result<&'static str, String> {
    match name {
        "github" => Ok("github"),
        "jira" => Ok("jira"),
        "obsidian" => Ok("obsidian"),
        "confluence" => Ok("confluence"),
        other => Err(format!("unknown provider {other}")),
    }
}

fn register(state: &AggregationState, provider: ScriptedProvider) {
    if state.providers.with_ref(|_| ()).is_none() {
        state.providers.set(Vec::new());
    }
    state.providers.with_mut(|providers| providers.push(provider));
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "rstest-bdd passes owned step arguments"
)]
#[given("a provider {name} returning {count:usize} items")]
fn returning_provider(
    aggregation_state: &AggregationState,
    name: String,
    count: usize,
) -> Result<(), String> {
    register(
        aggregation_state,
        ScriptedProvider {
            name: provider_name(&name)?,
            configured: true,
            result: Ok(count),
        },
    );
    Ok(())
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "rstest-bdd passes owned step arguments"
)]
#[given("a provider {name} that fails with a network error")]
fn failing_provider(aggregation_state: &AggregationState, name: String) -> Result<(), String> {
    register(
        aggregation_state,
        ScriptedProvider {
            name: provider_name(&name)?,
            configured: true,
            result: Err(ProviderError::Network {
                message: "connection reset".to_owned(),
            }),
        },
    );
    Ok(())
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "rstest-bdd passes owned step arguments"
)]
#[given("an unconfigured provider {name}")]
fn unconfigured_provider(aggregation_state: &AggregationState, name: String) -> Result<(), String> {
    register(
        aggregation_state,
        ScriptedProvider {
            name: provider_name(&name)?,
            configured: false,
            result: Ok(5),
        },
    );
    Ok(())
}

#[when("activity is aggregated for one day")]
fn aggregate(aggregation_state: &AggregationState) -> Result<(), String> {
    let runtime = ensure_runtime(&aggregation_state.runtime).map_err(|error| error.to_string())?;
    let sink = Arc::new(RecordingSink::default());
    let aggregator = aggregation_state
        .providers
        .take()
        .unwrap_or_default()
        .into_iter()
        .fold(Aggregator::new().with_sink(sink.clone()), |aggregator, provider| {
            aggregator.with_provider(Box::new(provider))
        });
    let from = Utc
        .with_ymd_and_hms(2025, 3, 4, 0, 0, 0)
        .single()
        .ok_or("invalid start time")?;
    let window = TimeWindow::new(from, from + TimeDelta::days(1));

    let summary = runtime.block_on(aggregator.aggregate(window));

    aggregation_state.summary.set(summary);
    aggregation_state.sink.set(sink);
    Ok(())
}

#[then("the summary contains {count:usize} items")]
fn assert_item_count(aggregation_state: &AggregationState, count: usize) -> Result<(), String> {
    let actual = aggregation_state
        .summary
        .with_ref(Summary::len)
        .ok_or("summary missing")?;
    if actual == count {
        Ok(())
    } else {
        Err(format!("expected {count} items but found {actual}"))
    }
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "rstest-bdd passes owned step arguments"
)]
#[then("the item ids are {ids}")]
fn assert_item_ids(aggregation_state: &AggregationState, ids: String) -> Result<(), String> {
    let expected: Vec<&str> = ids.trim_matches('"').split(',').collect();
    let actual: Vec<String> = aggregation_state
        .summary
        .with_ref(|summary| summary.items().iter().map(|item| item.id.clone()).collect())
        .ok_or("summary missing")?;
    if actual == expected {
        Ok(())
    } else {
        Err(format!("expected ids {expected:?} but found {actual:?}"))
    }
}

fn recorded_events(aggregation_state: &AggregationState) -> Result<Vec<TelemetryEvent>, String> {
    aggregation_state
        .sink
        .with_ref(|sink| sink.take())
        .ok_or_else(|| "telemetry sink missing".to_owned())
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "rstest-bdd passes owned step arguments"
)]
#[then("the failure of {name} is recorded")]
fn assert_failure_recorded(
    aggregation_state: &AggregationState,
    name: String,
) -> Result<(), String> {
    let events = recorded_events(aggregation_state)?;
    let recorded = events.iter().any(|event| {
        matches!(
            event,
            TelemetryEvent::ProviderFailed { provider, reason }
                if *provider == name && reason.contains("connection reset")
        )
    });
    if recorded {
        Ok(())
    } else {
        Err(format!("no failure recorded for {name}: {events:?}"))
    }
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "rstest-bdd passes owned step arguments"
)]
#[then("the provider {name} is recorded as skipped")]
fn assert_skip_recorded(aggregation_state: &AggregationState, name: String) -> Result<(), String> {
    let events = recorded_events(aggregation_state)?;
    let skipped = events.contains(&TelemetryEvent::ProviderSkipped {
        provider: name.clone(),
    });
    let failed = events
        .iter()
        .any(|event| matches!(event, TelemetryEvent::ProviderFailed { .. }));
    if skipped && !failed {
        Ok(())
    } else {
        Err(format!("expected only a skip for {name}: {events:?}"))
    }
}

#[scenario(path = "tests/features/aggregation.feature", index = 0)]
fn merges_in_registration_order(aggregation_state: AggregationState) {
    let _ = aggregation_state;
}

#[scenario(path = "tests/features/aggregation.feature", index = 1)]
fn failing_provider_is_isolated(aggregation_state: AggregationState) {
    let _ = aggregation_state;
}

#[scenario(path = "tests/features/aggregation.feature", index = 2)]
fn unconfigured_provider_is_skipped(aggregation_state: AggregationState) {
    let _ = aggregation_state;
}
