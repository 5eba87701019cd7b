//! Behavioural tests for the summary pipeline over HTTP and filesystem
//! providers.

mod support {
    #[path = "../support/runtime.rs"]
    pub mod runtime;
    #[path = "../support/server.rs"]
    pub mod server;
}

use std::fs;

use camino::Utf8PathBuf;
use chrono::{TimeDelta, Utc};
use daily::{
    Aggregation, Aggregator, JiraProvider, JiraSettings, ObsidianProvider, ObsidianSettings,
    ProviderError, TimeWindow,
};
use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::{ScenarioState, given, scenario, then, when};
use serde_json::json;
use support::runtime::SharedRuntime;
use support::server::ensure_runtime_and_server;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(ScenarioState, Default)]
struct PipelineState {
    runtime: Slot<SharedRuntime>,
    server: Slot<MockServer>,
    vault: Slot<Utf8PathBuf>,
    vault_dir: Slot<TempDir>,
    aggregation: Slot<Aggregation>,
}

#[fixture]
fn pipeline_state() -> PipelineState {
    PipelineState::default()
}

fn mount(pipeline_state: &PipelineState, response: ResponseTemplate) -> Result<(), String> {
    let runtime = ensure_runtime_and_server(&pipeline_state.runtime, &pipeline_state.server)
        .map_err(|error| error.to_string())?;
    let mock = Mock::given(method("GET"))
        .and(path("/rest/api/3/search"))
        .respond_with(response);
    pipeline_state
        .server
        .with_ref(|server| runtime.block_on(mock.mount(server)))
        .ok_or_else(|| "mock server not initialised".to_owned())
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "rstest-bdd passes owned step arguments"
)]
#[given("a Jira site with ticket {key} updated an hour ago")]
fn jira_with_ticket(pipeline_state: &PipelineState, key: String) -> Result<(), String> {
    let updated = (Utc::now() - TimeDelta::hours(1)).to_rfc3339();
    let body = json!({
        "issues": [{
            "key": key,
            "fields": {
                "summary": "Rotate credentials",
                "updated": updated,
                "status": { "name": "In Progress" }
            }
        }]
    });
    mount(pipeline_state, ResponseTemplate::new(200).set_body_json(body))
}

#[given("a Jira site that rejects the credentials")]
fn jira_rejecting(pipeline_state: &PipelineState) -> Result<(), String> {
    mount(
        pipeline_state,
        ResponseTemplate::new(401).set_body_string("Unauthorized"),
    )
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "rstest-bdd passes owned step arguments"
)]
#[given("an Obsidian vault with a note {name} containing an open task")]
fn vault_with_note(pipeline_state: &PipelineState, name: String) -> Result<(), String> {
    let dir = TempDir::new().map_err(|error| error.to_string())?;
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
        .map_err(|path| format!("non UTF-8 temp path {}", path.display()))?;
    fs::write(root.join(&name), "- [ ] Review rollout plan\n")
        .map_err(|error| error.to_string())?;
    pipeline_state.vault.set(root);
    pipeline_state.vault_dir.set(dir);
    Ok(())
}

#[when("the summary for the last day is built")]
fn build_summary(pipeline_state: &PipelineState) -> Result<(), String> {
    let runtime = ensure_runtime_and_server(&pipeline_state.runtime, &pipeline_state.server)
        .map_err(|error| error.to_string())?;
    let server_url = pipeline_state
        .server
        .with_ref(MockServer::uri)
        .ok_or("mock server URL missing")?;
    let jira = JiraProvider::new(JiraSettings {
        enabled: true,
        url: Some(server_url),
        email: Some("me@example.com".to_owned()),
        token: Some("secret".to_owned()),
        filter: None,
    })
    .map_err(|error| error.to_string())?;
    let obsidian = ObsidianProvider::new(ObsidianSettings {
        enabled: true,
        vault: pipeline_state.vault.get(),
    });
    let aggregator = Aggregator::new()
        .with_provider(Box::new(jira))
        .with_provider(Box::new(obsidian));
    let to = Utc::now() + TimeDelta::minutes(1);
    let window = TimeWindow::new(to - TimeDelta::days(1), to);

    let aggregation = runtime.block_on(aggregator.collect(window));

    pipeline_state.aggregation.set(aggregation);
    Ok(())
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "rstest-bdd passes owned step arguments"
)]
#[then("the summary item ids are {ids}")]
fn assert_ids(pipeline_state: &PipelineState, ids: String) -> Result<(), String> {
    let expected: Vec<&str> = ids.trim_matches('"').split(',').collect();
    let actual: Vec<String> = pipeline_state
        .aggregation
        .with_ref(|aggregation| {
            aggregation
                .summary
                .items()
                .iter()
                .map(|item| item.id.clone())
                .collect()
        })
        .ok_or("aggregation missing")?;
    if actual == expected {
        Ok(())
    } else {
        Err(format!("expected ids {expected:?} but found {actual:?}"))
    }
}

#[then("no provider failed")]
fn assert_no_failures(pipeline_state: &PipelineState) -> Result<(), String> {
    let failures = pipeline_state
        .aggregation
        .with_ref(|aggregation| aggregation.failures().count())
        .ok_or("aggregation missing")?;
    if failures == 0 {
        Ok(())
    } else {
        Err(format!("expected no failures but saw {failures}"))
    }
}

#[then("jira failed with an authentication error")]
fn assert_jira_auth_failure(pipeline_state: &PipelineState) -> Result<(), String> {
    let failed = pipeline_state
        .aggregation
        .with_ref(|aggregation| {
            aggregation.failures().any(|(provider, error)| {
                provider == "jira" && matches!(error, ProviderError::Authentication { .. })
            })
        })
        .ok_or("aggregation missing")?;
    if failed {
        Ok(())
    } else {
        Err("expected jira to fail with an authentication error".to_owned())
    }
}

#[scenario(path = "tests/features/summary_pipeline.feature", index = 0)]
fn merges_jira_and_vault(pipeline_state: PipelineState) {
    let _ = pipeline_state;
}

#[scenario(path = "tests/features/summary_pipeline.feature", index = 1)]
fn rejected_jira_is_isolated(pipeline_state: PipelineState) {
    let _ = pipeline_state;
}
