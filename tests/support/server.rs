//! Wiremock server initialisation for HTTP-backed behavioural tests.

use std::io;

use rstest_bdd::Slot;
use wiremock::MockServer;

use super::runtime::{SharedRuntime, ensure_runtime};

/// Ensures a Tokio runtime and Wiremock server are initialised.
///
/// # Errors
///
/// Returns an error if the Tokio runtime cannot be created or if the slots
/// behave unexpectedly.
pub fn ensure_runtime_and_server(
    runtime: &Slot<SharedRuntime>,
    server: &Slot<MockServer>,
) -> Result<SharedRuntime, io::Error> {
    let shared_runtime = ensure_runtime(runtime)?;

    if server.with_ref(|_| ()).is_none() {
        server.set(shared_runtime.block_on(MockServer::start()));
    }

    Ok(shared_runtime)
}
