//! Daily CLI entrypoint for activity summaries, todos, and review requests.

use std::io::{self, Write};
use std::process::ExitCode;

use daily::telemetry::init_tracing;
use daily::{DailyConfig, DailyError, OperationMode};
use ortho_config::OrthoConfig;

mod cli;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            if writeln!(io::stderr().lock(), "{error}").is_err() {
                return ExitCode::FAILURE;
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), DailyError> {
    let config = load_config()?;
    config.validate()?;
    init_tracing(config.verbose);

    let format = config.output_format()?;
    let mode = config.operation_mode();
    tracing::debug!(?mode, ?format, "starting");
    match mode {
        OperationMode::Summary => cli::summary::run(&config, format).await,
        OperationMode::Todo => cli::todo::run(&config, format).await,
        OperationMode::Reviews => cli::reviews::run(&config, format).await,
    }
}

/// Loads configuration from CLI, environment, and files.
///
/// # Errors
///
/// Returns [`DailyError::Configuration`] when ortho-config fails to parse
/// arguments or load configuration files.
fn load_config() -> Result<DailyConfig, DailyError> {
    DailyConfig::load().map_err(|error| DailyError::Configuration {
        message: error.to_string(),
    })
}
