//! Application configuration loaded from CLI, environment, and files.
//!
//! This module provides a unified configuration struct that merges values
//! from command-line arguments, environment variables, and configuration
//! files using ortho-config's layered approach.
//!
//! # Precedence
//!
//! Configuration values are loaded with the following precedence (lowest to
//! highest):
//!
//! 1. **Defaults** – Built-in application defaults
//! 2. **Configuration file** – `.daily.toml` in the current directory, home
//!    directory, or XDG config directory
//! 3. **Environment variables** – `DAILY_GITHUB_TOKEN`, `DAILY_JIRA_URL`, and
//!    so on; `GITHUB_TOKEN` is honoured when no GitHub token is configured
//! 4. **Command-line arguments** – `--since`/`-s`, `--reviews`/`-r`, ...
//!
//! # Configuration File
//!
//! ```toml
//! github_enabled = true
//! github_username = "octocat"
//! github_filter = "org:acme"
//! jira_enabled = true
//! jira_url = "https://acme.atlassian.net"
//! jira_email = "octocat@example.com"
//! obsidian_enabled = true
//! obsidian_vault = "/home/octocat/notes"
//! review_workers = 5
//! review_rate_interval_ms = 200
//! ```

use std::env;
use std::num::NonZeroUsize;
use std::time::Duration;

use camino::Utf8PathBuf;
use chrono::{DateTime, Local, Utc};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

use crate::activity::{TimeWindow, parse_date, parse_since};
use crate::confluence::ConfluenceSettings;
use crate::error::DailyError;
use crate::github::GitHubSettings;
use crate::jira::JiraSettings;
use crate::obsidian::ObsidianSettings;
use crate::review::EnrichmentSettings;

const DEFAULT_SINCE: &str = "1d";
const DEFAULT_OUTPUT: &str = "text";
const DEFAULT_REVIEW_RATE_INTERVAL_MS: u64 = 200;

/// Operation mode determined by CLI arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationMode {
    /// Summarise activity inside a time window.
    Summary,
    /// List outstanding work.
    Todo,
    /// List review requests with CI and diff details.
    Reviews,
}

/// Output rendering selected with `--output`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text.
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Application configuration supporting CLI, environment, and file sources.
///
/// Boolean switches such as `github_enabled` are read from the CLI and the
/// configuration file only; `ortho_config` does not load boolean values from
/// the environment.
///
/// # Example
///
/// ```no_run
/// use daily::DailyConfig;
/// use ortho_config::OrthoConfig;
///
/// let config = DailyConfig::load().expect("failed to load configuration");
/// let mode = config.operation_mode();
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(
    prefix = "DAILY",
    discovery(
        dotfile_name = ".daily.toml",
        config_file_name = "daily.toml",
        app_name = "daily"
    )
)]
pub struct DailyConfig {
    /// Day to summarise: `today`, `yesterday`, or `YYYY-MM-DD`.
    ///
    /// Cannot be combined with `since`.
    #[ortho_config(cli_short = 'd')]
    pub date: Option<String>,

    /// Look-back period ending now, e.g. `3h`, `1d`, `2w`, `1m`.
    ///
    /// Defaults to `1d` when neither `date` nor `since` is given.
    #[ortho_config(cli_short = 's')]
    pub since: Option<String>,

    /// Output format: `text` or `json`.
    #[ortho_config(cli_short = 'o')]
    pub output: String,

    /// One line per item in text output.
    #[ortho_config(cli_short = 'c')]
    pub compact: bool,

    /// Debug logging and per-provider progress on stderr.
    #[ortho_config(cli_short = 'v')]
    pub verbose: bool,

    /// Lists outstanding work instead of a summary.
    #[ortho_config(cli_short = 't')]
    pub todo: bool,

    /// Lists review requests instead of a summary. Wins over `todo`.
    #[ortho_config(cli_short = 'r')]
    pub reviews: bool,

    /// Lists review requests without fetching CI status or diff stats.
    #[ortho_config(cli_short = 'k')]
    pub skip_details: bool,

    /// Enables the GitHub integration.
    #[ortho_config(cli_short = 'G')]
    pub github_enabled: bool,

    /// GitHub personal access token; falls back to `GITHUB_TOKEN`.
    #[ortho_config(cli_short = 'g')]
    pub github_token: Option<String>,

    /// GitHub login whose activity is reported.
    #[ortho_config(cli_short = 'u')]
    pub github_username: Option<String>,

    /// Search qualifiers appended to every GitHub query, e.g. `org:acme`.
    #[ortho_config(cli_short = 'f')]
    pub github_filter: Option<String>,

    /// GitHub API base URL, for GitHub Enterprise.
    #[ortho_config(cli_short = 'a')]
    pub github_api_url: Option<String>,

    /// Enables the Jira integration.
    #[ortho_config(cli_short = 'J')]
    pub jira_enabled: bool,

    /// Jira site URL.
    #[ortho_config(cli_short = 'j')]
    pub jira_url: Option<String>,

    /// Jira account email.
    #[ortho_config(cli_short = 'e')]
    pub jira_email: Option<String>,

    /// Jira API token.
    #[ortho_config(cli_short = 'x')]
    pub jira_token: Option<String>,

    /// JQL clause `AND`-ed onto every Jira query.
    #[ortho_config(cli_short = 'q')]
    pub jira_filter: Option<String>,

    /// Enables the Confluence integration.
    #[ortho_config(cli_short = 'C')]
    pub confluence_enabled: bool,

    /// Confluence site URL; `https://` is assumed when omitted.
    #[ortho_config(cli_short = 'l')]
    pub confluence_url: Option<String>,

    /// Confluence account email.
    #[ortho_config(cli_short = 'm')]
    pub confluence_email: Option<String>,

    /// Confluence API token.
    #[ortho_config(cli_short = 'n')]
    pub confluence_token: Option<String>,

    /// Enables the Obsidian integration.
    #[ortho_config(cli_short = 'O')]
    pub obsidian_enabled: bool,

    /// Path to the Obsidian vault.
    #[ortho_config(cli_short = 'b')]
    pub obsidian_vault: Option<String>,

    /// Concurrent review enrichment workers. Must be at least one.
    #[ortho_config(cli_short = 'w')]
    pub review_workers: usize,

    /// Minimum spacing between review detail requests, in milliseconds.
    #[ortho_config(cli_short = 'i')]
    pub review_rate_interval_ms: u64,
}

impl Default for DailyConfig {
    fn default() -> Self {
        Self {
            date: None,
            since: None,
            output: DEFAULT_OUTPUT.to_owned(),
            compact: false,
            verbose: false,
            todo: false,
            reviews: false,
            skip_details: false,
            github_enabled: false,
            github_token: None,
            github_username: None,
            github_filter: None,
            github_api_url: None,
            jira_enabled: false,
            jira_url: None,
            jira_email: None,
            jira_token: None,
            jira_filter: None,
            confluence_enabled: false,
            confluence_url: None,
            confluence_email: None,
            confluence_token: None,
            obsidian_enabled: false,
            obsidian_vault: None,
            review_workers: EnrichmentSettings::DEFAULT_WORKERS.get(),
            review_rate_interval_ms: DEFAULT_REVIEW_RATE_INTERVAL_MS,
        }
    }
}

impl DailyConfig {
    /// Determines the operation mode from the command switches.
    ///
    /// `reviews` wins over `todo`; with neither set the summary runs.
    #[must_use]
    pub const fn operation_mode(&self) -> OperationMode {
        if self.reviews {
            OperationMode::Reviews
        } else if self.todo {
            OperationMode::Todo
        } else {
            OperationMode::Summary
        }
    }

    /// Checks that the configuration is internally consistent.
    ///
    /// # Errors
    ///
    /// Returns [`DailyError::Configuration`] when both `date` and `since` are
    /// set, and [`DailyError::InvalidArgument`] for an unknown output format.
    pub fn validate(&self) -> Result<(), DailyError> {
        if self.date.is_some() && self.since.is_some() {
            return Err(DailyError::Configuration {
                message: "cannot use both --date and --since".to_owned(),
            });
        }
        self.output_format().map(|_| ())
    }

    /// Parses the `output` setting.
    ///
    /// # Errors
    ///
    /// Returns [`DailyError::InvalidArgument`] when the value is not `text`
    /// or `json`.
    pub fn output_format(&self) -> Result<OutputFormat, DailyError> {
        match self.output.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(DailyError::InvalidArgument {
                argument: format!("--output {} (expected text or json)", self.output),
            }),
        }
    }

    /// Resolves the summary window relative to `now`.
    ///
    /// `date` selects one local calendar day; otherwise `since` (default
    /// `1d`) selects the period ending at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`DailyError::InvalidDate`] or [`DailyError::InvalidSince`]
    /// when the corresponding value cannot be parsed or lies outside the
    /// supported calendar range.
    pub fn summary_window(&self, now: DateTime<Local>) -> Result<TimeWindow, DailyError> {
        if let Some(date) = self.date.as_deref() {
            let day = parse_date(date, now.date_naive())?;
            return TimeWindow::for_day(day);
        }
        let since = self.since.as_deref().unwrap_or(DEFAULT_SINCE);
        parse_since(since, now.with_timezone(&Utc))
    }

    /// Resolves the GitHub token from configuration or the `GITHUB_TOKEN`
    /// environment variable.
    #[must_use]
    pub fn resolve_github_token(&self) -> Option<String> {
        self.github_token
            .clone()
            .filter(|token| !token.trim().is_empty())
            .or_else(|| env::var("GITHUB_TOKEN").ok())
    }

    /// Settings for the GitHub provider.
    #[must_use]
    pub fn github_settings(&self) -> GitHubSettings {
        GitHubSettings {
            enabled: self.github_enabled,
            token: self.resolve_github_token(),
            username: self.github_username.clone(),
            filter: self.github_filter.clone(),
            api_url: self.github_api_url.clone(),
        }
    }

    /// Settings for the Jira provider.
    #[must_use]
    pub fn jira_settings(&self) -> JiraSettings {
        JiraSettings {
            enabled: self.jira_enabled,
            url: self.jira_url.clone(),
            email: self.jira_email.clone(),
            token: self.jira_token.clone(),
            filter: self.jira_filter.clone(),
        }
    }

    /// Settings for the Confluence provider.
    #[must_use]
    pub fn confluence_settings(&self) -> ConfluenceSettings {
        ConfluenceSettings {
            enabled: self.confluence_enabled,
            url: self.confluence_url.clone(),
            email: self.confluence_email.clone(),
            token: self.confluence_token.clone(),
        }
    }

    /// Settings for the Obsidian provider.
    #[must_use]
    pub fn obsidian_settings(&self) -> ObsidianSettings {
        ObsidianSettings {
            enabled: self.obsidian_enabled,
            vault: self.obsidian_vault.clone().map(Utf8PathBuf::from),
        }
    }

    /// Worker-pool settings for review enrichment.
    ///
    /// # Errors
    ///
    /// Returns [`DailyError::Configuration`] when `review_workers` is zero.
    pub fn enrichment_settings(&self) -> Result<EnrichmentSettings, DailyError> {
        let workers =
            NonZeroUsize::new(self.review_workers).ok_or_else(|| DailyError::Configuration {
                message: "review_workers must be at least 1".to_owned(),
            })?;
        Ok(EnrichmentSettings::new(
            workers,
            Duration::from_millis(self.review_rate_interval_ms),
        ))
    }
}

#[cfg(test)]
mod tests;
