//! Errors surfaced by the command layer.

use thiserror::Error;

use crate::provider::ProviderError;

/// Failures that stop a `daily` command before it can render output.
///
/// Provider and enrichment failures are normally absorbed by the
/// aggregation pipeline; only listing failures that leave a command with
/// nothing to show reach this type through [`DailyError::Provider`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DailyError {
    /// Configuration could not be loaded or is inconsistent.
    #[error("configuration error: {message}")]
    Configuration {
        /// Details about the configuration failure.
        message: String,
    },

    /// A command-line value is not one the CLI accepts.
    #[error("invalid argument: {argument}")]
    InvalidArgument {
        /// The offending flag or value.
        argument: String,
    },

    /// A `--date` value could not be parsed.
    #[error("invalid date '{value}' (expected today, yesterday, or YYYY-MM-DD)")]
    InvalidDate {
        /// The rejected input.
        value: String,
    },

    /// A `--since` value could not be parsed.
    #[error("invalid since '{value}' (expected <n>h, <n>d, <n>w, or <n>m)")]
    InvalidSince {
        /// The rejected input.
        value: String,
    },

    /// Writing output failed.
    #[error("I/O error: {message}")]
    Io {
        /// Error detail from the underlying I/O operation.
        message: String,
    },

    /// A provider call the command depends on failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}
