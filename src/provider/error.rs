//! Error types shared by every provider integration.

use serde::Serialize;
use thiserror::Error;

/// Errors surfaced while a provider talks to its backing service.
///
/// Every remote or filesystem call made by a provider funnels into this
/// type so the aggregator and the enrichment pool can treat failures from
/// different services uniformly.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProviderError {
    /// The provider lacks the credentials or paths it needs.
    #[error("{provider} provider not configured")]
    NotConfigured {
        /// Name of the provider that was asked to do work.
        provider: String,
    },

    /// The caller supplied arguments the provider cannot act on.
    #[error("invalid request: {message}")]
    InvalidRequest {
        /// Description of what was wrong with the request.
        message: String,
    },

    /// A configured base URL could not be parsed.
    #[error("invalid URL: {message}")]
    InvalidUrl {
        /// Parser error detail.
        message: String,
    },

    /// The service rejected the supplied credentials.
    #[error("authentication failed: {message}")]
    Authentication {
        /// Message returned alongside the 401/403 response.
        message: String,
    },

    /// The service returned a non-authentication API error.
    #[error("API error: {message}")]
    Api {
        /// Response detail describing the failure.
        message: String,
    },

    /// Networking failed while calling the service.
    #[error("network error: {message}")]
    Network {
        /// Transport-level error detail.
        message: String,
    },

    /// The service refused the call because its rate limit was exhausted.
    #[error("rate limit exceeded: {message}")]
    RateLimitExceeded {
        /// Message returned by the service.
        message: String,
    },

    /// A response body did not match the expected shape.
    #[error("could not decode response: {message}")]
    Decode {
        /// Deserialisation error detail.
        message: String,
    },

    /// Local I/O failed (used by filesystem-backed providers).
    #[error("I/O error: {message}")]
    Io {
        /// Error detail from the underlying I/O operation.
        message: String,
    },
}

impl ProviderError {
    /// Builds a [`ProviderError::NotConfigured`] for the named provider.
    #[must_use]
    pub fn not_configured(provider: &str) -> Self {
        Self::NotConfigured {
            provider: provider.to_owned(),
        }
    }
}
