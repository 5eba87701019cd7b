//! Maps Octocrab failures onto [`ProviderError`].

use http::StatusCode;

use crate::provider::ProviderError;

/// Checks if a GitHub error status indicates an authentication failure.
const fn is_auth_failure(status: StatusCode) -> bool {
    matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
}

/// Checks if an octocrab error represents a network/transport issue.
const fn is_network_error(error: &octocrab::Error) -> bool {
    matches!(
        error,
        octocrab::Error::Http { .. }
            | octocrab::Error::Hyper { .. }
            | octocrab::Error::Service { .. }
    )
}

const fn is_decode_error(error: &octocrab::Error) -> bool {
    matches!(
        error,
        octocrab::Error::Serde { .. } | octocrab::Error::Json { .. }
    )
}

/// Checks whether the GitHub error represents a rate limit error based on the
/// HTTP status and message / documentation URL content.
fn is_rate_limit_error(source: &octocrab::GitHubError) -> bool {
    let is_rate_limit_status = matches!(
        source.status_code,
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS
    );

    let message_indicates_rate_limit = source.message.to_lowercase().contains("rate limit")
        || source
            .documentation_url
            .as_deref()
            .is_some_and(|url| url.contains("rate-limit"));

    is_rate_limit_status && message_indicates_rate_limit
}

pub(super) fn map_octocrab_error(operation: &str, error: &octocrab::Error) -> ProviderError {
    if let octocrab::Error::GitHub { source, .. } = error {
        let status = source.status_code;
        let message = &source.message;
        if is_rate_limit_error(source) {
            return ProviderError::RateLimitExceeded {
                message: format!("{operation} failed: {message}"),
            };
        }
        return if is_auth_failure(status) {
            ProviderError::Authentication {
                message: format!("{operation} failed: GitHub returned {status} {message}"),
            }
        } else {
            ProviderError::Api {
                message: format!("{operation} failed with status {status}: {message}"),
            }
        };
    }

    if is_network_error(error) {
        return ProviderError::Network {
            message: format!("{operation} failed: {error}"),
        };
    }

    if is_decode_error(error) {
        return ProviderError::Decode {
            message: format!("{operation} returned an unexpected body: {error}"),
        };
    }

    ProviderError::Api {
        message: format!("{operation} failed: {error}"),
    }
}
