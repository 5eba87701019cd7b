//! Octocrab client construction.

use http::Uri;
use octocrab::Octocrab;

use crate::provider::ProviderError;

use super::error_mapping::map_octocrab_error;

/// Builds an Octocrab client for the given token and API base URL.
///
/// # Errors
///
/// Returns `ProviderError::InvalidUrl` when the base URI cannot be parsed or
/// `ProviderError::Api` when Octocrab fails to construct a client.
pub(super) fn build_octocrab_client(
    token: &str,
    api_base: &str,
) -> Result<Octocrab, ProviderError> {
    let base_uri: Uri = api_base
        .parse::<Uri>()
        .map_err(|error| ProviderError::InvalidUrl {
            message: format!("{api_base}: {error}"),
        })?;

    Octocrab::builder()
        .personal_token(token)
        .base_uri(base_uri)
        .map_err(|error| ProviderError::Api {
            message: format!("build client failed: {error}"),
        })?
        .build()
        .map_err(|error| map_octocrab_error("build client", &error))
}
