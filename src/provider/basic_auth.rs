//! JSON-over-HTTPS client for services that accept email and API-token
//! basic authentication (Jira and Confluence).

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use super::ProviderError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const ERROR_BODY_LIMIT: usize = 160;

/// Basic-auth REST client rooted at a service base URL.
#[derive(Debug, Clone)]
pub(crate) struct BasicAuthClient {
    http: Client,
    base_url: String,
    email: String,
    token: String,
}

impl BasicAuthClient {
    /// Creates a client for `base_url`.
    ///
    /// A trailing slash on the base URL is dropped so paths can be appended
    /// verbatim.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::InvalidUrl` when `base_url` is not an absolute
    /// URL, or `ProviderError::Api` when the HTTP client cannot be built.
    pub(crate) fn new(base_url: &str, email: &str, token: &str) -> Result<Self, ProviderError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        Url::parse(trimmed).map_err(|error| ProviderError::InvalidUrl {
            message: format!("{trimmed}: {error}"),
        })?;
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|error| ProviderError::Api {
                message: format!("failed to configure HTTP client: {error}"),
            })?;
        Ok(Self {
            http,
            base_url: trimmed.to_owned(),
            email: email.to_owned(),
            token: token.to_owned(),
        })
    }

    /// Base URL without a trailing slash.
    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issues `GET {base}{path}?{query}` and decodes the JSON body.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        let endpoint = format!("{}{path}", self.base_url);
        tracing::debug!(operation, %endpoint, "sending request");
        let response = self
            .http
            .get(endpoint)
            .basic_auth(&self.email, Some(&self.token))
            .header(reqwest::header::ACCEPT, "application/json")
            .query(query)
            .send()
            .await
            .map_err(|error| ProviderError::Network {
                message: format!("{operation} failed: {error}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.map_or_else(
                |_| "(failed to read error response body)".to_owned(),
                |content| truncate_for_message(&content, ERROR_BODY_LIMIT),
            );
            return Err(map_status(operation, status, &body));
        }

        response
            .json::<T>()
            .await
            .map_err(|error| ProviderError::Decode {
                message: format!("{operation} returned an unexpected body: {error}"),
            })
    }
}

fn map_status(operation: &str, status: StatusCode, body: &str) -> ProviderError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Authentication {
            message: format!("{operation} failed with status {}: {body}", status.as_u16()),
        },
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimitExceeded {
            message: format!("{operation} failed: {body}"),
        },
        _ => ProviderError::Api {
            message: format!("{operation} failed with status {}: {body}", status.as_u16()),
        },
    }
}

fn truncate_for_message(content: &str, limit: usize) -> String {
    let trimmed = content.trim();
    if trimmed.chars().count() <= limit {
        return trimmed.to_owned();
    }
    let prefix: String = trimmed.chars().take(limit).collect();
    format!("{prefix}...")
}
