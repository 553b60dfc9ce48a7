// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP transport shared by the vendor REST clients.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::{ParseError, ProtocolError};

// ============================================================================
// HttpConfig
// ============================================================================

/// Configuration for a vendor REST endpoint.
///
/// # Examples
///
/// ```
/// use homeprobe::protocol::HttpConfig;
/// use std::time::Duration;
///
/// let config = HttpConfig::new("https://openapi.api.govee.com/")
///     .with_timeout(Duration::from_secs(5));
///
/// assert_eq!(config.base_url(), "https://openapi.api.govee.com");
/// assert_eq!(config.timeout(), Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
pub struct HttpConfig {
    base_url: String,
    timeout: Duration,
}

impl HttpConfig {
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a configuration for `base_url`.
    ///
    /// A trailing slash is removed so paths can be appended with a leading `/`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Creates an [`HttpClient`] from this configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn into_client(self) -> Result<HttpClient, ProtocolError> {
        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(ProtocolError::Http)?;

        Ok(HttpClient {
            base_url: self.base_url,
            client,
        })
    }
}

// ============================================================================
// HttpClient
// ============================================================================

/// A `reqwest` client bound to one vendor base URL.
#[derive(Debug, Clone)]
pub struct HttpClient {
    base_url: String,
    client: Client,
}

impl HttpClient {
    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Joins `path` onto the base URL.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Starts a request to `path`.
    #[must_use]
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        tracing::debug!(%method, url = %url, "Preparing HTTP request");
        self.client.request(method, url)
    }

    /// Sends `request` and decodes a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError`] for transport or status failures and
    /// [`ParseError`] if the body is not the expected JSON.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> crate::Result<T> {
        let response = request.send().await.map_err(ProtocolError::Http)?;
        let response = check_status(response).await?;
        let body = response.text().await.map_err(ProtocolError::Http)?;

        tracing::debug!(body = %body, "Received HTTP response");

        serde_json::from_str(&body).map_err(|e| ParseError::Json(e).into())
    }
}

/// Maps non-success status codes to [`ProtocolError`].
///
/// - 401 becomes [`ProtocolError::AuthenticationFailed`]
/// - 429 becomes [`ProtocolError::RateLimited`]
/// - any other non-2xx becomes [`ProtocolError::ConnectionFailed`] with the
///   status code and response body
///
/// # Errors
///
/// Returns the mapped error for any non-2xx status.
pub async fn check_status(response: Response) -> Result<Response, ProtocolError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status {
        StatusCode::UNAUTHORIZED => Err(ProtocolError::AuthenticationFailed),
        StatusCode::TOO_MANY_REQUESTS => Err(ProtocolError::RateLimited),
        _ => {
            let body = response.text().await.unwrap_or_default();
            let detail = if body.is_empty() {
                status.canonical_reason().unwrap_or("Unknown").to_string()
            } else {
                body
            };
            Err(ProtocolError::ConnectionFailed(format!(
                "HTTP {} - {detail}",
                status.as_u16()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_config_default_values() {
        let config = HttpConfig::new("https://api.meethue.com");
        assert_eq!(config.base_url(), "https://api.meethue.com");
        assert_eq!(config.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn http_config_strips_trailing_slashes() {
        let config = HttpConfig::new("http://127.0.0.1:8080//");
        assert_eq!(config.base_url(), "http://127.0.0.1:8080");
    }

    #[test]
    fn http_config_with_timeout() {
        let config = HttpConfig::new("http://host").with_timeout(Duration::from_secs(30));
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn http_config_into_client() {
        let client = HttpConfig::new("https://api.yosmart.com").into_client().unwrap();
        assert_eq!(client.base_url(), "https://api.yosmart.com");
        assert_eq!(
            client.url("/open/yolink/v2/api"),
            "https://api.yosmart.com/open/yolink/v2/api"
        );
    }
}
