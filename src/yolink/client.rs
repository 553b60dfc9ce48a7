// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! YoLink cloud API client.

use reqwest::Method;
use serde::de::DeserializeOwned;

use crate::credentials::keys;
use crate::error::{ApiError, ConfigError, ParseError};
use crate::protocol::{HttpClient, HttpConfig};

use super::models::{Bddp, Budp, Device, DeviceList, HomeInfo, TokenResponse};

/// Client for the YoLink open API.
///
/// # Examples
///
/// ```no_run
/// use homeprobe::yolink::YoLinkClient;
///
/// # async fn example() -> homeprobe::Result<()> {
/// let token = YoLinkClient::new()?.request_token("uaid", "secret").await?;
/// let client = YoLinkClient::new()?.with_token(token);
/// for device in client.devices().await? {
///     println!("{} ({})", device.name, device.device_type);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct YoLinkClient {
    http: HttpClient,
    token: Option<String>,
}

impl YoLinkClient {
    /// Production API host.
    pub const BASE_URL: &'static str = "https://api.yosmart.com";

    /// Creates a client for the production API.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn new() -> crate::Result<Self> {
        Self::with_config(HttpConfig::new(Self::BASE_URL))
    }

    /// Creates a client for a custom endpoint.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn with_config(config: HttpConfig) -> crate::Result<Self> {
        Ok(Self {
            http: config.into_client()?,
            token: None,
        })
    }

    /// Sets the bearer token used by [`call`](Self::call).
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Exchanges user access credentials for an access token.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the endpoint reports an OAuth error, or
    /// [`ParseError::MissingField`] if no token is returned.
    pub async fn request_token(&self, uaid: &str, secret: &str) -> crate::Result<String> {
        let request = self
            .http
            .request(Method::POST, "/open/yolink/token")
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", uaid),
                ("client_secret", secret),
            ]);

        let response: TokenResponse = self.http.send_json(request).await?;

        if let Some(error) = response.error {
            return Err(ApiError::new(
                "YoLink",
                error,
                response.error_description.unwrap_or_default(),
            )
            .into());
        }

        let token = response
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ParseError::MissingField("access_token".to_string()))?;

        tracing::info!("Obtained YoLink access token");
        Ok(token)
    }

    /// Calls an API method and decodes its `data` payload.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCredential`] without a token,
    /// [`ApiError`] if the BUDP code is not a success, or a parse error if
    /// `data` does not match `T`.
    pub async fn call<T: DeserializeOwned>(&self, method: &str) -> crate::Result<T> {
        let token = self.token.as_deref().ok_or_else(|| ConfigError::MissingCredential {
            key: keys::YOSMART_ACCESS_TOKEN.to_string(),
            hint: "run `homeprobe yolink auth` first".to_string(),
        })?;

        tracing::debug!(method, "Calling YoLink API");

        let request = self
            .http
            .request(Method::POST, "/open/yolink/v2/api")
            .bearer_auth(token)
            .json(&Bddp::new(method));

        let budp: Budp = self.http.send_json(request).await?;
        let data = budp.into_data()?;
        serde_json::from_value(data).map_err(|e| ParseError::Json(e).into())
    }

    /// Returns the home this token belongs to.
    ///
    /// # Errors
    ///
    /// See [`call`](Self::call).
    pub async fn home_info(&self) -> crate::Result<HomeInfo> {
        self.call("Home.getGeneralInfo").await
    }

    /// Returns every device in the home.
    ///
    /// # Errors
    ///
    /// See [`call`](Self::call).
    pub async fn devices(&self) -> crate::Result<Vec<Device>> {
        let list: DeviceList = self.call("Home.getDeviceList").await?;
        Ok(list.devices)
    }
}
