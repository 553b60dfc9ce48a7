// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Govee OpenAPI client.

use reqwest::Method;

use crate::error::ParseError;
use crate::protocol::{HttpClient, HttpConfig};

use super::models::{DeviceInfo, DeviceState, Envelope, StateRequest};

/// Header carrying the developer API key.
const API_KEY_HEADER: &str = "Govee-API-Key";

/// Client for the Govee developer API.
///
/// Every request counts against a budget of 10,000 requests per day.
#[derive(Debug, Clone)]
pub struct GoveeClient {
    http: HttpClient,
    api_key: String,
}

impl GoveeClient {
    /// Production API host.
    pub const BASE_URL: &'static str = "https://openapi.api.govee.com";

    /// Daily request budget.
    pub const DAILY_REQUEST_LIMIT: u32 = 10_000;

    /// Creates a client for the production API.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn new(api_key: impl Into<String>) -> crate::Result<Self> {
        Self::with_config(HttpConfig::new(Self::BASE_URL), api_key)
    }

    /// Creates a client for a custom endpoint.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn with_config(config: HttpConfig, api_key: impl Into<String>) -> crate::Result<Self> {
        Ok(Self {
            http: config.into_client()?,
            api_key: api_key.into(),
        })
    }

    /// Lists every device on the account.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`](crate::error::ApiError) if the response code is
    /// not 200.
    pub async fn devices(&self) -> crate::Result<Vec<DeviceInfo>> {
        let request = self
            .http
            .request(Method::GET, "/router/api/v1/user/devices")
            .header(API_KEY_HEADER, &self.api_key);

        let envelope: Envelope<Vec<DeviceInfo>> = self.http.send_json(request).await?;
        if let Some(message) = &envelope.message {
            tracing::debug!(message = %message, "Govee device list");
        }
        Ok(envelope.into_result()?.unwrap_or_default())
    }

    /// Queries the current state of one device.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`](crate::error::ApiError) if the response code is
    /// not 200, or [`ParseError::MissingField`] without a payload.
    pub async fn device_state(&self, sku: &str, device: &str) -> crate::Result<DeviceState> {
        let body = StateRequest::new(sku, device);
        tracing::debug!(sku, device, request_id = %body.request_id, "Requesting Govee device state");

        let request = self
            .http
            .request(Method::POST, "/router/api/v1/device/state")
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body);

        let envelope: Envelope<DeviceState> = self.http.send_json(request).await?;
        envelope
            .into_result()?
            .ok_or_else(|| ParseError::MissingField("payload".to_string()).into())
    }
}

/// Requests per hour each device may use within the daily budget.
///
/// # Examples
///
/// ```
/// use homeprobe::govee::polls_per_hour_per_device;
///
/// assert_eq!(polls_per_hour_per_device(4), 104);
/// assert_eq!(polls_per_hour_per_device(0), 416);
/// ```
#[must_use]
pub fn polls_per_hour_per_device(devices: usize) -> u32 {
    let devices = u32::try_from(devices.max(1)).unwrap_or(u32::MAX);
    GoveeClient::DAILY_REQUEST_LIMIT / devices / 24
}
