// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hue remote API client.

use std::collections::BTreeMap;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::protocol::{HttpClient, HttpConfig};

use super::models::{Group, Light, ResourceList, Sensor};

/// Client for the Hue remote API (`/route/...`).
///
/// The v1 endpoints return maps keyed by numeric id; they are returned here
/// as [`BTreeMap`]s so iteration follows id order.
#[derive(Debug, Clone)]
pub struct HueClient {
    http: HttpClient,
    token: String,
}

impl HueClient {
    /// Production API host.
    pub const BASE_URL: &'static str = "https://api.meethue.com";

    /// Creates a client for the production API.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn new(access_token: impl Into<String>) -> crate::Result<Self> {
        Self::with_config(HttpConfig::new(Self::BASE_URL), access_token)
    }

    /// Creates a client for a custom endpoint.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn with_config(config: HttpConfig, access_token: impl Into<String>) -> crate::Result<Self> {
        Ok(Self {
            http: config.into_client()?,
            token: access_token.into(),
        })
    }

    /// Returns the underlying HTTP client (used for the token endpoint).
    #[must_use]
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> crate::Result<T> {
        let request = self
            .http
            .request(Method::GET, path)
            .bearer_auth(&self.token);
        self.http.send_json(request).await
    }

    /// Fetches the bridge configuration.
    ///
    /// # Errors
    ///
    /// Returns error on transport, status or parse failures.
    pub async fn config(&self) -> crate::Result<Value> {
        self.get("/route/api/0/config").await
    }

    /// Fetches every light.
    ///
    /// # Errors
    ///
    /// Returns error on transport, status or parse failures.
    pub async fn lights(&self) -> crate::Result<BTreeMap<String, Light>> {
        self.get("/route/api/0/lights").await
    }

    /// Fetches every sensor.
    ///
    /// # Errors
    ///
    /// Returns error on transport, status or parse failures.
    pub async fn sensors(&self) -> crate::Result<BTreeMap<String, Sensor>> {
        self.get("/route/api/0/sensors").await
    }

    /// Fetches every room and zone.
    ///
    /// # Errors
    ///
    /// Returns error on transport, status or parse failures.
    pub async fn groups(&self) -> crate::Result<BTreeMap<String, Group>> {
        self.get("/route/api/0/groups").await
    }

    /// Fetches the CLIP v2 resource list.
    ///
    /// # Errors
    ///
    /// Returns error on transport, status or parse failures.
    pub async fn resources(&self) -> crate::Result<ResourceList> {
        self.get("/route/clip/v2/resource").await
    }

    /// Fetches lights and sensors concurrently.
    ///
    /// # Errors
    ///
    /// Returns the first failure of either request.
    pub async fn lights_and_sensors(
        &self,
    ) -> crate::Result<(BTreeMap<String, Light>, BTreeMap<String, Sensor>)> {
        tokio::try_join!(self.lights(), self.sensors())
    }
}
