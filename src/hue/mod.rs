// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Philips Hue remote API: OAuth, device listing and state polling.
//!
//! The remote API has no push channel, so both `poll` and `listen` are
//! interval loops; they differ in what they track and how much they report.

#[cfg(feature = "http")]
mod client;
mod models;
#[cfg(feature = "http")]
mod oauth;
mod poller;

#[cfg(feature = "http")]
pub use client::HueClient;
pub use models::{Group, Light, Resource, ResourceList, ResourceMetadata, ResourceRef, Sensor};
#[cfg(feature = "http")]
pub use oauth::{
    AUTHORIZE_URL, CALLBACK_TIMEOUT, CallbackRoute, DEFAULT_CALLBACK_PORT, DEFAULT_REDIRECT_URI,
    Pkce, TOKEN_PATH, TokenExchange, TokenSet, authorization_url, bind_callback, exchange_code,
    serve_callback,
};
pub use poller::{
    BRIGHTNESS_THRESHOLD, HueMonitor, TEMPERATURE_THRESHOLD, describe_temperature, device_key,
    is_significant, light_liveness, light_snapshot, observe_failure, observe_lights,
    observe_sensors, sensor_liveness, sensor_snapshot,
};
