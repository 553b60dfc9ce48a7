// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Govee: device listing, state polling and MQTT events.
//!
//! Events are pushed on `GA/<api key>` over MQTTS, authenticating with the
//! API key as both username and password.

#[cfg(feature = "http")]
mod client;
mod models;
mod poller;

#[cfg(feature = "http")]
pub use client::{GoveeClient, polls_per_hour_per_device};
pub use models::{
    Capability, CapabilityState, DeviceCategory, DeviceInfo, DeviceRef, DeviceState,
    EVENT_CAPABILITY, Envelope, Event, EventCapability, EventState, StateRequest,
};
pub use poller::{device_key, liveness_of, observe, snapshot_of};

/// Govee MQTT broker.
pub const MQTT_BROKER: &str = "mqtts://mqtt.openapi.govee.com:8883";

/// Returns the account event topic.
#[must_use]
pub fn event_topic(api_key: &str) -> String {
    format!("GA/{api_key}")
}

/// Builds the subscriber configuration for account events.
#[cfg(feature = "mqtt")]
#[must_use]
pub fn mqtt_config(api_key: &str) -> crate::protocol::MqttConfig {
    crate::protocol::MqttConfig::new(MQTT_BROKER, event_topic(api_key))
        .with_credentials(api_key, api_key)
}

/// Shortens an API key for display.
///
/// # Examples
///
/// ```
/// assert_eq!(homeprobe::govee::redact_key("0123456789abcdef"), "01234567...");
/// ```
#[must_use]
pub fn redact_key(api_key: &str) -> String {
    let prefix: String = api_key.chars().take(8).collect();
    format!("{prefix}...")
}
