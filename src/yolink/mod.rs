// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! YoLink: token exchange, home/device queries and door sensor reports.
//!
//! Door sensors push reports over MQTT on `yl-home/<home_id>/<device>/report`.
//! The broker accepts the access token as username with no password.

#[cfg(feature = "http")]
mod client;
mod models;

#[cfg(feature = "http")]
pub use client::YoLinkClient;
pub use models::{Bddp, Budp, Device, HomeInfo, Report, SUCCESS_CODE};

/// YoLink MQTT broker.
pub const MQTT_BROKER: &str = "mqtt://mqtt.api.yosmart.com:8003";

/// Returns the report topic filter for `home_id`.
///
/// # Examples
///
/// ```
/// assert_eq!(homeprobe::yolink::report_topic("abc"), "yl-home/abc/+/report");
/// ```
#[must_use]
pub fn report_topic(home_id: &str) -> String {
    format!("yl-home/{home_id}/+/report")
}

/// Builds the subscriber configuration for door sensor reports.
#[cfg(feature = "mqtt")]
#[must_use]
pub fn mqtt_config(access_token: &str, home_id: &str) -> crate::protocol::MqttConfig {
    crate::protocol::MqttConfig::new(MQTT_BROKER, report_topic(home_id)).with_username(access_token)
}

#[cfg(all(test, feature = "mqtt"))]
mod tests {
    use super::*;

    #[test]
    fn mqtt_config_uses_home_topic() {
        let config = mqtt_config("token", "home-1");
        assert_eq!(config.topic(), "yl-home/home-1/+/report");
        assert_eq!(config.broker(), MQTT_BROKER);
    }
}
