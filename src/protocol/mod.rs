// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Transports used by the vendor clients.
//!
//! - [`HttpClient`]: REST calls with shared status handling ([`check_status`])
//! - [`MqttSubscriber`]: push channels (YoLink reports, Govee events)

#[cfg(feature = "http")]
mod http;
#[cfg(feature = "mqtt")]
mod mqtt;

#[cfg(feature = "http")]
pub use http::{HttpClient, HttpConfig, check_status};
#[cfg(feature = "mqtt")]
pub use mqtt::{BrokerAddress, MqttConfig, MqttMessage, MqttSubscriber, topic_matches};
