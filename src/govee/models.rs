// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Govee OpenAPI payloads.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

/// Capability type that marks MQTT event support.
pub const EVENT_CAPABILITY: &str = "devices.capabilities.event";

/// Envelope shared by Govee responses.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    /// 200 on success.
    pub code: i64,
    /// Status message; the state endpoint calls it `msg`.
    #[serde(default, alias = "msg")]
    pub message: Option<String>,
    /// Device list (`data`) responses.
    pub data: Option<T>,
    /// Device state (`payload`) responses.
    pub payload: Option<T>,
}

impl<T> Envelope<T> {
    /// Returns the body if `code` is 200.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] for any other code.
    pub fn into_result(self) -> Result<Option<T>, ApiError> {
        if self.code != 200 {
            return Err(ApiError::new(
                "Govee",
                self.code.to_string(),
                self.message.unwrap_or_else(|| "Unknown error".to_string()),
            ));
        }
        Ok(self.data.or(self.payload))
    }
}

/// A capability advertised in the device list.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Capability {
    /// Capability type such as `devices.capabilities.on_off`.
    #[serde(rename = "type")]
    pub capability_type: String,
    /// Instance name such as `powerSwitch`.
    pub instance: String,
}

impl Capability {
    /// Returns `true` for MQTT event capabilities.
    #[must_use]
    pub fn is_event(&self) -> bool {
        self.capability_type == EVENT_CAPABILITY
    }
}

/// Broad device grouping used by the device listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DeviceCategory {
    /// `devices.types.sensor`
    Sensor,
    /// `devices.types.light`
    Light,
    /// Purifiers, heaters, humidifiers and similar.
    Appliance,
    /// Anything else.
    Other,
}

impl DeviceCategory {
    const APPLIANCES: [&'static str; 6] = [
        "devices.types.air_purifier",
        "devices.types.heater",
        "devices.types.humidifier",
        "devices.types.dehumidifier",
        "devices.types.ice_maker",
        "devices.types.aroma_diffuser",
    ];

    /// Classifies a Govee device type string.
    #[must_use]
    pub fn from_type(device_type: &str) -> Self {
        match device_type {
            "devices.types.sensor" => Self::Sensor,
            "devices.types.light" => Self::Light,
            t if Self::APPLIANCES.contains(&t) => Self::Appliance,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for DeviceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sensor => "Sensors",
            Self::Light => "Lights",
            Self::Appliance => "Appliances",
            Self::Other => "Other",
        })
    }
}

/// One entry of the user device list.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Product model.
    pub sku: String,
    /// Device identifier (a MAC-like string).
    pub device: String,
    /// User assigned name.
    #[serde(rename = "deviceName", default)]
    pub device_name: Option<String>,
    /// Govee device type.
    #[serde(rename = "type", default)]
    pub device_type: String,
    /// Advertised capabilities.
    #[serde(default)]
    pub capabilities: Vec<Capability>,
}

impl DeviceInfo {
    /// Returns the device category.
    #[must_use]
    pub fn category(&self) -> DeviceCategory {
        DeviceCategory::from_type(&self.device_type)
    }

    /// Returns the name, falling back to the SKU.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.device_name.as_deref().unwrap_or(&self.sku)
    }

    /// Returns `true` if the device publishes MQTT events.
    #[must_use]
    pub fn supports_events(&self) -> bool {
        self.capabilities.iter().any(Capability::is_event)
    }
}

/// Body of a device state query.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StateRequest {
    /// Correlation id.
    #[serde(rename = "requestId")]
    pub request_id: String,
    /// Target device.
    pub payload: DeviceRef,
}

impl StateRequest {
    /// Creates a request with a fresh id.
    #[must_use]
    pub fn new(sku: impl Into<String>, device: impl Into<String>) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            payload: DeviceRef {
                sku: sku.into(),
                device: device.into(),
            },
        }
    }
}

/// Identifies one device.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeviceRef {
    /// Product model.
    pub sku: String,
    /// Device identifier.
    pub device: String,
}

/// Current value of one capability.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CapabilityState {
    /// Capability type.
    #[serde(rename = "type", default)]
    pub capability_type: String,
    /// Instance name.
    pub instance: String,
    /// Reported state, usually `{"value": ...}`.
    #[serde(default)]
    pub state: Value,
}

/// Response payload of a device state query.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DeviceState {
    /// Product model.
    #[serde(default)]
    pub sku: Option<String>,
    /// Device identifier.
    #[serde(default)]
    pub device: Option<String>,
    /// Capability values; empty when the device is unreachable.
    #[serde(default)]
    pub capabilities: Vec<CapabilityState>,
}

/// A state entry inside an MQTT event capability.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct EventState {
    /// Event name such as `lack`.
    #[serde(default)]
    pub name: Option<String>,
    /// Event value.
    #[serde(default)]
    pub value: Value,
    /// Optional human readable text.
    #[serde(default)]
    pub message: Option<String>,
}

/// A capability inside an MQTT event.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct EventCapability {
    /// Capability type.
    #[serde(rename = "type", default)]
    pub capability_type: String,
    /// Instance name.
    #[serde(default)]
    pub instance: String,
    /// Event states.
    #[serde(default, deserialize_with = "states_or_empty")]
    pub state: Vec<EventState>,
}

impl EventCapability {
    /// Returns `true` for MQTT event capabilities.
    #[must_use]
    pub fn is_event(&self) -> bool {
        self.capability_type == EVENT_CAPABILITY
    }
}

/// A message published on `GA/<api key>`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Event {
    /// Product model.
    #[serde(default)]
    pub sku: Option<String>,
    /// Device identifier.
    #[serde(default)]
    pub device: Option<String>,
    /// User assigned name.
    #[serde(rename = "deviceName", default)]
    pub device_name: Option<String>,
    /// Reported capabilities.
    #[serde(default)]
    pub capabilities: Vec<EventCapability>,
}

impl Event {
    /// Returns the device name, id, or `Unknown`.
    #[must_use]
    pub fn device_label(&self) -> &str {
        self.device_name
            .as_deref()
            .or(self.device.as_deref())
            .unwrap_or("Unknown")
    }
}

// Event capability `state` is an array, but other capabilities may carry an
// object; those are not event states.
fn states_or_empty<'de, D>(deserializer: D) -> Result<Vec<EventState>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Array(_) => serde_json::from_value(value).map_err(serde::de::Error::custom),
        _ => Ok(Vec::new()),
    }
}
