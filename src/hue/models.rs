// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hue remote API payloads (v1 maps and the CLIP v2 resource list).

use serde::Deserialize;
use serde_json::Value;

/// Sensor type fragments worth monitoring.
const RELEVANT_SENSOR_TYPES: [&str; 5] = [
    "ZLLPresence",
    "ZLLLightLevel",
    "ZLLTemperature",
    "Contact",
    "OpenClose",
];

/// CLIP v2 resource types that describe sensors.
const SENSOR_RESOURCE_TYPES: [&str; 4] = ["motion", "contact", "device_power", "zigbee_connectivity"];

/// A light from `/route/api/0/lights`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Light {
    /// User assigned name.
    #[serde(default)]
    pub name: String,
    /// Light type such as `Extended color light`.
    #[serde(rename = "type", default)]
    pub light_type: String,
    /// Model id.
    #[serde(default)]
    pub modelid: Option<String>,
    /// Raw state object (`on`, `bri`, `reachable`, ...).
    #[serde(default)]
    pub state: Value,
}

impl Light {
    /// Returns `state.on`.
    #[must_use]
    pub fn is_on(&self) -> Option<bool> {
        self.state.get("on").and_then(Value::as_bool)
    }

    /// Returns `state.bri` (1-254).
    #[must_use]
    pub fn brightness(&self) -> Option<i64> {
        self.state.get("bri").and_then(Value::as_i64)
    }

    /// Returns `state.reachable`; a missing flag counts as reachable.
    #[must_use]
    pub fn reachable(&self) -> bool {
        self.state
            .get("reachable")
            .and_then(Value::as_bool)
            .unwrap_or(true)
    }
}

/// A sensor from `/route/api/0/sensors`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Sensor {
    /// User assigned name.
    #[serde(default)]
    pub name: String,
    /// Sensor type such as `ZLLPresence`.
    #[serde(rename = "type", default)]
    pub sensor_type: String,
    /// Model id.
    #[serde(default)]
    pub modelid: Option<String>,
    /// Raw state object.
    #[serde(default)]
    pub state: Value,
    /// Raw config object (`reachable`, `battery`, ...).
    #[serde(default)]
    pub config: Value,
}

impl Sensor {
    /// Returns `true` for motion, light level, temperature and contact
    /// sensors.
    #[must_use]
    pub fn is_relevant(&self) -> bool {
        RELEVANT_SENSOR_TYPES
            .iter()
            .any(|t| self.sensor_type.contains(t))
    }

    /// Returns `state.presence`.
    #[must_use]
    pub fn presence(&self) -> Option<bool> {
        self.state.get("presence").and_then(Value::as_bool)
    }

    /// Returns `state.temperature` in degrees Celsius.
    #[must_use]
    pub fn temperature_celsius(&self) -> Option<f64> {
        self.state
            .get("temperature")
            .and_then(Value::as_f64)
            .map(|t| t / 100.0)
    }

    /// Returns `state.lightlevel`.
    #[must_use]
    pub fn light_level(&self) -> Option<i64> {
        self.state.get("lightlevel").and_then(Value::as_i64)
    }

    /// Returns `state.open`.
    #[must_use]
    pub fn open(&self) -> Option<bool> {
        self.state.get("open").and_then(Value::as_bool)
    }

    /// Returns `state.lastupdated`.
    #[must_use]
    pub fn last_updated(&self) -> Option<&str> {
        self.state.get("lastupdated").and_then(Value::as_str)
    }

    /// Returns `config.battery` in percent.
    #[must_use]
    pub fn battery(&self) -> Option<&Value> {
        self.config.get("battery").filter(|b| !b.is_null())
    }

    /// Returns `config.reachable`; a missing flag counts as reachable.
    #[must_use]
    pub fn reachable(&self) -> bool {
        self.config
            .get("reachable")
            .and_then(Value::as_bool)
            .unwrap_or(true)
    }
}

/// A room or zone from `/route/api/0/groups`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Group {
    /// User assigned name.
    #[serde(default)]
    pub name: String,
    /// `Room`, `Zone`, ...
    #[serde(rename = "type", default)]
    pub group_type: String,
    /// Member light ids.
    #[serde(default)]
    pub lights: Vec<String>,
}

/// Reference to another CLIP v2 resource.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ResourceRef {
    /// Referenced resource id.
    pub rid: String,
}

/// Resource metadata.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ResourceMetadata {
    /// User assigned name.
    #[serde(default)]
    pub name: Option<String>,
}

/// One entry of `/route/clip/v2/resource`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Resource {
    /// Resource id.
    pub id: String,
    /// Resource type such as `motion` or `device`.
    #[serde(rename = "type")]
    pub resource_type: String,
    /// Owning device.
    #[serde(default)]
    pub owner: Option<ResourceRef>,
    /// Present on `device` resources.
    #[serde(default)]
    pub metadata: Option<ResourceMetadata>,
    /// Present on `motion` resources.
    #[serde(default)]
    pub motion: Option<Value>,
}

impl Resource {
    /// Returns `motion.motion` for motion resources.
    #[must_use]
    pub fn motion_detected(&self) -> Option<bool> {
        self.motion
            .as_ref()
            .and_then(|m| m.get("motion"))
            .and_then(Value::as_bool)
    }
}

/// Body of `/route/clip/v2/resource`.
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
pub struct ResourceList {
    /// Every resource on the bridge.
    #[serde(default)]
    pub data: Vec<Resource>,
}

impl ResourceList {
    /// Returns sensor resources paired with their owning device's name.
    #[must_use]
    pub fn sensors(&self) -> Vec<(&Resource, Option<&str>)> {
        self.data
            .iter()
            .filter(|r| SENSOR_RESOURCE_TYPES.contains(&r.resource_type.as_str()))
            .map(|sensor| (sensor, self.owner_name(sensor)))
            .collect()
    }

    fn owner_name(&self, resource: &Resource) -> Option<&str> {
        let owner = resource.owner.as_ref()?;
        self.data
            .iter()
            .find(|d| d.resource_type == "device" && d.id == owner.rid)
            .map(|d| {
                d.metadata
                    .as_ref()
                    .and_then(|m| m.name.as_deref())
                    .unwrap_or("Unknown")
            })
    }
}
