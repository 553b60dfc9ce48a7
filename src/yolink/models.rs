// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! YoLink request, response and report payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;
use crate::state::canonical_string;

/// Success code carried by every successful BUDP.
pub const SUCCESS_CODE: &str = "000000";

/// Basic downlink data packet: a method call sent to the API.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Bddp {
    /// Method name such as `Home.getGeneralInfo`.
    pub method: String,
    /// Request time in unix milliseconds.
    pub time: i64,
}

impl Bddp {
    /// Creates a request for `method` stamped with the current time.
    #[must_use]
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            time: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Basic uplink data packet: the API's answer.
#[derive(Debug, Clone, Deserialize)]
pub struct Budp {
    /// `"000000"` on success.
    pub code: String,
    /// Human readable status.
    #[serde(default)]
    pub desc: Option<String>,
    /// Method specific payload.
    #[serde(default)]
    pub data: Option<Value>,
}

impl Budp {
    /// Returns the data payload, or an [`ApiError`] if the code is not a
    /// success.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] carrying the code and description.
    pub fn into_data(self) -> Result<Value, ApiError> {
        if self.code != SUCCESS_CODE {
            return Err(ApiError::new(
                "YoLink",
                self.code,
                self.desc.unwrap_or_else(|| "No description".to_string()),
            ));
        }
        Ok(self.data.unwrap_or(Value::Null))
    }
}

/// Response of the token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// Result of `Home.getGeneralInfo`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct HomeInfo {
    /// Home identifier used in MQTT topics.
    pub id: String,
}

/// One entry of `Home.getDeviceList`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Device {
    /// Device identifier.
    #[serde(rename = "deviceId")]
    pub device_id: String,
    /// User assigned name.
    #[serde(default)]
    pub name: String,
    /// Device model family such as `DoorSensor`.
    #[serde(rename = "type", default)]
    pub device_type: String,
    /// Per-device token for direct state queries.
    #[serde(default)]
    pub token: Option<String>,
}

impl Device {
    /// Returns `true` for door sensors.
    #[must_use]
    pub fn is_door_sensor(&self) -> bool {
        self.device_type.to_lowercase().contains("door")
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct DeviceList {
    pub devices: Vec<Device>,
}

/// A message published on `yl-home/<home>/<device>/report`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Report {
    /// Event name such as `DoorSensor.Alert`.
    #[serde(default)]
    pub event: Option<String>,
    /// Reporting device.
    #[serde(rename = "deviceId", default)]
    pub device_id: Option<String>,
    /// Event payload.
    #[serde(default)]
    pub data: Option<Value>,
}

impl Report {
    /// Returns `true` if the event comes from a door sensor.
    #[must_use]
    pub fn is_door_sensor(&self) -> bool {
        self.event
            .as_deref()
            .is_some_and(|e| e.to_lowercase().contains("doorsensor"))
    }

    /// Returns the reporting device id, or `Unknown`.
    #[must_use]
    pub fn device_label(&self) -> &str {
        self.device_id.as_deref().unwrap_or("Unknown")
    }

    /// Returns `data.state`, if present.
    #[must_use]
    pub fn state(&self) -> Option<&Value> {
        self.data.as_ref().and_then(|d| d.get("state"))
    }

    /// Renders the reported state for display.
    ///
    /// Strings are upper-cased. Objects show their `state`, `open` or
    /// `closed` member, falling back to the whole object. Empty or missing
    /// state is `UNKNOWN`.
    ///
    /// # Examples
    ///
    /// ```
    /// use homeprobe::yolink::Report;
    /// use serde_json::json;
    ///
    /// let report: Report = serde_json::from_value(json!({
    ///     "event": "DoorSensor.Alert",
    ///     "deviceId": "d1",
    ///     "data": {"state": "open"}
    /// })).unwrap();
    /// assert_eq!(report.state_display(), "OPEN");
    /// ```
    #[must_use]
    pub fn state_display(&self) -> String {
        match self.state() {
            Some(state) if is_truthy(state) => display_value(state),
            _ => "UNKNOWN".to_string(),
        }
    }
}

fn display_value(state: &Value) -> String {
    let shown = match state {
        Value::Object(map) => ["state", "open", "closed"]
            .iter()
            .filter_map(|k| map.get(*k))
            .find(|v| is_truthy(v))
            .map_or_else(|| canonical_string(state), text_of),
        other => text_of(other),
    };
    shown.to_uppercase()
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => canonical_string(other),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn report(value: Value) -> Report {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn budp_success_returns_data() {
        let budp: Budp = serde_json::from_value(json!({
            "code": "000000", "desc": "Success", "data": {"id": "home-1"}
        }))
        .unwrap();
        assert_eq!(budp.into_data().unwrap()["id"], "home-1");
    }

    #[test]
    fn budp_failure_is_api_error() {
        let budp: Budp =
            serde_json::from_value(json!({"code": "010104", "desc": "Token is expired"})).unwrap();
        let err = budp.into_data().unwrap_err();
        assert_eq!(err.code, "010104");
        assert_eq!(err.message, "Token is expired");
    }

    #[test]
    fn bddp_serializes_method_and_time() {
        let value = serde_json::to_value(Bddp::new("Home.getDeviceList")).unwrap();
        assert_eq!(value["method"], "Home.getDeviceList");
        assert!(value["time"].as_i64().unwrap() > 0);
    }

    #[test]
    fn device_door_filter() {
        let device: Device = serde_json::from_value(json!({
            "deviceId": "d1", "name": "Front", "type": "DoorSensor", "token": "t"
        }))
        .unwrap();
        assert!(device.is_door_sensor());

        let hub: Device =
            serde_json::from_value(json!({"deviceId": "h", "name": "Hub", "type": "Hub"})).unwrap();
        assert!(!hub.is_door_sensor());
        assert!(hub.token.is_none());
    }

    #[test]
    fn report_door_sensor_filter_is_case_insensitive() {
        assert!(report(json!({"event": "DoorSensor.Alert"})).is_door_sensor());
        assert!(report(json!({"event": "doorsensor.report"})).is_door_sensor());
        assert!(!report(json!({"event": "THSensor.Report"})).is_door_sensor());
        assert!(!report(json!({})).is_door_sensor());
    }

    #[test]
    fn state_display_rules() {
        assert_eq!(report(json!({"data": {"state": "closed"}})).state_display(), "CLOSED");
        assert_eq!(
            report(json!({"data": {"state": {"state": "open", "battery": 4}}})).state_display(),
            "OPEN"
        );
        assert_eq!(
            report(json!({"data": {"state": {"open": true}}})).state_display(),
            "TRUE"
        );
        assert_eq!(
            report(json!({"data": {"state": {"lux": 3}}})).state_display(),
            r#"{"LUX":3}"#
        );
        assert_eq!(report(json!({"data": {"state": 1}})).state_display(), "1");
        assert_eq!(report(json!({"data": {}})).state_display(), "UNKNOWN");
        assert_eq!(report(json!({"data": {"state": ""}})).state_display(), "UNKNOWN");
    }

    #[test]
    fn device_label_defaults_to_unknown() {
        assert_eq!(report(json!({})).device_label(), "Unknown");
        assert_eq!(report(json!({"deviceId": "abc"})).device_label(), "abc");
    }
}
