// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mapping Govee state responses onto detector inputs.

use crate::state::{DeviceKey, Liveness, StateSnapshot};

use super::models::{DeviceInfo, DeviceState};

/// Returns the tracking key `"<deviceName> (<sku>)"`.
#[must_use]
pub fn device_key(device: &DeviceInfo) -> DeviceKey {
    DeviceKey::composite(device.display_name(), &device.sku)
}

/// Keys each capability's `state` by its `instance`.
#[must_use]
pub fn snapshot_of(state: &DeviceState) -> StateSnapshot {
    StateSnapshot::from_fields(
        state
            .capabilities
            .iter()
            .map(|c| (c.instance.clone(), c.state.clone())),
    )
}

/// A device that answers with no capabilities is treated as unreachable.
#[must_use]
pub fn liveness_of(state: &DeviceState) -> Liveness {
    Liveness::from(!state.capabilities.is_empty())
}

/// Turns the outcome of a state query into detector input.
///
/// Any error counts as offline with no snapshot.
#[must_use]
pub fn observe<E: std::fmt::Display>(
    key: &DeviceKey,
    result: Result<DeviceState, E>,
) -> (Option<StateSnapshot>, Liveness) {
    match result {
        Ok(state) => {
            let liveness = liveness_of(&state);
            tracing::debug!(
                device = %key,
                capabilities = state.capabilities.len(),
                %liveness,
                "Govee state received"
            );
            (Some(snapshot_of(&state)), liveness)
        }
        Err(e) => {
            tracing::warn!(device = %key, error = %e, "Govee poll failed, treating as offline");
            (None, Liveness::Offline)
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::state::ChangeDetector;

    fn state(value: serde_json::Value) -> DeviceState {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn key_uses_name_and_sku() {
        let info: DeviceInfo = serde_json::from_value(json!({
            "sku": "H6008", "device": "AA", "deviceName": "Desk Lamp"
        }))
        .unwrap();
        assert_eq!(device_key(&info).as_str(), "Desk Lamp (H6008)");
    }

    #[test]
    fn snapshot_is_keyed_by_instance() {
        let snapshot = snapshot_of(&state(json!({
            "capabilities": [
                {"type": "devices.capabilities.on_off", "instance": "powerSwitch", "state": {"value": 1}},
                {"type": "devices.capabilities.range", "instance": "brightness", "state": {"value": 40}}
            ]
        })));
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get("powerSwitch"), Some(&json!({"value": 1})));
    }

    #[test]
    fn empty_capabilities_mean_offline() {
        assert_eq!(liveness_of(&state(json!({"capabilities": []}))), Liveness::Offline);
        assert_eq!(
            liveness_of(&state(json!({"capabilities": [{"instance": "online", "state": {"value": true}}]}))),
            Liveness::Online
        );
    }

    #[test]
    fn error_is_offline_without_snapshot() {
        let key = DeviceKey::from("Lamp (H6008)");
        let (snapshot, liveness) = observe::<&str>(&key, Err("timeout"));
        assert!(snapshot.is_none());
        assert_eq!(liveness, Liveness::Offline);
    }

    #[test]
    fn capability_change_flows_through_detector() {
        let key = DeviceKey::from("Lamp (H6008)");
        let mut detector = ChangeDetector::new();
        let on = state(json!({"capabilities": [{"instance": "powerSwitch", "state": {"value": 1}}]}));
        let off = state(json!({"capabilities": [{"instance": "powerSwitch", "state": {"value": 0}}]}));

        let (s, l) = observe::<&str>(&key, Ok(on));
        assert!(detector.detect(&key, s, l).is_empty());

        let (s, l) = observe::<&str>(&key, Ok(off));
        let changes = detector.detect(&key, s, l);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field(), "powerSwitch");
    }
}
