// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mapping Hue lights and sensors onto detector inputs.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::event::DeviceEvent;
use crate::state::{ChangeDetector, DeviceKey, Liveness, StateChange, StateSnapshot};

use super::models::{Light, Sensor};

/// Smallest brightness step (out of 254) worth reporting while listening.
pub const BRIGHTNESS_THRESHOLD: f64 = 20.0;
/// Smallest temperature step (0.01 °C units) worth reporting while listening.
pub const TEMPERATURE_THRESHOLD: f64 = 100.0;

/// Returns the tracking key `"<name> (ID: <id>)"`.
#[must_use]
pub fn device_key(id: &str, name: &str) -> DeviceKey {
    DeviceKey::new(format!("{name} (ID: {id})"))
}

/// Light state without `reachable`, which is reported as liveness instead.
///
/// Returns `None` if the light carries no state object.
#[must_use]
pub fn light_snapshot(light: &Light) -> Option<StateSnapshot> {
    StateSnapshot::from_object(light.state.clone())
        .ok()
        .map(|s| s.without(&["reachable"]))
}

/// Liveness from `state.reachable`.
#[must_use]
pub fn light_liveness(light: &Light) -> Liveness {
    Liveness::from(light.reachable())
}

/// Sensor state without `lastupdated`, plus `battery` from the config.
#[must_use]
pub fn sensor_snapshot(sensor: &Sensor) -> Option<StateSnapshot> {
    let snapshot = StateSnapshot::from_object(sensor.state.clone())
        .ok()?
        .without(&["lastupdated"]);
    Some(match sensor.battery() {
        Some(battery) => snapshot.with("battery", battery.clone()),
        None => snapshot,
    })
}

/// Liveness from `config.reachable`.
#[must_use]
pub fn sensor_liveness(sensor: &Sensor) -> Liveness {
    Liveness::from(sensor.reachable())
}

/// Returns `false` for brightness and temperature changes below the
/// listening thresholds.
///
/// Non-numeric values and every other field are always significant.
#[must_use]
pub fn is_significant(change: &StateChange) -> bool {
    let StateChange::Field {
        field,
        previous,
        current,
    } = change
    else {
        return true;
    };

    let delta = || Some((current.as_f64()? - previous.as_f64()?).abs());
    match field.as_str() {
        "bri" => delta().is_none_or(|d| d > BRIGHTNESS_THRESHOLD),
        "temperature" => delta().is_none_or(|d| d >= TEMPERATURE_THRESHOLD),
        _ => true,
    }
}

/// Feeds a light poll into `detector`.
pub fn observe_lights(
    detector: &mut ChangeDetector,
    lights: &BTreeMap<String, Light>,
) -> Vec<DeviceEvent> {
    lights
        .iter()
        .flat_map(|(id, light)| {
            let key = device_key(id, &light.name);
            tracing::debug!(
                device = %key,
                on = ?light.is_on(),
                bri = ?light.brightness(),
                reachable = light.reachable(),
                "Hue light polled"
            );
            DeviceEvent::from_poll(detector, &key, light_snapshot(light), light_liveness(light))
        })
        .collect()
}

/// Feeds a sensor poll into `detector`.
pub fn observe_sensors(
    detector: &mut ChangeDetector,
    sensors: &BTreeMap<String, Sensor>,
) -> Vec<DeviceEvent> {
    sensors
        .iter()
        .flat_map(|(id, sensor)| {
            let key = device_key(id, &sensor.name);
            DeviceEvent::from_poll(detector, &key, sensor_snapshot(sensor), sensor_liveness(sensor))
        })
        .collect()
}

/// Marks every tracked device offline after a failed request.
pub fn observe_failure(detector: &mut ChangeDetector) -> Vec<DeviceEvent> {
    detector
        .tracked_keys()
        .into_iter()
        .flat_map(|key| {
            let changes = detector.detect(&key, None, Liveness::Offline);
            DeviceEvent::from_changes(&key, changes)
        })
        .collect()
}

/// Two detectors for `hue listen`: one for lights, one for sensors.
#[derive(Debug, Default)]
pub struct HueMonitor {
    lights: ChangeDetector,
    sensors: ChangeDetector,
}

impl HueMonitor {
    /// Creates a monitor with no baselines.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the first poll; returns `(lights, sensors)` tracked.
    pub fn capture_baseline(
        &mut self,
        lights: &BTreeMap<String, Light>,
        sensors: &BTreeMap<String, Sensor>,
    ) -> (usize, usize) {
        observe_lights(&mut self.lights, lights);
        observe_sensors(&mut self.sensors, sensors);
        (self.lights.len(), self.sensors.len())
    }

    /// Records a poll and returns its significant changes.
    pub fn observe(
        &mut self,
        lights: &BTreeMap<String, Light>,
        sensors: &BTreeMap<String, Sensor>,
    ) -> Vec<DeviceEvent> {
        let mut events = observe_lights(&mut self.lights, lights);
        events.extend(observe_sensors(&mut self.sensors, sensors));
        events.retain(|e| e.change().is_none_or(is_significant));
        events
    }

    /// Marks every tracked light and sensor offline after a failed poll.
    pub fn observe_failure(&mut self) -> Vec<DeviceEvent> {
        let mut events = observe_failure(&mut self.lights);
        events.extend(observe_failure(&mut self.sensors));
        events
    }
}

/// Renders a sensor value for listings, e.g. `21.5°C`.
#[must_use]
pub fn describe_temperature(value: &Value) -> Option<String> {
    value.as_f64().map(|t| format!("{}°C", t / 100.0))
}
