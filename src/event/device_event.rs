// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device event types.

use chrono::{DateTime, Utc};

use crate::state::{ChangeDetector, DeviceKey, Liveness, StateChange, StateSnapshot};

/// Something a poller or listener observed about one device.
///
/// # Examples
///
/// ```
/// use homeprobe::event::DeviceEvent;
/// use homeprobe::state::{DeviceKey, Liveness, StateChange};
///
/// let key = DeviceKey::new("Door A");
/// let event = DeviceEvent::state_changed(
///     key.clone(),
///     StateChange::connectivity(Liveness::Online, Liveness::Offline),
/// );
/// assert_eq!(event.device_key(), &key);
/// assert!(event.is_state_change());
/// ```
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum DeviceEvent {
    /// The first observation of a device was recorded.
    BaselineCaptured {
        /// The device.
        device_key: DeviceKey,
        /// Liveness at the first poll.
        liveness: Liveness,
        /// When the poll completed.
        observed_at: DateTime<Utc>,
    },

    /// A poll differed from the previous one.
    StateChanged {
        /// The device.
        device_key: DeviceKey,
        /// The specific change that occurred.
        change: StateChange,
        /// When the poll completed.
        observed_at: DateTime<Utc>,
    },
}

impl DeviceEvent {
    /// Creates a baseline event stamped with the current time.
    #[must_use]
    pub fn baseline(device_key: DeviceKey, liveness: Liveness) -> Self {
        Self::BaselineCaptured {
            device_key,
            liveness,
            observed_at: Utc::now(),
        }
    }

    /// Creates a state change event stamped with the current time.
    #[must_use]
    pub fn state_changed(device_key: DeviceKey, change: StateChange) -> Self {
        Self::StateChanged {
            device_key,
            change,
            observed_at: Utc::now(),
        }
    }

    /// Wraps every change of one poll, sharing a single timestamp.
    #[must_use]
    pub fn from_changes(device_key: &DeviceKey, changes: Vec<StateChange>) -> Vec<Self> {
        let observed_at = Utc::now();
        changes
            .into_iter()
            .map(|change| Self::StateChanged {
                device_key: device_key.clone(),
                change,
                observed_at,
            })
            .collect()
    }

    /// Feeds one poll into `detector` and wraps the outcome.
    ///
    /// The first poll of a key yields a single [`DeviceEvent::BaselineCaptured`];
    /// later polls yield one [`DeviceEvent::StateChanged`] per change.
    pub fn from_poll(
        detector: &mut ChangeDetector,
        key: &DeviceKey,
        snapshot: Option<StateSnapshot>,
        liveness: Liveness,
    ) -> Vec<Self> {
        let first = !detector.is_tracking(key);
        let changes = detector.detect(key, snapshot, liveness);
        if first {
            let recorded = detector
                .previous(key)
                .map_or(Liveness::Offline, |p| p.liveness);
            return vec![Self::baseline(key.clone(), recorded)];
        }
        Self::from_changes(key, changes)
    }

    /// Returns the device key associated with this event.
    #[must_use]
    pub fn device_key(&self) -> &DeviceKey {
        match self {
            Self::BaselineCaptured { device_key, .. } | Self::StateChanged { device_key, .. } => {
                device_key
            }
        }
    }

    /// Returns when the event was observed.
    #[must_use]
    pub fn observed_at(&self) -> DateTime<Utc> {
        match self {
            Self::BaselineCaptured { observed_at, .. } | Self::StateChanged { observed_at, .. } => {
                *observed_at
            }
        }
    }

    /// Returns `true` if this is a state change event.
    #[must_use]
    pub fn is_state_change(&self) -> bool {
        matches!(self, Self::StateChanged { .. })
    }

    /// Returns the change carried by a state change event.
    #[must_use]
    pub fn change(&self) -> Option<&StateChange> {
        match self {
            Self::StateChanged { change, .. } => Some(change),
            Self::BaselineCaptured { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn device_key_extraction() {
        let key = DeviceKey::from("Lamp");

        let baseline = DeviceEvent::baseline(key.clone(), Liveness::Online);
        assert_eq!(baseline.device_key(), &key);
        assert!(!baseline.is_state_change());
        assert!(baseline.change().is_none());
    }

    #[test]
    fn from_poll_reports_baseline_then_changes() {
        let mut detector = ChangeDetector::new();
        let key = DeviceKey::from("Door A");
        let closed = StateSnapshot::from_fields([("open", json!(false))]);
        let open = StateSnapshot::from_fields([("open", json!(true))]);

        let events = DeviceEvent::from_poll(&mut detector, &key, None, Liveness::Online);
        assert!(matches!(
            events.as_slice(),
            [DeviceEvent::BaselineCaptured { liveness: Liveness::Offline, .. }]
        ));

        let events = DeviceEvent::from_poll(&mut detector, &key, Some(closed), Liveness::Online);
        assert_eq!(events.len(), 1);
        assert!(events[0].change().is_some_and(StateChange::is_connectivity));

        let events = DeviceEvent::from_poll(&mut detector, &key, Some(open), Liveness::Online);
        assert_eq!(events[0].change().map(StateChange::field), Some("open"));
    }

    #[test]
    fn from_changes_shares_timestamp() {
        let key = DeviceKey::from("Lamp");
        let events = DeviceEvent::from_changes(
            &key,
            vec![
                StateChange::connectivity(Liveness::Offline, Liveness::Online),
                StateChange::field_change("on", json!(false), json!(true)),
            ],
        );

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].observed_at(), events[1].observed_at());
        assert_eq!(events[1].change().map(StateChange::field), Some("on"));
    }
}
