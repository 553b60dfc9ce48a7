// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-device change detection across successive polls.

use std::collections::HashMap;

use super::{DeviceKey, Liveness, StateChange, StateSnapshot};

/// Last observation recorded for a device.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviousState {
    /// Last known good state, kept across offline polls.
    ///
    /// `None` until the device has been seen online with state.
    pub snapshot: Option<StateSnapshot>,
    /// Liveness at the last poll.
    pub liveness: Liveness,
}

/// Compares each poll of a device with the previous one.
///
/// The detector is owned by the polling loop and passed by `&mut` into every
/// call. It holds one [`PreviousState`] per [`DeviceKey`] and never performs
/// I/O or fails: malformed or missing state degrades to a connectivity
/// report.
///
/// # Rules
///
/// - The first observation of a key records a baseline and reports nothing.
/// - `ONLINE -> OFFLINE` reports one connectivity change and keeps the last
///   known snapshot; no fields are compared.
/// - `OFFLINE -> ONLINE` reports a connectivity change, then compares fields
///   against the retained snapshot.
/// - While online, each snapshot position whose value changed is reported.
///   Positions missing on either side are not compared.
/// - A poll without a snapshot counts as offline.
///
/// Connectivity changes come first; field changes follow in ascending
/// position name order.
///
/// # Examples
///
/// ```
/// use homeprobe::state::{ChangeDetector, DeviceKey, Liveness, StateChange, StateSnapshot};
/// use serde_json::json;
///
/// let mut detector = ChangeDetector::new();
/// let key = DeviceKey::new("Door A");
/// let open = StateSnapshot::from_fields([("open", json!(true))]);
///
/// detector.detect(&key, Some(open.clone()), Liveness::Online);
///
/// let changes = detector.detect(&key, None, Liveness::Offline);
/// assert_eq!(
///     changes,
///     vec![StateChange::connectivity(Liveness::Online, Liveness::Offline)]
/// );
///
/// // Back online with the same state: only the connectivity change
/// let changes = detector.detect(&key, Some(open), Liveness::Online);
/// assert_eq!(
///     changes,
///     vec![StateChange::connectivity(Liveness::Offline, Liveness::Online)]
/// );
/// ```
#[derive(Debug, Default)]
pub struct ChangeDetector {
    previous: HashMap<DeviceKey, PreviousState>,
}

impl ChangeDetector {
    /// Creates a detector with no tracked devices.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a poll of `key` and returns what changed since the last one.
    pub fn detect(
        &mut self,
        key: &DeviceKey,
        snapshot: Option<StateSnapshot>,
        liveness: Liveness,
    ) -> Vec<StateChange> {
        let liveness = if snapshot.is_some() {
            liveness
        } else {
            Liveness::Offline
        };

        let Some(prev) = self.previous.get_mut(key) else {
            self.previous
                .insert(key.clone(), PreviousState { snapshot, liveness });
            return Vec::new();
        };

        let mut changes = Vec::new();
        if prev.liveness != liveness {
            changes.push(StateChange::connectivity(prev.liveness, liveness));
        }

        if liveness.is_online() {
            if let (Some(before), Some(now)) = (prev.snapshot.as_ref(), snapshot.as_ref()) {
                changes.extend(before.differing(now).map(|(field, was, is)| {
                    StateChange::field_change(field, was.clone(), is.clone())
                }));
            }
            if snapshot.is_some() {
                prev.snapshot = snapshot;
            }
        }
        prev.liveness = liveness;

        changes
    }

    /// Returns `true` if `key` has been observed before.
    #[must_use]
    pub fn is_tracking(&self, key: &DeviceKey) -> bool {
        self.previous.contains_key(key)
    }

    /// Returns the recorded observation for `key`.
    #[must_use]
    pub fn previous(&self, key: &DeviceKey) -> Option<&PreviousState> {
        self.previous.get(key)
    }

    /// Returns every tracked key, sorted.
    #[must_use]
    pub fn tracked_keys(&self) -> Vec<DeviceKey> {
        let mut keys: Vec<DeviceKey> = self.previous.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Drops the record for `key`; its next poll becomes a new baseline.
    pub fn forget(&mut self, key: &DeviceKey) -> Option<PreviousState> {
        self.previous.remove(key)
    }

    /// Returns the number of tracked devices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.previous.len()
    }

    /// Returns `true` if no device has been observed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.previous.is_empty()
    }
}
