// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device state change detection.
//!
//! A poller hands every observation of a device to a [`ChangeDetector`]
//! as a [`DeviceKey`], an optional [`StateSnapshot`] and a [`Liveness`]
//! flag. The detector compares it with the previous observation of the same
//! key and returns the resulting [`StateChange`]s.
//!
//! # Examples
//!
//! ```
//! use homeprobe::state::{ChangeDetector, DeviceKey, Liveness, StateSnapshot};
//! use serde_json::json;
//!
//! let mut detector = ChangeDetector::new();
//! let key = DeviceKey::new("Door A");
//!
//! let closed = StateSnapshot::from_fields([("open", json!(false))]);
//! let open = StateSnapshot::from_fields([("open", json!(true))]);
//!
//! // First observation only records the baseline
//! assert!(detector.detect(&key, Some(closed), Liveness::Online).is_empty());
//!
//! let changes = detector.detect(&key, Some(open), Liveness::Online);
//! assert_eq!(changes.len(), 1);
//! assert_eq!(changes[0].field(), "open");
//! ```

mod detector;
mod device_key;
mod snapshot;
mod state_change;

pub use detector::{ChangeDetector, PreviousState};
pub use device_key::DeviceKey;
pub use snapshot::{StateSnapshot, canonical_eq, canonical_string};
pub use state_change::{Liveness, StateChange};
