// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! State change representation.
//!
//! A [`StateChange`] is one observed difference between two polls of the
//! same device: either a reachability transition ([`StateChange::Connectivity`])
//! or a single position whose value changed ([`StateChange::Field`]).
//!
//! # Examples
//!
//! ```
//! use homeprobe::state::{Liveness, StateChange};
//! use serde_json::json;
//!
//! let offline = StateChange::connectivity(Liveness::Online, Liveness::Offline);
//! assert_eq!(offline.field(), "connectivity");
//! assert_eq!(offline.previous_value(), json!("ONLINE"));
//!
//! let opened = StateChange::field_change("open", json!(false), json!(true));
//! assert_eq!(opened.current_value(), json!(true));
//! ```

use std::fmt;

use serde_json::Value;

/// Reachability of a device as judged by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Liveness {
    /// The device answered with usable state.
    Online,
    /// The device is unreachable or the poll failed.
    Offline,
}

impl Liveness {
    /// Returns `true` for [`Liveness::Online`].
    #[must_use]
    pub fn is_online(self) -> bool {
        matches!(self, Self::Online)
    }

    /// Returns the upper-case label used in change reports.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Online => "ONLINE",
            Self::Offline => "OFFLINE",
        }
    }
}

impl From<bool> for Liveness {
    fn from(online: bool) -> Self {
        if online { Self::Online } else { Self::Offline }
    }
}

impl fmt::Display for Liveness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One difference between consecutive observations of a device.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum StateChange {
    /// The device went online or offline.
    Connectivity {
        /// Liveness at the previous poll.
        previous: Liveness,
        /// Liveness at this poll.
        current: Liveness,
    },

    /// The value at one snapshot position changed.
    Field {
        /// Name of the position (field or capability instance).
        field: String,
        /// Value before the change.
        previous: Value,
        /// Value after the change.
        current: Value,
    },
}

impl StateChange {
    /// Field name reported for connectivity transitions.
    pub const CONNECTIVITY: &'static str = "connectivity";

    /// Creates a connectivity transition.
    #[must_use]
    pub fn connectivity(previous: Liveness, current: Liveness) -> Self {
        Self::Connectivity { previous, current }
    }

    /// Creates a field change.
    #[must_use]
    pub fn field_change(field: impl Into<String>, previous: Value, current: Value) -> Self {
        Self::Field {
            field: field.into(),
            previous,
            current,
        }
    }

    /// Returns the name of the changed position.
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::Connectivity { .. } => Self::CONNECTIVITY,
            Self::Field { field, .. } => field,
        }
    }

    /// Returns the previous value as JSON.
    ///
    /// Connectivity values are rendered as `"ONLINE"` / `"OFFLINE"`.
    #[must_use]
    pub fn previous_value(&self) -> Value {
        match self {
            Self::Connectivity { previous, .. } => Value::from(previous.as_str()),
            Self::Field { previous, .. } => previous.clone(),
        }
    }

    /// Returns the current value as JSON.
    #[must_use]
    pub fn current_value(&self) -> Value {
        match self {
            Self::Connectivity { current, .. } => Value::from(current.as_str()),
            Self::Field { current, .. } => current.clone(),
        }
    }

    /// Returns `true` if this is a connectivity transition.
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connectivity { .. })
    }

    /// Returns `true` if this change is the device going offline.
    #[must_use]
    pub fn is_offline_transition(&self) -> bool {
        matches!(
            self,
            Self::Connectivity {
                current: Liveness::Offline,
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn liveness_from_bool() {
        assert_eq!(Liveness::from(true), Liveness::Online);
        assert_eq!(Liveness::from(false), Liveness::Offline);
        assert!(Liveness::Online.is_online());
    }

    #[test]
    fn liveness_display() {
        assert_eq!(Liveness::Offline.to_string(), "OFFLINE");
        assert_eq!(serde_json::to_string(&Liveness::Online).unwrap(), "\"ONLINE\"");
    }

    #[test]
    fn connectivity_values_render_as_labels() {
        let change = StateChange::connectivity(Liveness::Offline, Liveness::Online);
        assert_eq!(change.field(), "connectivity");
        assert_eq!(change.previous_value(), json!("OFFLINE"));
        assert_eq!(change.current_value(), json!("ONLINE"));
        assert!(change.is_connectivity());
        assert!(!change.is_offline_transition());
    }

    #[test]
    fn field_change_accessors() {
        let change = StateChange::field_change("bri", json!(10), json!(200));
        assert_eq!(change.field(), "bri");
        assert_eq!(change.previous_value(), json!(10));
        assert_eq!(change.current_value(), json!(200));
        assert!(!change.is_connectivity());
    }
}
