// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device key type.

use std::borrow::Borrow;
use std::fmt;

/// Identifier of a physical device within one vendor account.
///
/// Keys are built by the caller from vendor metadata, for example
/// `"Desk Lamp (H6008)"` for Govee or `"Hallway (ID: 3)"` for Hue. They are
/// only meaningful for the lifetime of the process that built them.
///
/// # Examples
///
/// ```
/// use homeprobe::state::DeviceKey;
///
/// let key = DeviceKey::composite("Desk Lamp", "H6008");
/// assert_eq!(key.as_str(), "Desk Lamp (H6008)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct DeviceKey(String);

impl DeviceKey {
    /// Creates a key from an arbitrary string.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Creates a `"<name> (<qualifier>)"` key.
    #[must_use]
    pub fn composite(name: &str, qualifier: &str) -> Self {
        Self(format!("{name} ({qualifier})"))
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for DeviceKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl Borrow<str> for DeviceKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}
