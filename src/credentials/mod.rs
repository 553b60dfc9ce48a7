// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Credentials read from a `.env` style file and the process environment.
//!
//! Tokens obtained by the `auth` commands are appended to the same file, so
//! a key may appear several times; the last occurrence wins.
//!
//! # Examples
//!
//! ```
//! use homeprobe::credentials::{CredentialStore, keys};
//!
//! let store = CredentialStore::from_contents("GOVEE_API_KEY=abc123\n");
//! assert_eq!(store.get(keys::GOVEE_API_KEY).as_deref(), Some("abc123"));
//! ```

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Well-known credential names.
pub mod keys {
    /// YoLink user access ID.
    pub const YOSMART_UAID: &str = "YOSMART_UAID";
    /// YoLink user access secret.
    pub const YOSMART_SECRET: &str = "YOSMART_SECRET";
    /// YoLink bearer token.
    pub const YOSMART_ACCESS_TOKEN: &str = "YOSMART_ACCESS_TOKEN";
    /// YoLink home identifier.
    pub const YOSMART_HOME_ID: &str = "YOSMART_HOME_ID";
    /// Govee developer API key.
    pub const GOVEE_API_KEY: &str = "GOVEE_API_KEY";
    /// Hue remote API client id.
    pub const HUE_CLIENT_ID: &str = "HUE_CLIENT_ID";
    /// Hue remote API client secret.
    pub const HUE_CLIENT_SECRET: &str = "HUE_CLIENT_SECRET";
    /// Hue OAuth access token.
    pub const HUE_ACCESS_TOKEN: &str = "HUE_ACCESS_TOKEN";
    /// Hue OAuth refresh token.
    pub const HUE_REFRESH_TOKEN: &str = "HUE_REFRESH_TOKEN";
}

/// Key/value credentials backed by an optional file.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    path: Option<PathBuf>,
    values: HashMap<String, String>,
}

impl CredentialStore {
    /// Loads credentials from `path`.
    ///
    /// A missing file yields an empty store that will create the file on the
    /// first [`persist`](Self::persist).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file exists but cannot be read.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Credential file not found, starting empty");
                String::new()
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        let mut store = Self::from_contents(&contents);
        store.path = Some(path.to_path_buf());
        tracing::debug!(path = %path.display(), entries = store.values.len(), "Loaded credentials");
        Ok(store)
    }

    /// Builds an in-memory store from `.env` formatted text.
    #[must_use]
    pub fn from_contents(contents: &str) -> Self {
        let values = contents.lines().filter_map(parse_line).collect();
        Self { path: None, values }
    }

    /// Returns the value for `key`.
    ///
    /// A non-empty process environment variable takes precedence over the
    /// file.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| self.values.get(key).filter(|v| !v.is_empty()).cloned())
    }

    /// Returns the value for `key` or an error carrying `hint`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCredential`] if the key is not set.
    pub fn require(&self, key: &str, hint: &str) -> Result<String, ConfigError> {
        self.get(key).ok_or_else(|| ConfigError::MissingCredential {
            key: key.to_string(),
            hint: hint.to_string(),
        })
    }

    /// Appends `entries` to the backing file and updates the in-memory view.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be written.
    pub fn persist(&mut self, entries: &[(&str, &str)]) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            let mut file = OpenOptions::new().create(true).append(true).open(path)?;
            for (key, value) in entries {
                write!(file, "\n{key}={value}")?;
            }
            writeln!(file)?;
            tracing::info!(path = %path.display(), count = entries.len(), "Saved credentials");
        }

        for (key, value) in entries {
            self.values.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }

    /// Returns the backing file, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

fn parse_line(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let (key, value) = line.split_once('=')?;
    let key = key.trim().trim_start_matches("export ").trim();
    if key.is_empty() {
        return None;
    }
    let value = value.trim();
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value);
    Some((key.to_string(), value.to_string()))
}
