// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `homeprobe` library.
//!
//! The change detector itself never fails; these errors cover the glue
//! around it: transport failures, malformed vendor payloads, vendor-level
//! rejections and missing credentials.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during protocol communication.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while parsing a response.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// The vendor API answered but reported a failure.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Local configuration is incomplete or unreadable.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The OAuth authorization flow did not complete.
    #[error("authorization failed: {0}")]
    Auth(String),
}

/// Errors related to protocol communication (HTTP/MQTT).
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// HTTP request failed.
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// MQTT connection or communication failed.
    #[cfg(feature = "mqtt")]
    #[error("MQTT error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    /// Connection to the service failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Request timed out.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Authentication failed (HTTP 401).
    #[error("authentication failed")]
    AuthenticationFailed,

    /// The vendor rate limit was exceeded (HTTP 429).
    #[error("rate limit exceeded")]
    RateLimited,

    /// Internal channel was closed.
    #[error("channel closed: {0}")]
    ChannelClosed(String),

    /// Socket I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to parsing vendor responses.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Expected field is missing from the response.
    #[error("missing field in response: {0}")]
    MissingField(String),

    /// Unexpected response format.
    #[error("unexpected response format: {0}")]
    UnexpectedFormat(String),
}

/// A failure reported inside an otherwise successful HTTP exchange.
///
/// YoLink signals errors with a non-`"000000"` code, Govee with a code other
/// than 200, and OAuth token endpoints with an `error` field.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{vendor} returned code {code}: {message}")]
pub struct ApiError {
    /// Vendor that reported the failure.
    pub vendor: &'static str,
    /// Vendor-specific error code.
    pub code: String,
    /// Human readable description.
    pub message: String,
}

impl ApiError {
    /// Creates a new API error.
    #[must_use]
    pub fn new(vendor: &'static str, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            vendor,
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Errors related to local configuration and the credential file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required credential is not present in the environment or file.
    #[error("{key} is missing: {hint}")]
    MissingCredential {
        /// The environment key that was looked up.
        key: String,
        /// What the operator should do to obtain it.
        hint: String,
    },

    /// The credential file could not be read or written.
    #[error("credential file error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
