// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `homeprobe` - probes for smart home cloud APIs.
//!
//! The library talks to the YoLink, Govee and Philips Hue cloud APIs and
//! turns successive observations of each device into a stream of discrete
//! change events.
//!
//! # Supported Features
//!
//! - **Change detection**: per-device baselines, field diffs and
//!   online/offline transitions ([`state::ChangeDetector`])
//! - **YoLink**: token exchange, home and device queries, door sensor
//!   reports over MQTT
//! - **Govee**: device listing, state polling, MQTT events
//! - **Philips Hue**: OAuth with PKCE, device listing, light and sensor
//!   polling
//!
//! # Quick Start
//!
//! ```
//! use homeprobe::event::{ConsoleSink, DeviceEvent};
//! use homeprobe::state::{ChangeDetector, DeviceKey, Liveness, StateSnapshot};
//! use serde_json::json;
//!
//! let mut detector = ChangeDetector::new();
//! let mut sink = ConsoleSink::new(Vec::new());
//! let key = DeviceKey::new("Door A");
//!
//! for (snapshot, liveness) in [
//!     (Some(json!({"open": false})), Liveness::Online),
//!     (Some(json!({"open": true})), Liveness::Online),
//!     (None, Liveness::Offline),
//! ] {
//!     let snapshot = snapshot.map(|s| StateSnapshot::from_object(s).unwrap());
//!     let events = DeviceEvent::from_poll(&mut detector, &key, snapshot, liveness);
//!     sink.record_all(&events);
//! }
//!
//! let out = String::from_utf8(sink.into_inner()).unwrap();
//! assert!(out.contains("Door A open: false -> true"));
//! assert!(out.contains("Door A connectivity: ONLINE -> OFFLINE"));
//! ```
//!
//! # Features
//!
//! - `http` (default): REST clients via `reqwest`
//! - `mqtt` (default): push subscriptions via `rumqttc`

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod credentials;
pub mod error;
pub mod event;
pub mod govee;
pub mod hue;
pub mod protocol;
pub mod state;
pub mod yolink;

pub use error::{ApiError, ConfigError, Error, ParseError, ProtocolError, Result};
pub use event::{ConsoleSink, DeviceEvent};
pub use state::{ChangeDetector, DeviceKey, Liveness, StateChange, StateSnapshot};
