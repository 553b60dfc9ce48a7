// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Timestamped device events and their console rendering.
//!
//! Pollers wrap the [`StateChange`](crate::state::StateChange)s returned by
//! the detector into [`DeviceEvent`]s and hand them to a [`ConsoleSink`].

mod console_sink;
mod device_event;

pub use console_sink::{ConsoleSink, render};
pub use device_event::DeviceEvent;
