// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Console rendering of device events.

use std::borrow::Cow;
use std::io::{self, Write};

use chrono::SecondsFormat;
use serde_json::Value;

use crate::state::{StateChange, canonical_string};

use super::DeviceEvent;

/// Writes one timestamped line per [`DeviceEvent`].
///
/// Lines look like:
///
/// ```text
/// [2026-01-05T10:00:00.000Z] Door A open: false -> true
/// [2026-01-05T10:00:05.000Z] Door A connectivity: ONLINE -> OFFLINE
/// ```
///
/// Write failures are logged and otherwise ignored, so a closed pipe never
/// stops a poll loop.
///
/// # Examples
///
/// ```
/// use homeprobe::event::{ConsoleSink, DeviceEvent};
/// use homeprobe::state::{DeviceKey, StateChange};
/// use serde_json::json;
///
/// let mut sink = ConsoleSink::new(Vec::new());
/// sink.record(&DeviceEvent::state_changed(
///     DeviceKey::new("Door A"),
///     StateChange::field_change("open", json!(false), json!(true)),
/// ));
///
/// let out = String::from_utf8(sink.into_inner()).unwrap();
/// assert!(out.ends_with("Door A open: false -> true\n"));
/// ```
#[derive(Debug)]
pub struct ConsoleSink<W = io::Stdout> {
    out: W,
}

impl ConsoleSink<io::Stdout> {
    /// Creates a sink writing to standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> ConsoleSink<W> {
    /// Creates a sink writing to `out`.
    #[must_use]
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Renders and writes one event.
    pub fn record(&mut self, event: &DeviceEvent) {
        let line = render(event);
        if let Err(e) = writeln!(self.out, "{line}") {
            tracing::warn!(error = %e, "Failed to write change event");
        }
    }

    /// Renders and writes a batch of events.
    pub fn record_all<'a>(&mut self, events: impl IntoIterator<Item = &'a DeviceEvent>) {
        for event in events {
            self.record(event);
        }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Renders an event as a single console line (without newline).
#[must_use]
pub fn render(event: &DeviceEvent) -> String {
    let timestamp = event
        .observed_at()
        .to_rfc3339_opts(SecondsFormat::Millis, true);

    match event {
        DeviceEvent::BaselineCaptured {
            device_key,
            liveness,
            ..
        } => format!("[{timestamp}] Initial state captured for {device_key} ({liveness})"),
        DeviceEvent::StateChanged {
            device_key, change, ..
        } => format!(
            "[{timestamp}] {device_key} {}: {} -> {}",
            field_label(change),
            render_value(change, &change.previous_value()),
            render_value(change, &change.current_value()),
        ),
    }
}

/// A snapshot position named like the liveness pseudo-field is printed as
/// `state.<name>` so the two stay distinguishable.
fn field_label(change: &StateChange) -> Cow<'_, str> {
    match change {
        StateChange::Field { field, .. } if field == StateChange::CONNECTIVITY => {
            Cow::Owned(format!("state.{field}"))
        }
        _ => Cow::Borrowed(change.field()),
    }
}

fn render_value(change: &StateChange, value: &Value) -> String {
    match (change, value) {
        (StateChange::Connectivity { .. }, Value::String(label)) => label.clone(),
        _ => canonical_string(value),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use super::*;
    use crate::state::{DeviceKey, Liveness};

    fn at_noon(change: StateChange) -> DeviceEvent {
        DeviceEvent::StateChanged {
            device_key: DeviceKey::from("Door A"),
            change,
            observed_at: Utc.with_ymd_and_hms(2026, 1, 5, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn renders_field_change() {
        let line = render(&at_noon(StateChange::field_change(
            "open",
            json!(false),
            json!(true),
        )));
        assert_eq!(line, "[2026-01-05T12:00:00.000Z] Door A open: false -> true");
    }

    #[test]
    fn renders_connectivity_without_quotes() {
        let line = render(&at_noon(StateChange::connectivity(
            Liveness::Online,
            Liveness::Offline,
        )));
        assert_eq!(
            line,
            "[2026-01-05T12:00:00.000Z] Door A connectivity: ONLINE -> OFFLINE"
        );
    }

    #[test]
    fn field_named_connectivity_is_told_apart_from_liveness() {
        let line = render(&at_noon(StateChange::field_change(
            "connectivity",
            json!("wifi"),
            json!("thread"),
        )));
        assert_eq!(
            line,
            r#"[2026-01-05T12:00:00.000Z] Door A state.connectivity: "wifi" -> "thread""#
        );
    }

    #[test]
    fn renders_structured_values_canonically() {
        let prev: Value = serde_json::from_str(r#"{"r":1,"g":2}"#).unwrap();
        let line = render(&at_noon(StateChange::field_change("color", prev, json!(null))));
        assert!(line.ends_with(r#"color: {"g":2,"r":1} -> null"#));
    }

    #[test]
    fn renders_baseline() {
        let event = DeviceEvent::BaselineCaptured {
            device_key: DeviceKey::from("Lamp"),
            liveness: Liveness::Offline,
            observed_at: Utc.with_ymd_and_hms(2026, 1, 5, 12, 0, 0).unwrap(),
        };
        assert_eq!(
            render(&event),
            "[2026-01-05T12:00:00.000Z] Initial state captured for Lamp (OFFLINE)"
        );
    }

    #[test]
    fn record_all_writes_one_line_per_event() {
        let mut sink = ConsoleSink::new(Vec::new());
        let events = vec![
            at_noon(StateChange::field_change("on", json!(true), json!(false))),
            at_noon(StateChange::field_change("bri", json!(1), json!(2))),
        ];
        sink.record_all(&events);

        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(out.lines().count(), 2);
    }
}
