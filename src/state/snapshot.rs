// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! State snapshots and canonical structural equality.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde_json::Value;

use crate::error::ParseError;

/// Reported device state at one poll instant.
///
/// A snapshot is a set of named positions (fields or capabilities) holding
/// arbitrary JSON values. Positions are the unit of change reporting: each
/// position whose value differs between two snapshots yields one change.
///
/// Snapshots are never mutated after capture; a new poll builds a new one.
///
/// # Examples
///
/// ```
/// use homeprobe::state::StateSnapshot;
/// use serde_json::json;
///
/// let snapshot = StateSnapshot::from_object(json!({"on": true, "bri": 254})).unwrap();
/// assert_eq!(snapshot.get("bri"), Some(&json!(254)));
/// assert_eq!(snapshot.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StateSnapshot {
    fields: BTreeMap<String, Value>,
}

impl StateSnapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a snapshot from `(position, value)` pairs.
    ///
    /// A repeated position keeps the last value.
    #[must_use]
    pub fn from_fields<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Self {
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Builds a snapshot from the top-level members of a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::UnexpectedFormat`] if `value` is not an object.
    pub fn from_object(value: Value) -> Result<Self, ParseError> {
        match value {
            Value::Object(map) => Ok(Self::from_fields(map)),
            other => Err(ParseError::UnexpectedFormat(format!(
                "expected a JSON object for device state, got {}",
                kind_of(&other)
            ))),
        }
    }

    /// Returns a copy of this snapshot without the given positions.
    #[must_use]
    pub fn without(&self, positions: &[&str]) -> Self {
        Self {
            fields: self
                .fields
                .iter()
                .filter(|(k, _)| !positions.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    /// Returns a copy of this snapshot with one extra position.
    #[must_use]
    pub fn with(&self, position: impl Into<String>, value: Value) -> Self {
        let mut fields = self.fields.clone();
        fields.insert(position.into(), value);
        Self { fields }
    }

    /// Returns the value at a position.
    #[must_use]
    pub fn get(&self, position: &str) -> Option<&Value> {
        self.fields.get(position)
    }

    /// Iterates positions in ascending name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of positions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the snapshot has no positions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Positions present in both snapshots whose values differ.
    ///
    /// Positions missing on either side are skipped rather than reported.
    pub(crate) fn differing<'a>(
        &'a self,
        current: &'a StateSnapshot,
    ) -> impl Iterator<Item = (&'a str, &'a Value, &'a Value)> {
        current.fields.iter().filter_map(move |(name, now)| {
            let before = self.fields.get(name)?;
            (!canonical_eq(before, now)).then_some((name.as_str(), before, now))
        })
    }
}

impl PartialEq for StateSnapshot {
    fn eq(&self, other: &Self) -> bool {
        self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .zip(&other.fields)
                .all(|((ka, va), (kb, vb))| ka == kb && canonical_eq(va, vb))
    }
}

impl TryFrom<Value> for StateSnapshot {
    type Error = ParseError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_object(value)
    }
}

/// Structural equality of two JSON values.
///
/// Objects are equal when they hold the same keys with equal values,
/// whatever the member order. Arrays compare element-wise. Numbers compare
/// as JSON numbers, so `1` and `1.0` are different values, as their
/// serialized forms are.
#[must_use]
pub fn canonical_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| canonical_eq(l, r))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(k, l)| y.get(k).is_some_and(|r| canonical_eq(l, r)))
        }
        _ => false,
    }
}

/// Renders a JSON value with object keys in ascending order.
#[must_use]
pub fn canonical_string(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(&mut out, value);
    out
}

fn write_canonical(out: &mut String, value: &Value) {
    match value {
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(out, item);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                // Serializing a plain string cannot fail
                let _ = write!(out, "{}:", Value::String(key.clone()));
                write_canonical(out, &map[key]);
            }
            out.push('}');
        }
        scalar => {
            let _ = write!(out, "{scalar}");
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
