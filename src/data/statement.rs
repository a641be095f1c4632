// SPDX-License-Identifier: GPL-3.0-or-later

//! A thin accessor layer over the generic JSON representation of a
//! Statement body (spec §9 Design Notes: "Represent bodies as a recursive
//! tagged value... thread them unchanged through validation, storage, and
//! projection"). Schema validation (C1) is the sole gate on well-formedness;
//! this type only reads the handful of fields the engine needs by name.

use crate::data::{identity::is_voided_verb, DataError};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

/// A Statement body, backed by its raw JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement(Map<String, Value>);

impl Statement {
    /// Wrap a JSON value as a [Statement], failing if it is not an object.
    pub fn from_value(value: Value) -> Result<Self, DataError> {
        match value {
            Value::Object(map) => Ok(Statement(map)),
            _ => Err(DataError::Runtime("Statement body must be a JSON object".into())),
        }
    }

    /// Consume `self`, returning the underlying JSON value.
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Borrow the underlying JSON object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Return the `id` field as a [Uuid] if present and well-formed.
    pub fn id(&self) -> Option<Uuid> {
        self.0.get("id")?.as_str().and_then(|s| Uuid::parse_str(s).ok())
    }

    /// Set (or replace) the `id` field.
    pub fn set_id(&mut self, id: Uuid) {
        self.0.insert("id".into(), Value::String(id.to_string()));
    }

    /// Return the `verb.id` IRI, if present.
    pub fn verb_id(&self) -> Option<&str> {
        self.0.get("verb")?.get("id")?.as_str()
    }

    /// Return TRUE if this Statement's verb is the voiding verb.
    pub fn is_verb_voided(&self) -> bool {
        self.verb_id().is_some_and(is_voided_verb)
    }

    /// Return the `object` field.
    pub fn object(&self) -> Option<&Value> {
        self.0.get("object")
    }

    /// Return the `actor` field.
    pub fn actor(&self) -> Option<&Value> {
        self.0.get("actor")
    }

    /// Return the `authority` field.
    pub fn authority(&self) -> Option<&Value> {
        self.0.get("authority")
    }

    /// Return the `context` field.
    pub fn context(&self) -> Option<&Value> {
        self.0.get("context")
    }

    /// Return the raw `timestamp` field string, if present.
    pub fn timestamp_str(&self) -> Option<&str> {
        self.0.get("timestamp")?.as_str()
    }

    /// Set the `stored` field to the given instant, RFC3339 with millis.
    pub fn set_stored(&mut self, stored: DateTime<Utc>) {
        self.0.insert(
            "stored".into(),
            Value::String(stored.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
    }

    /// Return the UUID of the Statement this one voids, if its verb is the
    /// voiding verb and its object is a `StatementRef`.
    pub fn voided_target(&self) -> Option<Uuid> {
        if !self.is_verb_voided() {
            return None;
        }
        let object = self.object()?;
        if object.get("objectType")?.as_str()? != "StatementRef" {
            return None;
        }
        Uuid::parse_str(object.get("id")?.as_str()?).ok()
    }

    /// Return the `attachments` array, or an empty slice if absent.
    pub fn attachments(&self) -> &[Value] {
        self.0
            .get("attachments")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Return the serialized byte length of this Statement body, used for
    /// quota accounting.
    pub fn byte_len(&self) -> usize {
        serde_json::to_vec(&self.0).map(|v| v.len()).unwrap_or(0)
    }
}
