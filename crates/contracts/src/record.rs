//! Record - Log Source output
//!
//! One parsed log line, with its event time lifted out of the field map.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A single field value.
///
/// Produced once while parsing a payload; formatting for storage and content
/// hashing both match on this closed set instead of re-inspecting JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    /// Plain text
    String(String),
    /// Any JSON number, kept in its JSON form so the text is stable
    Number(serde_json::Number),
    /// Boolean
    Bool(bool),
    /// Nested object or array
    Structured(Value),
    /// JSON `null`
    Missing,
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FieldValue::Missing,
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Number(n) => FieldValue::Number(n),
            Value::String(s) => FieldValue::String(s),
            nested @ (Value::Array(_) | Value::Object(_)) => FieldValue::Structured(nested),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value.into())
    }
}

/// A fetched log record.
///
/// `timestamp` is the event time in UTC epoch nanoseconds; it is stored under
/// the configured timestamp column and never appears in `fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Event time (UTC epoch nanoseconds)
    pub timestamp: i64,

    /// Remaining fields, keyed by name
    pub fields: BTreeMap<String, FieldValue>,
}

impl Record {
    /// Create an empty record at the given time
    pub fn new(timestamp: i64) -> Self {
        Self {
            timestamp,
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field insertion
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Build a record from a JSON object, lifting the event time out.
    ///
    /// A field in the object named `timestamp_field` is discarded: the
    /// transport-level timestamp always wins.
    pub fn from_json_object(
        timestamp: i64,
        object: serde_json::Map<String, Value>,
        timestamp_field: &str,
    ) -> Self {
        let fields = object
            .into_iter()
            .filter(|(name, _)| name != timestamp_field)
            .map(|(name, value)| (name, FieldValue::from(value)))
            .collect();
        Self { timestamp, fields }
    }

    /// Field lookup
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Text of a string field, used to read the grouping key
    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.fields.get(name) {
            Some(FieldValue::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Names of all fields, without the timestamp column
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}
