//! Schema-less records.
//!
//! A [`Record`] is an ordered JSON object. Field values are arbitrary
//! [`serde_json::Value`]s (string, number, bool, null, array or nested
//! object); the store only interprets the reserved [`ID_FIELD`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::id::RecordId;

/// The key the store reserves for the record identifier.
pub const ID_FIELD: &str = "id";

/// A single schema-less entry in the store.
///
/// Serializes as a bare JSON object, so a `Vec<Record>` is exactly the
/// on-disk array format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Record(Map::new())
    }

    /// Reads the reserved identifier.
    ///
    /// Fails with [`CoreError::InvalidIdentifier`] if the field is missing or
    /// is not a numeric identifier.
    pub fn id(&self) -> Result<RecordId, CoreError> {
        match self.0.get(ID_FIELD) {
            Some(value) => RecordId::from_value(value).ok_or(CoreError::InvalidIdentifier {
                found: value_kind(value),
            }),
            None => Err(CoreError::InvalidIdentifier { found: "missing" }),
        }
    }

    /// Sets the reserved identifier, overwriting any existing value.
    pub fn stamp_id(&mut self, id: RecordId) {
        self.0.insert(ID_FIELD.to_string(), id.to_value());
    }

    /// Returns the record with `id` stamped onto it.
    pub fn with_id(mut self, id: RecordId) -> Self {
        self.stamp_id(id);
        self
    }

    /// Rejects records that carry the reserved field.
    ///
    /// Callers must never supply `id` themselves; this is the check the
    /// HTTP layer runs on incoming bodies.
    pub fn ensure_unreserved(&self) -> Result<(), CoreError> {
        if self.0.contains_key(ID_FIELD) {
            return Err(CoreError::ReservedField { field: ID_FIELD });
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Record(map)
    }
}

impl TryFrom<Value> for Record {
    type Error = CoreError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Record(map)),
            other => Err(CoreError::NotAnObject {
                found: value_kind(&other),
            }),
        }
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Object(record.0)
    }
}

/// Human-readable name of a JSON value's kind, for error messages.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
