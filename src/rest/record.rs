//! Untyped server entities.

use std::ops::{Deref, DerefMut};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::rest::path::ResourceId;
use crate::rest::ResourceError;

/// One server entity: an ordered, string-keyed bag of JSON values.
///
/// A record also carries the name of the resource type it came from. The
/// tag is local bookkeeping and is never serialized.
///
/// # Example
///
/// ```rust
/// use serde_json::json;
/// use storage_api::rest::Record;
///
/// let record = Record::from_value(json!({"id": 7, "name": "db01"})).unwrap();
/// assert_eq!(record.get_str("name"), Some("db01"));
/// assert_eq!(record.id().unwrap().to_string(), "7");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record {
    fields: Map<String, Value>,
    #[serde(skip)]
    resource_type: Option<String>,
}

impl Record {
    /// Creates an empty, untagged record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a JSON object.
    #[must_use]
    pub const fn from_map(fields: Map<String, Value>) -> Self {
        Self {
            fields,
            resource_type: None,
        }
    }

    /// Wraps a JSON value, returning `None` unless it is an object.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self::from_map(fields)),
            _ => None,
        }
    }

    /// Returns the resource type this record was tagged with.
    #[must_use]
    pub fn resource_type(&self) -> Option<&str> {
        self.resource_type.as_deref()
    }

    /// Tags the record with a resource type, replacing any existing tag.
    pub fn set_resource_type(&mut self, resource_type: impl Into<String>) {
        self.resource_type = Some(resource_type.into());
    }

    /// Tags the record unless it already carries a tag.
    pub fn tag_if_missing(&mut self, resource_type: &str) {
        if self.resource_type.is_none() {
            self.resource_type = Some(resource_type.to_string());
        }
    }

    /// Builder form of [`set_resource_type`](Self::set_resource_type).
    #[must_use]
    pub fn tagged(mut self, resource_type: impl Into<String>) -> Self {
        self.set_resource_type(resource_type);
        self
    }

    /// Returns the string value of a field.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Returns the integer value of a field.
    #[must_use]
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.fields.get(key).and_then(Value::as_i64)
    }

    /// Returns the boolean value of a field.
    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.fields.get(key).and_then(Value::as_bool)
    }

    /// Returns the record's `id` field as an identifier.
    #[must_use]
    pub fn id(&self) -> Option<ResourceId> {
        self.fields.get("id").and_then(ResourceId::from_value)
    }

    /// Consumes the record, returning its fields.
    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.fields
    }

    /// Consumes the record, returning it as a JSON object value.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }

    /// Projects the record onto a typed struct through serde.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Fill`] if the fields do not deserialize into
    /// `T`.
    pub fn fill<T: DeserializeOwned>(&self) -> Result<T, ResourceError> {
        serde_json::from_value(Value::Object(self.fields.clone())).map_err(|e| {
            ResourceError::Fill {
                type_name: std::any::type_name::<T>(),
                message: e.to_string(),
            }
        })
    }
}

impl Deref for Record {
    type Target = Map<String, Value>;

    fn deref(&self) -> &Self::Target {
        &self.fields
    }
}

impl DerefMut for Record {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.fields
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self::from_map(fields)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        record.into_value()
    }
}

/// An ordered list of records.
///
/// An empty set is a valid result and never an error.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RecordSet(Vec<Record>);

impl RecordSet {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Tags every record that carries no tag yet.
    pub fn tag_if_missing(&mut self, resource_type: &str) {
        for record in &mut self.0 {
            record.tag_if_missing(resource_type);
        }
    }

    /// Tags every record, replacing existing tags.
    pub fn set_resource_type(&mut self, resource_type: &str) {
        for record in &mut self.0 {
            record.set_resource_type(resource_type);
        }
    }

    /// Consumes the set, returning the records.
    #[must_use]
    pub fn into_vec(self) -> Vec<Record> {
        self.0
    }
}

impl Deref for RecordSet {
    type Target = Vec<Record>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for RecordSet {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Vec<Record>> for RecordSet {
    fn from(records: Vec<Record>) -> Self {
        Self(records)
    }
}

impl IntoIterator for RecordSet {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<Record> for RecordSet {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
