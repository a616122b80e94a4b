//! Entity - Application record plus system-managed metadata.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use crate::key::Key;
use crate::value::{Fields, Value};

pub const CREATED: &str = "created";
pub const UPDATED: &str = "updated";

/// Error converting between typed records and entity fields.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("record did not serialize to an object")]
    NotAnObject,
    #[error("record serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// System-managed metadata attached to every entity.
///
/// Holds at least `created` and `updated` once the entity has been written.
/// Additional metadata entries are carried through storage untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata(Fields);

impl Metadata {
    /// Empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creation timestamp, if stamped.
    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.0.get(CREATED).and_then(Value::as_timestamp)
    }

    /// Last update timestamp, if stamped.
    pub fn updated(&self) -> Option<DateTime<Utc>> {
        self.0.get(UPDATED).and_then(Value::as_timestamp)
    }

    /// Stamp the creation time.
    pub fn set_created(&mut self, at: DateTime<Utc>) {
        self.0.insert(CREATED.to_string(), Value::Timestamp(at));
    }

    /// Stamp the last update time.
    pub fn set_updated(&mut self, at: DateTime<Utc>) {
        self.0.insert(UPDATED.to_string(), Value::Timestamp(at));
    }

    /// Get a metadata property.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Set a metadata property, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }

    /// Remove a metadata property.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.remove(name)
    }

    /// Whether no metadata is set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate properties in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Unwrap into the underlying fields.
    pub fn into_fields(self) -> Fields {
        self.0
    }
}

impl From<Fields> for Metadata {
    fn from(fields: Fields) -> Self {
        Self(fields)
    }
}

/// One logical record as seen by the application.
///
/// `id` and `key` are derived from the storage key when the entity comes
/// back from the model; neither is ever written as a stored field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entity {
    pub id: Option<String>,
    pub key: Option<Key>,
    pub metadata: Metadata,
    pub data: Fields,
}

impl Entity {
    /// Entity carrying `data` with no id, key or metadata.
    pub fn new(data: Fields) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    /// Builder form of [`Entity::set`].
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(name.into(), value.into());
        self
    }

    /// Get a data field.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    /// Set a data field, returning the previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.data.insert(name.into(), value.into())
    }

    /// Tag with the storage key it was read from or written to.
    pub fn keyed(mut self, key: &Key) -> Self {
        self.id = Some(key.name());
        self.key = Some(key.clone());
        self
    }

    /// Build an entity from a plain serializable record.
    pub fn from_record<T: Serialize>(record: &T) -> Result<Self, RecordError> {
        match serde_json::to_value(record)? {
            serde_json::Value::Object(map) => Ok(Self::new(
                map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            )),
            _ => Err(RecordError::NotAnObject),
        }
    }

    /// Decode the data fields into a plain record. Metadata, id and key are not included.
    pub fn to_record<T: DeserializeOwned>(&self) -> Result<T, RecordError> {
        let object: serde_json::Map<String, serde_json::Value> = self
            .data
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        Ok(serde_json::from_value(serde_json::Value::Object(object))?)
    }
}
