//! InMemoryDatastore - BTreeMap-backed datastore for testing and development.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use thiserror::Error;
use tracing::trace;

use super::{Datastore, DeleteResponse, MutationResult, Query, Record, SaveMethod, SaveRequest};
use crate::key::Key;
use crate::metadata::StoredEntity;

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("entity already exists: {0}")]
    AlreadyExists(Key),
    #[error("no entity to update: {0}")]
    Missing(Key),
    #[error("field {field} of {key} holds a non-finite number")]
    NonFinite { key: Key, field: String },
    #[error("datastore lock poisoned during {0}")]
    LockPoisoned(&'static str),
    #[error("record serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// In-memory datastore.
///
/// Records are held in their serialized form, keyed by [`Key`] so scans
/// run in key order. Clone-friendly via Arc.
#[derive(Clone, Default)]
pub struct InMemoryDatastore {
    storage: Arc<RwLock<BTreeMap<Key, Vec<u8>>>>,
}

impl InMemoryDatastore {
    /// Create an empty datastore.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> Result<usize, MemoryError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| MemoryError::LockPoisoned("len"))?;
        Ok(storage.len())
    }

    /// Whether no records are stored.
    pub fn is_empty(&self) -> Result<bool, MemoryError> {
        Ok(self.len()? == 0)
    }

    /// Drop every record.
    pub fn clear(&self) -> Result<(), MemoryError> {
        let mut storage = self
            .storage
            .write()
            .map_err(|_| MemoryError::LockPoisoned("clear"))?;
        storage.clear();
        Ok(())
    }

    fn decode(key: &Key, bytes: &[u8]) -> Result<Record, MemoryError> {
        let data: StoredEntity = serde_json::from_slice(bytes)?;
        Ok(Record {
            key: key.clone(),
            data,
        })
    }
}

#[async_trait]
impl Datastore for InMemoryDatastore {
    type Query = Query;
    type Error = MemoryError;

    async fn save(&self, request: SaveRequest) -> Result<(), MemoryError> {
        // JSON has no NaN or infinity; such a record could never be read back.
        if let Some((field, _)) = request.data.iter().find(|(_, v)| v.has_non_finite()) {
            return Err(MemoryError::NonFinite {
                field: field.clone(),
                key: request.key,
            });
        }

        let bytes = serde_json::to_vec(&request.data)?;
        let mut storage = self
            .storage
            .write()
            .map_err(|_| MemoryError::LockPoisoned("save"))?;

        let exists = storage.contains_key(&request.key);
        match request.method {
            SaveMethod::Insert if exists => return Err(MemoryError::AlreadyExists(request.key)),
            SaveMethod::Update if !exists => return Err(MemoryError::Missing(request.key)),
            _ => {}
        }

        trace!(key = %request.key, method = request.method.as_str(), "datastore save");
        storage.insert(request.key, bytes);
        Ok(())
    }

    async fn get(&self, key: &Key) -> Result<Option<Record>, MemoryError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| MemoryError::LockPoisoned("get"))?;

        storage
            .get(key)
            .map(|bytes| Self::decode(key, bytes))
            .transpose()
    }

    async fn get_many(&self, keys: &[Key]) -> Result<Vec<Record>, MemoryError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| MemoryError::LockPoisoned("get_many"))?;

        let mut records = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(bytes) = storage.get(key) {
                records.push(Self::decode(key, bytes)?);
            }
        }
        Ok(records)
    }

    async fn run_query(&self, query: &Query) -> Result<Vec<Record>, MemoryError> {
        let records = {
            let storage = self
                .storage
                .read()
                .map_err(|_| MemoryError::LockPoisoned("run_query"))?;

            storage
                .iter()
                .filter(|(key, _)| key.kind() == query.kind())
                .map(|(key, bytes)| Self::decode(key, bytes))
                .collect::<Result<Vec<_>, _>>()?
        };

        let results = query.apply(records.into_iter());
        trace!(kind = query.kind(), count = results.len(), "datastore query");
        Ok(results)
    }

    async fn delete(&self, key: &Key) -> Result<DeleteResponse, MemoryError> {
        let mut storage = self
            .storage
            .write()
            .map_err(|_| MemoryError::LockPoisoned("delete"))?;

        // One entry for the key itself plus one per stored property.
        let index_updates = match storage.get(key) {
            Some(bytes) => {
                let data: StoredEntity = serde_json::from_slice(bytes)?;
                1 + data.len() as u64
            }
            None => 0,
        };
        if index_updates > 0 {
            storage.remove(key);
        }

        trace!(key = %key, index_updates, "datastore delete");
        Ok(DeleteResponse {
            mutation_result: MutationResult { index_updates },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Fields, Value};

    fn data(pairs: &[(&str, i64)]) -> StoredEntity {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Value::Integer(*v)))
            .collect()
    }

    fn insert(key: &Key, data: StoredEntity) -> SaveRequest {
        SaveRequest {
            key: key.clone(),
            method: SaveMethod::Insert,
            data,
        }
    }

    #[tokio::test]
    async fn save_and_get() {
        let store = InMemoryDatastore::new();
        let key = Key::new("Kind", "1");

        store.save(insert(&key, data(&[("value", 42)]))).await.unwrap();

        let record = store.get(&key).await.unwrap().unwrap();
        assert_eq!(record.key, key);
        assert_eq!(record.data["value"], Value::Integer(42));
    }

    #[tokio::test]
    async fn get_missing_returns_none() {
        let store = InMemoryDatastore::new();
        let result = store.get(&Key::new("Kind", "missing")).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn insert_fails_on_existing() {
        let store = InMemoryDatastore::new();
        let key = Key::new("Kind", "1");

        store.save(insert(&key, Fields::new())).await.unwrap();
        let err = store.save(insert(&key, Fields::new())).await.unwrap_err();
        assert!(matches!(err, MemoryError::AlreadyExists(k) if k == key));
    }

    #[tokio::test]
    async fn update_requires_existing() {
        let store = InMemoryDatastore::new();
        let key = Key::new("Kind", "1");
        let update = SaveRequest {
            key: key.clone(),
            method: SaveMethod::Update,
            data: data(&[("value", 2)]),
        };

        let err = store.save(update.clone()).await.unwrap_err();
        assert!(matches!(err, MemoryError::Missing(_)));

        store.save(insert(&key, data(&[("value", 1)]))).await.unwrap();
        store.save(update).await.unwrap();
        let record = store.get(&key).await.unwrap().unwrap();
        assert_eq!(record.data["value"], Value::Integer(2));
    }

    #[tokio::test]
    async fn get_many_keeps_request_order_and_skips_missing() {
        let store = InMemoryDatastore::new();
        let a = Key::new("Kind", "a");
        let b = Key::new("Kind", "b");
        store.save(insert(&a, Fields::new())).await.unwrap();
        store.save(insert(&b, Fields::new())).await.unwrap();

        let records = store
            .get_many(&[b.clone(), Key::new("Kind", "nope"), a.clone()])
            .await
            .unwrap();
        let keys: Vec<_> = records.into_iter().map(|r| r.key).collect();
        assert_eq!(keys, vec![b, a]);
    }

    #[tokio::test]
    async fn delete_reports_index_updates() {
        let store = InMemoryDatastore::new();
        let key = Key::new("Kind", "1");
        store
            .save(insert(&key, data(&[("a", 1), ("b", 2)])))
            .await
            .unwrap();

        let response = store.delete(&key).await.unwrap();
        assert_eq!(response.mutation_result.index_updates, 3);
        assert!(store.get(&key).await.unwrap().is_none());

        let response = store.delete(&key).await.unwrap();
        assert_eq!(response.mutation_result.index_updates, 0);
    }

    #[tokio::test]
    async fn run_query_scans_kind() {
        let store = InMemoryDatastore::new();
        for (id, field) in [("1", 3), ("2", 1), ("3", 2)] {
            store
                .save(insert(&Key::new("Kind", id), data(&[("field", field)])))
                .await
                .unwrap();
        }
        store
            .save(insert(&Key::new("Other", "x"), data(&[("field", 0)])))
            .await
            .unwrap();

        let records = store
            .run_query(&Query::new("Kind").order("field"))
            .await
            .unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.key.name()).collect();
        assert_eq!(ids, ["2", "3", "1"]);
    }

    #[tokio::test]
    async fn clear_and_clone_share_storage() {
        let store = InMemoryDatastore::new();
        let clone = store.clone();

        store
            .save(insert(&Key::new("Kind", "1"), Fields::new()))
            .await
            .unwrap();
        assert_eq!(clone.len().unwrap(), 1);

        clone.clear().unwrap();
        assert!(store.is_empty().unwrap());
    }

    #[tokio::test]
    async fn save_rejects_non_finite_numbers() {
        let store = InMemoryDatastore::new();
        let key = Key::new("Kind", "nan");
        let nested = Fields::from([(
            "inner".to_string(),
            Value::Array(vec![Value::Double(f64::INFINITY)]),
        )]);

        for (field, value) in [("x", Value::Double(f64::NAN)), ("deep", Value::Map(nested))] {
            let request = insert(&key, Fields::from([(field.to_string(), value)]));
            let err = store.save(request).await.unwrap_err();
            assert!(matches!(err, MemoryError::NonFinite { field: f, .. } if f == field));
        }

        assert!(store.is_empty().unwrap());
        store
            .save(insert(&key, Fields::from([("x".to_string(), Value::Double(1.5))])))
            .await
            .unwrap();
        let record = store.get(&key).await.unwrap().unwrap();
        assert_eq!(record.data["x"], Value::Double(1.5));
    }

    #[tokio::test]
    async fn failed_delete_keeps_record() {
        let store = InMemoryDatastore::new();
        let key = Key::new("Kind", "corrupt");
        store
            .storage
            .write()
            .unwrap()
            .insert(key.clone(), b"not json".to_vec());

        let err = store.delete(&key).await.unwrap_err();
        assert!(matches!(err, MemoryError::Serde(_)));
        assert_eq!(store.len().unwrap(), 1);
    }
}
