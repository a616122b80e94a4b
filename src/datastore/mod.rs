//! Datastore - The store handle a [`Model`](crate::Model) delegates to.
//!
//! A datastore offers four primitives: save, get (single or batch), query
//! and delete. Each call resolves exactly once, to a value or an error.
//! Keys, queries and the wire format belong to the store.
//!
//! ## Example
//!
//! ```ignore
//! use datastore_model::{InMemoryDatastore, Key, Model, Operator, Query};
//!
//! let store = InMemoryDatastore::new();
//! let model = Model::new(store.clone());
//! model.insert(&Key::new("Todo", "1"), entity).await?;
//! let open = model.find(&Query::new("Todo").filter("done", Operator::Equal, false)).await?;
//! ```

mod memory;
mod query;

use std::sync::Arc;

use async_trait::async_trait;

use crate::key::Key;
use crate::metadata::StoredEntity;

/// Write mode for [`Datastore::save`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMethod {
    /// Create a record. The store rejects the write if the key exists.
    Insert,
    /// Replace an existing record.
    Update,
}

impl SaveMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaveMethod::Insert => "insert",
            SaveMethod::Update => "update",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest {
    pub key: Key,
    pub method: SaveMethod,
    pub data: StoredEntity,
}

/// A record as returned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub key: Key,
    pub data: StoredEntity,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutationResult {
    /// Number of index entries touched. Zero means nothing was there.
    pub index_updates: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteResponse {
    pub mutation_result: MutationResult,
}

/// Abstract record storage.
#[async_trait]
pub trait Datastore: Send + Sync {
    /// Opaque query object, built by the store's own query builder.
    type Query: Send + Sync;

    type Error: std::error::Error + Send + Sync + 'static;

    async fn save(&self, request: SaveRequest) -> Result<(), Self::Error>;

    /// Get a record by key. Returns None if not found.
    async fn get(&self, key: &Key) -> Result<Option<Record>, Self::Error>;

    /// Get several records in one round trip. Missing keys are omitted.
    async fn get_many(&self, keys: &[Key]) -> Result<Vec<Record>, Self::Error>;

    async fn run_query(&self, query: &Self::Query) -> Result<Vec<Record>, Self::Error>;

    async fn delete(&self, key: &Key) -> Result<DeleteResponse, Self::Error>;
}

#[async_trait]
impl<S: Datastore + ?Sized> Datastore for Arc<S> {
    type Query = S::Query;
    type Error = S::Error;

    async fn save(&self, request: SaveRequest) -> Result<(), Self::Error> {
        (**self).save(request).await
    }

    async fn get(&self, key: &Key) -> Result<Option<Record>, Self::Error> {
        (**self).get(key).await
    }

    async fn get_many(&self, keys: &[Key]) -> Result<Vec<Record>, Self::Error> {
        (**self).get_many(keys).await
    }

    async fn run_query(&self, query: &Self::Query) -> Result<Vec<Record>, Self::Error> {
        (**self).run_query(query).await
    }

    async fn delete(&self, key: &Key) -> Result<DeleteResponse, Self::Error> {
        (**self).delete(key).await
    }
}

pub use memory::{InMemoryDatastore, MemoryError};
pub use query::{Direction, Filter, Operator, Order, Query};
