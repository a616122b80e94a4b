//! Models - Entity CRUD over a [`Datastore`](crate::Datastore).
//!
//! A model stamps `created`/`updated` metadata on writes, flattens entities
//! into their stored form and expands them back on reads, tagging each
//! returned entity with the `id` and key it was stored under.
//!
//! ## Example
//!
//! ```ignore
//! use datastore_model::{Entity, InMemoryDatastore, Key, Model};
//!
//! let model = Model::new(InMemoryDatastore::new());
//! let key = Key::new("Kind", "myid");
//!
//! let inserted = model.insert(&key, Entity::default().with_field("one", "two")).await?;
//! assert_eq!(inserted.id.as_deref(), Some("myid"));
//!
//! let updated = model.update(&key, Entity::default().with_field("a", "b")).await?;
//! assert_eq!(updated.metadata.created(), inserted.metadata.created());
//! ```

#[allow(clippy::module_inception)]
mod model;

use thiserror::Error;

use crate::key::Key;

/// Error type for model operations.
#[derive(Debug, Error)]
pub enum ModelError<E: std::error::Error + 'static> {
    /// No record exists at the targeted key.
    #[error("entity not found: {key}")]
    NotFound { key: Key },
    /// Error reported by the datastore, passed through unchanged.
    #[error(transparent)]
    Store(E),
}

impl<E: std::error::Error + 'static> ModelError<E> {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ModelError::NotFound { .. })
    }

    /// The store's own error, if this is not a not-found failure.
    pub fn store_error(&self) -> Option<&E> {
        match self {
            ModelError::Store(err) => Some(err),
            ModelError::NotFound { .. } => None,
        }
    }
}

pub use model::Model;
