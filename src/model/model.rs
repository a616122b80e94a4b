use std::sync::Arc;

use tracing::debug;

use super::ModelError;
use crate::clock::{Clock, SystemClock};
use crate::datastore::{Datastore, Record, SaveMethod, SaveRequest};
use crate::entity::Entity;
use crate::key::Key;
use crate::metadata::{expand, flatten, stamp_insert, stamp_update};

#[cfg(feature = "emitter")]
use crate::emitter::{EventKind, ListenerId, ModelEmitter, ModelEvent};

type ModelResult<T, S> = Result<T, ModelError<<S as Datastore>::Error>>;

/// Entity model over a datastore handle.
///
/// Holds no entity state between calls. Concurrent updates to the same key
/// are not isolated from each other: the last write wins.
pub struct Model<S: Datastore> {
    store: S,
    clock: Arc<dyn Clock>,
    #[cfg(feature = "emitter")]
    emitter: ModelEmitter,
}

impl<S: Datastore> Model<S> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }

    /// Create a model that stamps metadata from `clock`.
    pub fn with_clock(store: S, clock: impl Clock + 'static) -> Self {
        Self {
            store,
            clock: Arc::new(clock),
            #[cfg(feature = "emitter")]
            emitter: ModelEmitter::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get an entity by key. Fails with [`ModelError::NotFound`] if absent.
    pub async fn get(&self, key: &Key) -> ModelResult<Entity, S> {
        let record = self
            .store
            .get(key)
            .await
            .map_err(ModelError::Store)?
            .ok_or_else(|| ModelError::NotFound { key: key.clone() })?;

        debug!(key = %key, "entity fetched");
        Ok(hydrate(record))
    }

    /// Get several entities in one round trip. Keys without a record are skipped.
    pub async fn get_many(&self, keys: &[Key]) -> ModelResult<Vec<Entity>, S> {
        let records = self.store.get_many(keys).await.map_err(ModelError::Store)?;

        debug!(requested = keys.len(), found = records.len(), "entities fetched");
        Ok(records.into_iter().map(hydrate).collect())
    }

    /// Insert a new entity, stamping `created` and `updated` with the current time.
    pub async fn insert(&self, key: &Key, entity: Entity) -> ModelResult<Entity, S> {
        let entity = stamp_insert(entity, self.clock.now());
        let inserted = self.save(key, &entity, SaveMethod::Insert).await?;

        debug!(key = %key, "entity inserted");
        #[cfg(feature = "emitter")]
        self.emitter.emit(&ModelEvent::Inserted {
            entity: inserted.clone(),
            key: key.clone(),
        });

        Ok(inserted)
    }

    /// Replace the data fields of an existing entity.
    ///
    /// The stored `created` time is carried forward and `updated` is
    /// refreshed. Fails with [`ModelError::NotFound`] if nothing is stored at
    /// `key`.
    pub async fn update(&self, key: &Key, entity: Entity) -> ModelResult<Entity, S> {
        let current = self.get(key).await?;
        let entity = stamp_update(entity, &current.metadata, self.clock.now());
        let updated = self.save(key, &entity, SaveMethod::Update).await?;

        debug!(key = %key, "entity updated");
        #[cfg(feature = "emitter")]
        self.emitter.emit(&ModelEvent::Updated {
            entity: updated.clone(),
            key: key.clone(),
        });

        Ok(updated)
    }

    /// Run a query built with the store's query builder.
    ///
    /// Results keep the store's ordering. Each entity carries its source key.
    pub async fn find(&self, query: &S::Query) -> ModelResult<Vec<Entity>, S> {
        let records = self.store.run_query(query).await.map_err(ModelError::Store)?;

        debug!(count = records.len(), "query returned entities");
        Ok(records.into_iter().map(hydrate).collect())
    }

    /// Delete the entity at `key`. Fails with [`ModelError::NotFound`] if
    /// the store reports that no index entries were touched.
    pub async fn delete(&self, key: &Key) -> ModelResult<(), S> {
        let response = self.store.delete(key).await.map_err(ModelError::Store)?;
        if response.mutation_result.index_updates == 0 {
            return Err(ModelError::NotFound { key: key.clone() });
        }

        debug!(key = %key, index_updates = response.mutation_result.index_updates, "entity deleted");
        #[cfg(feature = "emitter")]
        self.emitter.emit(&ModelEvent::Deleted { key: key.clone() });

        Ok(())
    }

    async fn save(&self, key: &Key, entity: &Entity, method: SaveMethod) -> ModelResult<Entity, S> {
        let data = flatten(entity);
        self.store
            .save(SaveRequest {
                key: key.clone(),
                method,
                data: data.clone(),
            })
            .await
            .map_err(ModelError::Store)?;

        Ok(expand(data).keyed(key))
    }
}

#[cfg(feature = "emitter")]
impl<S: Datastore> Model<S> {
    pub fn emitter(&self) -> &ModelEmitter {
        &self.emitter
    }

    /// Register a listener for every event of `kind`.
    pub fn on<F>(&self, kind: EventKind, listener: F) -> ListenerId
    where
        F: Fn(&ModelEvent) + Send + Sync + 'static,
    {
        self.emitter.on(kind, listener)
    }

    pub fn off(&self, kind: EventKind, id: ListenerId) -> bool {
        self.emitter.off(kind, id)
    }

    pub fn on_inserted<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&Entity, &Key) + Send + Sync + 'static,
    {
        self.emitter.on(EventKind::Inserted, move |event| {
            if let ModelEvent::Inserted { entity, key } = event {
                listener(entity, key);
            }
        })
    }

    pub fn on_updated<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&Entity, &Key) + Send + Sync + 'static,
    {
        self.emitter.on(EventKind::Updated, move |event| {
            if let ModelEvent::Updated { entity, key } = event {
                listener(entity, key);
            }
        })
    }

    pub fn on_deleted<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&Key) + Send + Sync + 'static,
    {
        self.emitter.on(EventKind::Deleted, move |event| {
            if let ModelEvent::Deleted { key } = event {
                listener(key);
            }
        })
    }
}

fn hydrate(record: Record) -> Entity {
    let Record { key, data } = record;
    expand(data).keyed(&key)
}
