//! Metadata flattening - Mapping between entities and their stored form.
//!
//! Stores only hold flat records, so the nested metadata map is hoisted to
//! top-level properties prefixed with [`METADATA_PREFIX`] on write and
//! folded back on read:
//!
//! ```text
//! { one: "two", _metadata: { created: t0, updated: t1 } }
//!     <=> { one: "two", _metadata_created: t0, _metadata_updated: t1 }
//! ```

use chrono::{DateTime, Utc};

use crate::entity::{Entity, Metadata, CREATED};
use crate::value::Fields;

pub const METADATA_PREFIX: &str = "_metadata_";

/// The flat on-wire shape written to the store.
pub type StoredEntity = Fields;

/// Hoist metadata entries to prefixed top-level properties.
///
/// `id` and `key` are not stored; they are derived from the record key on read.
pub fn flatten(entity: &Entity) -> StoredEntity {
    let mut stored: StoredEntity = entity
        .metadata
        .iter()
        .map(|(name, value)| (metadata_field(name), value.clone()))
        .collect();

    for (name, value) in &entity.data {
        stored.insert(name.clone(), value.clone());
    }

    stored
}

/// Fold prefixed properties back under the entity's metadata.
pub fn expand(stored: StoredEntity) -> Entity {
    let mut metadata = Fields::new();
    let mut data = Fields::new();

    for (name, value) in stored {
        match name.strip_prefix(METADATA_PREFIX) {
            Some(meta) => {
                metadata.insert(meta.to_string(), value);
            }
            None => {
                data.insert(name, value);
            }
        }
    }

    Entity {
        id: None,
        key: None,
        metadata: Metadata::from(metadata),
        data,
    }
}

/// Stamp a new entity: `created` and `updated` both become `now`.
pub fn stamp_insert(mut entity: Entity, now: DateTime<Utc>) -> Entity {
    entity.metadata.set_created(now);
    entity.metadata.set_updated(now);
    entity
}

/// Carry the stored metadata forward onto a replacement entity.
///
/// Starts from `current`'s metadata, overlays anything the caller supplied
/// except `created`, then refreshes `updated`. Data fields come from `entity`
/// only.
pub fn stamp_update(mut entity: Entity, current: &Metadata, now: DateTime<Utc>) -> Entity {
    let supplied = std::mem::take(&mut entity.metadata);
    let mut metadata = current.clone();
    for (name, value) in supplied.into_fields() {
        if name != CREATED {
            metadata.insert(name, value);
        }
    }
    if let Some(created) = current.get(CREATED) {
        metadata.insert(CREATED, created.clone());
    }
    metadata.set_updated(now);
    entity.metadata = metadata;
    entity
}

/// Stored property name for a metadata entry.
pub fn metadata_field(name: &str) -> String {
    format!("{}{}", METADATA_PREFIX, name)
}
