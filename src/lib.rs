mod clock;
mod datastore;
#[cfg(feature = "emitter")]
mod emitter;
mod entity;
mod key;
mod metadata;
mod model;
mod value;

pub use clock::{Clock, ManualClock, SystemClock};
pub use datastore::{
    Datastore, DeleteResponse, Direction, Filter, InMemoryDatastore, MemoryError, MutationResult,
    Operator, Order, Query, Record, SaveMethod, SaveRequest,
};
pub use entity::{Entity, Metadata, RecordError, CREATED, UPDATED};
pub use key::{Key, KeyError, KeyId, PathElement};
pub use metadata::{
    expand, flatten, metadata_field, stamp_insert, stamp_update, StoredEntity, METADATA_PREFIX,
};
pub use model::{Model, ModelError};
pub use value::{Fields, Value};

#[cfg(feature = "emitter")]
pub use emitter::{EventKind, ListenerId, ModelEmitter, ModelEvent, UnknownEvent};

// Re-export so callers can implement Datastore without a direct dependency
pub use async_trait::async_trait;
