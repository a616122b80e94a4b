//! Emitter - Lifecycle events raised by a [`Model`](crate::Model).
//!
//! Enabled by the `emitter` feature. Listeners run synchronously, in
//! registration order, after the store write or delete has succeeded and
//! before the operation returns. Failed operations raise nothing.
//!
//! ## Example
//!
//! ```ignore
//! let model = Model::new(InMemoryDatastore::new());
//!
//! model.on_inserted(|entity, key| {
//!     println!("inserted {} at {}", entity.id.as_deref().unwrap_or_default(), key);
//! });
//!
//! model.insert(&Key::new("Thing", "1"), entity).await?;
//! ```

mod model_emitter;

use std::fmt;
use std::str::FromStr;

use crate::entity::Entity;
use crate::key::Key;

pub use model_emitter::{ListenerId, ModelEmitter};

/// Name of a lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Inserted,
    Updated,
    Deleted,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Inserted => "inserted",
            EventKind::Updated => "updated",
            EventKind::Deleted => "deleted",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown model event: {0}")]
pub struct UnknownEvent(pub String);

impl FromStr for EventKind {
    type Err = UnknownEvent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inserted" => Ok(EventKind::Inserted),
            "updated" => Ok(EventKind::Updated),
            "deleted" => Ok(EventKind::Deleted),
            other => Err(UnknownEvent(other.to_string())),
        }
    }
}

/// A lifecycle event and its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelEvent {
    Inserted { entity: Entity, key: Key },
    Updated { entity: Entity, key: Key },
    Deleted { key: Key },
}

impl ModelEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ModelEvent::Inserted { .. } => EventKind::Inserted,
            ModelEvent::Updated { .. } => EventKind::Updated,
            ModelEvent::Deleted { .. } => EventKind::Deleted,
        }
    }

    pub fn key(&self) -> &Key {
        match self {
            ModelEvent::Inserted { key, .. }
            | ModelEvent::Updated { key, .. }
            | ModelEvent::Deleted { key } => key,
        }
    }

    /// The resulting entity, for inserts and updates.
    pub fn entity(&self) -> Option<&Entity> {
        match self {
            ModelEvent::Inserted { entity, .. } | ModelEvent::Updated { entity, .. } => {
                Some(entity)
            }
            ModelEvent::Deleted { .. } => None,
        }
    }
}
