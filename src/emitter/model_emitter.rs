use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use super::{EventKind, ModelEvent};

type Listener = Arc<dyn Fn(&ModelEvent) + Send + Sync>;

/// Handle returned by [`ModelEmitter::on`], used to remove the listener again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Registry of lifecycle listeners keyed by event kind.
///
/// Dispatch is synchronous. The listener list is copied before dispatch, so a
/// listener may add or remove listeners; changes apply from the next emit.
#[derive(Default)]
pub struct ModelEmitter {
    listeners: RwLock<HashMap<EventKind, Vec<(ListenerId, Listener)>>>,
    next_id: AtomicU64,
}

impl ModelEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(&self, kind: EventKind, listener: F) -> ListenerId
    where
        F: Fn(&ModelEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        listeners
            .entry(kind)
            .or_default()
            .push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener. Returns true if it was registered for `kind`.
    pub fn off(&self, kind: EventKind, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        match listeners.get_mut(&kind) {
            Some(registered) => {
                let before = registered.len();
                registered.retain(|(listener_id, _)| *listener_id != id);
                registered.len() != before
            }
            None => false,
        }
    }

    pub fn emit(&self, event: &ModelEvent) {
        let snapshot: Vec<Listener> = {
            let listeners = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
            match listeners.get(&event.kind()) {
                Some(registered) => registered.iter().map(|(_, l)| Arc::clone(l)).collect(),
                None => return,
            }
        };

        for listener in snapshot {
            listener(event);
        }
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        let listeners = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
        listeners.get(&kind).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Key;
    use std::sync::Mutex;

    fn deleted(id: &str) -> ModelEvent {
        ModelEvent::Deleted {
            key: Key::new("Thing", id),
        }
    }

    #[test]
    fn emits_in_registration_order() {
        let emitter = ModelEmitter::new();
        let calls = Arc::new(Mutex::new(Vec::new()));

        for name in ["first", "second"] {
            let calls = Arc::clone(&calls);
            emitter.on(EventKind::Deleted, move |event| {
                calls.lock().unwrap().push(format!("{}:{}", name, event.key()));
            });
        }

        emitter.emit(&deleted("1"));
        assert_eq!(
            *calls.lock().unwrap(),
            vec!["first:Thing:1".to_string(), "second:Thing:1".to_string()]
        );
    }

    #[test]
    fn only_matching_kind_is_called() {
        let emitter = ModelEmitter::new();
        let calls = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&calls);
        emitter.on(EventKind::Inserted, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        emitter.emit(&deleted("1"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn off_removes_listener() {
        let emitter = ModelEmitter::new();
        let calls = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&calls);
        let id = emitter.on(EventKind::Deleted, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(emitter.listener_count(EventKind::Deleted), 1);

        assert!(emitter.off(EventKind::Deleted, id));
        assert!(!emitter.off(EventKind::Deleted, id));
        assert!(!emitter.off(EventKind::Inserted, id));

        emitter.emit(&deleted("1"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(emitter.listener_count(EventKind::Deleted), 0);
    }

    #[test]
    fn listener_can_register_during_emit() {
        let emitter = Arc::new(ModelEmitter::new());
        let inner = Arc::clone(&emitter);
        emitter.on(EventKind::Deleted, move |_| {
            inner.on(EventKind::Deleted, |_| {});
        });

        emitter.emit(&deleted("1"));
        assert_eq!(emitter.listener_count(EventKind::Deleted), 2);
    }
}
