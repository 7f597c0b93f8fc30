//! EventEmitter<T> — a simple typed pub/sub primitive.
//!
//! Used for per-node listener lists in [`Graph`](super::Graph) and for
//! transition listeners in the drag/drop service.
//!
//! Snapshot-on-emit semantics:
//!   - A listener removed *during* emission is still called in that round.
//!   - A listener added *during* emission is NOT called until the next emit.
//!
//! All methods take `&self`. The internal `parking_lot::Mutex` is never held
//! while a listener runs, so listeners may call `on()`/`off()` (or write back
//! into the graph) without deadlocking.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

/// Returned by [`EventEmitter::on`]; pass it to [`EventEmitter::off`].
pub type ListenerId = u64;

/// Closure type for event listeners.
pub type ListenerFn<T> = dyn Fn(&T) + Send + Sync;

type Entry<T> = (ListenerId, Arc<ListenerFn<T>>);

pub struct EventEmitter<T> {
    listeners: Mutex<Vec<Entry<T>>>,
    next_id: AtomicU64,
}

impl<T> EventEmitter<T> {
    pub fn new() -> Self {
        Self {
            listeners: Mutex::default(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Run `f` against the listener list. The lock is released on return,
    /// so `f` must never invoke a listener.
    fn with_listeners<R>(&self, f: impl FnOnce(&mut Vec<Entry<T>>) -> R) -> R {
        f(&mut *self.listeners.lock())
    }

    /// Register `callback` and return its [`ListenerId`].
    pub fn on(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> ListenerId {
        self.on_shared(Arc::new(callback))
    }

    /// Register an already shared listener. The caller keeps its own handle,
    /// which lets it invoke the same listener directly (e.g. for a replay).
    pub fn on_shared(&self, callback: Arc<ListenerFn<T>>) -> ListenerId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.with_listeners(|listeners| listeners.push((id, callback)));
        id
    }

    /// Remove the listener registered as `id`. Unknown ids are ignored.
    pub fn off(&self, id: ListenerId) {
        self.with_listeners(|listeners| {
            if let Some(pos) = listeners.iter().position(|(lid, _)| *lid == id) {
                listeners.remove(pos);
            }
        });
    }

    /// Deliver `event` to every listener registered when the call starts.
    pub fn emit(&self, event: &T) {
        let round = self.with_listeners(|listeners| {
            listeners
                .iter()
                .map(|(_, listener)| Arc::clone(listener))
                .collect::<Vec<_>>()
        });
        round.iter().for_each(|listener| listener(event));
    }

    pub fn len(&self) -> usize {
        self.with_listeners(|listeners| listeners.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for EventEmitter<T> {
    fn default() -> Self {
        Self::new()
    }
}
