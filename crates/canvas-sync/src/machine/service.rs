//! DragDropService — holds the live `(state, context)` of one drag/drop
//! machine and notifies listeners after every handled event.
//!
//! The service is a thin owner around [`transition`]: it applies one event at
//! a time under a `parking_lot::Mutex` and emits a [`DragSnapshot`] once the
//! lock is released, so listeners may call [`send`](DragDropService::send)
//! again.

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::reactive::{EventEmitter, ListenerId};

use super::drag_drop::{can_accept, transition, DragContext, DragEvent, DragEventKind, DragState};

/// State and context right after a handled event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DragSnapshot<I, C> {
    pub state: DragState,
    pub context: DragContext<I, C>,
    /// Event that produced this snapshot.
    pub event: DragEventKind,
}

pub struct DragDropService<I, C> {
    current: Mutex<(DragState, DragContext<I, C>)>,
    emitter: EventEmitter<DragSnapshot<I, C>>,
}

impl<I, C> DragDropService<I, C>
where
    I: Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
{
    /// Start in `idle` with an empty context.
    pub fn new() -> Self {
        Self {
            current: Mutex::new((DragState::Idle, DragContext::default())),
            emitter: EventEmitter::new(),
        }
    }

    pub fn state(&self) -> DragState {
        self.current.lock().0
    }

    pub fn context(&self) -> DragContext<I, C> {
        self.current.lock().1.clone()
    }

    pub fn is_dragging(&self) -> bool {
        self.state() == DragState::Dragging
    }

    /// Apply `event`. Returns `false` when the current state has no
    /// transition for it, in which case nothing changes and no listener runs.
    pub fn send(&self, event: DragEvent<I, C>) -> bool {
        let kind = event.kind();
        let snapshot = {
            let mut current = self.current.lock();
            let from = current.0;
            if !can_accept(from, kind) {
                tracing::trace!(state = ?from, event = ?kind, "event ignored");
                return false;
            }

            let (state, context) = std::mem::take(&mut *current);
            *current = transition(state, context, event);
            tracing::debug!(from = ?from, to = ?current.0, event = ?kind, "drag/drop transition");

            DragSnapshot {
                state: current.0,
                context: current.1.clone(),
                event: kind,
            }
        };

        self.emitter.emit(&snapshot);
        true
    }

    /// Register a listener for snapshots produced by handled events.
    pub fn on_transition(
        &self,
        callback: impl Fn(&DragSnapshot<I, C>) + Send + Sync + 'static,
    ) -> ListenerId {
        self.emitter.on(callback)
    }

    pub fn off(&self, id: ListenerId) {
        self.emitter.off(id);
    }
}

impl<I, C> DragDropService<I, C>
where
    I: Clone + Send + Sync + DeserializeOwned + 'static,
    C: Clone + Send + Sync + DeserializeOwned + 'static,
{
    /// Decode a JSON event such as `{"type":"DRAG_START","item":{...}}` and
    /// send it.
    pub fn send_json(&self, json: &str) -> Result<bool> {
        let event: DragEvent<I, C> = serde_json::from_str(json).map_err(Error::Event)?;
        Ok(self.send(event))
    }
}

impl<I, C> Default for DragDropService<I, C>
where
    I: Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
