//! subscribe — turns a node's listener API into a push subscription.
//!
//! * Scalar nodes forward every [`UpdateEvent`] to `publish` unchanged.
//! * Collection nodes receive one event per changed member, so the adapter
//!   keeps its own `identity -> value` cache and publishes the whole current
//!   membership after every event. The empty cache is published once before
//!   the listener is registered.
//!
//! The cache never holds a deleted entry: a `null` value removes the identity.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde_json::Value;

use super::event::{NodeKind, UpdateEvent};
use super::event_emitter::ListenerId;
use super::graph::{GraphNode, NodeListener, NodeRef};

/// What a subscriber receives.
#[derive(Debug, Clone, PartialEq)]
pub enum Publication {
    /// One update of a scalar node, with its key and origin metadata.
    Value(UpdateEvent),
    /// Current members of a collection as `(identity, value)` pairs.
    Entries(Vec<(String, Value)>),
}

impl Publication {
    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Value(event) => Some(&event.value),
            Self::Entries(_) => None,
        }
    }

    pub fn entries(&self) -> Option<&[(String, Value)]> {
        match self {
            Self::Entries(entries) => Some(entries),
            Self::Value(_) => None,
        }
    }
}

// ============================================================================
// Subscription handle
// ============================================================================

/// Handle returned by [`subscribe`]. Call [`off`](Self::off) to stop
/// deliveries; dropping the handle leaves the listener registered.
pub struct Subscription {
    node: Box<dyn GraphNode>,
    listener_id: ListenerId,
    active: AtomicBool,
}

impl Subscription {
    /// Deregister the listener. Later calls do nothing.
    pub fn off(&self) {
        if self.active.swap(false, Ordering::AcqRel) {
            self.node.off(self.listener_id);
            tracing::debug!(listener_id = self.listener_id, "unsubscribed");
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("kind", &self.node.kind())
            .field("listener_id", &self.listener_id)
            .field("active", &self.is_active())
            .finish()
    }
}

// ============================================================================
// subscribe
// ============================================================================

/// Subscribe `publish` to `node`.
///
/// `publish` runs synchronously inside the store's delivery path, including
/// for any data the store replays when the listener is registered.
pub fn subscribe<N>(node: N, publish: impl Fn(Publication) + Send + Sync + 'static) -> Subscription
where
    N: GraphNode + 'static,
{
    let kind = node.kind();
    let listener: Arc<NodeListener> = match kind {
        NodeKind::Scalar => Arc::new(move |event: &UpdateEvent| {
            publish(Publication::Value(event.clone()));
        }),
        NodeKind::Collection => {
            publish(Publication::Entries(Vec::new()));
            let cache = Mutex::new(IndexMap::new());
            Arc::new(move |event: &UpdateEvent| {
                let entries = apply_to_cache(&mut cache.lock(), event);
                publish(Publication::Entries(entries));
            })
        }
    };

    let listener_id = node.on(listener);
    tracing::debug!(?kind, listener_id, "subscribed");

    Subscription {
        node: Box::new(node),
        listener_id,
        active: AtomicBool::new(true),
    }
}

/// Fold one member event into the cache and return its current contents.
fn apply_to_cache(cache: &mut IndexMap<String, Value>, event: &UpdateEvent) -> Vec<(String, Value)> {
    let identity = event.identity();
    if event.is_deletion() {
        cache.shift_remove(identity);
    } else {
        cache.insert(identity.to_string(), event.value.clone());
    }
    cache
        .iter()
        .map(|(id, value)| (id.clone(), value.clone()))
        .collect()
}

impl NodeRef {
    /// Shorthand for [`subscribe`] on a clone of this reference.
    pub fn subscribe(&self, publish: impl Fn(Publication) + Send + Sync + 'static) -> Subscription {
        subscribe(self.clone(), publish)
    }
}
