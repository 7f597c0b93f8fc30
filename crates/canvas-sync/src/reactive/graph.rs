//! Graph — handle to the reactive graph store, plus the [`GraphNode`] seam
//! that the subscription adapter is written against.
//!
//! # Addressing
//!
//! Every record lives under a *soul*, a `/`-separated path such as
//! `boards/main/items/a`. `Graph::get("boards")` addresses a root node,
//! `NodeRef::get` descends one level and `NodeRef::map` turns a node into a
//! collection over its direct children.
//!
//! # Delivery
//!
//! `put` delivers one [`UpdateEvent`] to the listeners of the written node and
//! one to the collection listeners of its parent. Object values are stamped
//! with their soul under `"_": {"#": soul}`, the same metadata the graph
//! store attaches to nodes. A deletion is delivered via the soul of the value
//! it removed, so it resolves to the same identity as the earlier puts.
//! Registering a listener replays the current data to that listener alone.
//!
//! This implementation keeps the graph in process memory. The configured
//! peers are recorded but never dialled.
//!
//! # Threading model
//!
//! `Graph` is `Send + Sync` and cheap to clone (an `Arc` inside). `data` and
//! `listeners` are separate `parking_lot::Mutex`es; neither is held while a
//! listener runs, so listeners may write back into the graph.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Map, Value};

use crate::config::GraphConfig;
use crate::error::ConfigError;

use super::event::{soul_of, NodeKind, UpdateEvent, META_FIELD, SOUL_FIELD};
use super::event_emitter::{EventEmitter, ListenerFn, ListenerId};

/// Listener type accepted by [`GraphNode::on`].
pub type NodeListener = ListenerFn<UpdateEvent>;

// ============================================================================
// GraphNode
// ============================================================================

/// A live node in a reactive graph store.
///
/// Implemented by [`NodeRef`]; any other store client can implement it to be
/// driven by [`subscribe`](super::subscribe).
pub trait GraphNode: Send + Sync {
    /// Whether this reference was derived through a collection (map) step.
    fn kind(&self) -> NodeKind;

    /// Register `listener` for every update to this node (or, for a
    /// collection, to any of its members).
    fn on(&self, listener: Arc<NodeListener>) -> ListenerId;

    /// Deregister a listener. Unknown ids are ignored.
    fn off(&self, id: ListenerId);
}

// ============================================================================
// Graph
// ============================================================================

struct GraphInner {
    config: GraphConfig,
    /// Stored values keyed by soul. Ordered so replays are deterministic.
    data: Mutex<BTreeMap<String, Value>>,
    listeners: Mutex<HashMap<(String, NodeKind), Arc<EventEmitter<UpdateEvent>>>>,
}

/// Connection to the graph store. Construct once, then clone the handle into
/// every consumer.
#[derive(Clone)]
pub struct Graph {
    inner: Arc<GraphInner>,
}

impl Graph {
    /// Open a graph using `config`. Fails if the peer list is invalid.
    pub fn connect(config: GraphConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        tracing::info!(peers = ?config.peers, "graph connected");
        Ok(Self {
            inner: Arc::new(GraphInner {
                config,
                data: Mutex::new(BTreeMap::new()),
                listeners: Mutex::new(HashMap::new()),
            }),
        })
    }

    pub fn peers(&self) -> &[String] {
        &self.inner.config.peers
    }

    /// Reference the root node stored under `key`.
    pub fn get(&self, key: impl Into<String>) -> NodeRef {
        NodeRef {
            graph: self.clone(),
            soul: key.into(),
            kind: NodeKind::Scalar,
        }
    }

    /// Number of listeners currently registered across all nodes.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.lock().values().map(|em| em.len()).sum()
    }

    fn emitter(&self, soul: &str, kind: NodeKind) -> Option<Arc<EventEmitter<UpdateEvent>>> {
        self.inner
            .listeners
            .lock()
            .get(&(soul.to_string(), kind))
            .cloned()
    }

    /// Direct children of `soul` as `(child soul, value)`.
    fn children(&self, soul: &str) -> Vec<(String, Value)> {
        let prefix = format!("{soul}/");
        self.inner
            .data
            .lock()
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .filter(|(k, _)| !k[prefix.len()..].contains('/'))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn write(&self, soul: &str, value: Value) {
        let value = stamp_soul(soul, value);
        // A deletion travels via the removed record's own soul so listeners
        // resolve it to the identity they cached.
        let removed_soul = {
            let mut data = self.inner.data.lock();
            if value.is_null() {
                data.remove(soul)
                    .and_then(|removed| soul_of(&removed).map(str::to_string))
            } else {
                data.insert(soul.to_string(), value.clone());
                None
            }
        };
        let origin = removed_soul.unwrap_or_else(|| soul.to_string());

        let event = UpdateEvent::new(value, last_segment(soul)).via(origin);
        tracing::trace!(soul, deleted = event.is_deletion(), "delivering update");

        if let Some(emitter) = self.emitter(soul, NodeKind::Scalar) {
            emitter.emit(&event);
        }
        if let Some((parent, _)) = soul.rsplit_once('/') {
            if let Some(emitter) = self.emitter(parent, NodeKind::Collection) {
                emitter.emit(&event);
            }
        }
    }
}

// ============================================================================
// NodeRef
// ============================================================================

/// Reference to a node (or, after [`map`](Self::map), a collection of nodes).
#[derive(Clone)]
pub struct NodeRef {
    graph: Graph,
    soul: String,
    kind: NodeKind,
}

impl NodeRef {
    pub fn soul(&self) -> &str {
        &self.soul
    }

    /// Last path segment of the soul.
    pub fn key(&self) -> &str {
        last_segment(&self.soul)
    }

    /// Reference the child stored under `key`.
    pub fn get(&self, key: &str) -> NodeRef {
        NodeRef {
            graph: self.graph.clone(),
            soul: format!("{}/{key}", self.soul),
            kind: NodeKind::Scalar,
        }
    }

    /// Treat this node as a collection over its direct children.
    pub fn map(&self) -> NodeRef {
        NodeRef {
            graph: self.graph.clone(),
            soul: self.soul.clone(),
            kind: NodeKind::Collection,
        }
    }

    /// Write `value`. `Value::Null` deletes the record.
    ///
    /// On a collection reference the value is written to every current member.
    pub fn put(&self, value: Value) {
        match self.kind {
            NodeKind::Scalar => self.graph.write(&self.soul, value),
            NodeKind::Collection => {
                for (child, _) in self.graph.children(&self.soul) {
                    self.graph.write(&child, value.clone());
                }
            }
        }
    }

    /// Current value, read without subscribing.
    ///
    /// A collection reads as an object keyed by member key, or `None` when it
    /// has no members.
    pub fn once(&self) -> Option<Value> {
        match self.kind {
            NodeKind::Scalar => self.graph.inner.data.lock().get(&self.soul).cloned(),
            NodeKind::Collection => {
                let members: Map<String, Value> = self
                    .graph
                    .children(&self.soul)
                    .into_iter()
                    .map(|(child, v)| (last_segment(&child).to_string(), v))
                    .collect();
                (!members.is_empty()).then_some(Value::Object(members))
            }
        }
    }

    /// Events describing the data a new listener should be primed with.
    fn replay(&self) -> Vec<UpdateEvent> {
        match self.kind {
            NodeKind::Scalar => self
                .once()
                .map(|value| vec![UpdateEvent::new(value, self.key()).via(&self.soul)])
                .unwrap_or_default(),
            NodeKind::Collection => self
                .graph
                .children(&self.soul)
                .into_iter()
                .map(|(child, value)| UpdateEvent::new(value, last_segment(&child)).via(child))
                .collect(),
        }
    }
}

impl GraphNode for NodeRef {
    fn kind(&self) -> NodeKind {
        self.kind
    }

    fn on(&self, listener: Arc<NodeListener>) -> ListenerId {
        let id = self
            .graph
            .inner
            .listeners
            .lock()
            .entry((self.soul.clone(), self.kind))
            .or_default()
            .on_shared(Arc::clone(&listener));

        for event in self.replay() {
            listener(&event);
        }
        id
    }

    fn off(&self, id: ListenerId) {
        let mut listeners = self.graph.inner.listeners.lock();
        let key = (self.soul.clone(), self.kind);
        if let Some(emitter) = listeners.get(&key) {
            emitter.off(id);
            if emitter.is_empty() {
                listeners.remove(&key);
            }
        }
    }
}

impl std::fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeRef")
            .field("soul", &self.soul)
            .field("kind", &self.kind)
            .finish()
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn last_segment(soul: &str) -> &str {
    soul.rsplit_once('/').map_or(soul, |(_, key)| key)
}

/// Attach `soul` as graph metadata to object values that carry none yet.
fn stamp_soul(soul: &str, value: Value) -> Value {
    if soul_of(&value).is_some() {
        return value;
    }
    match value {
        Value::Object(mut fields) => {
            let mut meta = match fields.remove(META_FIELD) {
                Some(Value::Object(meta)) => meta,
                _ => Map::new(),
            };
            meta.insert(SOUL_FIELD.to_string(), Value::String(soul.to_string()));
            fields.insert(META_FIELD.to_string(), Value::Object(meta));
            Value::Object(fields)
        }
        other => other,
    }
}
