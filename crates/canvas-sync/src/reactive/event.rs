//! UpdateEvent — one delivery from the graph store to a node listener.
//!
//! The store fires one event per changed record. For a collection node that
//! means one event per changed member, never a snapshot of the whole set.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Metadata field that holds a node's graph metadata object.
pub const META_FIELD: &str = "_";

/// Key of the soul (intrinsic identity) inside the metadata object.
pub const SOUL_FIELD: &str = "#";

/// Whether a node reference addresses a single record or the members of a
/// mapped collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Scalar,
    Collection,
}

/// Context describing where an update came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMeta {
    /// Soul of the node the event travelled through, if known.
    pub via_soul: Option<String>,
}

/// A single update delivered to a listener.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateEvent {
    /// New value. `Value::Null` marks a deletion.
    pub value: Value,
    /// Raw key the update fired under.
    pub key: String,
    pub meta: EventMeta,
}

impl UpdateEvent {
    pub fn new(value: Value, key: impl Into<String>) -> Self {
        Self {
            value,
            key: key.into(),
            meta: EventMeta::default(),
        }
    }

    pub fn via(mut self, soul: impl Into<String>) -> Self {
        self.meta.via_soul = Some(soul.into());
        self
    }

    pub fn is_deletion(&self) -> bool {
        self.value.is_null()
    }

    /// Stable identity of the record this event is about.
    ///
    /// Priority: the value's own soul, then the origin soul, then the raw key.
    pub fn identity(&self) -> &str {
        soul_of(&self.value)
            .or(self.meta.via_soul.as_deref())
            .unwrap_or(&self.key)
    }
}

/// Intrinsic identity of a record, read from `value["_"]["#"]`.
pub fn soul_of(value: &Value) -> Option<&str> {
    value.get(META_FIELD)?.get(SOUL_FIELD)?.as_str()
}
