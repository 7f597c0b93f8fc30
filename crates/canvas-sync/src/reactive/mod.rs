//! Reactive layer — push subscriptions over a live graph store.
//!
//! # Overview
//!
//! [`subscribe`] wraps any [`GraphNode`] and delivers either every update
//! (scalar nodes) or the current membership (collection nodes) to a
//! `publish` callback. [`Graph`] is the in-process store those nodes come
//! from.
//!
//! # Modules
//!
//! - [`event`] — [`UpdateEvent`], [`EventMeta`], [`NodeKind`].
//! - [`event_emitter`] — Generic typed pub/sub ([`EventEmitter<T>`]).
//! - [`graph`] — [`Graph`], [`NodeRef`] and the [`GraphNode`] trait.
//! - [`subscribe`] — the subscription adapter and [`Subscription`] handle.

pub mod event;
pub mod event_emitter;
pub mod graph;
pub mod subscribe;

pub use event::{soul_of, EventMeta, NodeKind, UpdateEvent};
pub use event_emitter::{EventEmitter, ListenerId};
pub use graph::{Graph, GraphNode, NodeListener, NodeRef};
pub use subscribe::{subscribe, Publication, Subscription};
