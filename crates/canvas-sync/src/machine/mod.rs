//! Drag/drop interaction state for a canvas UI.
//!
//! - [`drag_drop`] — states, events, the transition table and the pure
//!   [`transition`] function.
//! - [`service`] — [`DragDropService`], a stateful owner that applies events
//!   and notifies listeners.

pub mod drag_drop;
pub mod service;

pub use drag_drop::{
    can_accept, transition, ContextEffect, DragContext, DragEvent, DragEventKind, DragState,
    TransitionRule, TRANSITIONS,
};
pub use service::{DragDropService, DragSnapshot};
