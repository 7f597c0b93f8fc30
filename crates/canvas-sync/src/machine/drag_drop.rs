//! Drag/drop state machine as a pure transition function.
//!
//! ```text
//!            DRAG_START (item := event.item)
//!   idle ─────────────────────────────────▶ dragging
//!    ▲                                          │
//!    └──────────────────────────────────────────┘
//!            DROP        (exit dragging: item := None)
//!
//!   any state: ASSIGN_CANVAS (canvas := event.canvas), no state change
//! ```
//!
//! Events with no matching row in [`TRANSITIONS`] are ignored: state and
//! context come back unchanged.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DragState {
    #[default]
    Idle,
    Dragging,
}

/// Extended state carried alongside [`DragState`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragContext<I, C> {
    /// Item being dragged. Only set while `dragging`.
    pub item: Option<I>,
    /// Canvas the drag interaction is attached to.
    pub canvas: Option<C>,
}

impl<I, C> Default for DragContext<I, C> {
    fn default() -> Self {
        Self {
            item: None,
            canvas: None,
        }
    }
}

/// Events accepted by the machine. Serialized as `{"type": "DRAG_START", ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DragEvent<I, C> {
    DragStart { item: Option<I> },
    Drop,
    AssignCanvas { canvas: Option<C> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DragEventKind {
    DragStart,
    Drop,
    AssignCanvas,
}

impl<I, C> DragEvent<I, C> {
    pub fn kind(&self) -> DragEventKind {
        match self {
            Self::DragStart { .. } => DragEventKind::DragStart,
            Self::Drop => DragEventKind::Drop,
            Self::AssignCanvas { .. } => DragEventKind::AssignCanvas,
        }
    }
}

// ============================================================================
// Transition table
// ============================================================================

/// Context change applied by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextEffect {
    /// `item := event.item`
    AssignItem,
    /// `canvas := event.canvas`
    AssignCanvas,
}

/// One row of the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRule {
    /// Source state; `None` matches every state.
    pub from: Option<DragState>,
    pub event: DragEventKind,
    /// Target state. `Some` always exits the source state, even when the
    /// target is the same state; `None` stays put without exiting.
    pub to: Option<DragState>,
    pub effect: Option<ContextEffect>,
}

/// Rows are matched top to bottom, so state-specific rows must precede
/// any-state rows for the same event.
pub const TRANSITIONS: &[TransitionRule] = &[
    TransitionRule {
        from: Some(DragState::Idle),
        event: DragEventKind::DragStart,
        to: Some(DragState::Dragging),
        effect: Some(ContextEffect::AssignItem),
    },
    TransitionRule {
        from: Some(DragState::Dragging),
        event: DragEventKind::Drop,
        to: Some(DragState::Idle),
        effect: None,
    },
    TransitionRule {
        from: None,
        event: DragEventKind::AssignCanvas,
        to: None,
        effect: Some(ContextEffect::AssignCanvas),
    },
];

fn find_rule(state: DragState, event: DragEventKind) -> Option<&'static TransitionRule> {
    TRANSITIONS
        .iter()
        .find(|rule| rule.event == event && rule.from.map_or(true, |from| from == state))
}

/// Whether `event` has a transition out of `state`.
pub fn can_accept(state: DragState, event: DragEventKind) -> bool {
    find_rule(state, event).is_some()
}

/// Run the exit action of `state`.
fn exit<I, C>(state: DragState, context: &mut DragContext<I, C>) {
    match state {
        DragState::Dragging => context.item = None,
        DragState::Idle => {}
    }
}

// ============================================================================
// transition
// ============================================================================

/// Apply `event` to `(state, context)`.
///
/// A targeted transition runs the exit action of the old state before the
/// transition's own effect.
pub fn transition<I, C>(
    state: DragState,
    context: DragContext<I, C>,
    event: DragEvent<I, C>,
) -> (DragState, DragContext<I, C>) {
    match find_rule(state, event.kind()) {
        Some(rule) => apply(rule, state, context, event),
        None => (state, context),
    }
}

fn apply<I, C>(
    rule: &TransitionRule,
    state: DragState,
    mut context: DragContext<I, C>,
    event: DragEvent<I, C>,
) -> (DragState, DragContext<I, C>) {
    if rule.to.is_some() {
        exit(state, &mut context);
    }

    match (rule.effect, event) {
        (Some(ContextEffect::AssignItem), DragEvent::DragStart { item }) => context.item = item,
        (Some(ContextEffect::AssignCanvas), DragEvent::AssignCanvas { canvas }) => {
            context.canvas = canvas;
        }
        _ => {}
    }

    (rule.to.unwrap_or(state), context)
}
