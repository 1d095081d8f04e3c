// Copyright 2026 the Sylva Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Interaction events, handlers, and the entity bridge.

use alloc::boxed::Box;
use core::fmt;
use core::ops::{Deref, DerefMut};

use kurbo::{Point, Vec2};

use crate::node::{NodeId, NodeTree};

/// The kinds of interaction event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A pointer was pressed.
    PointerDown,
    /// A pointer was released.
    PointerUp,
    /// An unpressed pointer moved.
    PointerMove,
    /// The node under a pointer became this target.
    PointerOver,
    /// The node under a pointer stopped being this target.
    PointerOut,
    /// Press and release on the same node without dragging.
    Click,
    /// Movement since the press passed the dead zone.
    DragStart,
    /// Movement during a drag.
    Drag,
    /// Release (or pinch takeover) ended a drag.
    DragEnd,
    /// Two touch contacts moved relative to each other.
    Pinch,
}

impl EventKind {
    /// Number of event kinds.
    pub const COUNT: usize = 10;

    /// Every kind, in declaration order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::PointerDown,
        Self::PointerUp,
        Self::PointerMove,
        Self::PointerOver,
        Self::PointerOut,
        Self::Click,
        Self::DragStart,
        Self::Drag,
        Self::DragEnd,
        Self::Pinch,
    ];

    /// Returns a short lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::PointerDown => "pointerdown",
            Self::PointerUp => "pointerup",
            Self::PointerMove => "pointermove",
            Self::PointerOver => "pointerover",
            Self::PointerOut => "pointerout",
            Self::Click => "click",
            Self::DragStart => "dragstart",
            Self::Drag => "drag",
            Self::DragEnd => "dragend",
            Self::Pinch => "pinch",
        }
    }

    #[inline]
    const fn index(self) -> usize {
        self as usize
    }
}

/// Which button started a press.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PointerButton {
    /// Left mouse button or a touch contact.
    #[default]
    Primary,
    /// Right mouse button.
    Secondary,
    /// Middle mouse button.
    Middle,
}

/// Modifier keys held during an event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    /// Shift.
    pub shift: bool,
    /// Control.
    pub ctrl: bool,
    /// Alt / Option.
    pub alt: bool,
    /// Meta / Command / Windows.
    pub meta: bool,
}

/// Drag-specific event data, in world units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragInfo {
    /// Movement since the previous drag event.
    pub delta: Vec2,
    /// Movement since the press.
    pub total: Vec2,
}

/// Pinch-specific event data.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PinchInfo {
    /// Midpoint of the two contacts, in world space.
    pub center: Point,
    /// Current distance over initial distance.
    pub scale: f64,
    /// Current angle minus initial angle, in radians.
    pub rotation: f64,
    /// Current distance over the previous step's distance.
    pub delta_scale: f64,
    /// Current angle minus the previous step's angle, in radians.
    pub delta_rotation: f64,
    /// Current distance between the contacts.
    pub distance: f64,
}

/// An event delivered to scene handlers and node callbacks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InteractionEvent {
    /// What happened.
    pub kind: EventKind,
    /// Pointer slot: 0 is the mouse, touches use `1..=max_touches`.
    pub pointer: usize,
    /// The node the event is aimed at, if any.
    pub target: Option<NodeId>,
    /// Pointer position in world space.
    pub world: Point,
    /// Pointer position in the target's local space (world space without a
    /// target).
    pub local: Point,
    /// The button that started the current press.
    pub button: PointerButton,
    /// Modifier keys.
    pub modifiers: Modifiers,
    /// Drag data for drag events.
    pub drag: Option<DragInfo>,
    /// Pinch data for pinch events.
    pub pinch: Option<PinchInfo>,
}

impl InteractionEvent {
    pub(crate) fn new(kind: EventKind, pointer: usize, target: Option<NodeId>, world: Point) -> Self {
        Self {
            kind,
            pointer,
            target,
            world,
            local: world,
            button: PointerButton::Primary,
            modifiers: Modifiers::default(),
            drag: None,
            pinch: None,
        }
    }
}

/// The node-independent view of an event handed to an [`EntityBridge`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InteractionRecord {
    /// What happened.
    pub kind: EventKind,
    /// External entity of the target node, if it carries one.
    pub entity: Option<u32>,
    /// Pointer position in world space.
    pub world: Point,
    /// Pointer position in the target's local space.
    pub local: Point,
    /// The button that started the current press.
    pub button: PointerButton,
    /// Modifier keys.
    pub modifiers: Modifiers,
    /// Drag data for drag events.
    pub drag: Option<DragInfo>,
    /// Pinch data for pinch events.
    pub pinch: Option<PinchInfo>,
}

impl InteractionRecord {
    pub(crate) fn from_event(event: &InteractionEvent, entity: u32) -> Self {
        Self {
            kind: event.kind,
            entity: (entity != 0).then_some(entity),
            world: event.world,
            local: event.local,
            button: event.button,
            modifiers: event.modifiers,
            drag: event.drag,
            pinch: event.pinch,
        }
    }
}

/// Forwards interaction events to an external entity system.
///
/// Called after scene handlers and node callbacks, for events whose target
/// carries a non-zero entity identifier, and for every pinch.
pub trait EntityBridge {
    /// Receives one event.
    fn on_interaction(&mut self, record: &InteractionRecord);
}

/// An event callback, registered on the scene or on a node.
pub(crate) type Handler = Box<dyn FnMut(&mut EventContext<'_>, &InteractionEvent)>;

/// What a handler can touch while an event is being dispatched.
///
/// Dereferences to the [`NodeTree`], so handlers may mutate the tree
/// directly, including disposing the event's own target.
pub struct EventContext<'a> {
    tree: &'a mut NodeTree,
    pointer: usize,
    capture: Option<Option<NodeId>>,
}

impl<'a> EventContext<'a> {
    pub(crate) fn new(tree: &'a mut NodeTree, pointer: usize) -> Self {
        Self {
            tree,
            pointer,
            capture: None,
        }
    }

    /// Returns the tree.
    pub fn tree(&mut self) -> &mut NodeTree {
        self.tree
    }

    /// Routes every later event of this event's pointer to `node` until the
    /// pointer is released or [`release_capture`](Self::release_capture) is
    /// called.
    ///
    /// Ignored while handling a release (`PointerUp`, `Click`, `DragEnd`). A
    /// capture whose node is disposed is dropped at the start of the next
    /// step.
    pub fn capture(&mut self, node: NodeId) {
        self.capture = Some(Some(node));
    }

    /// Cancels a capture on this event's pointer.
    pub fn release_capture(&mut self) {
        self.capture = Some(None);
    }

    /// Returns the pointer slot of the event being dispatched.
    #[must_use]
    pub fn pointer(&self) -> usize {
        self.pointer
    }

    /// Returns the pending capture change, if a handler asked for one.
    pub(crate) fn capture_request(&self) -> Option<Option<NodeId>> {
        self.capture
    }
}

impl Deref for EventContext<'_> {
    type Target = NodeTree;

    fn deref(&self) -> &NodeTree {
        self.tree
    }
}

impl DerefMut for EventContext<'_> {
    fn deref_mut(&mut self) -> &mut NodeTree {
        self.tree
    }
}

impl fmt::Debug for EventContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventContext")
            .field("pointer", &self.pointer)
            .field("capture", &self.capture)
            .finish_non_exhaustive()
    }
}

/// One optional callback per event kind.
pub(crate) struct NodeHandlers {
    slots: [Option<Handler>; EventKind::COUNT],
}

impl NodeHandlers {
    /// Replaces the callback for `kind`, returning the previous one.
    pub(crate) fn set(&mut self, kind: EventKind, handler: Option<Handler>) -> Option<Handler> {
        core::mem::replace(&mut self.slots[kind.index()], handler)
    }

    pub(crate) fn is_set(&self, kind: EventKind) -> bool {
        self.slots[kind.index()].is_some()
    }
}

impl Default for NodeHandlers {
    fn default() -> Self {
        Self {
            slots: core::array::from_fn(|_| None),
        }
    }
}

impl fmt::Debug for NodeHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(EventKind::ALL.iter().filter(|k| self.is_set(**k)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_index_densely() {
        for (i, kind) in EventKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn handler_slots_replace() {
        let mut handlers = NodeHandlers::default();
        assert!(!handlers.is_set(EventKind::Click));
        assert!(handlers.set(EventKind::Click, Some(Box::new(|_, _| {}))).is_none());
        assert!(handlers.is_set(EventKind::Click));
        assert!(!handlers.is_set(EventKind::Drag));
        assert!(handlers.set(EventKind::Click, None).is_some());
    }

    #[test]
    fn record_drops_zero_entity() {
        let event = InteractionEvent::new(EventKind::Pinch, 1, None, Point::new(1.0, 2.0));
        assert_eq!(InteractionRecord::from_event(&event, 0).entity, None);
        assert_eq!(InteractionRecord::from_event(&event, 9).entity, Some(9));
    }
}
