// Copyright 2026 the Sylva Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer and gesture interaction.
//!
//! [`InteractionEngine::process`] runs once per step, after transform
//! propagation:
//!
//! 1. Collect hit-test candidates from the tree as it stands.
//! 2. Turn the host's [`RawInput`] (or the next scripted event) into one
//!    world-space sample per pointer slot. Slot 0 is the mouse; touches are
//!    assigned slots `1..=max_touches` as they appear.
//! 3. Update the pinch recognizer.
//! 4. Advance every pointer's state machine, queueing events.
//! 5. Dispatch the queued events in order. For each event: scene handlers,
//!    then the target's own callback, then the [`EntityBridge`].
//!
//! All hit-testing for a step happens before any handler runs, so handlers
//! that mutate the tree affect the next step, not the current one.
//!
//! Handlers may mutate the tree freely, including disposing the target of the
//! event being dispatched. A node's callback is detached while it runs and
//! reattached only if the node is still alive and no replacement was
//! installed. Events aimed at a node disposed earlier in the step are still
//! delivered to scene handlers, with the target cleared.

mod event;
mod hit;
mod input;
mod pinch;
mod pointer;
mod synthetic;

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use kurbo::{Affine, Point};

pub use event::{
    DragInfo, EntityBridge, EventContext, EventKind, InteractionEvent, InteractionRecord,
    Modifiers, PinchInfo, PointerButton,
};
pub(crate) use event::{Handler, NodeHandlers};
pub use input::{MouseSample, RawInput, TouchSample};
pub use pinch::PinchState;
pub use pointer::PointerState;
pub use synthetic::{InputScript, SyntheticEvent};

use pinch::PinchUpdate;
use pointer::Sample;

use crate::node::{NodeId, NodeTree};
use crate::trace::{DispatchEvent, Tracer};

/// Default movement, in world units, before a press becomes a drag.
pub const DEFAULT_DRAG_DEAD_ZONE: f64 = 4.0;

/// Default number of touch slots.
pub const DEFAULT_MAX_TOUCHES: usize = 4;

/// Pointer state, gesture recognition, and event dispatch for one scene.
pub struct InteractionEngine {
    pointers: Vec<PointerState>,
    touch_ids: Vec<Option<u64>>,
    pinch: PinchState,
    handlers: Vec<Handler>,
    bridge: Option<Box<dyn EntityBridge>>,
    script: InputScript,
    synthetic_mouse: Option<MouseSample>,
    dead_zone: f64,
    hit_list: Vec<u32>,
    samples: Vec<Option<Sample>>,
    events: Vec<InteractionEvent>,
}

impl fmt::Debug for InteractionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InteractionEngine")
            .field("pointers", &self.pointers)
            .field("touch_ids", &self.touch_ids)
            .field("pinch", &self.pinch)
            .field("handlers", &self.handlers.len())
            .field("bridge", &self.bridge.is_some())
            .field("script", &self.script)
            .field("dead_zone", &self.dead_zone)
            .finish_non_exhaustive()
    }
}

impl Default for InteractionEngine {
    fn default() -> Self {
        Self::new(DEFAULT_DRAG_DEAD_ZONE, DEFAULT_MAX_TOUCHES)
    }
}

impl InteractionEngine {
    /// Creates an engine with one mouse slot and `max_touches` touch slots.
    #[must_use]
    pub fn new(dead_zone: f64, max_touches: usize) -> Self {
        Self {
            pointers: alloc::vec![PointerState::default(); max_touches + 1],
            touch_ids: alloc::vec![None; max_touches],
            pinch: PinchState::default(),
            handlers: Vec::new(),
            bridge: None,
            script: InputScript::default(),
            synthetic_mouse: None,
            dead_zone,
            hit_list: Vec::new(),
            samples: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Returns the drag dead zone.
    #[must_use]
    pub fn dead_zone(&self) -> f64 {
        self.dead_zone
    }

    /// Sets the drag dead zone.
    pub fn set_dead_zone(&mut self, dead_zone: f64) {
        self.dead_zone = dead_zone;
    }

    /// Returns the number of touch slots.
    #[must_use]
    pub fn max_touches(&self) -> usize {
        self.touch_ids.len()
    }

    /// Registers a scene-level handler. Scene handlers run for every event,
    /// in registration order, before the target's own callback.
    pub fn on_event(&mut self, handler: impl FnMut(&mut EventContext<'_>, &InteractionEvent) + 'static) {
        self.handlers.push(Box::new(handler));
    }

    /// Installs or removes the entity bridge.
    pub fn set_bridge(&mut self, bridge: Option<Box<dyn EntityBridge>>) {
        self.bridge = bridge;
    }

    /// Returns the synthetic input queue.
    pub fn script(&mut self) -> &mut InputScript {
        &mut self.script
    }

    /// Returns the state of a pointer slot.
    #[must_use]
    pub fn pointer(&self, slot: usize) -> Option<&PointerState> {
        self.pointers.get(slot)
    }

    /// Returns the pinch state.
    #[must_use]
    pub fn pinch(&self) -> &PinchState {
        &self.pinch
    }

    /// Routes every event of `slot` to `node` until release.
    pub fn capture(&mut self, slot: usize, node: NodeId) {
        if let Some(p) = self.pointers.get_mut(slot) {
            p.set_capture(Some(node));
        }
    }

    /// Cancels a capture on `slot`.
    pub fn release_capture(&mut self, slot: usize) {
        if let Some(p) = self.pointers.get_mut(slot) {
            p.set_capture(None);
        }
    }

    /// Runs one step of input processing and dispatch.
    ///
    /// `screen_to_world` maps host coordinates into world space (the inverse
    /// of the active camera's view). World transforms must be current.
    pub fn process(
        &mut self,
        tree: &mut NodeTree,
        root: NodeId,
        input: &RawInput,
        screen_to_world: Affine,
        tracer: &mut Tracer<'_>,
        frame_index: u64,
    ) {
        let mut hit_list = core::mem::take(&mut self.hit_list);
        tree.collect_interactive(root, &mut hit_list);

        self.sample_pointers(input, screen_to_world);

        let down: Vec<(usize, Point)> = self
            .samples
            .iter()
            .enumerate()
            .skip(1)
            .filter_map(|(slot, s)| s.filter(|s| s.pressed).map(|s| (slot, s.pos)))
            .collect();
        let pinch = self.pinch.update(&down);
        if pinch == PinchUpdate::Started {
            if let [(_, a), (_, b)] = down[..] {
                self.pinch.set_target(tree.hit_test_in(&hit_list, a.midpoint(b)));
            }
        }

        for (slot, pointer) in self.pointers.iter_mut().enumerate() {
            if pointer.captured().is_some_and(|node| !tree.is_alive(node)) {
                log::debug!("pointer {slot}: dropping capture of a disposed node");
                pointer.set_capture(None);
            }
        }

        let mut events = core::mem::take(&mut self.events);
        for slot in 0..self.pointers.len() {
            let pointer = &mut self.pointers[slot];
            match self.samples[slot] {
                Some(sample) => {
                    let hit = tree.hit_test_in(&hit_list, sample.pos);
                    let suppressed = self.pinch.involves(slot);
                    pointer.step(slot, &sample, hit, self.dead_zone, suppressed, &mut events);
                }
                None if pointer.is_known() => {
                    let hit = pointer
                        .position()
                        .and_then(|pos| tree.hit_test_in(&hit_list, pos));
                    pointer.vanish(slot, hit, input.modifiers, &mut events);
                }
                None => {}
            }
        }

        if let (PinchUpdate::Moved(info), Some([first, _])) = (pinch, self.pinch.slots()) {
            let mut event = InteractionEvent::new(EventKind::Pinch, first, self.pinch.target(), info.center);
            event.modifiers = input.modifiers;
            event.pinch = Some(info);
            events.push(event);
        }

        self.hit_list = hit_list;
        for event in &mut events {
            self.dispatch(tree, event, tracer, frame_index);
        }
        events.clear();
        self.events = events;
    }

    /// Fills `self.samples` with this step's world-space sample per slot.
    fn sample_pointers(&mut self, input: &RawInput, screen_to_world: Affine) {
        self.samples.clear();
        self.samples.resize(self.pointers.len(), None);

        if let Some(mouse) = self.next_mouse(input.mouse) {
            self.samples[0] = Some(Sample {
                pos: screen_to_world * mouse.position,
                pressed: mouse.pressed,
                button: mouse.button,
                modifiers: input.modifiers,
            });
        }

        // Free slots of lifted contacts, then seat new ones.
        for id in &mut self.touch_ids {
            if id.is_some_and(|id| !input.touches.iter().any(|t| t.id == id)) {
                *id = None;
            }
        }
        for touch in &input.touches {
            if self.touch_ids.contains(&Some(touch.id)) {
                continue;
            }
            // A slot freed this step still has to report its release.
            let free = (0..self.touch_ids.len())
                .find(|&k| self.touch_ids[k].is_none() && !self.pointers[k + 1].is_known());
            match free {
                Some(k) => self.touch_ids[k] = Some(touch.id),
                None => log::debug!("ignoring touch {}: no free touch slot", touch.id),
            }
        }
        for (k, id) in self.touch_ids.iter().enumerate() {
            let Some(id) = *id else {
                continue;
            };
            if let Some(touch) = input.touches.iter().find(|t| t.id == id) {
                self.samples[k + 1] = Some(Sample {
                    pos: screen_to_world * touch.position,
                    pressed: true,
                    button: PointerButton::Primary,
                    modifiers: input.modifiers,
                });
            }
        }
    }

    /// Returns the mouse for this step: the next scripted event if any, the
    /// scripted mouse while a scripted press is held, else the live mouse.
    fn next_mouse(&mut self, live: Option<MouseSample>) -> Option<MouseSample> {
        if let Some(event) = self.script.pop() {
            let mouse = self
                .synthetic_mouse
                .get_or_insert_with(|| live.unwrap_or_default());
            event.apply(mouse);
            return Some(*mouse);
        }
        match self.synthetic_mouse {
            Some(mouse) if mouse.pressed => Some(mouse),
            _ => {
                self.synthetic_mouse = None;
                live
            }
        }
    }

    fn dispatch(
        &mut self,
        tree: &mut NodeTree,
        event: &mut InteractionEvent,
        tracer: &mut Tracer<'_>,
        frame_index: u64,
    ) {
        if event.target.is_some_and(|t| !tree.is_alive(t)) {
            event.target = None;
        }
        event.local = match event.target {
            Some(t) => tree.to_local(t, event.world),
            None => event.world,
        };
        let entity = event.target.map_or(0, |t| tree.entity(t));
        let event: &InteractionEvent = event;

        let mut cx = EventContext::new(tree, event.pointer);
        for handler in &mut self.handlers {
            handler(&mut cx, event);
        }
        if let Some(target) = event.target {
            if let Some(mut handler) = cx.take_handler(target, event.kind) {
                handler(&mut cx, event);
                cx.restore_handler(target, event.kind, handler);
            }
        }

        let mut forwarded = false;
        if entity != 0 || event.kind == EventKind::Pinch {
            if let Some(bridge) = &mut self.bridge {
                bridge.on_interaction(&InteractionRecord::from_event(event, entity));
                forwarded = true;
            }
        }

        // The pointer has already been released by the time release events
        // run, so a new capture there would outlive it.
        let releasing = matches!(
            event.kind,
            EventKind::PointerUp | EventKind::Click | EventKind::DragEnd
        );
        match cx.capture_request() {
            Some(Some(_)) if releasing => {
                log::debug!("pointer {}: ignoring capture from {:?}", event.pointer, event.kind);
            }
            Some(capture) => {
                if let Some(pointer) = self.pointers.get_mut(event.pointer) {
                    pointer.set_capture(capture);
                }
            }
            None => {}
        }

        tracer.dispatch(&DispatchEvent {
            frame_index,
            kind: event.kind,
            pointer: event.pointer,
            target: event.target,
            forwarded,
        });
    }
}
