// Copyright 2026 the Sylva Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-pointer press, click, drag, and hover recognition.
//!
//! ## States
//!
//! - *idle*: not pressed. Movement fires [`PointerMove`](EventKind::PointerMove).
//! - *down*: pressed, still inside the dead zone.
//! - *dragging*: pressed and moved past the dead zone.
//!
//! Hover (over/out) is tracked independently of the press state and is always
//! emitted before press handling within one step.

use alloc::vec::Vec;

use kurbo::{Point, Vec2};

use super::event::{DragInfo, EventKind, InteractionEvent, Modifiers, PointerButton};
use crate::node::NodeId;

/// Tracks drag movement: the delta since the last update and the offset since
/// the start.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct DragState {
    start_pos: Option<Point>,
    last_pos: Option<Point>,
}

impl DragState {
    /// Starts tracking a drag from `pos`.
    pub(crate) fn start(&mut self, pos: Point) {
        self.start_pos = Some(pos);
        self.last_pos = Some(pos);
    }

    /// Moves to `pos`, returning the delta since the last update.
    pub(crate) fn update(&mut self, pos: Point) -> Option<Vec2> {
        self.start_pos?;
        let delta = self.last_pos.map(|last| pos - last);
        self.last_pos = Some(pos);
        delta
    }

    /// Returns the offset from the drag start.
    pub(crate) fn total_offset(&self, pos: Point) -> Option<Vec2> {
        self.start_pos.map(|start| pos - start)
    }

    /// Ends the drag.
    pub(crate) fn end(&mut self) {
        self.start_pos = None;
        self.last_pos = None;
    }

    pub(crate) fn is_dragging(&self) -> bool {
        self.start_pos.is_some()
    }
}

/// One pointer's input for one step, in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Sample {
    pub(crate) pos: Point,
    pub(crate) pressed: bool,
    pub(crate) button: PointerButton,
    pub(crate) modifiers: Modifiers,
}

/// The state of one pointer slot.
#[derive(Clone, Copy, Debug, Default)]
pub struct PointerState {
    pressed: bool,
    button: PointerButton,
    press_pos: Point,
    last_pos: Option<Point>,
    hit_node: Option<NodeId>,
    hovered: Option<NodeId>,
    drag: DragState,
    captured: Option<NodeId>,
    pinched: bool,
}

impl PointerState {
    /// Returns whether the pointer is pressed.
    #[must_use]
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Returns whether the pointer is dragging.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    /// Returns the last known world position, if the pointer has been seen.
    #[must_use]
    pub fn position(&self) -> Option<Point> {
        self.last_pos
    }

    /// Returns the node under the pointer as of the last step.
    #[must_use]
    pub fn hovered(&self) -> Option<NodeId> {
        self.hovered
    }

    /// Returns the node hit when the current press began.
    #[must_use]
    pub fn press_target(&self) -> Option<NodeId> {
        self.hit_node
    }

    /// Returns the capturing node, if any.
    #[must_use]
    pub fn captured(&self) -> Option<NodeId> {
        self.captured
    }

    pub(crate) fn set_capture(&mut self, node: Option<NodeId>) {
        self.captured = node;
    }

    /// Advances the pointer by one step.
    ///
    /// `hit` is the node under `sample.pos`. `suppressed` is set while the
    /// pointer takes part in a pinch.
    pub(crate) fn step(
        &mut self,
        slot: usize,
        sample: &Sample,
        hit: Option<NodeId>,
        dead_zone: f64,
        suppressed: bool,
        out: &mut Vec<InteractionEvent>,
    ) {
        self.update_hover(slot, sample, hit, out);
        self.update_press(slot, sample, hit, dead_zone, suppressed, out);
        self.last_pos = Some(sample.pos);
    }

    /// Handles a pointer that disappeared (a lifted touch).
    ///
    /// Leaves the hovered node, releases at the last position, and resets.
    pub(crate) fn vanish(
        &mut self,
        slot: usize,
        hit: Option<NodeId>,
        modifiers: Modifiers,
        out: &mut Vec<InteractionEvent>,
    ) {
        let Some(pos) = self.last_pos else {
            return;
        };
        let sample = Sample {
            pos,
            pressed: false,
            button: self.button,
            modifiers,
        };
        self.update_hover(slot, &sample, None, out);
        self.update_press(slot, &sample, hit, 0.0, false, out);
        *self = Self::default();
    }

    /// Returns whether the pointer has been seen and not reset since.
    pub(crate) fn is_known(&self) -> bool {
        self.last_pos.is_some()
    }

    fn update_hover(
        &mut self,
        slot: usize,
        sample: &Sample,
        hit: Option<NodeId>,
        out: &mut Vec<InteractionEvent>,
    ) {
        if self.hovered == hit {
            return;
        }
        if let Some(old) = self.hovered {
            out.push(self.event(EventKind::PointerOut, slot, Some(old), sample));
        }
        if let Some(new) = hit {
            out.push(self.event(EventKind::PointerOver, slot, Some(new), sample));
        }
        self.hovered = hit;
    }

    fn update_press(
        &mut self,
        slot: usize,
        sample: &Sample,
        hit: Option<NodeId>,
        dead_zone: f64,
        suppressed: bool,
        out: &mut Vec<InteractionEvent>,
    ) {
        let pos = sample.pos;
        match (self.pressed, sample.pressed) {
            (false, true) => {
                self.pressed = true;
                self.button = sample.button;
                self.press_pos = pos;
                self.hit_node = hit;
                self.pinched = suppressed;
                let target = self.captured.or(hit);
                out.push(self.event(EventKind::PointerDown, slot, target, sample));
            }
            (true, false) => {
                let press_target = self.captured.or(self.hit_node);
                if self.drag.is_dragging() {
                    let mut event = self.event(EventKind::DragEnd, slot, press_target, sample);
                    event.drag = self.drag_info(pos, Vec2::ZERO);
                    out.push(event);
                    self.drag.end();
                } else if !self.pinched && hit == self.hit_node {
                    out.push(self.event(EventKind::Click, slot, press_target, sample));
                }
                let target = self.captured.or(hit);
                out.push(self.event(EventKind::PointerUp, slot, target, sample));
                self.pressed = false;
                self.hit_node = None;
                self.pinched = false;
                self.captured = None;
            }
            (true, true) => {
                let press_target = self.captured.or(self.hit_node);
                if suppressed {
                    if self.drag.is_dragging() {
                        let mut event = self.event(EventKind::DragEnd, slot, press_target, sample);
                        event.drag = self.drag_info(pos, Vec2::ZERO);
                        out.push(event);
                        self.drag.end();
                    }
                    self.pinched = true;
                } else if self.drag.is_dragging() {
                    if self.last_pos != Some(pos) {
                        let delta = self.drag.update(pos).unwrap_or(Vec2::ZERO);
                        let mut event = self.event(EventKind::Drag, slot, press_target, sample);
                        event.drag = self.drag_info(pos, delta);
                        out.push(event);
                    }
                } else if !self.pinched && (pos - self.press_pos).hypot() > dead_zone {
                    self.drag.start(self.press_pos);
                    let mut event = self.event(EventKind::DragStart, slot, press_target, sample);
                    event.drag = self.drag_info(self.press_pos, Vec2::ZERO);
                    out.push(event);

                    let delta = self.drag.update(pos).unwrap_or(Vec2::ZERO);
                    let mut event = self.event(EventKind::Drag, slot, press_target, sample);
                    event.drag = self.drag_info(pos, delta);
                    out.push(event);
                }
            }
            (false, false) => {
                if self.last_pos.is_some_and(|last| last != pos) {
                    let target = self.captured.or(hit);
                    out.push(self.event(EventKind::PointerMove, slot, target, sample));
                }
            }
        }
    }

    fn drag_info(&self, pos: Point, delta: Vec2) -> Option<DragInfo> {
        Some(DragInfo {
            delta,
            total: self.drag.total_offset(pos).unwrap_or(Vec2::ZERO),
        })
    }

    fn event(
        &self,
        kind: EventKind,
        slot: usize,
        target: Option<NodeId>,
        sample: &Sample,
    ) -> InteractionEvent {
        let mut event = InteractionEvent::new(kind, slot, target, sample.pos);
        event.button = if self.pressed {
            self.button
        } else {
            sample.button
        };
        event.modifiers = sample.modifiers;
        event
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    fn sample(x: f64, y: f64, pressed: bool) -> Sample {
        Sample {
            pos: Point::new(x, y),
            pressed,
            button: PointerButton::Primary,
            modifiers: Modifiers::default(),
        }
    }

    fn kinds(events: &[InteractionEvent]) -> Vec<EventKind> {
        events.iter().map(|e| e.kind).collect()
    }

    fn node(idx: u32) -> NodeId {
        NodeId { idx, generation: 0 }
    }

    #[test]
    fn drag_state_tracks_deltas() {
        let mut drag = DragState::default();
        assert_eq!(drag.update(Point::new(1.0, 1.0)), None);
        drag.start(Point::new(10.0, 20.0));
        assert_eq!(drag.update(Point::new(15.0, 25.0)), Some(Vec2::new(5.0, 5.0)));
        assert_eq!(drag.update(Point::new(16.0, 25.0)), Some(Vec2::new(1.0, 0.0)));
        assert_eq!(drag.total_offset(Point::new(16.0, 25.0)), Some(Vec2::new(6.0, 5.0)));
        drag.end();
        assert!(!drag.is_dragging());
    }

    #[test]
    fn press_release_in_place_clicks() {
        let target = node(1);
        let mut p = PointerState::default();
        let mut out = Vec::new();
        p.step(0, &sample(50.0, 50.0, false), Some(target), 4.0, false, &mut out);
        p.step(0, &sample(50.0, 50.0, true), Some(target), 4.0, false, &mut out);
        p.step(0, &sample(50.0, 50.0, false), Some(target), 4.0, false, &mut out);
        assert_eq!(
            kinds(&out),
            vec![
                EventKind::PointerOver,
                EventKind::PointerDown,
                EventKind::Click,
                EventKind::PointerUp
            ]
        );
        assert!(out.iter().all(|e| e.target == Some(target)));
    }

    #[test]
    fn movement_inside_dead_zone_still_clicks() {
        let target = node(1);
        let mut p = PointerState::default();
        let mut out = Vec::new();
        p.step(0, &sample(50.0, 50.0, true), Some(target), 4.0, false, &mut out);
        p.step(0, &sample(52.0, 51.0, true), Some(target), 4.0, false, &mut out);
        p.step(0, &sample(52.0, 51.0, false), Some(target), 4.0, false, &mut out);
        assert!(kinds(&out).contains(&EventKind::Click));
        assert!(!kinds(&out).contains(&EventKind::DragStart));
    }

    #[test]
    fn drag_suppresses_click_and_keeps_press_target() {
        let target = node(1);
        let mut p = PointerState::default();
        let mut out = Vec::new();
        p.step(0, &sample(50.0, 50.0, true), Some(target), 4.0, false, &mut out);
        out.clear();
        // Moved off the target: drag events still aim at the press target.
        p.step(0, &sample(80.0, 50.0, true), None, 4.0, false, &mut out);
        p.step(0, &sample(90.0, 50.0, true), None, 4.0, false, &mut out);
        p.step(0, &sample(90.0, 50.0, false), None, 4.0, false, &mut out);
        assert_eq!(
            kinds(&out),
            vec![
                EventKind::PointerOut,
                EventKind::DragStart,
                EventKind::Drag,
                EventKind::Drag,
                EventKind::DragEnd,
                EventKind::PointerUp
            ]
        );
        assert_eq!(out[1].target, Some(target));
        assert_eq!(out[2].drag.map(|d| d.delta), Some(Vec2::new(30.0, 0.0)));
        assert_eq!(out[3].drag.map(|d| d.delta), Some(Vec2::new(10.0, 0.0)));
        assert_eq!(out[4].drag.map(|d| d.total), Some(Vec2::new(40.0, 0.0)));
        assert_eq!(out[4].target, Some(target));
        assert_eq!(out[5].target, None);
    }

    #[test]
    fn release_elsewhere_does_not_click() {
        let a = node(1);
        let mut p = PointerState::default();
        let mut out = Vec::new();
        p.step(0, &sample(0.0, 0.0, true), Some(a), 100.0, false, &mut out);
        p.step(0, &sample(1.0, 0.0, false), None, 100.0, false, &mut out);
        assert!(!kinds(&out).contains(&EventKind::Click));
    }

    #[test]
    fn idle_movement_fires_move() {
        let mut p = PointerState::default();
        let mut out = Vec::new();
        p.step(0, &sample(0.0, 0.0, false), None, 4.0, false, &mut out);
        p.step(0, &sample(0.0, 0.0, false), None, 4.0, false, &mut out);
        assert!(out.is_empty());
        p.step(0, &sample(3.0, 0.0, false), None, 4.0, false, &mut out);
        assert_eq!(kinds(&out), vec![EventKind::PointerMove]);
    }

    #[test]
    fn capture_overrides_hit_and_releases_on_up() {
        let a = node(1);
        let captor = node(2);
        let mut p = PointerState::default();
        let mut out = Vec::new();
        p.set_capture(Some(captor));
        p.step(0, &sample(0.0, 0.0, true), Some(a), 4.0, false, &mut out);
        p.step(0, &sample(0.0, 0.0, false), Some(a), 4.0, false, &mut out);
        let down = out.iter().find(|e| e.kind == EventKind::PointerDown);
        assert_eq!(down.and_then(|e| e.target), Some(captor));
        assert_eq!(p.captured(), None);
    }

    #[test]
    fn pinch_suppression_ends_drag_and_blocks_click() {
        let a = node(1);
        let mut p = PointerState::default();
        let mut out = Vec::new();
        p.step(1, &sample(0.0, 0.0, true), Some(a), 4.0, false, &mut out);
        p.step(1, &sample(10.0, 0.0, true), Some(a), 4.0, false, &mut out);
        out.clear();
        p.step(1, &sample(20.0, 0.0, true), Some(a), 4.0, true, &mut out);
        assert_eq!(kinds(&out), vec![EventKind::DragEnd]);
        out.clear();
        // Pinch over; the pointer stays inert until released.
        p.step(1, &sample(30.0, 0.0, true), Some(a), 4.0, false, &mut out);
        p.step(1, &sample(30.0, 0.0, false), Some(a), 4.0, false, &mut out);
        assert_eq!(kinds(&out), vec![EventKind::PointerUp]);
    }

    #[test]
    fn vanish_leaves_then_releases() {
        let a = node(1);
        let mut p = PointerState::default();
        let mut out = Vec::new();
        p.step(1, &sample(5.0, 5.0, true), Some(a), 4.0, false, &mut out);
        out.clear();
        p.vanish(1, Some(a), Modifiers::default(), &mut out);
        assert_eq!(
            kinds(&out),
            vec![EventKind::PointerOut, EventKind::Click, EventKind::PointerUp]
        );
        assert!(!p.is_known());
    }
}
