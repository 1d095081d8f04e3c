// Copyright 2026 the Sylva Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scripted mouse input.
//!
//! [`InputScript`] is a FIFO of press/move/release events in screen
//! coordinates. The interaction engine consumes one event per step and feeds
//! it to the mouse slot through the same state machine as live input.

use alloc::collections::VecDeque;

use kurbo::Point;

use super::event::PointerButton;
use super::input::MouseSample;

/// One scripted mouse event, in screen coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SyntheticEvent {
    /// Move to `pos` and press `button`.
    Press {
        /// Screen position.
        pos: Point,
        /// Pressed button.
        button: PointerButton,
    },
    /// Move to `pos`.
    Move {
        /// Screen position.
        pos: Point,
    },
    /// Move to `pos` and release.
    Release {
        /// Screen position.
        pos: Point,
    },
}

impl SyntheticEvent {
    /// Applies this event to a running mouse sample.
    pub(crate) fn apply(self, mouse: &mut MouseSample) {
        match self {
            Self::Press { pos, button } => {
                mouse.position = pos;
                mouse.pressed = true;
                mouse.button = button;
            }
            Self::Move { pos } => mouse.position = pos,
            Self::Release { pos } => {
                mouse.position = pos;
                mouse.pressed = false;
            }
        }
    }
}

/// A queue of scripted mouse events.
#[derive(Clone, Debug, Default)]
pub struct InputScript {
    queue: VecDeque<SyntheticEvent>,
}

impl InputScript {
    /// Queues a primary-button press at `pos`.
    pub fn press(&mut self, pos: impl Into<Point>) -> &mut Self {
        self.press_with(pos, PointerButton::Primary)
    }

    /// Queues a press of `button` at `pos`.
    pub fn press_with(&mut self, pos: impl Into<Point>, button: PointerButton) -> &mut Self {
        self.queue.push_back(SyntheticEvent::Press {
            pos: pos.into(),
            button,
        });
        self
    }

    /// Queues a move to `pos`.
    pub fn move_to(&mut self, pos: impl Into<Point>) -> &mut Self {
        self.queue.push_back(SyntheticEvent::Move { pos: pos.into() });
        self
    }

    /// Queues a release at `pos`.
    pub fn release(&mut self, pos: impl Into<Point>) -> &mut Self {
        self.queue.push_back(SyntheticEvent::Release { pos: pos.into() });
        self
    }

    /// Queues a press and a release at `pos`.
    pub fn click(&mut self, pos: impl Into<Point>) -> &mut Self {
        let pos = pos.into();
        self.press(pos).release(pos)
    }

    /// Queues a drag from `from` to `to` spread over `steps` events: a press,
    /// `steps - 2` evenly interpolated moves, and a release at `to`.
    ///
    /// `steps` below 2 is treated as 2.
    pub fn drag(&mut self, from: impl Into<Point>, to: impl Into<Point>, steps: usize) -> &mut Self {
        let (from, to) = (from.into(), to.into());
        let steps = steps.max(2);
        self.press(from);
        let last = (steps - 1) as f64;
        for k in 1..steps - 1 {
            self.move_to(from.lerp(to, k as f64 / last));
        }
        self.release(to)
    }

    /// Returns the number of queued events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drops every queued event.
    pub fn clear(&mut self) {
        self.queue.clear();
    }

    /// Iterates the queued events, next first.
    pub fn iter(&self) -> impl Iterator<Item = &SyntheticEvent> {
        self.queue.iter()
    }

    pub(crate) fn pop(&mut self) -> Option<SyntheticEvent> {
        self.queue.pop_front()
    }
}
