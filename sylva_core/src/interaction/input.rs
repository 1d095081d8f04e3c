// Copyright 2026 the Sylva Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Raw per-step input samples supplied by the host.

use alloc::vec::Vec;

use kurbo::Point;

use super::event::{Modifiers, PointerButton};

/// The mouse as seen at the start of a step, in screen coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MouseSample {
    /// Cursor position.
    pub position: Point,
    /// Whether a button is held.
    pub pressed: bool,
    /// The held button (ignored while not pressed).
    pub button: PointerButton,
}

/// One touch contact currently on the surface, in screen coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TouchSample {
    /// Platform identifier, stable for the lifetime of the contact.
    pub id: u64,
    /// Contact position.
    pub position: Point,
}

/// Everything the host reports for one step.
///
/// Touches present in one step and absent in the next are treated as lifted.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawInput {
    /// The mouse, or `None` when there is no mouse.
    pub mouse: Option<MouseSample>,
    /// Contacts currently down.
    pub touches: Vec<TouchSample>,
    /// Modifier keys held.
    pub modifiers: Modifiers,
}

impl RawInput {
    /// Input with only a mouse at `position`.
    #[must_use]
    pub fn mouse(position: impl Into<Point>, pressed: bool) -> Self {
        Self {
            mouse: Some(MouseSample {
                position: position.into(),
                pressed,
                button: PointerButton::Primary,
            }),
            ..Self::default()
        }
    }

    /// Input with only the given touches.
    #[must_use]
    pub fn touches(touches: impl IntoIterator<Item = (u64, Point)>) -> Self {
        Self {
            touches: touches
                .into_iter()
                .map(|(id, position)| TouchSample { id, position })
                .collect(),
            ..Self::default()
        }
    }
}
