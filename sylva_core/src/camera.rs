// Copyright 2026 the Sylva Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! 2D cameras.
//!
//! A camera maps world space to screen space. The render traversal applies
//! the active camera's view on top of every world transform, so a moving
//! camera shows up as a delta on cached subtrees rather than a rebuild.

use kurbo::{Affine, Point, Vec2};

use crate::transform::invert_or_identity;

/// A view onto the world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    /// World point shown at the screen origin.
    pub position: Vec2,
    /// Magnification; `2.0` shows the world twice as large.
    pub zoom: f64,
    /// Rotation of the camera in radians. The world appears rotated by the
    /// opposite angle.
    pub rotation: f64,
}

impl Camera {
    /// A camera at the origin with unit zoom.
    pub const IDENTITY: Self = Self {
        position: Vec2::ZERO,
        zoom: 1.0,
        rotation: 0.0,
    };

    /// Creates a camera looking at `position`.
    #[must_use]
    pub fn new(position: impl Into<Vec2>, zoom: f64, rotation: f64) -> Self {
        Self {
            position: position.into(),
            zoom,
            rotation,
        }
    }

    /// World to screen.
    #[must_use]
    pub fn view_transform(&self) -> Affine {
        Affine::scale(self.zoom) * Affine::rotate(-self.rotation) * Affine::translate(-self.position)
    }

    /// Screen to world. A zero zoom collapses the view; the identity is
    /// returned in that case.
    #[must_use]
    pub fn screen_to_world(&self) -> Affine {
        invert_or_identity(self.view_transform())
    }

    /// Maps a world point to the screen.
    #[must_use]
    pub fn world_to_screen_point(&self, p: Point) -> Point {
        self.view_transform() * p
    }

    /// Maps a screen point into the world.
    #[must_use]
    pub fn screen_to_world_point(&self, p: Point) -> Point {
        self.screen_to_world() * p
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::IDENTITY
    }
}
