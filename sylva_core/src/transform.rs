// Copyright 2026 the Sylva Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! 2D affine transform helpers.
//!
//! Matrices are [`kurbo::Affine`] values (`[a, b, c, d, tx, ty]`, mapping
//! `x' = a·x + c·y + tx`, `y' = b·x + d·y + ty`). This module adds the pieces
//! the scene graph needs on top of kurbo: the local transform of a node, and
//! an inversion that never produces NaNs.

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Affine, Point, Vec2};

/// Determinant magnitude below which a matrix is treated as singular.
pub const DETERMINANT_EPSILON: f64 = 1e-12;

/// The local transform components of a node.
///
/// The matrix built by [`to_affine`](Self::to_affine) applies, in order:
/// translate by `-pivot`, scale, skew, rotate, translate by `position`.
/// Every node in the tree relies on this order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocalTransform {
    /// Translation applied last.
    pub position: Vec2,
    /// Non-uniform scale factors.
    pub scale: Vec2,
    /// Rotation in radians.
    pub rotation: f64,
    /// Skew angles in radians: `x` shears along the x axis, `y` along y.
    pub skew: Vec2,
    /// Local point that position, scale, and rotation are relative to.
    pub pivot: Vec2,
}

impl LocalTransform {
    /// Position and pivot at the origin, unit scale, no rotation or skew.
    pub const IDENTITY: Self = Self {
        position: Vec2::ZERO,
        scale: Vec2::new(1.0, 1.0),
        rotation: 0.0,
        skew: Vec2::ZERO,
        pivot: Vec2::ZERO,
    };

    /// Builds the affine matrix for these components.
    ///
    /// The skew tangents are folded into the linear terms before rotation:
    /// `L = R(rotation) · K(tan skew.x, tan skew.y) · S(scale)`, then the
    /// translation is chosen so that `pivot` lands on `position`.
    #[must_use]
    pub fn to_affine(&self) -> Affine {
        let (sin, cos) = (self.rotation.sin(), self.rotation.cos());
        let kx = self.skew.x.tan();
        let ky = self.skew.y.tan();
        let (sx, sy) = (self.scale.x, self.scale.y);

        let a = sx * (cos - sin * ky);
        let b = sx * (sin + cos * ky);
        let c = sy * (cos * kx - sin);
        let d = sy * (sin * kx + cos);

        let tx = self.position.x - (a * self.pivot.x + c * self.pivot.y);
        let ty = self.position.y - (b * self.pivot.x + d * self.pivot.y);
        Affine::new([a, b, c, d, tx, ty])
    }
}

impl Default for LocalTransform {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Composes `parent ∘ child`: the child is applied first.
#[inline]
#[must_use]
pub fn multiply(parent: Affine, child: Affine) -> Affine {
    parent * child
}

/// Inverts `m`, returning the identity when the matrix is singular.
///
/// Coordinate conversion for input handling goes through here, so a
/// zero-scaled node never poisons hit-testing with NaNs.
#[must_use]
pub fn invert_or_identity(m: Affine) -> Affine {
    if m.determinant().abs() < DETERMINANT_EPSILON {
        Affine::IDENTITY
    } else {
        m.inverse()
    }
}

/// Maps `p` through `m`.
#[inline]
#[must_use]
pub fn apply(m: Affine, p: Point) -> Point {
    m * p
}

/// Returns whether two matrices agree coefficient-wise within `eps`.
#[must_use]
pub fn approx_eq(a: Affine, b: Affine, eps: f64) -> bool {
    a.as_coeffs()
        .iter()
        .zip(b.as_coeffs().iter())
        .all(|(x, y)| (x - y).abs() <= eps)
}
