// Copyright 2026 the Sylva Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hit shapes for interactive nodes.
//!
//! A node without a shape is hit-tested against the axis-aligned box
//! `(0, 0)..(width, height)` of its intrinsic size. Attaching a [`HitShape`]
//! replaces that box. All tests run in the node's local space.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use kurbo::{Circle, Point, Rect};

/// Anything that can answer "does this local point lie inside me".
///
/// Implement this to attach a custom shape via [`HitShape::Custom`].
pub trait HitTest {
    /// Returns whether `pt`, in the node's local space, is inside the shape.
    fn contains(&self, pt: Point) -> bool;
}

/// A node's hit region in local coordinates.
pub enum HitShape {
    /// An axis-aligned rectangle (edges inclusive).
    Rect(Rect),
    /// A circle (boundary inclusive).
    Circle(Circle),
    /// A convex polygon, vertices in either winding order.
    Polygon(Vec<Point>),
    /// An externally defined shape.
    Custom(Box<dyn HitTest>),
}

impl fmt::Debug for HitShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rect(r) => f.debug_tuple("Rect").field(r).finish(),
            Self::Circle(c) => f.debug_tuple("Circle").field(c).finish(),
            Self::Polygon(pts) => f.debug_tuple("Polygon").field(pts).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl HitTest for HitShape {
    fn contains(&self, pt: Point) -> bool {
        match self {
            Self::Rect(r) => rect_contains(*r, pt),
            Self::Circle(c) => (pt - c.center).hypot2() <= c.radius * c.radius,
            Self::Polygon(pts) => convex_contains(pts, pt),
            Self::Custom(shape) => shape.contains(pt),
        }
    }
}

/// Inclusive rectangle containment.
///
/// `kurbo::Rect::contains` excludes the far edges; sprites are hit on their
/// full extent here.
pub(crate) fn rect_contains(r: Rect, pt: Point) -> bool {
    let r = r.abs();
    pt.x >= r.x0 && pt.x <= r.x1 && pt.y >= r.y0 && pt.y <= r.y1
}

/// Point-in-convex-polygon: every edge cross product has the same sign.
fn convex_contains(pts: &[Point], pt: Point) -> bool {
    if pts.len() < 3 {
        return false;
    }
    let mut sign = 0.0_f64;
    for (i, &a) in pts.iter().enumerate() {
        let b = pts[(i + 1) % pts.len()];
        let cross = (b - a).cross(pt - a);
        if cross == 0.0 {
            continue;
        }
        if sign == 0.0 {
            sign = cross;
        } else if (sign > 0.0) != (cross > 0.0) {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    #[test]
    fn rect_includes_edges() {
        let shape = HitShape::Rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(shape.contains(Point::new(10.0, 10.0)));
        assert!(shape.contains(Point::new(0.0, 5.0)));
        assert!(!shape.contains(Point::new(10.5, 5.0)));
    }

    #[test]
    fn circle_contains() {
        let shape = HitShape::Circle(Circle::new((5.0, 5.0), 2.0));
        assert!(shape.contains(Point::new(6.0, 6.0)));
        assert!(shape.contains(Point::new(7.0, 5.0)));
        assert!(!shape.contains(Point::new(7.5, 7.5)));
    }

    #[test]
    fn polygon_either_winding() {
        let cw = vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 10.0),
            Point::new(10.0, 10.0),
            Point::new(10.0, 0.0),
        ];
        let mut ccw = cw.clone();
        ccw.reverse();
        for pts in [cw, ccw] {
            let shape = HitShape::Polygon(pts);
            assert!(shape.contains(Point::new(5.0, 5.0)));
            assert!(!shape.contains(Point::new(-1.0, 5.0)));
        }
    }

    #[test]
    fn degenerate_polygon_never_hits() {
        let shape = HitShape::Polygon(vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)]);
        assert!(!shape.contains(Point::new(0.5, 0.5)));
    }

    #[test]
    fn custom_shape_delegates() {
        struct UpperHalf;
        impl HitTest for UpperHalf {
            fn contains(&self, pt: Point) -> bool {
                pt.y < 0.0
            }
        }
        let shape = HitShape::Custom(Box::new(UpperHalf));
        assert!(shape.contains(Point::new(100.0, -1.0)));
        assert!(!shape.contains(Point::new(0.0, 1.0)));
    }
}
