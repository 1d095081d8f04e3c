// Copyright 2026 the Sylva Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hit-testing against the node tree.
//!
//! Candidates are collected depth-first in paint order, so the *last* entry
//! is the topmost painted node. A query scans that list backwards and returns
//! the first node whose hit region contains the point in its local space.

use alloc::vec::Vec;

use kurbo::{Point, Rect};

use crate::node::{NodeId, NodeTree};
use crate::shape::{self, HitTest};
use crate::transform;

impl NodeTree {
    /// Returns the topmost interactive node under `world` within the subtree
    /// at `root`.
    ///
    /// World transforms must be current.
    pub fn hit_test(&mut self, root: NodeId, world: Point) -> Option<NodeId> {
        let mut candidates = Vec::new();
        self.collect_interactive(root, &mut candidates);
        self.hit_test_in(&candidates, world)
    }

    /// Converts a world-space point into the local space of `id`.
    ///
    /// A node with a singular world transform maps points through the
    /// identity.
    #[must_use]
    pub fn to_local(&self, id: NodeId, world: Point) -> Point {
        match self.slot(id) {
            Some(i) => transform::apply(transform::invert_or_identity(self.world_transform[i]), world),
            None => world,
        }
    }

    /// Converts a point in the local space of `id` into world space.
    #[must_use]
    pub fn to_world(&self, id: NodeId, local: Point) -> Point {
        match self.slot(id) {
            Some(i) => transform::apply(self.world_transform[i], local),
            None => local,
        }
    }

    /// Collects the slots of every hit-testable node under `root`, in paint
    /// order.
    ///
    /// Invisible nodes are skipped with their subtrees. A node contributes
    /// descendants only while it is interactive itself and has
    /// `interactive_children` set, so one non-interactive ancestor prunes the
    /// whole branch. Containers start interactive for this reason.
    pub(crate) fn collect_interactive(&mut self, root: NodeId, out: &mut Vec<u32>) {
        out.clear();
        let Some(root) = self.slot(root) else {
            return;
        };
        let mut stack = alloc::vec![root as u32];
        while let Some(idx) = stack.pop() {
            let i = idx as usize;
            let flags = self.flags[i];
            if !flags.visible {
                continue;
            }
            if !flags.interactive {
                continue;
            }
            out.push(idx);
            if flags.interactive_children {
                self.ensure_sorted(i);
                // Reverse so the first child in paint order pops first.
                stack.extend(self.paint_order[i].iter().rev());
            }
        }
    }

    /// Scans `candidates` from topmost to bottommost.
    ///
    /// A node whose world transform is singular has collapsed to a line or a
    /// point and is never hit. A node without a custom shape and with zero
    /// area is never hit either.
    pub(crate) fn hit_test_in(&self, candidates: &[u32], world: Point) -> Option<NodeId> {
        candidates.iter().rev().copied().find_map(|idx| {
            let i = idx as usize;
            let world_transform = self.world_transform[i];
            if world_transform.determinant().abs() < transform::DETERMINANT_EPSILON {
                return None;
            }
            let local = transform::apply(world_transform.inverse(), world);
            let hit = match &self.cold[i].shape {
                Some(shape) => shape.contains(local),
                None => {
                    let size = self.visual[i].size;
                    !size.is_zero_area()
                        && shape::rect_contains(Rect::from_origin_size(Point::ORIGIN, size), local)
                }
            };
            hit.then(|| self.handle(idx))
        })
    }
}

#[cfg(test)]
mod tests {
    use kurbo::{Circle, Size};

    use super::*;
    use crate::shape::HitShape;

    fn interactive_box(tree: &mut NodeTree, parent: NodeId, size: f64) -> NodeId {
        let id = tree.create(crate::node::NodeKind::Sprite);
        tree.set_size(id, Size::new(size, size));
        tree.set_interactive(id, true);
        tree.add_child(parent, id);
        id
    }

    #[test]
    fn later_sibling_wins() {
        let mut tree = NodeTree::new();
        let root = tree.create_container();
        let a = interactive_box(&mut tree, root, 100.0);
        let b = interactive_box(&mut tree, root, 100.0);
        let _ = tree.update_transforms(root);
        assert_eq!(tree.hit_test(root, Point::new(50.0, 50.0)), Some(b));

        tree.set_z_index(a, 1);
        assert_eq!(tree.hit_test(root, Point::new(50.0, 50.0)), Some(a));
    }

    #[test]
    fn miss_returns_none() {
        let mut tree = NodeTree::new();
        let root = tree.create_container();
        let _ = interactive_box(&mut tree, root, 10.0);
        let _ = tree.update_transforms(root);
        assert_eq!(tree.hit_test(root, Point::new(50.0, 50.0)), None);
    }

    #[test]
    fn hit_uses_local_space() {
        let mut tree = NodeTree::new();
        let root = tree.create_container();
        let a = interactive_box(&mut tree, root, 10.0);
        tree.set_position(a, (100.0, 100.0));
        tree.set_scale(a, (2.0, 2.0));
        let _ = tree.update_transforms(root);
        assert_eq!(tree.hit_test(root, Point::new(119.0, 119.0)), Some(a));
        assert_eq!(tree.hit_test(root, Point::new(95.0, 95.0)), None);
        assert_eq!(tree.to_local(a, Point::new(110.0, 104.0)), Point::new(5.0, 2.0));
    }

    #[test]
    fn collapsed_node_is_never_hit() {
        let mut tree = NodeTree::new();
        let root = tree.create_container();
        let a = interactive_box(&mut tree, root, 100.0);
        tree.set_position(a, (500.0, 500.0));
        tree.set_scale(a, (0.0, 0.0));
        let _ = tree.update_transforms(root);
        assert_eq!(tree.hit_test(root, Point::new(50.0, 50.0)), None);
        assert_eq!(tree.hit_test(root, Point::new(500.0, 500.0)), None);

        tree.set_scale(a, (1.0, 1.0));
        let _ = tree.update_transforms(root);
        assert_eq!(tree.hit_test(root, Point::new(550.0, 550.0)), Some(a));
    }

    #[test]
    fn non_interactive_ancestor_prunes_branch() {
        let mut tree = NodeTree::new();
        let root = tree.create_container();
        let group = tree.create_container();
        tree.add_child(root, group);
        let inner = interactive_box(&mut tree, group, 100.0);
        let _ = tree.update_transforms(root);
        let pt = Point::new(50.0, 50.0);
        assert_eq!(tree.hit_test(root, pt), Some(inner));

        tree.set_interactive(group, false);
        assert_eq!(tree.hit_test(root, pt), None);

        // A non-interactive sprite blocks its interactive children too.
        tree.set_interactive(group, true);
        let plain = tree.create(crate::node::NodeKind::Sprite);
        tree.set_size(plain, Size::new(100.0, 100.0));
        tree.add_child(root, plain);
        let nested = interactive_box(&mut tree, plain, 10.0);
        let _ = tree.update_transforms(root);
        assert_eq!(tree.hit_test(root, Point::new(5.0, 5.0)), Some(inner));
        tree.set_interactive(plain, true);
        assert_eq!(tree.hit_test(root, Point::new(5.0, 5.0)), Some(nested));
    }

    #[test]
    fn empty_container_has_no_area() {
        let mut tree = NodeTree::new();
        let root = tree.create_container();
        let _ = tree.update_transforms(root);
        assert!(tree.flags(root).interactive, "containers start interactive");
        assert_eq!(tree.hit_test(root, Point::ORIGIN), None);

        tree.set_hit_shape(root, Some(HitShape::Circle(Circle::new((0.0, 0.0), 5.0))));
        assert_eq!(tree.hit_test(root, Point::new(1.0, 1.0)), Some(root));
    }

    #[test]
    fn custom_shape_overrides_box() {
        let mut tree = NodeTree::new();
        let root = tree.create_container();
        let a = interactive_box(&mut tree, root, 100.0);
        tree.set_hit_shape(a, Some(HitShape::Circle(Circle::new((50.0, 50.0), 10.0))));
        let _ = tree.update_transforms(root);
        assert_eq!(tree.hit_test(root, Point::new(55.0, 55.0)), Some(a));
        assert_eq!(tree.hit_test(root, Point::new(5.0, 5.0)), None);
    }

    #[test]
    fn hidden_or_blocked_subtrees_are_skipped() {
        let mut tree = NodeTree::new();
        let root = tree.create_container();
        let group = tree.create_container();
        tree.add_child(root, group);
        let inner = interactive_box(&mut tree, group, 10.0);
        let _ = tree.update_transforms(root);
        let pt = Point::new(5.0, 5.0);
        assert_eq!(tree.hit_test(root, pt), Some(inner));

        tree.set_interactive_children(group, false);
        assert_eq!(tree.hit_test(root, pt), None);
        tree.set_interactive_children(group, true);
        tree.set_visible(group, false);
        assert_eq!(tree.hit_test(root, pt), None);
    }

    #[test]
    fn child_is_above_parent() {
        let mut tree = NodeTree::new();
        let root = tree.create_container();
        let parent = interactive_box(&mut tree, root, 100.0);
        let child = interactive_box(&mut tree, parent, 10.0);
        let _ = tree.update_transforms(root);
        assert_eq!(tree.hit_test(root, Point::new(5.0, 5.0)), Some(child));
        assert_eq!(tree.hit_test(root, Point::new(50.0, 50.0)), Some(parent));
    }
}
