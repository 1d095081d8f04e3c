// Copyright 2026 the Sylva Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use super::id::NodeId;
use super::store::NodeTree;

/// An iterator over the direct children of a node, in child-list order.
///
/// Created by [`NodeTree::children`].
#[derive(Debug)]
pub struct Children<'a> {
    tree: &'a NodeTree,
    slots: core::slice::Iter<'a, u32>,
}

impl<'a> Children<'a> {
    pub(crate) fn new(tree: &'a NodeTree, slots: &'a [u32]) -> Self {
        Self {
            tree,
            slots: slots.iter(),
        }
    }
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let &idx = self.slots.next()?;
        Some(NodeId {
            idx,
            generation: self.tree.generation[idx as usize],
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.slots.size_hint()
    }
}

impl ExactSizeIterator for Children<'_> {}

impl DoubleEndedIterator for Children<'_> {
    fn next_back(&mut self) -> Option<NodeId> {
        let &idx = self.slots.next_back()?;
        Some(NodeId {
            idx,
            generation: self.tree.generation[idx as usize],
        })
    }
}
