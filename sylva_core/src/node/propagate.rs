// Copyright 2026 the Sylva Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Transform and alpha propagation.
//!
//! A single depth-first pass from a root. Each node carries a "recompute"
//! decision down to its children:
//!
//! 1. A node is recomputed when its own dirty flag is set or its parent was
//!    recomputed in this pass.
//! 2. Recomputing writes `world = parent_world * local` (and the alpha product)
//!    and clears the node's own flag.
//! 3. Clean subtrees under clean parents are still walked, but cost one branch
//!    per node.
//!
//! Invisible nodes are walked like any other: their world transforms stay
//! current, so showing them again needs no extra work.
//!
//! [`TransformChanges`] uses raw slot indices (`u32`) so renderers can read
//! the SoA arrays through the `*_at()` accessors without generation checks.

use alloc::vec::Vec;

use kurbo::Affine;

use super::id::{INVALID, NodeId};
use super::store::NodeTree;
use crate::transform;

/// The set of nodes recomputed by one
/// [`NodeTree::update_transforms`] call.
#[derive(Clone, Debug, Default)]
pub struct TransformChanges {
    /// Nodes whose world transform was recomputed, in pre-order.
    pub transforms: Vec<u32>,
    /// Nodes whose world alpha was recomputed, in pre-order.
    pub alphas: Vec<u32>,
}

impl TransformChanges {
    /// Clears all change lists.
    pub fn clear(&mut self) {
        self.transforms.clear();
        self.alphas.clear();
    }

    /// Returns whether nothing was recomputed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty() && self.alphas.is_empty()
    }
}

impl NodeTree {
    /// Brings every world transform and world alpha under `root` up to date.
    ///
    /// A root with a parent composes onto the parent's stored world values;
    /// a detached root composes onto the identity and full opacity.
    pub fn update_transforms(&mut self, root: NodeId) -> TransformChanges {
        let mut changes = TransformChanges::default();
        self.update_transforms_into(root, &mut changes);
        changes
    }

    /// Like [`update_transforms`](Self::update_transforms), but reuses a
    /// caller-provided buffer.
    pub fn update_transforms_into(&mut self, root: NodeId, changes: &mut TransformChanges) {
        changes.clear();
        let Some(root) = self.slot(root) else {
            return;
        };

        // (slot, parent transform recomputed, parent alpha recomputed)
        let mut stack: Vec<(u32, bool, bool)> = Vec::new();
        stack.push((root as u32, false, false));

        while let Some((idx, parent_moved, parent_faded)) = stack.pop() {
            let i = idx as usize;
            let parent = self.parent[i];

            let moved = parent_moved || self.dirty[i].transform;
            if moved {
                let parent_world = if parent != INVALID {
                    self.world_transform[parent as usize]
                } else {
                    Affine::IDENTITY
                };
                self.world_transform[i] = transform::multiply(parent_world, self.local[i].to_affine());
                self.dirty[i].transform = false;
                changes.transforms.push(idx);
            }

            let faded = parent_faded || self.dirty[i].alpha;
            if faded {
                let parent_alpha = if parent != INVALID {
                    self.world_alpha[parent as usize]
                } else {
                    1.0
                };
                self.world_alpha[i] = parent_alpha * self.alpha[i];
                self.dirty[i].alpha = false;
                changes.alphas.push(idx);
            }

            // Reverse so the first child is visited first.
            for &c in self.children[i].iter().rev() {
                stack.push((c, moved, faded));
            }
        }
    }
}
