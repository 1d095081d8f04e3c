// Copyright 2026 the Sylva Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Structural errors reported by the fallible tree operations.

use core::fmt;

/// Why a topology change was refused.
///
/// The `try_*` operations on [`NodeTree`](super::NodeTree) return these and
/// leave the tree untouched. Their panicking counterparts panic with the
/// [`Display`](fmt::Display) text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeError {
    /// The child is the parent itself or one of its ancestors.
    Cycle,
    /// The node is not a child of the given parent.
    NotAChild,
    /// A child index is past the end of the child list.
    IndexOutOfBounds {
        /// The requested index.
        index: usize,
        /// The number of children at the time of the call.
        len: usize,
    },
    /// A handle refers to a disposed node.
    Disposed,
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cycle => f.write_str("cannot add a node to itself or to one of its descendants"),
            Self::NotAChild => f.write_str("node is not a child of the given parent"),
            Self::IndexOutOfBounds { index, len } => {
                write!(f, "child index {index} out of bounds (len {len})")
            }
            Self::Disposed => f.write_str("node has been disposed"),
        }
    }
}

impl core::error::Error for TreeError {}
