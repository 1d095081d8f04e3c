// Copyright 2026 the Sylva Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node tree data model.
//!
//! A *node* is an element of the scene tree. Each node has:
//!
//! - An identity ([`NodeId`]), a generational handle that goes stale when the
//!   node is disposed.
//! - Topology: one parent and an ordered child list. The child list is the
//!   insertion order; paint and hit order additionally sort by
//!   [`z_index`](NodeTree::set_z_index).
//! - **Local properties** set by the caller: position, scale, rotation, skew,
//!   pivot, alpha, visibility, and visual state ([`NodeKind`], tint, blend,
//!   texture).
//! - **Computed properties** produced by
//!   [`update_transforms`](NodeTree::update_transforms): the world transform
//!   (product of ancestor local transforms) and world alpha (product of
//!   ancestor alphas).
//!
//! Nodes are stored in struct-of-arrays layout with index-based handles.
//!
//! # Dirty tracking
//!
//! Transform and alpha setters set the node's own flag. Propagation recomputes
//! a node when its own flag is set *or* its parent was recomputed this pass,
//! so marking a single ancestor is enough to refresh its whole subtree.
//!
//! Mutations also invalidate the nearest auto-mode subtree cache (see
//! [`cache`](crate::cache)). Transform and alpha changes start looking at the
//! parent, since a cache is replayed with its own node's current world
//! transform and alpha.

mod error;
mod id;
mod kind;
mod propagate;
mod store;
mod traverse;

pub use error::TreeError;
pub use id::{INVALID, NodeId, ResourceId};
pub use kind::{BlendMode, Color, NodeFlags, NodeKind, TextureRegion};
pub use propagate::TransformChanges;
pub use store::NodeTree;
pub use traverse::Children;
