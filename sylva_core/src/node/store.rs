// Copyright 2026 the Sylva Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays node storage with allocation, topology, and property management.

use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;

use kurbo::{Affine, Size, Vec2};

use super::error::TreeError;
use super::id::{INVALID, NodeId, ResourceId};
use super::kind::{BlendMode, Color, DirtyBits, NodeFlags, NodeKind, TextureRegion, Visual};
use super::traverse::Children;
use crate::cache::SubtreeCache;
use crate::debug::DebugContext;
use crate::interaction::{EventContext, EventKind, Handler, InteractionEvent, NodeHandlers};
use crate::shape::HitShape;
use crate::transform::LocalTransform;

/// Rarely touched per-node state, kept out of the hot arrays.
#[derive(Debug, Default)]
pub(crate) struct NodeCold {
    pub(crate) shape: Option<HitShape>,
    pub(crate) handlers: NodeHandlers,
    pub(crate) entity: u32,
    pub(crate) image: Option<ResourceId>,
    pub(crate) offscreen: Option<ResourceId>,
}

/// Struct-of-arrays storage for every node of one scene.
///
/// Nodes are addressed by [`NodeId`] handles. Disposed slots are recycled via
/// a free list; the generation counter bumped at disposal keeps old handles
/// from reaching the new occupant.
///
/// Hot state (topology, transforms, flags) lives in parallel arrays walked by
/// propagation and hit-testing. Callbacks, hit shapes, and subtree caches live
/// in separate cold columns.
#[derive(Debug)]
pub struct NodeTree {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) children: Vec<Vec<u32>>,
    pub(crate) paint_order: Vec<Vec<u32>>,

    // -- Local properties (set by callers) --
    pub(crate) local: Vec<LocalTransform>,
    pub(crate) alpha: Vec<f64>,
    pub(crate) z_index: Vec<i32>,
    pub(crate) flags: Vec<NodeFlags>,
    pub(crate) dirty: Vec<DirtyBits>,

    // -- Computed properties (written by update_transforms) --
    pub(crate) world_transform: Vec<Affine>,
    pub(crate) world_alpha: Vec<f64>,

    // -- Cold columns --
    pub(crate) visual: Vec<Visual>,
    pub(crate) cold: Vec<NodeCold>,
    pub(crate) cache: Vec<Option<Box<SubtreeCache>>>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) alive: Vec<bool>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    pub(crate) debug: DebugContext,
    pub(crate) pending_released: Vec<ResourceId>,
}

impl Default for NodeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeTree {
    /// Creates an empty tree with the default [`DebugContext`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_debug(DebugContext::default())
    }

    /// Creates an empty tree with the given debug context.
    #[must_use]
    pub fn with_debug(debug: DebugContext) -> Self {
        Self {
            parent: Vec::new(),
            children: Vec::new(),
            paint_order: Vec::new(),
            local: Vec::new(),
            alpha: Vec::new(),
            z_index: Vec::new(),
            flags: Vec::new(),
            dirty: Vec::new(),
            world_transform: Vec::new(),
            world_alpha: Vec::new(),
            visual: Vec::new(),
            cold: Vec::new(),
            cache: Vec::new(),
            generation: Vec::new(),
            alive: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            debug,
            pending_released: Vec::new(),
        }
    }

    /// Returns this tree's debug context.
    #[must_use]
    pub fn debug_context(&self) -> DebugContext {
        self.debug
    }

    /// Replaces this tree's debug context.
    pub fn set_debug_context(&mut self, debug: DebugContext) {
        self.debug = debug;
    }

    // -- Allocation API --

    /// Creates a detached node of the given kind and returns its handle.
    ///
    /// The node starts visible and renderable with full opacity, unit scale
    /// and its transform marked dirty. Only containers start interactive.
    pub fn create(&mut self, kind: NodeKind) -> NodeId {
        let idx = if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot; its generation was bumped at disposal.
            let i = idx as usize;
            self.parent[i] = INVALID;
            self.children[i].clear();
            self.paint_order[i].clear();
            self.local[i] = LocalTransform::IDENTITY;
            self.alpha[i] = 1.0;
            self.z_index[i] = 0;
            self.flags[i] = NodeFlags::for_kind(kind);
            self.dirty[i] = DirtyBits::NEW;
            self.world_transform[i] = Affine::IDENTITY;
            self.world_alpha[i] = 1.0;
            self.visual[i] = Visual::default();
            self.cold[i] = NodeCold::default();
            self.cache[i] = None;
            self.alive[i] = true;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.children.push(Vec::new());
            self.paint_order.push(Vec::new());
            self.local.push(LocalTransform::IDENTITY);
            self.alpha.push(1.0);
            self.z_index.push(0);
            self.flags.push(NodeFlags::for_kind(kind));
            self.dirty.push(DirtyBits::NEW);
            self.world_transform.push(Affine::IDENTITY);
            self.world_alpha.push(1.0);
            self.visual.push(Visual::default());
            self.cold.push(NodeCold::default());
            self.cache.push(None);
            self.generation.push(0);
            self.alive.push(true);
            idx
        };
        self.visual[idx as usize].kind = kind;
        self.handle(idx)
    }

    /// Creates a detached container node.
    pub fn create_container(&mut self) -> NodeId {
        self.create(NodeKind::Container)
    }

    /// Creates a detached sprite showing `texture` at `size`.
    pub fn create_sprite(&mut self, texture: TextureRegion, size: Size) -> NodeId {
        let id = self.create(NodeKind::Sprite);
        let visual = &mut self.visual[id.idx as usize];
        visual.texture = Some(texture);
        visual.size = size;
        id
    }

    /// Disposes a node and its whole subtree.
    ///
    /// Detaches the node from its parent, disposes every descendant, queues
    /// owned resources for release, and drops hit shapes, callbacks, and
    /// caches. Disposing an already disposed handle does nothing.
    pub fn dispose(&mut self, id: NodeId) {
        if !self.is_alive(id) {
            return;
        }
        let idx = id.idx as usize;
        if self.parent[idx] != INVALID {
            self.detach(idx);
        }
        let mut stack = vec![id.idx];
        while let Some(i) = stack.pop() {
            let i = i as usize;
            stack.append(&mut self.children[i]);
            self.release_slot(i);
        }
    }

    /// Returns whether the given handle refers to a live node.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        id.idx < self.len
            && self.generation[id.idx as usize] == id.generation
            && self.alive[id.idx as usize]
    }

    /// Returns the number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len as usize - self.free_list.len()
    }

    /// Returns whether the tree holds no live nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drains the resources released by disposal or replacement since the
    /// last call.
    pub fn take_released_resources(&mut self) -> Vec<ResourceId> {
        core::mem::take(&mut self.pending_released)
    }

    // -- Topology API --

    /// Appends `child` to `parent`'s children, detaching it from any previous
    /// parent first.
    ///
    /// # Panics
    ///
    /// Panics if `child` is `parent` or one of its ancestors, or if either
    /// handle is stale.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        let index = self.slot(parent).map_or(0, |p| self.children[p].len());
        self.add_child_at(parent, child, index);
    }

    /// Fallible form of [`add_child`](Self::add_child).
    pub fn try_add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        let p = self.resolve(parent)?;
        let index = self.children[p].len();
        self.try_add_child_at(parent, child, index)
    }

    /// Inserts `child` at `index` among `parent`'s children.
    ///
    /// # Panics
    ///
    /// Panics on a cycle, an index past the end, or a stale handle.
    pub fn add_child_at(&mut self, parent: NodeId, child: NodeId, index: usize) {
        if let Err(err) = self.try_add_child_at(parent, child, index) {
            self.structural_failure(err);
        }
    }

    /// Fallible form of [`add_child_at`](Self::add_child_at).
    ///
    /// On error the tree is left untouched.
    pub fn try_add_child_at(
        &mut self,
        parent: NodeId,
        child: NodeId,
        index: usize,
    ) -> Result<(), TreeError> {
        let p = self.resolve(parent)?;
        let c = self.resolve(child)?;
        if self.is_ancestor_or_self(c, p) {
            return Err(TreeError::Cycle);
        }
        let len = self.children[p].len();
        if index > len {
            return Err(TreeError::IndexOutOfBounds { index, len });
        }

        if self.parent[c] != INVALID {
            self.detach(c);
        }
        let index = index.min(self.children[p].len());
        self.children[p].insert(index, c as u32);
        self.parent[c] = p as u32;

        self.dirty[c].transform = true;
        self.dirty[c].alpha = true;
        self.dirty[p].children_sorted = false;
        self.invalidate_from(p);

        if self.debug.enabled {
            self.debug.check_children(self.children[p].len());
            self.debug.check_depth(self.deepest_depth(c));
        }
        Ok(())
    }

    /// Detaches `child` from `parent` without disposing it.
    ///
    /// # Panics
    ///
    /// Panics if `child` is not a child of `parent`, or on a stale handle.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        if let Err(err) = self.try_remove_child(parent, child) {
            self.structural_failure(err);
        }
    }

    /// Fallible form of [`remove_child`](Self::remove_child).
    pub fn try_remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        let p = self.resolve(parent)?;
        let c = self.resolve(child)?;
        if self.parent[c] != p as u32 {
            return Err(TreeError::NotAChild);
        }
        self.detach(c);
        Ok(())
    }

    /// Detaches and returns the child at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds, or on a stale handle.
    pub fn remove_child_at(&mut self, parent: NodeId, index: usize) -> Option<NodeId> {
        match self.try_remove_child_at(parent, index) {
            Ok(id) => Some(id),
            Err(err) => {
                self.structural_failure(err);
                None
            }
        }
    }

    /// Fallible form of [`remove_child_at`](Self::remove_child_at).
    pub fn try_remove_child_at(&mut self, parent: NodeId, index: usize) -> Result<NodeId, TreeError> {
        let p = self.resolve(parent)?;
        let len = self.children[p].len();
        let Some(&c) = self.children[p].get(index) else {
            return Err(TreeError::IndexOutOfBounds { index, len });
        };
        self.detach(c as usize);
        Ok(self.handle(c))
    }

    /// Detaches a node from its parent, if it has one. Returns whether it was
    /// attached.
    pub fn remove_from_parent(&mut self, child: NodeId) -> bool {
        let Some(c) = self.slot(child) else {
            return false;
        };
        if self.parent[c] == INVALID {
            return false;
        }
        self.detach(c);
        true
    }

    /// Detaches every child of `parent` and returns them in order.
    pub fn remove_children(&mut self, parent: NodeId) -> Vec<NodeId> {
        let Some(p) = self.slot(parent) else {
            return Vec::new();
        };
        let removed = core::mem::take(&mut self.children[p]);
        for &c in &removed {
            let c = c as usize;
            self.parent[c] = INVALID;
            self.dirty[c].transform = true;
            self.dirty[c].alpha = true;
        }
        self.paint_order[p].clear();
        self.dirty[p].children_sorted = false;
        self.invalidate_from(p);
        removed.into_iter().map(|c| self.handle(c)).collect()
    }

    /// Moves `child` to position `index` among its siblings.
    ///
    /// # Panics
    ///
    /// Panics if `child` is not a child of `parent` or `index` is out of
    /// bounds, or on a stale handle.
    pub fn set_child_index(&mut self, parent: NodeId, child: NodeId, index: usize) {
        if let Err(err) = self.try_set_child_index(parent, child, index) {
            self.structural_failure(err);
        }
    }

    /// Fallible form of [`set_child_index`](Self::set_child_index).
    pub fn try_set_child_index(
        &mut self,
        parent: NodeId,
        child: NodeId,
        index: usize,
    ) -> Result<(), TreeError> {
        let p = self.resolve(parent)?;
        let c = self.resolve(child)?;
        let Some(pos) = self.children[p].iter().position(|&x| x == c as u32) else {
            return Err(TreeError::NotAChild);
        };
        let len = self.children[p].len();
        if index >= len {
            return Err(TreeError::IndexOutOfBounds { index, len });
        }
        if pos != index {
            let moved = self.children[p].remove(pos);
            self.children[p].insert(index, moved);
            self.dirty[p].children_sorted = false;
            self.invalidate_from(p);
        }
        Ok(())
    }

    /// Returns the parent of a node, if any.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        let i = self.slot(id)?;
        let p = self.parent[i];
        (p != INVALID).then(|| self.handle(p))
    }

    /// Returns an iterator over the direct children of a node, in insertion
    /// order (not z-order).
    #[must_use]
    pub fn children(&self, id: NodeId) -> Children<'_> {
        match self.slot(id) {
            Some(i) => Children::new(self, &self.children[i]),
            None => Children::new(self, &[]),
        }
    }

    /// Returns the number of direct children.
    #[must_use]
    pub fn child_count(&self, id: NodeId) -> usize {
        self.slot(id).map_or(0, |i| self.children[i].len())
    }

    /// Returns the child at `index`, if any.
    #[must_use]
    pub fn child_at(&self, id: NodeId, index: usize) -> Option<NodeId> {
        let i = self.slot(id)?;
        self.children[i].get(index).map(|&c| self.handle(c))
    }

    /// Returns the position of `child` among `parent`'s children.
    #[must_use]
    pub fn child_index(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        let p = self.slot(parent)?;
        let c = self.slot(child)?;
        self.children[p].iter().position(|&x| x == c as u32)
    }

    /// Returns whether `ancestor` is a strict ancestor of `node`.
    #[must_use]
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        match (self.slot(ancestor), self.slot(node)) {
            (Some(a), Some(n)) => a != n && self.is_ancestor_or_self(a, n),
            _ => false,
        }
    }

    /// Returns the number of ancestors of a node.
    #[must_use]
    pub fn depth(&self, id: NodeId) -> usize {
        self.slot(id).map_or(0, |i| self.depth_of(i))
    }

    // -- Transform properties --

    /// Returns the local transform components of a node.
    #[must_use]
    pub fn local_transform(&self, id: NodeId) -> LocalTransform {
        self.slot(id)
            .map_or(LocalTransform::IDENTITY, |i| self.local[i])
    }

    /// Replaces all local transform components at once.
    pub fn set_local_transform(&mut self, id: NodeId, local: LocalTransform) {
        if let Some(i) = self.slot(id) {
            self.local[i] = local;
            self.touch_transform(i);
        }
    }

    /// Returns the position of a node.
    #[must_use]
    pub fn position(&self, id: NodeId) -> Vec2 {
        self.local_transform(id).position
    }

    /// Sets the position of a node.
    pub fn set_position(&mut self, id: NodeId, position: impl Into<Vec2>) {
        if let Some(i) = self.slot(id) {
            self.local[i].position = position.into();
            self.touch_transform(i);
        }
    }

    /// Sets the scale of a node.
    pub fn set_scale(&mut self, id: NodeId, scale: impl Into<Vec2>) {
        if let Some(i) = self.slot(id) {
            self.local[i].scale = scale.into();
            self.touch_transform(i);
        }
    }

    /// Sets the rotation of a node, in radians.
    pub fn set_rotation(&mut self, id: NodeId, radians: f64) {
        if let Some(i) = self.slot(id) {
            self.local[i].rotation = radians;
            self.touch_transform(i);
        }
    }

    /// Sets the skew angles of a node, in radians.
    pub fn set_skew(&mut self, id: NodeId, skew: impl Into<Vec2>) {
        if let Some(i) = self.slot(id) {
            self.local[i].skew = skew.into();
            self.touch_transform(i);
        }
    }

    /// Sets the pivot of a node, in local units.
    pub fn set_pivot(&mut self, id: NodeId, pivot: impl Into<Vec2>) {
        if let Some(i) = self.slot(id) {
            self.local[i].pivot = pivot.into();
            self.touch_transform(i);
        }
    }

    /// Returns the local opacity of a node.
    #[must_use]
    pub fn alpha(&self, id: NodeId) -> f64 {
        self.slot(id).map_or(1.0, |i| self.alpha[i])
    }

    /// Sets the local opacity of a node.
    pub fn set_alpha(&mut self, id: NodeId, alpha: f64) {
        if let Some(i) = self.slot(id) {
            self.alpha[i] = alpha;
            self.dirty[i].alpha = true;
            self.invalidate_above(i);
        }
    }

    /// Returns the computed world transform of a node.
    ///
    /// Only valid after [`update_transforms`](Self::update_transforms).
    #[must_use]
    pub fn world_transform(&self, id: NodeId) -> Affine {
        self.slot(id)
            .map_or(Affine::IDENTITY, |i| self.world_transform[i])
    }

    /// Returns the computed world opacity of a node.
    ///
    /// Only valid after [`update_transforms`](Self::update_transforms).
    #[must_use]
    pub fn world_alpha(&self, id: NodeId) -> f64 {
        self.slot(id).map_or(1.0, |i| self.world_alpha[i])
    }

    /// Returns whether the node's own transform flag is set.
    #[must_use]
    pub fn transform_dirty(&self, id: NodeId) -> bool {
        self.slot(id).is_some_and(|i| self.dirty[i].transform)
    }

    /// Returns whether the node's own alpha flag is set.
    #[must_use]
    pub fn alpha_dirty(&self, id: NodeId) -> bool {
        self.slot(id).is_some_and(|i| self.dirty[i].alpha)
    }

    // -- Ordering --

    /// Returns the z-index of a node.
    #[must_use]
    pub fn z_index(&self, id: NodeId) -> i32 {
        self.slot(id).map_or(0, |i| self.z_index[i])
    }

    /// Sets paint and hit priority among siblings. Higher values paint later
    /// and are hit first; ties keep child-list order.
    pub fn set_z_index(&mut self, id: NodeId, z_index: i32) {
        let Some(i) = self.slot(id) else {
            return;
        };
        if self.z_index[i] == z_index {
            return;
        }
        self.z_index[i] = z_index;
        let p = self.parent[i];
        if p != INVALID {
            self.dirty[p as usize].children_sorted = false;
            self.invalidate_from(p as usize);
        }
    }

    // -- Visual properties --

    /// Returns the kind of a node.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.slot(id).map_or(NodeKind::Container, |i| self.visual[i].kind)
    }

    /// Returns the flags of a node.
    #[must_use]
    pub fn flags(&self, id: NodeId) -> NodeFlags {
        self.slot(id).map_or(NodeFlags::default(), |i| self.flags[i])
    }

    /// Returns whether the node is visible.
    #[must_use]
    pub fn visible(&self, id: NodeId) -> bool {
        self.flags(id).visible
    }

    /// Shows or hides a node and its subtree.
    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        if let Some(i) = self.slot(id) {
            if self.flags[i].visible != visible {
                self.flags[i].visible = visible;
                self.invalidate_above(i);
            }
        }
    }

    /// Includes or excludes a node and its subtree from drawing.
    pub fn set_renderable(&mut self, id: NodeId, renderable: bool) {
        if let Some(i) = self.slot(id) {
            if self.flags[i].renderable != renderable {
                self.flags[i].renderable = renderable;
                self.invalidate_above(i);
            }
        }
    }

    /// Sets the tint color.
    pub fn set_tint(&mut self, id: NodeId, tint: Color) {
        if let Some(i) = self.slot(id) {
            self.visual[i].tint = tint;
            self.invalidate_from(i);
        }
    }

    /// Sets the blend mode.
    pub fn set_blend_mode(&mut self, id: NodeId, blend: BlendMode) {
        if let Some(i) = self.slot(id) {
            self.visual[i].blend = blend;
            self.invalidate_from(i);
        }
    }

    /// Sets the render layer forwarded to the renderer.
    pub fn set_render_layer(&mut self, id: NodeId, layer: i32) {
        if let Some(i) = self.slot(id) {
            self.visual[i].layer = layer;
            self.invalidate_from(i);
        }
    }

    /// Sets the paint-order tiebreak forwarded to the renderer.
    pub fn set_paint_order(&mut self, id: NodeId, order: i32) {
        if let Some(i) = self.slot(id) {
            self.visual[i].paint_order = order;
            self.invalidate_from(i);
        }
    }

    /// Returns the intrinsic size of a node.
    #[must_use]
    pub fn size(&self, id: NodeId) -> Size {
        self.slot(id).map_or(Size::ZERO, |i| self.visual[i].size)
    }

    /// Sets the intrinsic size, used for drawing and default hit boxes.
    pub fn set_size(&mut self, id: NodeId, size: Size) {
        if let Some(i) = self.slot(id) {
            self.visual[i].size = size;
            self.invalidate_from(i);
        }
    }

    /// Returns the texture region of a node.
    #[must_use]
    pub fn texture(&self, id: NodeId) -> Option<TextureRegion> {
        self.slot(id).and_then(|i| self.visual[i].texture)
    }

    /// Sets the texture region of a node.
    ///
    /// Switching frames on the same atlas page does not invalidate the
    /// enclosing subtree cache; the cached record is flagged animated and
    /// re-reads this node's region on every replay instead.
    pub fn set_texture(&mut self, id: NodeId, texture: Option<TextureRegion>) {
        let Some(i) = self.slot(id) else {
            return;
        };
        let old = core::mem::replace(&mut self.visual[i].texture, texture);
        let same_page = matches!((old, texture), (Some(a), Some(b)) if a.page == b.page);
        if same_page && self.register_animated_source(i) {
            return;
        }
        self.invalidate_from(i);
    }

    // -- Interaction properties --

    /// Makes a node take part in hit-testing, or not.
    pub fn set_interactive(&mut self, id: NodeId, interactive: bool) {
        if let Some(i) = self.slot(id) {
            self.flags[i].interactive = interactive;
        }
    }

    /// Allows or blocks hit-testing of a node's descendants.
    pub fn set_interactive_children(&mut self, id: NodeId, interactive: bool) {
        if let Some(i) = self.slot(id) {
            self.flags[i].interactive_children = interactive;
        }
    }

    /// Attaches or removes a custom hit shape.
    pub fn set_hit_shape(&mut self, id: NodeId, shape: Option<HitShape>) {
        if let Some(i) = self.slot(id) {
            self.cold[i].shape = shape;
        }
    }

    /// Returns whether a custom hit shape is attached.
    #[must_use]
    pub fn has_hit_shape(&self, id: NodeId) -> bool {
        self.slot(id).is_some_and(|i| self.cold[i].shape.is_some())
    }

    /// Returns the external entity identifier (0 means none).
    #[must_use]
    pub fn entity(&self, id: NodeId) -> u32 {
        self.slot(id).map_or(0, |i| self.cold[i].entity)
    }

    /// Sets the external entity identifier forwarded to the entity bridge.
    pub fn set_entity(&mut self, id: NodeId, entity: u32) {
        if let Some(i) = self.slot(id) {
            self.cold[i].entity = entity;
        }
    }

    /// Installs the node's callback for one event kind, replacing any previous
    /// one.
    ///
    /// The callback runs after scene handlers and before the entity bridge.
    pub fn set_handler(
        &mut self,
        id: NodeId,
        kind: EventKind,
        handler: impl FnMut(&mut EventContext<'_>, &InteractionEvent) + 'static,
    ) {
        if let Some(i) = self.slot(id) {
            self.cold[i].handlers.set(kind, Some(Box::new(handler)));
        }
    }

    /// Removes the node's callback for one event kind.
    pub fn clear_handler(&mut self, id: NodeId, kind: EventKind) {
        if let Some(i) = self.slot(id) {
            self.cold[i].handlers.set(kind, None);
        }
    }

    /// Returns whether the node has a callback for `kind`.
    #[must_use]
    pub fn has_handler(&self, id: NodeId, kind: EventKind) -> bool {
        self.slot(id)
            .is_some_and(|i| self.cold[i].handlers.is_set(kind))
    }

    /// Takes a callback out of a live node for the duration of a call.
    pub(crate) fn take_handler(&mut self, id: NodeId, kind: EventKind) -> Option<Handler> {
        if !self.is_alive(id) {
            return None;
        }
        self.cold[id.idx as usize].handlers.set(kind, None)
    }

    /// Puts a callback back unless the node died or got a new one meanwhile.
    pub(crate) fn restore_handler(&mut self, id: NodeId, kind: EventKind, handler: Handler) {
        if self.is_alive(id) && !self.cold[id.idx as usize].handlers.is_set(kind) {
            self.cold[id.idx as usize].handlers.set(kind, Some(handler));
        }
    }

    // -- Owned resources --

    /// Sets the image resource owned by this node. A replaced image is queued
    /// for release.
    pub fn set_image(&mut self, id: NodeId, image: Option<ResourceId>) {
        if let Some(i) = self.slot(id) {
            let old = core::mem::replace(&mut self.cold[i].image, image);
            self.release_replaced(old, image);
            self.invalidate_from(i);
        }
    }

    /// Sets the offscreen buffer owned by this node. A replaced buffer is
    /// queued for release.
    pub fn set_offscreen(&mut self, id: NodeId, buffer: Option<ResourceId>) {
        if let Some(i) = self.slot(id) {
            let old = core::mem::replace(&mut self.cold[i].offscreen, buffer);
            self.release_replaced(old, buffer);
        }
    }

    // -- Raw-index accessors for renderers --
    //
    // These accept raw slot indices (as found in `TransformChanges`) rather
    // than `NodeId` handles, skipping generation validation.

    /// Returns the computed world transform at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn world_transform_at(&self, idx: u32) -> Affine {
        assert!(
            idx < self.len,
            "slot index {idx} out of range (len {})",
            self.len
        );
        self.world_transform[idx as usize]
    }

    /// Returns the computed world opacity at raw slot `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len`.
    #[must_use]
    pub fn world_alpha_at(&self, idx: u32) -> f64 {
        assert!(
            idx < self.len,
            "slot index {idx} out of range (len {})",
            self.len
        );
        self.world_alpha[idx as usize]
    }

    // -- Internal helpers --

    /// Builds a handle for a live slot.
    pub(crate) fn handle(&self, idx: u32) -> NodeId {
        NodeId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    fn resolve(&self, id: NodeId) -> Result<usize, TreeError> {
        if self.is_alive(id) {
            Ok(id.idx as usize)
        } else {
            Err(TreeError::Disposed)
        }
    }

    /// Resolves a handle; a stale handle panics when debugging, otherwise it
    /// makes the calling operation a no-op.
    pub(crate) fn slot(&self, id: NodeId) -> Option<usize> {
        match self.resolve(id) {
            Ok(i) => Some(i),
            Err(_) => {
                assert!(
                    !self.debug.enabled,
                    "stale NodeId: {id:?} (node was disposed)"
                );
                None
            }
        }
    }

    fn structural_failure(&self, err: TreeError) {
        // Disposed handles in release builds degrade to a no-op; every other
        // structural violation is fatal.
        if err == TreeError::Disposed && !self.debug.enabled {
            return;
        }
        panic!("{err}");
    }

    /// Returns whether `a` is `n` or one of its ancestors.
    fn is_ancestor_or_self(&self, a: usize, n: usize) -> bool {
        let mut cur = n as u32;
        while cur != INVALID {
            if cur as usize == a {
                return true;
            }
            cur = self.parent[cur as usize];
        }
        false
    }

    fn depth_of(&self, i: usize) -> usize {
        let mut depth = 0;
        let mut cur = self.parent[i];
        while cur != INVALID {
            depth += 1;
            cur = self.parent[cur as usize];
        }
        depth
    }

    /// Depth of the deepest node in the subtree at `i`.
    pub(crate) fn deepest_depth(&self, i: usize) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(i, self.depth_of(i))];
        while let Some((j, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            stack.extend(self.children[j].iter().map(|&c| (c as usize, depth + 1)));
        }
        deepest
    }

    /// Removes `c` from its parent's child list and marks what that affects.
    fn detach(&mut self, c: usize) {
        let p = self.parent[c] as usize;
        if let Some(pos) = self.children[p].iter().position(|&x| x == c as u32) {
            self.children[p].remove(pos);
        }
        self.dirty[p].children_sorted = false;
        self.invalidate_from(p);
        self.parent[c] = INVALID;
        self.dirty[c].transform = true;
        self.dirty[c].alpha = true;
    }

    fn touch_transform(&mut self, i: usize) {
        self.dirty[i].transform = true;
        self.invalidate_above(i);
    }

    fn release_replaced(&mut self, old: Option<ResourceId>, new: Option<ResourceId>) {
        if let Some(old) = old {
            if Some(old) != new {
                self.pending_released.push(old);
            }
        }
    }

    /// Frees one slot. The slot's children must already have been taken.
    fn release_slot(&mut self, i: usize) {
        let cold = core::mem::take(&mut self.cold[i]);
        self.pending_released.extend(cold.image);
        self.pending_released.extend(cold.offscreen);
        self.cache[i] = None;
        self.visual[i] = Visual::default();
        self.paint_order[i].clear();
        self.parent[i] = INVALID;
        self.generation[i] = self.generation[i].wrapping_add(1);
        self.alive[i] = false;
        self.free_list.push(i as u32);
    }

    /// Rebuilds the z-sorted child order of `i` if it is stale.
    pub(crate) fn ensure_sorted(&mut self, i: usize) {
        if self.dirty[i].children_sorted {
            return;
        }
        let mut order = core::mem::take(&mut self.paint_order[i]);
        order.clear();
        order.extend_from_slice(&self.children[i]);
        // Stable: equal z-indices keep child-list order.
        order.sort_by_key(|&c| self.z_index[c as usize]);
        self.paint_order[i] = order;
        self.dirty[i].children_sorted = true;
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use kurbo::Rect;

    fn region(page: u32) -> TextureRegion {
        TextureRegion {
            page: ResourceId(page),
            frame: Rect::new(0.0, 0.0, 16.0, 16.0),
        }
    }

    #[test]
    fn create_and_dispose() {
        let mut tree = NodeTree::new();
        let id = tree.create_container();
        assert!(tree.is_alive(id));
        assert_eq!(tree.len(), 1);
        tree.dispose(id);
        assert!(!tree.is_alive(id));
        assert!(tree.is_empty());
    }

    #[test]
    fn generation_prevents_stale_access() {
        let mut tree = NodeTree::new();
        let id1 = tree.create_container();
        tree.dispose(id1);
        let id2 = tree.create_container();
        // id2 reuses the same slot but has a different generation.
        assert!(!tree.is_alive(id1));
        assert!(tree.is_alive(id2));
        assert_eq!(id1.idx, id2.idx);
        assert_ne!(id1.generation, id2.generation);
    }

    #[test]
    fn new_nodes_start_with_shared_defaults() {
        let mut tree = NodeTree::new();
        let id = tree.create(NodeKind::Mesh);
        assert_eq!(tree.kind(id), NodeKind::Mesh);
        assert_eq!(tree.alpha(id), 1.0);
        assert_eq!(tree.local_transform(id).scale, Vec2::new(1.0, 1.0));
        assert!(tree.visible(id));
        assert!(tree.transform_dirty(id));
    }

    #[test]
    fn add_child_and_query() {
        let mut tree = NodeTree::new();
        let parent = tree.create_container();
        let a = tree.create_container();
        let b = tree.create_container();

        tree.add_child(parent, a);
        tree.add_child(parent, b);

        assert_eq!(tree.parent(a), Some(parent));
        let kids: Vec<_> = tree.children(parent).collect();
        assert_eq!(kids, vec![a, b]);
        assert_eq!(tree.child_index(parent, b), Some(1));
        assert_eq!(tree.depth(b), 1);
    }

    #[test]
    fn add_child_at_inserts_in_place() {
        let mut tree = NodeTree::new();
        let parent = tree.create_container();
        let a = tree.create_container();
        let b = tree.create_container();
        let c = tree.create_container();
        tree.add_child(parent, a);
        tree.add_child(parent, c);
        tree.add_child_at(parent, b, 1);
        let kids: Vec<_> = tree.children(parent).collect();
        assert_eq!(kids, vec![a, b, c]);
    }

    #[test]
    fn adding_detaches_from_previous_parent() {
        let mut tree = NodeTree::new();
        let p1 = tree.create_container();
        let p2 = tree.create_container();
        let child = tree.create_container();
        tree.add_child(p1, child);
        tree.add_child(p2, child);
        assert_eq!(tree.parent(child), Some(p2));
        assert_eq!(tree.child_count(p1), 0);
    }

    #[test]
    fn readding_to_same_parent_moves_to_end() {
        let mut tree = NodeTree::new();
        let parent = tree.create_container();
        let a = tree.create_container();
        let b = tree.create_container();
        tree.add_child(parent, a);
        tree.add_child(parent, b);
        tree.add_child(parent, a);
        let kids: Vec<_> = tree.children(parent).collect();
        assert_eq!(kids, vec![b, a]);
    }

    #[test]
    fn cycle_is_rejected_without_mutation() {
        let mut tree = NodeTree::new();
        let root = tree.create_container();
        let mid = tree.create_container();
        let leaf = tree.create_container();
        tree.add_child(root, mid);
        tree.add_child(mid, leaf);

        assert_eq!(tree.try_add_child(leaf, root), Err(TreeError::Cycle));
        assert_eq!(tree.try_add_child(mid, mid), Err(TreeError::Cycle));
        assert_eq!(tree.parent(root), None);
        assert_eq!(tree.parent(mid), Some(root));
        assert_eq!(tree.children(leaf).count(), 0);
    }

    #[test]
    #[should_panic(expected = "cannot add a node to itself")]
    fn cycle_panics() {
        let mut tree = NodeTree::new();
        let root = tree.create_container();
        let child = tree.create_container();
        tree.add_child(root, child);
        tree.add_child(child, root);
    }

    #[test]
    fn remove_child_keeps_node_alive() {
        let mut tree = NodeTree::new();
        let parent = tree.create_container();
        let child = tree.create_container();
        tree.add_child(parent, child);
        tree.remove_child(parent, child);
        assert!(tree.is_alive(child));
        assert_eq!(tree.parent(child), None);
        assert!(!tree.remove_from_parent(child));
    }

    #[test]
    fn remove_child_of_other_parent_fails() {
        let mut tree = NodeTree::new();
        let p1 = tree.create_container();
        let p2 = tree.create_container();
        let child = tree.create_container();
        tree.add_child(p1, child);
        assert_eq!(tree.try_remove_child(p2, child), Err(TreeError::NotAChild));
        assert_eq!(tree.parent(child), Some(p1));
    }

    #[test]
    fn remove_child_at_and_children() {
        let mut tree = NodeTree::new();
        let parent = tree.create_container();
        let a = tree.create_container();
        let b = tree.create_container();
        let c = tree.create_container();
        tree.add_child(parent, a);
        tree.add_child(parent, b);
        tree.add_child(parent, c);

        assert_eq!(tree.remove_child_at(parent, 1), Some(b));
        assert_eq!(
            tree.try_remove_child_at(parent, 5),
            Err(TreeError::IndexOutOfBounds { index: 5, len: 2 })
        );
        assert_eq!(tree.remove_children(parent), vec![a, c]);
        assert_eq!(tree.child_count(parent), 0);
        assert_eq!(tree.parent(a), None);
    }

    #[test]
    fn set_child_index_reorders() {
        let mut tree = NodeTree::new();
        let parent = tree.create_container();
        let a = tree.create_container();
        let b = tree.create_container();
        let c = tree.create_container();
        tree.add_child(parent, a);
        tree.add_child(parent, b);
        tree.add_child(parent, c);

        tree.set_child_index(parent, c, 0);
        let kids: Vec<_> = tree.children(parent).collect();
        assert_eq!(kids, vec![c, a, b]);

        let stranger = tree.create_container();
        assert_eq!(
            tree.try_set_child_index(parent, stranger, 0),
            Err(TreeError::NotAChild)
        );
        assert_eq!(
            tree.try_set_child_index(parent, a, 3),
            Err(TreeError::IndexOutOfBounds { index: 3, len: 3 })
        );
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn set_child_index_out_of_range_panics() {
        let mut tree = NodeTree::new();
        let parent = tree.create_container();
        let a = tree.create_container();
        tree.add_child(parent, a);
        tree.set_child_index(parent, a, 1);
    }

    #[test]
    fn attach_depth_covers_whole_subtree() {
        let mut tree = NodeTree::new();
        tree.set_debug_context(DebugContext {
            max_depth: 3,
            ..DebugContext::ENABLED
        });
        let root = tree.create_container();
        let top = tree.create_container();
        tree.add_child(root, top);

        // A detached chain three levels deep.
        let branch = tree.create_container();
        let mut tip = branch;
        for _ in 0..3 {
            let next = tree.create_container();
            tree.add_child(tip, next);
            tip = next;
        }
        let b = branch.idx as usize;
        assert_eq!(tree.deepest_depth(b), 3);

        // Attached under `top` its root sits at depth 2, its tip at depth 5.
        tree.add_child(top, branch);
        assert_eq!(tree.depth_of(b), 2);
        assert_eq!(tree.deepest_depth(b), 5);
        assert!(tree.debug.check_depth(tree.deepest_depth(b)), "deep tip warns");
        assert!(!tree.debug.check_depth(tree.depth_of(b)), "attach point alone would not");
    }

    #[test]
    fn dispose_recurses_and_detaches() {
        let mut tree = NodeTree::new();
        let root = tree.create_container();
        let mid = tree.create_container();
        let leaf = tree.create_container();
        let sibling = tree.create_container();
        tree.add_child(root, mid);
        tree.add_child(mid, leaf);
        tree.add_child(root, sibling);

        tree.dispose(mid);
        assert!(!tree.is_alive(mid));
        assert!(!tree.is_alive(leaf));
        let kids: Vec<_> = tree.children(root).collect();
        assert_eq!(kids, vec![sibling]);

        // Idempotent.
        tree.dispose(mid);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn dispose_releases_owned_resources_only() {
        let mut tree = NodeTree::new();
        let parent = tree.create_container();
        let sprite = tree.create_sprite(region(7), Size::new(8.0, 8.0));
        tree.add_child(parent, sprite);
        tree.set_image(sprite, Some(ResourceId(1)));
        tree.set_offscreen(parent, Some(ResourceId(2)));
        tree.set_offscreen(parent, Some(ResourceId(3)));
        assert_eq!(tree.take_released_resources(), vec![ResourceId(2)]);

        tree.dispose(parent);
        let mut released = tree.take_released_resources();
        released.sort_by_key(|r| r.0);
        // The atlas page (7) is shared and never released by a node.
        assert_eq!(released, vec![ResourceId(1), ResourceId(3)]);
    }

    #[test]
    fn dispose_drops_callbacks() {
        use alloc::rc::Rc;
        use core::cell::Cell;

        let mut tree = NodeTree::new();
        let id = tree.create_container();
        let token = Rc::new(Cell::new(0));
        let held = token.clone();
        tree.set_handler(id, EventKind::Click, move |_, _| held.set(1));
        assert_eq!(Rc::strong_count(&token), 2);
        tree.dispose(id);
        assert_eq!(Rc::strong_count(&token), 1);
    }

    #[test]
    #[should_panic(expected = "stale NodeId")]
    fn disposed_handle_panics_when_debugging() {
        let mut tree = NodeTree::with_debug(DebugContext::ENABLED);
        let id = tree.create_container();
        tree.dispose(id);
        tree.set_position(id, (1.0, 1.0));
    }

    #[test]
    fn disposed_handle_is_noop_without_debugging() {
        let mut tree = NodeTree::with_debug(DebugContext::DISABLED);
        let root = tree.create_container();
        let id = tree.create_container();
        tree.dispose(id);
        tree.set_position(id, (1.0, 1.0));
        tree.add_child(root, id);
        assert_eq!(tree.parent(id), None);
        assert_eq!(tree.child_count(root), 0);
        assert_eq!(tree.world_alpha(id), 1.0);
    }

    #[test]
    fn setters_mark_dirty() {
        let mut tree = NodeTree::new();
        let id = tree.create_container();
        let _ = tree.update_transforms(id);
        assert!(!tree.transform_dirty(id));
        assert!(!tree.alpha_dirty(id));

        tree.set_rotation(id, 0.5);
        assert!(tree.transform_dirty(id));
        tree.set_alpha(id, 0.5);
        assert!(tree.alpha_dirty(id));
    }

    #[test]
    fn z_index_sorts_stably() {
        let mut tree = NodeTree::new();
        let parent = tree.create_container();
        let a = tree.create_container();
        let b = tree.create_container();
        let c = tree.create_container();
        tree.add_child(parent, a);
        tree.add_child(parent, b);
        tree.add_child(parent, c);
        tree.set_z_index(a, 5);

        let p = parent.idx as usize;
        tree.ensure_sorted(p);
        assert_eq!(tree.paint_order[p], vec![b.idx, c.idx, a.idx]);
        // Insertion order is untouched.
        assert_eq!(tree.child_index(parent, a), Some(0));
    }
}
