// Copyright 2026 the Sylva Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render traversal and the renderer contract.
//!
//! The core never rasterizes. [`NodeTree::render`] walks a subtree in paint
//! order and produces a flat [`DrawList`]; a [`Renderer`] (batching, GPU
//! submission, screenshots) consumes it.
//!
//! Cache-enabled nodes are replayed from their [`cache`](crate::cache)
//! instead of being re-traversed.

use alloc::vec::Vec;

use kurbo::{Affine, Size};

use crate::node::{BlendMode, Color, NodeId, NodeKind, NodeTree, TextureRegion};
use crate::trace::{RenderEvent, Tracer};

/// One draw instruction, in screen space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawCommand {
    /// The node that produced this command.
    pub node: NodeId,
    /// What to draw.
    pub kind: NodeKind,
    /// Full transform: camera view times the node's world transform.
    pub transform: Affine,
    /// Effective opacity.
    pub alpha: f64,
    /// Tint color.
    pub tint: Color,
    /// Blend mode.
    pub blend: BlendMode,
    /// Texture region, if any.
    pub texture: Option<TextureRegion>,
    /// Intrinsic size in local units.
    pub size: Size,
    /// Render layer hint.
    pub layer: i32,
    /// Paint-order tiebreak hint.
    pub paint_order: i32,
}

/// A flat, paint-ordered list of draw instructions for one frame.
#[derive(Clone, Debug, Default)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
}

impl DrawList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes all commands, keeping the allocation.
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Returns the number of commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Returns the commands in paint order.
    #[must_use]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Iterates the commands in paint order.
    pub fn iter(&self) -> core::slice::Iter<'_, DrawCommand> {
        self.commands.iter()
    }

    pub(crate) fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }
}

impl<'a> IntoIterator for &'a DrawList {
    type Item = &'a DrawCommand;
    type IntoIter = core::slice::Iter<'a, DrawCommand>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}

/// Consumes the draw list produced for a frame.
///
/// # Frame loop pseudocode
///
/// ```rust,ignore
/// fn on_frame(input: &RawInput) {
///     // Mutate: app code moves nodes, swaps frames, adds children.
///     scene.tree_mut().set_position(player, pos);
///
///     // Step: propagate transforms, then process input.
///     scene.step(input);
///
///     // Present: traverse or replay caches, then hand off the list.
///     scene.present(&mut renderer);
/// }
/// ```
pub trait Renderer {
    /// Draws the given list, first command first.
    fn submit(&mut self, list: &DrawList);
}

/// Per-traversal state.
pub(crate) struct RenderCx<'a, 't> {
    pub(crate) view: Affine,
    pub(crate) tracer: &'a mut Tracer<'t>,
    pub(crate) frame_index: u64,
}

impl NodeTree {
    /// Emits the draw commands for the subtree at `root` into `out`.
    ///
    /// `view` is applied on top of every world transform (usually the active
    /// camera's view). World transforms must be current, so call
    /// [`update_transforms`](Self::update_transforms) first.
    ///
    /// Invisible and non-renderable nodes are skipped along with their
    /// subtrees. Siblings are emitted in z-order, ties in child-list order.
    pub fn render(&mut self, root: NodeId, view: Affine, out: &mut DrawList) {
        self.render_traced(root, view, out, &mut Tracer::none(), 0);
    }

    /// Like [`render`](Self::render), reporting cache activity and the final
    /// command count to `tracer`.
    pub fn render_traced(
        &mut self,
        root: NodeId,
        view: Affine,
        out: &mut DrawList,
        tracer: &mut Tracer<'_>,
        frame_index: u64,
    ) {
        out.clear();
        let Some(root) = self.slot(root) else {
            return;
        };
        let mut cx = RenderCx {
            view,
            tracer,
            frame_index,
        };
        self.emit_node(root, &mut cx, out, None);
        cx.tracer.render(&RenderEvent {
            frame_index,
            commands: out.len(),
        });
    }

    /// Emits one node and its subtree, or its cache if it has one.
    ///
    /// While an enclosing cache is being built, `rec` collects what is
    /// emitted.
    pub(crate) fn emit_node(
        &mut self,
        i: usize,
        cx: &mut RenderCx<'_, '_>,
        out: &mut DrawList,
        rec: Option<&mut Vec<crate::cache::CachedRecord>>,
    ) {
        let flags = self.flags[i];
        if !flags.visible || !flags.renderable {
            return;
        }
        if self.cache[i].is_some() {
            if let Some(rec) = rec {
                rec.push(crate::cache::CachedRecord::Nested(self.handle(i as u32)));
            }
            self.emit_cached(i, cx, out);
            return;
        }
        self.emit_subtree(i, cx, out, rec);
    }

    /// Emits a node's own command, then its children in paint order,
    /// ignoring any cache on the node itself.
    pub(crate) fn emit_subtree(
        &mut self,
        i: usize,
        cx: &mut RenderCx<'_, '_>,
        out: &mut DrawList,
        mut rec: Option<&mut Vec<crate::cache::CachedRecord>>,
    ) {
        if let Some(command) = self.own_command(i, cx.view) {
            if let Some(rec) = rec.as_deref_mut() {
                rec.push(crate::cache::CachedRecord::Draw {
                    command,
                    animated: false,
                });
            }
            out.push(command);
        }

        self.ensure_sorted(i);
        let order = core::mem::take(&mut self.paint_order[i]);
        for &c in &order {
            self.emit_node(c as usize, cx, out, rec.as_deref_mut());
        }
        self.paint_order[i] = order;
    }

    fn own_command(&self, i: usize, view: Affine) -> Option<DrawCommand> {
        let visual = &self.visual[i];
        if !visual.kind.draws() {
            return None;
        }
        Some(DrawCommand {
            node: self.handle(i as u32),
            kind: visual.kind,
            transform: view * self.world_transform[i],
            alpha: self.world_alpha[i],
            tint: visual.tint,
            blend: visual.blend,
            texture: visual.texture,
            size: visual.size,
            layer: visual.layer,
            paint_order: visual.paint_order,
        })
    }
}
