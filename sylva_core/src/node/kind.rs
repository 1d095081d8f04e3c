// Copyright 2026 the Sylva Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node variants and per-node visual properties.

use kurbo::{Rect, Size};

use super::id::ResourceId;

/// Selects how a node renders.
///
/// Every node shares one storage layout; the kind only decides what the
/// render traversal emits for it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A grouping node. Emits nothing itself.
    #[default]
    Container,
    /// A textured quad.
    Sprite,
    /// A textured triangle mesh.
    Mesh,
    /// A particle emitter.
    Particles,
    /// A laid-out text run.
    Text,
}

impl NodeKind {
    /// Returns whether nodes of this kind emit a draw command of their own.
    #[inline]
    #[must_use]
    pub const fn draws(self) -> bool {
        !matches!(self, Self::Container)
    }
}

/// Compositing operator forwarded to the renderer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// Source-over.
    #[default]
    Normal,
    /// Additive.
    Add,
    /// Multiply.
    Multiply,
    /// Screen.
    Screen,
}

/// A packed `0xRRGGBBAA` tint color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color(pub u32);

impl Color {
    /// Opaque white; leaves textures untinted.
    pub const WHITE: Self = Self(0xffff_ffff);
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// A sub-rectangle of a texture page (an atlas frame).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextureRegion {
    /// The atlas page the frame lives on.
    pub page: ResourceId,
    /// The frame rectangle in page pixels.
    pub frame: Rect,
}

/// Per-node boolean flags set by the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeFlags {
    /// Hidden nodes (and their subtrees) are neither drawn nor hit-tested.
    pub visible: bool,
    /// Non-renderable nodes (and their subtrees) are skipped when drawing but
    /// still hit-tested.
    pub renderable: bool,
    /// Whether the node itself takes part in hit-testing.
    pub interactive: bool,
    /// Whether descendants may take part in hit-testing.
    pub interactive_children: bool,
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self {
            visible: true,
            renderable: true,
            interactive: false,
            interactive_children: true,
        }
    }
}

impl NodeFlags {
    /// Flags a freshly created node of `kind` starts with.
    ///
    /// Containers start interactive so they pass hit-testing through to their
    /// children; other kinds opt in.
    #[must_use]
    pub fn for_kind(kind: NodeKind) -> Self {
        Self {
            interactive: matches!(kind, NodeKind::Container),
            ..Self::default()
        }
    }
}

/// Cold visual state: read by the render traversal, rarely written.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Visual {
    pub(crate) kind: NodeKind,
    pub(crate) tint: Color,
    pub(crate) blend: BlendMode,
    pub(crate) texture: Option<TextureRegion>,
    pub(crate) size: Size,
    pub(crate) layer: i32,
    pub(crate) paint_order: i32,
}

/// Dirty bits for derived state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct DirtyBits {
    pub(crate) transform: bool,
    pub(crate) alpha: bool,
    pub(crate) children_sorted: bool,
}

impl DirtyBits {
    /// State of a freshly created node.
    pub(crate) const NEW: Self = Self {
        transform: true,
        alpha: true,
        children_sorted: true,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_visible_and_not_interactive() {
        let flags = NodeFlags::default();
        assert!(flags.visible && flags.renderable && flags.interactive_children);
        assert!(!flags.interactive);
    }

    #[test]
    fn only_containers_start_interactive() {
        assert!(NodeFlags::for_kind(NodeKind::Container).interactive);
        assert!(!NodeFlags::for_kind(NodeKind::Sprite).interactive);
        assert!(!NodeFlags::for_kind(NodeKind::Text).interactive);
    }

    #[test]
    fn only_containers_skip_drawing() {
        assert!(!NodeKind::Container.draws());
        assert!(NodeKind::Sprite.draws());
        assert!(NodeKind::Text.draws());
    }
}
