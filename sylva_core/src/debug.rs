// Copyright 2026 the Sylva Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-tree debug context.
//!
//! Each [`NodeTree`](crate::node::NodeTree) carries its own [`DebugContext`],
//! so two scenes with different debug settings can coexist. When the context
//! is disabled every check below is a single branch.

/// Development-time checks for one node tree.
///
/// - With `enabled`, operations on a disposed [`NodeId`](crate::node::NodeId)
///   panic; otherwise they are silent no-ops.
/// - With `enabled`, attaching a child deeper than `max_depth` or beyond
///   `max_children` siblings logs a warning through [`log`]. These are never
///   fatal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DebugContext {
    /// Whether debug checks run at all.
    pub enabled: bool,
    /// Tree depth above which a warning is logged.
    pub max_depth: usize,
    /// Sibling count above which a warning is logged.
    pub max_children: usize,
}

impl DebugContext {
    /// A context with every check switched off.
    pub const DISABLED: Self = Self {
        enabled: false,
        max_depth: 64,
        max_children: 1024,
    };

    /// A context with every check switched on and default thresholds.
    pub const ENABLED: Self = Self {
        enabled: true,
        ..Self::DISABLED
    };

    /// Warns when `depth` is above `max_depth`. Returns whether it warned.
    pub(crate) fn check_depth(&self, depth: usize) -> bool {
        let over = self.enabled && depth > self.max_depth;
        if over {
            log::warn!(
                "scene tree depth {depth} exceeds the configured limit of {}",
                self.max_depth
            );
        }
        over
    }

    /// Warns when `count` is above `max_children`. Returns whether it warned.
    pub(crate) fn check_children(&self, count: usize) -> bool {
        let over = self.enabled && count > self.max_children;
        if over {
            log::warn!(
                "node has {count} children, above the configured limit of {}",
                self.max_children
            );
        }
        over
    }
}

impl Default for DebugContext {
    /// Enabled in builds with debug assertions, disabled otherwise.
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::ENABLED
        } else {
            Self::DISABLED
        }
    }
}
