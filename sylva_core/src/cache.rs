// Copyright 2026 the Sylva Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Subtree render caches.
//!
//! A cache-enabled node records the draw commands its subtree emits together
//! with a snapshot of its own screen transform and alpha. Later frames replay
//! the records through a single delta, `current * snapshot⁻¹` (and the alpha
//! ratio), instead of walking the subtree. Replay cost is linear in the number
//! of records instead of the subtree size, which pays off for static content
//! such as tilemaps.
//!
//! # Invalidation
//!
//! - [`CacheMode::Auto`]: any mutation below the node marks the *first*
//!   cache-enabled node on the way up as dirty, and stops there.
//! - [`CacheMode::Manual`]: only [`NodeTree::invalidate_cache`] marks it
//!   dirty. Setters elsewhere pay nothing.
//!
//! Changes to the cached node's own transform or alpha never dirty its own
//! cache; they flow into the replay delta.
//!
//! Swapping a sprite's frame within the same atlas page does not dirty the
//! cache either. The record for that sprite is flagged *animated* and its
//! texture region is re-read on every replay.
//!
//! # Nesting
//!
//! A cache-enabled node inside another cached subtree is recorded as a
//! marker. Replaying the outer cache hands that marker to the inner cache,
//! which rebuilds or replays on its own terms.

use alloc::boxed::Box;
use alloc::vec::Vec;

use kurbo::Affine;

use crate::node::{INVALID, NodeId, NodeTree};
use crate::render::{DrawCommand, DrawList, RenderCx};
use crate::trace::CacheEvent;
use crate::transform::{self, DETERMINANT_EPSILON};

/// Snapshot alpha at or below which no alpha ratio can be taken.
const ALPHA_EPSILON: f64 = 1e-9;

/// How a subtree cache gets invalidated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CacheMode {
    /// Rebuilt only on [`NodeTree::invalidate_cache`].
    Manual,
    /// Rebuilt after any mutation inside the subtree.
    #[default]
    Auto,
}

/// A snapshot of a node's cache state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheInfo {
    /// Invalidation mode.
    pub mode: CacheMode,
    /// Whether the next render rebuilds the cache.
    pub dirty: bool,
    /// Whether the cache has ever been built since it was enabled.
    pub built: bool,
    /// Number of recorded draw commands.
    pub records: usize,
    /// Number of recorded commands flagged animated.
    pub animated: usize,
    /// Number of nested caches referenced.
    pub nested: usize,
}

#[derive(Clone, Debug)]
pub(crate) enum CachedRecord {
    /// A draw command as emitted when the cache was built.
    Draw {
        command: DrawCommand,
        animated: bool,
    },
    /// A nested cache-enabled node; replay defers to its own cache.
    Nested(NodeId),
}

#[derive(Debug)]
pub(crate) struct SubtreeCache {
    mode: CacheMode,
    dirty: bool,
    built: bool,
    /// Screen transform of the cached node at build time.
    snapshot_transform: Affine,
    /// World alpha of the cached node at build time.
    snapshot_alpha: f64,
    records: Vec<CachedRecord>,
}

impl SubtreeCache {
    fn new(mode: CacheMode) -> Self {
        Self {
            mode,
            dirty: true,
            built: false,
            snapshot_transform: Affine::IDENTITY,
            snapshot_alpha: 1.0,
            records: Vec::new(),
        }
    }

    fn info(&self) -> CacheInfo {
        let mut info = CacheInfo {
            mode: self.mode,
            dirty: self.dirty,
            built: self.built,
            records: 0,
            animated: 0,
            nested: 0,
        };
        for record in &self.records {
            match record {
                CachedRecord::Draw { animated, .. } => {
                    info.records += 1;
                    info.animated += usize::from(*animated);
                }
                CachedRecord::Nested(_) => info.nested += 1,
            }
        }
        info
    }
}

impl NodeTree {
    /// Enables a subtree cache on `id`, replacing any existing one.
    ///
    /// The cache is built on the next render.
    pub fn enable_cache(&mut self, id: NodeId, mode: CacheMode) {
        if let Some(i) = self.slot(id) {
            self.cache[i] = Some(Box::new(SubtreeCache::new(mode)));
            self.invalidate_above(i);
        }
    }

    /// Disables and discards the subtree cache on `id`.
    pub fn disable_cache(&mut self, id: NodeId) {
        if let Some(i) = self.slot(id) {
            if self.cache[i].take().is_some() {
                self.invalidate_above(i);
            }
        }
    }

    /// Changes the invalidation mode of an enabled cache. Clears recorded
    /// content; does nothing if caching is disabled.
    pub fn set_cache_mode(&mut self, id: NodeId, mode: CacheMode) {
        if let Some(i) = self.slot(id) {
            if self.cache[i].is_some() {
                self.cache[i] = Some(Box::new(SubtreeCache::new(mode)));
            }
        }
    }

    /// Returns the cache mode of `id`, or `None` if caching is disabled.
    #[must_use]
    pub fn cache_mode(&self, id: NodeId) -> Option<CacheMode> {
        let i = self.slot(id)?;
        self.cache[i].as_ref().map(|c| c.mode)
    }

    /// Marks the cache on `id` for rebuild, in either mode.
    pub fn invalidate_cache(&mut self, id: NodeId) {
        if let Some(i) = self.slot(id) {
            if let Some(cache) = &mut self.cache[i] {
                cache.dirty = true;
            }
        }
    }

    /// Returns the state of the cache on `id`, or `None` if caching is
    /// disabled.
    #[must_use]
    pub fn cache_info(&self, id: NodeId) -> Option<CacheInfo> {
        let i = self.slot(id)?;
        self.cache[i].as_ref().map(|c| c.info())
    }

    /// Marks the first cache-enabled node at or above `start` dirty if it is
    /// in auto mode. Stops at that node either way.
    pub(crate) fn invalidate_from(&mut self, start: usize) {
        let mut cur = start as u32;
        while cur != INVALID {
            if let Some(cache) = &mut self.cache[cur as usize] {
                if cache.mode == CacheMode::Auto {
                    cache.dirty = true;
                }
                return;
            }
            cur = self.parent[cur as usize];
        }
    }

    /// Like [`invalidate_from`](Self::invalidate_from), starting at the
    /// parent of `node`.
    pub(crate) fn invalidate_above(&mut self, node: usize) {
        let parent = self.parent[node];
        if parent != INVALID {
            self.invalidate_from(parent as usize);
        }
    }

    /// Flags the record emitted by slot `i` as animated in the nearest cache.
    ///
    /// Returns `false` when the nearest cache holds no record for `i`; the
    /// caller then invalidates normally.
    pub(crate) fn register_animated_source(&mut self, i: usize) -> bool {
        let mut cur = i as u32;
        while cur != INVALID {
            if self.cache[cur as usize].is_some() {
                break;
            }
            cur = self.parent[cur as usize];
        }
        if cur == INVALID {
            return true;
        }
        let source = self.handle(i as u32);
        let Some(cache) = &mut self.cache[cur as usize] else {
            return true;
        };
        if cache.dirty || !cache.built {
            // The next build reads the new region anyway.
            return true;
        }
        for record in &mut cache.records {
            if let CachedRecord::Draw { command, animated } = record {
                if command.node == source {
                    *animated = true;
                    return true;
                }
            }
        }
        false
    }

    /// Emits a cache-enabled node: rebuilds its cache if needed, otherwise
    /// replays it.
    pub(crate) fn emit_cached(&mut self, i: usize, cx: &mut RenderCx<'_, '_>, out: &mut DrawList) {
        let Some(mut cache) = self.cache[i].take() else {
            self.emit_subtree(i, cx, out, None);
            return;
        };
        let base = cx.view * self.world_transform[i];
        let base_alpha = self.world_alpha[i];

        let rebuilt = cache.dirty || !cache.built;
        if rebuilt {
            let degenerate = base.determinant().abs() < DETERMINANT_EPSILON
                || base_alpha.abs() <= ALPHA_EPSILON;
            if degenerate {
                // A collapsed snapshot has no inverse to compute deltas from.
                // Draw directly and try again next frame.
                self.cache[i] = Some(cache);
                self.emit_subtree(i, cx, out, None);
                return;
            }

            let mut records = core::mem::take(&mut cache.records);
            records.clear();
            self.emit_subtree(i, cx, out, Some(&mut records));
            cache.records = records;
            cache.snapshot_transform = base;
            cache.snapshot_alpha = base_alpha;
            cache.built = true;
            cache.dirty = false;
        } else {
            let delta = base * transform::invert_or_identity(cache.snapshot_transform);
            let alpha_ratio = base_alpha / cache.snapshot_alpha;
            for record in &cache.records {
                match record {
                    CachedRecord::Draw { command, animated } => {
                        let mut command = *command;
                        command.transform = delta * command.transform;
                        command.alpha *= alpha_ratio;
                        if *animated && self.is_alive(command.node) {
                            command.texture = self.visual[command.node.idx as usize].texture;
                        }
                        out.push(command);
                    }
                    CachedRecord::Nested(inner) => {
                        if self.is_alive(*inner) {
                            self.emit_node(inner.idx as usize, cx, out, None);
                        }
                    }
                }
            }
        }

        cx.tracer.cache(&CacheEvent {
            frame_index: cx.frame_index,
            node: i as u32,
            rebuilt,
            records: cache.records.len(),
        });
        self.cache[i] = Some(cache);
    }
}
