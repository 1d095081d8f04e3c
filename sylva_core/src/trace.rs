// Copyright 2026 the Sylva Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the simulation step.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! step instrumentation calls at each stage. All method bodies default to
//! no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).

use crate::interaction::EventKind;
use crate::node::NodeId;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which stage of a step is being traced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// World transform and alpha propagation.
    Propagate,
    /// Input processing and event dispatch.
    Interact,
    /// Render traversal and cache replay.
    Render,
    /// Handing the draw list to the renderer.
    Present,
}

impl PhaseKind {
    /// Returns a short lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Propagate => "propagate",
            Self::Interact => "interact",
            Self::Render => "render",
            Self::Present => "present",
        }
    }
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Marks the beginning of a step phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseBeginEvent {
    /// Step counter.
    pub frame_index: u64,
    /// Which phase is starting.
    pub phase: PhaseKind,
}

/// Marks the end of a step phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseEndEvent {
    /// Step counter.
    pub frame_index: u64,
    /// Which phase is ending.
    pub phase: PhaseKind,
}

/// Emitted after transform propagation.
#[derive(Clone, Copy, Debug)]
pub struct PropagateEvent {
    /// Step counter.
    pub frame_index: u64,
    /// Number of world transforms recomputed.
    pub transforms: usize,
    /// Number of world alphas recomputed.
    pub alphas: usize,
}

/// Emitted when the render traversal reaches a cache-enabled node.
#[derive(Clone, Copy, Debug)]
pub struct CacheEvent {
    /// Step counter.
    pub frame_index: u64,
    /// Slot index of the cache-enabled node.
    pub node: u32,
    /// Whether the cache was rebuilt (`false` means replayed).
    pub rebuilt: bool,
    /// Number of records in the cache after this visit.
    pub records: usize,
}

/// Emitted for every interaction event delivered.
#[derive(Clone, Copy, Debug)]
pub struct DispatchEvent {
    /// Step counter.
    pub frame_index: u64,
    /// The event kind.
    pub kind: EventKind,
    /// Pointer slot (0 is the mouse).
    pub pointer: usize,
    /// The target node, if any.
    pub target: Option<NodeId>,
    /// Whether the event was forwarded to the entity bridge.
    pub forwarded: bool,
}

/// Emitted after the render traversal.
#[derive(Clone, Copy, Debug)]
pub struct RenderEvent {
    /// Step counter.
    pub frame_index: u64,
    /// Number of draw commands produced.
    pub commands: usize,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the scene step.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called at the beginning of a step phase.
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = e;
    }

    /// Called at the end of a step phase.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called after transform propagation.
    fn on_propagate(&mut self, e: &PropagateEvent) {
        _ = e;
    }

    /// Called when a subtree cache is rebuilt or replayed.
    fn on_cache(&mut self, e: &CacheEvent) {
        _ = e;
    }

    /// Called for every dispatched interaction event.
    fn on_dispatch(&mut self, e: &DispatchEvent) {
        _ = e;
    }

    /// Called after the render traversal.
    fn on_render(&mut self, e: &RenderEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`PhaseBeginEvent`].
    #[inline]
    pub fn phase_begin(&mut self, e: &PhaseBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseEndEvent`].
    #[inline]
    pub fn phase_end(&mut self, e: &PhaseEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PropagateEvent`].
    #[inline]
    pub fn propagate(&mut self, e: &PropagateEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_propagate(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`CacheEvent`].
    #[inline]
    pub fn cache(&mut self, e: &CacheEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_cache(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`DispatchEvent`].
    #[inline]
    pub fn dispatch(&mut self, e: &DispatchEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_dispatch(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`RenderEvent`].
    #[inline]
    pub fn render(&mut self, e: &RenderEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_render(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
