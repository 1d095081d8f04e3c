// Copyright 2026 the Sylva Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use sylva_core::node::NodeId;
use sylva_core::trace::{
    CacheEvent, DispatchEvent, PhaseBeginEvent, PhaseEndEvent, PropagateEvent, RenderEvent,
    TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn node(target: Option<NodeId>) -> String {
    target.map_or_else(|| "-".to_owned(), |id| format!("{}@{}", id.index(), id.generation()))
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:begin] frame={} {}",
            e.frame_index,
            e.phase.name(),
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:end] frame={} {}",
            e.frame_index,
            e.phase.name(),
        );
    }

    fn on_propagate(&mut self, e: &PropagateEvent) {
        let _ = writeln!(
            self.writer,
            "[propagate] frame={} transforms={} alphas={}",
            e.frame_index, e.transforms, e.alphas,
        );
    }

    fn on_cache(&mut self, e: &CacheEvent) {
        let _ = writeln!(
            self.writer,
            "[cache] frame={} node={} {} records={}",
            e.frame_index,
            e.node,
            if e.rebuilt { "rebuild" } else { "replay" },
            e.records,
        );
    }

    fn on_dispatch(&mut self, e: &DispatchEvent) {
        let _ = writeln!(
            self.writer,
            "[dispatch] frame={} {} pointer={} target={}{}",
            e.frame_index,
            e.kind.name(),
            e.pointer,
            node(e.target),
            if e.forwarded { " -> bridge" } else { "" },
        );
    }

    fn on_render(&mut self, e: &RenderEvent) {
        let _ = writeln!(
            self.writer,
            "[render] frame={} commands={}",
            e.frame_index, e.commands,
        );
    }
}
