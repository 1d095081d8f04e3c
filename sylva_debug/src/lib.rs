// Copyright 2026 the Sylva Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pretty-printing and recording of sylva step traces.
//!
//! This crate provides [`TraceSink`](sylva_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output.
//! - [`recorder::RecorderSink`]: in-memory recording with JSON export.

pub mod pretty;
pub mod recorder;
