// Copyright 2026 the Sylva Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Retained 2D scene graph with lazy transform propagation, subtree render
//! caching, and a pointer/gesture interaction engine.
//!
//! `sylva_core` is `no_std` compatible (with `alloc`). Nodes live in a
//! struct-of-arrays [`NodeTree`](node::NodeTree) and are addressed by
//! generational [`NodeId`](node::NodeId) handles.
//!
//! # Architecture
//!
//! One simulation step runs these stages in a fixed order:
//!
//! ```text
//!   app code mutates the tree
//!       │
//!       ▼
//!   NodeTree::update_transforms() ──► TransformChanges
//!       │
//!       ▼
//!   InteractionEngine::process() ──► scene handlers ─► node callbacks ─► EntityBridge
//!       │
//!       ▼
//!   render traversal / cache replay ──► DrawList ──► Renderer::submit()
//! ```
//!
//! **[`transform`]**: affine composition of the local transform
//! (pivot, scale, skew, rotation, position), inversion with a silent identity
//! fallback, point mapping.
//!
//! **[`node`]**: node storage, topology, property setters with dirty
//! marking, disposal, and the depth-first propagation pass.
//!
//! **[`cache`]** / **[`render`]**: subtree caches (manual or auto
//! invalidation) replayed with a delta transform, and the traversal that
//! emits the flat draw list.
//!
//! **[`interaction`]**: hit-testing, per-pointer state machines, click,
//! drag and pinch recognition, capture, synthetic input, and the external
//! entity bridge.
//!
//! **[`scene`]**: owns one root node, the cameras, and the interaction
//! engine, and drives a step.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) hooks with a
//! zero-overhead [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod cache;
pub mod camera;
pub mod debug;
pub mod interaction;
pub mod node;
pub mod render;
pub mod scene;
pub mod shape;
pub mod trace;
pub mod transform;
