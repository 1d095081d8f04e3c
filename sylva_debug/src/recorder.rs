// Copyright 2026 the Sylva Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory event recording and JSON export.
//!
//! [`RecorderSink`] implements [`TraceSink`] and keeps a copy of every event
//! it receives, in arrival order. [`RecorderSink::to_json`] turns the
//! recording into a JSON array with one object per event, suitable for
//! diffing step traces between runs.

use std::io::{self, Write};

use serde_json::{Value, json};

use sylva_core::trace::{
    CacheEvent, DispatchEvent, PhaseBeginEvent, PhaseEndEvent, PropagateEvent, RenderEvent,
    TraceSink,
};

/// A single recorded trace event.
#[derive(Clone, Copy, Debug)]
pub enum RecordedEvent {
    /// A phase started.
    PhaseBegin(PhaseBeginEvent),
    /// A phase ended.
    PhaseEnd(PhaseEndEvent),
    /// Transforms were propagated.
    Propagate(PropagateEvent),
    /// A subtree cache was rebuilt or replayed.
    Cache(CacheEvent),
    /// An interaction event was dispatched.
    Dispatch(DispatchEvent),
    /// A draw list was produced.
    Render(RenderEvent),
}

impl RecordedEvent {
    /// Returns the frame the event belongs to.
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        match self {
            Self::PhaseBegin(e) => e.frame_index,
            Self::PhaseEnd(e) => e.frame_index,
            Self::Propagate(e) => e.frame_index,
            Self::Cache(e) => e.frame_index,
            Self::Dispatch(e) => e.frame_index,
            Self::Render(e) => e.frame_index,
        }
    }

    /// Converts the event to a JSON object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::PhaseBegin(e) => json!({
                "event": "phase_begin",
                "frame": e.frame_index,
                "phase": e.phase.name(),
            }),
            Self::PhaseEnd(e) => json!({
                "event": "phase_end",
                "frame": e.frame_index,
                "phase": e.phase.name(),
            }),
            Self::Propagate(e) => json!({
                "event": "propagate",
                "frame": e.frame_index,
                "transforms": e.transforms,
                "alphas": e.alphas,
            }),
            Self::Cache(e) => json!({
                "event": "cache",
                "frame": e.frame_index,
                "node": e.node,
                "rebuilt": e.rebuilt,
                "records": e.records,
            }),
            Self::Dispatch(e) => json!({
                "event": "dispatch",
                "frame": e.frame_index,
                "kind": e.kind.name(),
                "pointer": e.pointer,
                "target": e.target.map(|id| id.index()),
                "forwarded": e.forwarded,
            }),
            Self::Render(e) => json!({
                "event": "render",
                "frame": e.frame_index,
                "commands": e.commands,
            }),
        }
    }
}

/// A [`TraceSink`] that stores every event in memory.
#[derive(Debug, Default)]
pub struct RecorderSink {
    events: Vec<RecordedEvent>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded events, oldest first.
    #[must_use]
    pub fn events(&self) -> &[RecordedEvent] {
        &self.events
    }

    /// Drops every recorded event.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Consumes the recorder and returns the recorded events.
    #[must_use]
    pub fn into_events(self) -> Vec<RecordedEvent> {
        self.events
    }

    /// Returns the recording as a JSON array.
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Array(self.events.iter().map(RecordedEvent::to_json).collect())
    }

    /// Writes the recording as pretty-printed JSON.
    pub fn write_json(&self, writer: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer_pretty(writer, &self.to_json())?;
        Ok(())
    }
}

impl TraceSink for RecorderSink {
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.events.push(RecordedEvent::PhaseBegin(*e));
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.events.push(RecordedEvent::PhaseEnd(*e));
    }

    fn on_propagate(&mut self, e: &PropagateEvent) {
        self.events.push(RecordedEvent::Propagate(*e));
    }

    fn on_cache(&mut self, e: &CacheEvent) {
        self.events.push(RecordedEvent::Cache(*e));
    }

    fn on_dispatch(&mut self, e: &DispatchEvent) {
        self.events.push(RecordedEvent::Dispatch(*e));
    }

    fn on_render(&mut self, e: &RenderEvent) {
        self.events.push(RecordedEvent::Render(*e));
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Size;
    use sylva_core::cache::CacheMode;
    use sylva_core::interaction::RawInput;
    use sylva_core::node::NodeKind;
    use sylva_core::scene::Scene;
    use sylva_core::trace::Tracer;

    use super::*;

    fn cached_scene() -> Scene {
        let mut scene = Scene::new();
        let root = scene.root();
        let tree = scene.tree_mut();
        let group = tree.create_container();
        tree.add_child(root, group);
        for _ in 0..3 {
            let sprite = tree.create(NodeKind::Sprite);
            tree.set_size(sprite, Size::new(4.0, 4.0));
            tree.add_child(group, sprite);
        }
        tree.enable_cache(group, CacheMode::Auto);
        scene
    }

    #[test]
    fn records_cache_rebuild_then_replay() {
        let mut scene = cached_scene();
        let mut sink = RecorderSink::new();
        {
            let mut tracer = Tracer::new(&mut sink);
            scene.render_traced(&mut tracer);
            scene.render_traced(&mut tracer);
        }
        let caches: Vec<(bool, usize)> = sink
            .events()
            .iter()
            .filter_map(|e| match e {
                RecordedEvent::Cache(c) => Some((c.rebuilt, c.records)),
                _ => None,
            })
            .collect();
        assert_eq!(caches, [(true, 3), (false, 3)]);
    }

    #[test]
    fn json_has_one_object_per_event() {
        let mut scene = cached_scene();
        let mut sink = RecorderSink::new();
        {
            let mut tracer = Tracer::new(&mut sink);
            scene.step_traced(&RawInput::mouse((1.0, 1.0), false), &mut tracer);
        }
        let json = sink.to_json();
        let array = json.as_array().unwrap();
        assert_eq!(array.len(), sink.events().len());
        assert_eq!(array[0]["event"], "phase_begin");
        assert_eq!(array[0]["phase"], "propagate");
        assert!(array.iter().all(|v| v["frame"] == 1));

        let mut bytes = Vec::new();
        sink.write_json(&mut bytes).unwrap();
        let parsed: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed, json);
    }
}
