// Copyright 2026 the Sylva Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The scene: one tree, its cameras, and its interaction state.
//!
//! A [`Scene`] is the unit of isolation. Two scenes share nothing: each has
//! its own [`NodeTree`], debug context, pointer state, and handler registry.
//!
//! # Step lifecycle
//!
//! ```text
//! step(input)
//!   ├─ Propagate  update_transforms(root)
//!   └─ Interact   InteractionEngine::process(..)
//! render()
//!   ├─ update_transforms(root)   (picks up handler mutations)
//!   └─ Render     traversal / cache replay into the draw list
//! present(renderer)
//!   └─ Present    Renderer::submit(draw list)
//! ```

use alloc::boxed::Box;
use alloc::vec::Vec;

use kurbo::Point;

use crate::camera::Camera;
use crate::debug::DebugContext;
use crate::interaction::{
    DEFAULT_DRAG_DEAD_ZONE, DEFAULT_MAX_TOUCHES, EntityBridge, EventContext, InputScript,
    InteractionEngine, InteractionEvent, PinchState, PointerState, RawInput,
};
use crate::node::{NodeId, NodeTree, TransformChanges};
use crate::render::{DrawList, Renderer};
use crate::trace::{PhaseBeginEvent, PhaseEndEvent, PhaseKind, PropagateEvent, Tracer};

/// Construction-time settings for a [`Scene`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneConfig {
    /// Movement, in world units, before a press becomes a drag.
    pub drag_dead_zone: f64,
    /// Number of simultaneous touch contacts tracked.
    pub max_touches: usize,
    /// Debug checks for the scene's tree.
    pub debug: DebugContext,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            drag_dead_zone: DEFAULT_DRAG_DEAD_ZONE,
            max_touches: DEFAULT_MAX_TOUCHES,
            debug: DebugContext::default(),
        }
    }
}

/// One independent scene graph.
#[derive(Debug)]
pub struct Scene {
    tree: NodeTree,
    root: NodeId,
    cameras: Vec<Camera>,
    active_camera: usize,
    interaction: InteractionEngine,
    frame: u64,
    changes: TransformChanges,
    draw_list: DrawList,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Creates a scene with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(SceneConfig::default())
    }

    /// Creates a scene with an empty root container and one default camera.
    #[must_use]
    pub fn with_config(config: SceneConfig) -> Self {
        let mut tree = NodeTree::with_debug(config.debug);
        let root = tree.create_container();
        Self {
            tree,
            root,
            cameras: alloc::vec![Camera::default()],
            active_camera: 0,
            interaction: InteractionEngine::new(config.drag_dead_zone, config.max_touches),
            frame: 0,
            changes: TransformChanges::default(),
            draw_list: DrawList::new(),
        }
    }

    /// Returns the root node.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the node tree.
    #[must_use]
    pub fn tree(&self) -> &NodeTree {
        &self.tree
    }

    /// Returns the node tree for mutation.
    pub fn tree_mut(&mut self) -> &mut NodeTree {
        &mut self.tree
    }

    /// Returns the index of the most recent step, `0` before the first.
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.frame
    }

    /// Returns the nodes recomputed by the most recent propagation.
    #[must_use]
    pub fn changes(&self) -> &TransformChanges {
        &self.changes
    }

    // -- cameras ------------------------------------------------------------

    /// Adds a camera and returns its index.
    pub fn add_camera(&mut self, camera: Camera) -> usize {
        self.cameras.push(camera);
        self.cameras.len() - 1
    }

    /// Returns all cameras.
    #[must_use]
    pub fn cameras(&self) -> &[Camera] {
        &self.cameras
    }

    /// Makes camera `index` the one used for input and rendering.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn set_active_camera(&mut self, index: usize) {
        assert!(
            index < self.cameras.len(),
            "camera index {index} out of bounds (len {})",
            self.cameras.len()
        );
        self.active_camera = index;
    }

    /// Returns the active camera.
    #[must_use]
    pub fn active_camera(&self) -> &Camera {
        &self.cameras[self.active_camera]
    }

    /// Returns camera `index` for mutation.
    pub fn camera_mut(&mut self, index: usize) -> Option<&mut Camera> {
        self.cameras.get_mut(index)
    }

    /// Maps a screen point into the world through the active camera.
    #[must_use]
    pub fn screen_to_world(&self, screen: Point) -> Point {
        self.active_camera().screen_to_world_point(screen)
    }

    // -- interaction --------------------------------------------------------

    /// Registers a scene-level handler, called for every event before the
    /// target's own callback.
    pub fn on_event(&mut self, handler: impl FnMut(&mut EventContext<'_>, &InteractionEvent) + 'static) {
        self.interaction.on_event(handler);
    }

    /// Installs or removes the entity bridge.
    pub fn set_bridge(&mut self, bridge: Option<Box<dyn EntityBridge>>) {
        self.interaction.set_bridge(bridge);
    }

    /// Returns the synthetic input queue.
    ///
    /// Positions are in screen coordinates; one event is consumed per step.
    pub fn script(&mut self) -> &mut InputScript {
        self.interaction.script()
    }

    /// Routes every event of pointer `slot` to `node` until release.
    pub fn capture(&mut self, slot: usize, node: NodeId) {
        self.interaction.capture(slot, node);
    }

    /// Cancels a capture on pointer `slot`.
    pub fn release_capture(&mut self, slot: usize) {
        self.interaction.release_capture(slot);
    }

    /// Returns the state of pointer `slot` (0 is the mouse).
    #[must_use]
    pub fn pointer(&self, slot: usize) -> Option<&PointerState> {
        self.interaction.pointer(slot)
    }

    /// Returns the pinch state.
    #[must_use]
    pub fn pinch(&self) -> &PinchState {
        self.interaction.pinch()
    }

    /// Returns the interaction engine.
    #[must_use]
    pub fn interaction(&self) -> &InteractionEngine {
        &self.interaction
    }

    /// Returns the interaction engine for configuration.
    pub fn interaction_mut(&mut self) -> &mut InteractionEngine {
        &mut self.interaction
    }

    /// Returns the topmost interactive node under a world point.
    pub fn hit_test(&mut self, world: Point) -> Option<NodeId> {
        self.tree.hit_test(self.root, world)
    }

    // -- frame --------------------------------------------------------------

    /// Runs one simulation step: propagation, then input.
    pub fn step(&mut self, input: &RawInput) {
        self.step_traced(input, &mut Tracer::none());
    }

    /// Like [`step`](Self::step), reporting each phase to `tracer`.
    pub fn step_traced(&mut self, input: &RawInput, tracer: &mut Tracer<'_>) {
        self.frame += 1;
        let frame_index = self.frame;

        self.propagate(tracer);

        tracer.phase_begin(&PhaseBeginEvent {
            frame_index,
            phase: PhaseKind::Interact,
        });
        let screen_to_world = self.active_camera().screen_to_world();
        self.interaction.process(
            &mut self.tree,
            self.root,
            input,
            screen_to_world,
            tracer,
            frame_index,
        );
        tracer.phase_end(&PhaseEndEvent {
            frame_index,
            phase: PhaseKind::Interact,
        });
    }

    /// Brings transforms up to date and builds this frame's draw list.
    pub fn render(&mut self) -> &DrawList {
        self.render_traced(&mut Tracer::none())
    }

    /// Like [`render`](Self::render), reporting each phase to `tracer`.
    pub fn render_traced(&mut self, tracer: &mut Tracer<'_>) -> &DrawList {
        let frame_index = self.frame;
        self.propagate(tracer);

        tracer.phase_begin(&PhaseBeginEvent {
            frame_index,
            phase: PhaseKind::Render,
        });
        let view = self.active_camera().view_transform();
        self.tree
            .render_traced(self.root, view, &mut self.draw_list, tracer, frame_index);
        tracer.phase_end(&PhaseEndEvent {
            frame_index,
            phase: PhaseKind::Render,
        });
        &self.draw_list
    }

    /// Renders and hands the draw list to `renderer`.
    pub fn present(&mut self, renderer: &mut dyn Renderer) {
        self.present_traced(renderer, &mut Tracer::none());
    }

    /// Like [`present`](Self::present), reporting each phase to `tracer`.
    pub fn present_traced(&mut self, renderer: &mut dyn Renderer, tracer: &mut Tracer<'_>) {
        self.render_traced(tracer);
        let frame_index = self.frame;
        tracer.phase_begin(&PhaseBeginEvent {
            frame_index,
            phase: PhaseKind::Present,
        });
        renderer.submit(&self.draw_list);
        tracer.phase_end(&PhaseEndEvent {
            frame_index,
            phase: PhaseKind::Present,
        });
    }

    fn propagate(&mut self, tracer: &mut Tracer<'_>) {
        let frame_index = self.frame;
        tracer.phase_begin(&PhaseBeginEvent {
            frame_index,
            phase: PhaseKind::Propagate,
        });
        self.tree.update_transforms_into(self.root, &mut self.changes);
        tracer.propagate(&PropagateEvent {
            frame_index,
            transforms: self.changes.transforms.len(),
            alphas: self.changes.alphas.len(),
        });
        tracer.phase_end(&PhaseEndEvent {
            frame_index,
            phase: PhaseKind::Propagate,
        });
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use core::cell::RefCell;

    use kurbo::{Affine, Size, Vec2};

    use super::*;
    use crate::interaction::EventKind;
    use crate::node::NodeKind;

    fn scene_with_box() -> (Scene, NodeId) {
        let mut scene = Scene::new();
        let root = scene.root();
        let tree = scene.tree_mut();
        let sprite = tree.create(NodeKind::Sprite);
        tree.set_size(sprite, Size::new(50.0, 50.0));
        tree.set_interactive(sprite, true);
        tree.add_child(root, sprite);
        (scene, sprite)
    }

    #[test]
    fn step_counts_frames_and_propagates() {
        let (mut scene, sprite) = scene_with_box();
        scene.tree_mut().set_position(sprite, (10.0, 0.0));
        scene.step(&RawInput::default());
        assert_eq!(scene.frame_index(), 1);
        assert!(scene.changes().transforms.contains(&sprite.idx));
        assert_eq!(
            scene.tree().world_transform(sprite),
            Affine::translate((10.0, 0.0))
        );
    }

    #[test]
    fn input_goes_through_active_camera() {
        let (mut scene, sprite) = scene_with_box();
        let cam = scene.add_camera(Camera::new((100.0, 100.0), 2.0, 0.0));
        scene.set_active_camera(cam);
        let clicked = Rc::new(RefCell::new(false));
        let c = clicked.clone();
        scene
            .tree_mut()
            .set_handler(sprite, EventKind::Click, move |_, _| *c.borrow_mut() = true);

        // Screen (0, 0) is world (100, 100): outside the box.
        scene.script().click((0.0, 0.0));
        scene.step(&RawInput::default());
        scene.step(&RawInput::default());
        assert!(!*clicked.borrow());

        // Screen (-190, -190) is world (5, 5).
        scene.script().click((-190.0, -190.0));
        scene.step(&RawInput::default());
        scene.step(&RawInput::default());
        assert!(*clicked.borrow());
    }

    #[test]
    fn render_applies_view() {
        let (mut scene, sprite) = scene_with_box();
        *scene.camera_mut(0).unwrap() = Camera::new(Vec2::new(5.0, 0.0), 1.0, 0.0);
        let list = scene.render();
        let cmd = list.iter().find(|c| c.node == sprite).unwrap();
        assert_eq!(cmd.transform, Affine::translate((-5.0, 0.0)));
    }

    #[test]
    fn render_sees_handler_mutations() {
        let (mut scene, sprite) = scene_with_box();
        scene.tree_mut().set_handler(sprite, EventKind::PointerDown, move |cx, e| {
            if let Some(t) = e.target {
                cx.set_position(t, (30.0, 0.0));
            }
        });
        scene.step(&RawInput::mouse((1.0, 1.0), true));
        let list = scene.render();
        let cmd = list.iter().find(|c| c.node == sprite).unwrap();
        assert_eq!(cmd.transform, Affine::translate((30.0, 0.0)));
    }

    #[test]
    fn present_submits_draw_list() {
        struct Count(usize);
        impl Renderer for Count {
            fn submit(&mut self, list: &DrawList) {
                self.0 = list.len();
            }
        }
        let (mut scene, _) = scene_with_box();
        let mut renderer = Count(0);
        scene.present(&mut renderer);
        // Containers draw nothing themselves.
        assert_eq!(renderer.0, 1);
    }

    #[test]
    fn scenes_are_isolated() {
        let mut strict = Scene::with_config(SceneConfig {
            debug: DebugContext::ENABLED,
            ..SceneConfig::default()
        });
        let mut lenient = Scene::with_config(SceneConfig {
            debug: DebugContext::DISABLED,
            ..SceneConfig::default()
        });
        let a = strict.tree_mut().create_container();
        let b = lenient.tree_mut().create_container();
        lenient.tree_mut().dispose(b);
        // A stale handle is a no-op in the lenient scene only.
        lenient.tree_mut().set_position(b, (1.0, 1.0));
        strict.tree_mut().set_position(a, (1.0, 1.0));
        assert!(strict.tree().debug_context().enabled);
        assert!(!lenient.tree().debug_context().enabled);
        assert_eq!(lenient.tree().len(), 1);
        assert_eq!(strict.tree().len(), 2);
    }

    #[test]
    #[should_panic(expected = "camera index 3 out of bounds")]
    fn bad_camera_index_panics() {
        Scene::new().set_active_camera(3);
    }
}
