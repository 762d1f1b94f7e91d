//! Editor session
//!
//! Ties the command engine, the stage camera, and the single active gesture
//! slot together. One gesture runs at a time: `begin_transform` refuses to
//! start while a gesture is active, and only `end_transform` clears the
//! slot. Releasing the pointer always finalizes whatever state is current;
//! there is no separate cancel path.

use crate::gizmo::{Handle, SelectionOverlay};
use crate::history::CommandEngine;
use crate::transform2d::{
    complete_transform, start_transform, update_transform, Active2DTransform,
};
use crate::viewport::{OrthographicCamera, Viewport};
use kurbo::Point;

/// Handle hit-test tolerance in device-independent pixels
pub const HANDLE_TOLERANCE_DIP: f64 = 6.0;

/// One interactive editor session over a document
pub struct Editor {
    engine: CommandEngine,
    camera: OrthographicCamera,
    viewport: Viewport,
    active_transform: Option<Active2DTransform>,
}

impl Editor {
    /// Create an editor around a command engine
    pub fn new(engine: CommandEngine) -> Self {
        Self {
            engine,
            camera: OrthographicCamera::default(),
            viewport: Viewport::default(),
            active_transform: None,
        }
    }

    /// The command engine
    pub fn engine(&self) -> &CommandEngine {
        &self.engine
    }

    /// Mutable command engine access
    pub fn engine_mut(&mut self) -> &mut CommandEngine {
        &mut self.engine
    }

    /// The stage camera
    pub fn camera(&self) -> &OrthographicCamera {
        &self.camera
    }

    /// Replace the stage camera (pan/zoom)
    pub fn set_camera(&mut self, camera: OrthographicCamera) {
        self.camera = camera;
    }

    /// The viewport dimensions
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Update the viewport dimensions
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Whether a gesture is in progress
    pub fn is_transforming(&self) -> bool {
        self.active_transform.is_some()
    }

    /// The selection overlay for the current selection, if it has 2D bounds
    pub fn selection_overlay(&self) -> Option<SelectionOverlay> {
        let document = self.engine.document();
        let scene = document.scene()?;
        SelectionOverlay::from_selection(scene, document.selection().node_ids())
    }

    /// Hit test a screen position against the selection overlay
    pub fn hit_test_handle(&self, pointer_screen: Point) -> Option<Handle> {
        let overlay = self.selection_overlay()?;
        let world = self.camera.screen_to_world(pointer_screen, &self.viewport);
        overlay.hit_test(world, self.handle_tolerance())
    }

    /// Begin a gesture at the given screen position
    ///
    /// Returns false when a gesture is already active, when the pointer hits
    /// no handle or selection bounds, or when the selection has no 2D nodes.
    pub fn begin_transform(&mut self, pointer_screen: Point) -> bool {
        if self.active_transform.is_some() {
            return false;
        }
        let Some(handle) = self.hit_test_handle(pointer_screen) else {
            return false;
        };
        let Some(overlay) = self.selection_overlay() else {
            return false;
        };
        let document = self.engine.document();
        let Some(scene) = document.scene() else {
            return false;
        };
        self.active_transform = start_transform(
            pointer_screen,
            handle,
            &overlay,
            scene,
            document.selection().node_ids(),
            &self.camera,
            &self.viewport,
        );
        self.active_transform.is_some()
    }

    /// Feed a pointer move into the active gesture
    ///
    /// Mutates the scene directly as a live preview; nothing is recorded
    /// until the gesture ends.
    pub fn drag_to(&mut self, pointer_screen: Point) {
        let Some(session) = &self.active_transform else {
            return;
        };
        let camera = self.camera;
        let viewport = self.viewport;
        let Some(scene) = self.engine.document_mut().scene_mut() else {
            return;
        };
        update_transform(pointer_screen, session, scene, &camera, &viewport);
    }

    /// End the active gesture, committing one transaction per changed node
    ///
    /// Returns the number of history entries pushed; zero for a zero-delta
    /// gesture.
    pub fn end_transform(&mut self) -> usize {
        let Some(session) = self.active_transform.take() else {
            return 0;
        };
        let entries = {
            let document = self.engine.document_mut();
            let Some(scene) = document.scene_mut() else {
                return 0;
            };
            let entries = complete_transform(session, scene);
            if !entries.is_empty() {
                document.commit_fields_changed();
            }
            entries
        };
        let count = entries.len();
        for entry in entries {
            self.engine.push_entry(entry);
        }
        count
    }

    fn handle_tolerance(&self) -> f64 {
        HANDLE_TOLERANCE_DIP * self.viewport.pixel_ratio / self.camera.zoom
    }
}
