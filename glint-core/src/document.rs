//! Editor document
//!
//! A [`SceneDocument`] is one open editor tab: the scene graph (if a scene is
//! open), the selection, the cached hierarchy snapshot, and the dirty flag.
//! The ordered mutation helpers at the bottom keep the derived state
//! consistent with every structural edit: canonical tree first, then the
//! hierarchy snapshot, then the dirty flag, then the selection.

use crate::hierarchy::HierarchySnapshot;
use crate::node::NodeId;
use crate::scene::SceneGraph;
use crate::selection::Selection;
use uuid::Uuid;

/// One open editor tab
#[derive(Clone, Debug)]
pub struct SceneDocument {
    /// Unique identifier for this tab
    pub id: Uuid,

    /// The open scene, if any
    scene: Option<SceneGraph>,

    /// Current node selection
    selection: Selection,

    /// Cached tree snapshot for read-only observers
    hierarchy: HierarchySnapshot,

    /// Whether the document has unsaved changes
    dirty: bool,
}

impl Default for SceneDocument {
    fn default() -> Self {
        Self::empty()
    }
}

impl SceneDocument {
    /// Create a document with no scene open
    pub fn empty() -> Self {
        Self {
            id: Uuid::new_v4(),
            scene: None,
            selection: Selection::new(),
            hierarchy: HierarchySnapshot::default(),
            dirty: false,
        }
    }

    /// Create a document holding the given scene
    pub fn with_scene(scene: SceneGraph) -> Self {
        let mut document = Self::empty();
        document.open_scene(scene);
        document
    }

    /// Open a scene, replacing any current one
    ///
    /// Resets selection and the dirty flag; the hierarchy snapshot is
    /// captured immediately.
    pub fn open_scene(&mut self, scene: SceneGraph) {
        self.hierarchy = HierarchySnapshot::capture(&scene);
        self.scene = Some(scene);
        self.selection.clear();
        self.dirty = false;
    }

    /// Close the current scene, if any
    pub fn close_scene(&mut self) -> Option<SceneGraph> {
        self.selection.clear();
        self.hierarchy = HierarchySnapshot::default();
        self.dirty = false;
        self.scene.take()
    }

    /// Whether a scene is open
    pub fn has_scene(&self) -> bool {
        self.scene.is_some()
    }

    /// Read access to the open scene
    pub fn scene(&self) -> Option<&SceneGraph> {
        self.scene.as_ref()
    }

    /// Mutable scene access, for commands and the active transform session
    pub(crate) fn scene_mut(&mut self) -> Option<&mut SceneGraph> {
        self.scene.as_mut()
    }

    /// Read access to the selection
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Mutable selection access
    ///
    /// Selecting is not an undoable edit; UI code may change it directly.
    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    /// The cached hierarchy snapshot
    pub fn hierarchy(&self) -> &HierarchySnapshot {
        &self.hierarchy
    }

    /// Whether the document has unsaved changes
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clear the dirty flag, e.g. after a successful save
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    // === ORDERED MUTATION HELPERS (called after the tree is mutated) ===

    /// Bookkeeping after a node was inserted: snapshot, dirty, select it
    pub(crate) fn commit_inserted(&mut self, id: &NodeId) {
        self.refresh_hierarchy();
        self.dirty = true;
        self.selection.select_only(id.clone());
    }

    /// Bookkeeping after nodes were removed: snapshot, dirty, deselect them
    pub(crate) fn commit_removed(&mut self, removed: &[NodeId]) {
        self.refresh_hierarchy();
        self.dirty = true;
        self.selection.drop_ids(removed);
    }

    /// Bookkeeping after node names/links changed: snapshot, dirty
    pub(crate) fn commit_nodes_changed(&mut self) {
        self.refresh_hierarchy();
        self.dirty = true;
    }

    /// Bookkeeping after field-only edits (transforms, properties)
    pub(crate) fn commit_fields_changed(&mut self) {
        self.dirty = true;
    }

    fn refresh_hierarchy(&mut self) {
        self.hierarchy = match &self.scene {
            Some(scene) => HierarchySnapshot::capture(scene),
            None => HierarchySnapshot::default(),
        };
    }
}
