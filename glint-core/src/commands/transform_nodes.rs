//! Transform records and edits for 2D nodes
//!
//! A [`Transform2dState`] is the before/after record committed at the end of
//! a stage gesture: position, rotation in degrees, scale, and the declared
//! size and container layout offset where the node kind carries them.

use crate::command::{
    require_open_scene, Command, CommandContext, CommandError, CommandMeta, Execution, Precondition,
};
use crate::document::SceneDocument;
use crate::history::{Edit, HistoryEntry};
use crate::node::{Node, NodeId};
use kurbo::{Point, Size, Vec2};
use std::collections::HashMap;

/// Snapshot of every field a 2D transform transaction touches
#[derive(Clone, Debug, PartialEq)]
pub struct Transform2dState {
    pub position: Point,
    /// Rotation in degrees; radians stay internal to the node
    pub rotation_deg: f64,
    pub scale: Vec2,
    /// Declared width/height, for kinds with explicit dimensions
    pub size: Option<Size>,
    /// Container layout offset, re-derived after move gestures
    pub layout_offset: Option<Vec2>,
}

impl Transform2dState {
    /// Capture the current state of a node; `None` for non-2D kinds
    pub fn capture(node: &Node) -> Option<Self> {
        let transform = node.transform_2d()?;
        Some(Self {
            position: transform.position,
            rotation_deg: transform.rotation.to_degrees(),
            scale: transform.scale,
            size: node.declared_size(),
            layout_offset: node.layout().map(|(_, offset)| offset),
        })
    }

    /// Write this state back onto a node
    pub(crate) fn apply(&self, node: &mut Node) {
        if let Some(transform) = node.transform_2d_mut() {
            transform.position = self.position;
            transform.rotation = self.rotation_deg.to_radians();
            transform.scale = self.scale;
        }
        if let Some(size) = self.size {
            node.set_declared_size(size);
        }
        if let Some(offset) = self.layout_offset {
            node.set_layout_offset(offset);
        }
    }
}

fn apply_state(document: &mut SceneDocument, id: &NodeId, state: &Transform2dState) {
    let Some(scene) = document.scene_mut() else {
        return;
    };
    match scene.node_mut(id) {
        Some(node) => state.apply(node),
        None => log::warn!("transform target {id} no longer exists"),
    }
    document.commit_fields_changed();
}

/// One node's undoable transform transaction
///
/// Stage gestures commit one of these per manipulated node.
pub struct TransformNodeEdit {
    node_id: NodeId,
    before: Transform2dState,
    after: Transform2dState,
}

impl TransformNodeEdit {
    /// Create an edit from captured before/after states
    pub fn new(node_id: NodeId, before: Transform2dState, after: Transform2dState) -> Self {
        Self {
            node_id,
            before,
            after,
        }
    }
}

impl Edit for TransformNodeEdit {
    fn undo(&mut self, document: &mut SceneDocument) {
        apply_state(document, &self.node_id, &self.before);
    }

    fn redo(&mut self, document: &mut SceneDocument) {
        apply_state(document, &self.node_id, &self.after);
    }
}

/// Batch transform edit, used by the programmatic command below
struct TransformNodesEdit {
    changes: HashMap<NodeId, (Transform2dState, Transform2dState)>,
}

impl Edit for TransformNodesEdit {
    fn undo(&mut self, document: &mut SceneDocument) {
        for (id, (before, _after)) in &self.changes {
            apply_state(document, id, before);
        }
    }

    fn redo(&mut self, document: &mut SceneDocument) {
        for (id, (_before, after)) in &self.changes {
            apply_state(document, id, after);
        }
    }
}

/// Command applying explicit before/after transform states to many nodes
pub struct TransformNodesCommand {
    /// Map of node id to (old state, new state)
    changes: HashMap<NodeId, (Transform2dState, Transform2dState)>,
    applied: usize,
}

impl TransformNodesCommand {
    /// Create a new transform command
    pub fn new(changes: HashMap<NodeId, (Transform2dState, Transform2dState)>) -> Self {
        Self {
            changes,
            applied: 0,
        }
    }
}

impl Command for TransformNodesCommand {
    fn meta(&self) -> CommandMeta {
        CommandMeta {
            id: "scene.transformNodes",
            title: "Transform Nodes",
            shortcut: None,
            when: Some(SceneDocument::has_scene),
        }
    }

    fn preconditions(&self, document: &SceneDocument) -> Precondition {
        require_open_scene(document)
    }

    fn execute(&mut self, ctx: &mut CommandContext) -> Result<Execution, CommandError> {
        let scene = ctx.document.scene_mut().ok_or(CommandError::SceneClosed)?;
        self.applied = 0;
        for (id, (before, after)) in &self.changes {
            if before == after {
                continue;
            }
            if let Some(node) = scene.node_mut(id) {
                after.apply(node);
                self.applied += 1;
            }
        }
        if self.applied == 0 {
            return Ok(Execution::no_op());
        }
        ctx.document.commit_fields_changed();
        Ok(Execution::mutated())
    }

    fn post_commit(&mut self, _ctx: &mut CommandContext) -> Option<HistoryEntry> {
        let label = if self.changes.len() == 1 {
            "Transform node".to_string()
        } else {
            format!("Transform {} nodes", self.changes.len())
        };
        Some(HistoryEntry::new(
            label,
            TransformNodesEdit {
                changes: std::mem::take(&mut self.changes),
            },
        ))
    }
}
