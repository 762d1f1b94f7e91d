//! Create node command
//!
//! The template every node-creation action follows: allocate a
//! collision-checked id, build the typed kind through the node factory,
//! insert into the tree and the id map, refresh the hierarchy snapshot, mark
//! the document dirty, and select the new node. Undo detaches the node; redo
//! re-inserts the very same node value at the same position so references
//! keyed by its id stay valid.

use crate::command::{
    require_open_scene, Command, CommandContext, CommandError, CommandMeta, Execution, Precondition,
};
use crate::document::SceneDocument;
use crate::history::{Edit, HistoryEntry};
use crate::node::{Node, NodeId, PropertyBag};
use crate::scene::DetachedSubtree;
use std::collections::BTreeMap;

/// Command that creates one node of a registered type
pub struct CreateNodeCommand {
    /// Type tag resolved through the node factory
    type_tag: String,

    /// Display name; defaults to the kind's display name
    name: Option<String>,

    /// Parent to attach under; `None` creates a root node
    parent: Option<NodeId>,

    /// Initial properties handed to the factory builder
    properties: PropertyBag,

    /// Id of the created node (set after execution)
    created: Option<NodeId>,
}

impl CreateNodeCommand {
    /// Create a command for the given node type
    pub fn new(type_tag: impl Into<String>) -> Self {
        Self {
            type_tag: type_tag.into(),
            name: None,
            parent: None,
            properties: PropertyBag::new(),
            created: None,
        }
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attach under a parent node instead of the scene root
    pub fn with_parent(mut self, parent: NodeId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Supply initial properties for the factory builder
    pub fn with_properties(mut self, properties: PropertyBag) -> Self {
        self.properties = properties;
        self
    }

    /// Id of the created node, available after execution
    pub fn created_id(&self) -> Option<&NodeId> {
        self.created.as_ref()
    }
}

impl Command for CreateNodeCommand {
    fn meta(&self) -> CommandMeta {
        CommandMeta {
            id: "scene.createNode",
            title: "Create Node",
            shortcut: None,
            when: Some(SceneDocument::has_scene),
        }
    }

    fn preconditions(&self, document: &SceneDocument) -> Precondition {
        let ready = require_open_scene(document);
        if !ready.is_ready() {
            return ready;
        }
        if let (Some(parent), Some(scene)) = (&self.parent, document.scene()) {
            if !scene.contains(parent) {
                return Precondition::blocked(
                    format!("Parent node {parent} no longer exists"),
                    false,
                    crate::command::BlockScope::Scene,
                );
            }
        }
        Precondition::Ready
    }

    fn execute(&mut self, ctx: &mut CommandContext) -> Result<Execution, CommandError> {
        let kind = ctx.services.factory.create(&self.type_tag, &self.properties)?;
        let scene = ctx.document.scene_mut().ok_or(CommandError::SceneClosed)?;

        let id = scene.allocate_node_id(&self.type_tag);
        let name = self
            .name
            .clone()
            .unwrap_or_else(|| kind.display_name().to_string());
        let mut node = Node::new(id.clone(), name, kind);
        node.properties = self.properties.clone();

        scene.insert_node(node, self.parent.as_ref(), None)?;
        ctx.document.commit_inserted(&id);
        self.created = Some(id);
        Ok(Execution::mutated())
    }

    fn post_commit(&mut self, _ctx: &mut CommandContext) -> Option<HistoryEntry> {
        let node_id = self.created.clone()?;
        Some(HistoryEntry::new(
            format!("Create {}", self.type_tag),
            CreateNodeEdit {
                node_id,
                detached: None,
            },
        ))
    }

    fn telemetry_metadata(&self) -> BTreeMap<String, serde_json::Value> {
        let mut metadata = BTreeMap::new();
        metadata.insert(
            "typeTag".to_string(),
            serde_json::Value::String(self.type_tag.clone()),
        );
        metadata
    }
}

/// Undo/redo transaction for a created node
struct CreateNodeEdit {
    node_id: NodeId,

    /// The detached node while undone; re-inserted as-is on redo
    detached: Option<DetachedSubtree>,
}

impl Edit for CreateNodeEdit {
    fn undo(&mut self, document: &mut SceneDocument) {
        let Some(scene) = document.scene_mut() else {
            return;
        };
        self.detached = scene.remove_subtree(&self.node_id);
        document.commit_removed(&[self.node_id.clone()]);
    }

    fn redo(&mut self, document: &mut SceneDocument) {
        let Some(detached) = self.detached.take() else {
            return;
        };
        let Some(scene) = document.scene_mut() else {
            return;
        };
        if let Err(err) = scene.restore_subtree(detached) {
            log::warn!("could not restore {}: {err}", self.node_id);
            return;
        }
        document.commit_inserted(&self.node_id);
    }
}
