//! Set node properties command
//!
//! Changes a single property (name, instance path, or a free-form bag entry)
//! on one or more nodes, stashing the old values for rollback.

use crate::command::{
    require_open_scene, Command, CommandContext, CommandError, CommandMeta, Execution, Precondition,
};
use crate::document::SceneDocument;
use crate::history::{Edit, HistoryEntry};
use crate::node::{Node, NodeId};

/// Property that can be set on a node
#[derive(Clone, Debug)]
pub enum NodeProperty {
    Name(String),
    InstancePath(Option<String>),
    /// Free-form bag entry; `None` removes the key
    Bag(String, Option<serde_json::Value>),
}

/// Stored old value for rollback
#[derive(Clone, Debug)]
enum OldValue {
    Name(String),
    InstancePath(Option<String>),
    Bag(Option<serde_json::Value>),
}

fn read_old(node: &Node, property: &NodeProperty) -> OldValue {
    match property {
        NodeProperty::Name(_) => OldValue::Name(node.name.clone()),
        NodeProperty::InstancePath(_) => OldValue::InstancePath(node.instance_path.clone()),
        NodeProperty::Bag(key, _) => OldValue::Bag(node.properties.get(key).cloned()),
    }
}

fn write_new(node: &mut Node, property: &NodeProperty) {
    match property {
        NodeProperty::Name(name) => node.name = name.clone(),
        NodeProperty::InstancePath(path) => node.instance_path = path.clone(),
        NodeProperty::Bag(key, Some(value)) => {
            node.properties.insert(key.clone(), value.clone());
        }
        NodeProperty::Bag(key, None) => {
            node.properties.remove(key);
        }
    }
}

fn write_old(node: &mut Node, property: &NodeProperty, old: &OldValue) {
    match (property, old) {
        (NodeProperty::Name(_), OldValue::Name(name)) => node.name = name.clone(),
        (NodeProperty::InstancePath(_), OldValue::InstancePath(path)) => {
            node.instance_path = path.clone();
        }
        (NodeProperty::Bag(key, _), OldValue::Bag(Some(value))) => {
            node.properties.insert(key.clone(), value.clone());
        }
        (NodeProperty::Bag(key, _), OldValue::Bag(None)) => {
            node.properties.remove(key);
        }
        _ => {}
    }
}

/// Command that sets one property on one or more nodes
pub struct SetNodePropertiesCommand {
    node_ids: Vec<NodeId>,
    property: NodeProperty,

    /// Old values per node, captured by execute
    old_values: Vec<Option<OldValue>>,
}

impl SetNodePropertiesCommand {
    /// Set a property on a single node
    pub fn new(node_id: NodeId, property: NodeProperty) -> Self {
        Self {
            node_ids: vec![node_id],
            property,
            old_values: vec![None],
        }
    }

    /// Set a property on multiple nodes
    pub fn new_batch(node_ids: Vec<NodeId>, property: NodeProperty) -> Self {
        let old_values = vec![None; node_ids.len()];
        Self {
            node_ids,
            property,
            old_values,
        }
    }
}

impl Command for SetNodePropertiesCommand {
    fn meta(&self) -> CommandMeta {
        CommandMeta {
            id: "scene.setNodeProperties",
            title: "Set Node Properties",
            shortcut: None,
            when: Some(SceneDocument::has_scene),
        }
    }

    fn preconditions(&self, document: &SceneDocument) -> Precondition {
        require_open_scene(document)
    }

    fn execute(&mut self, ctx: &mut CommandContext) -> Result<Execution, CommandError> {
        let scene = ctx.document.scene_mut().ok_or(CommandError::SceneClosed)?;
        let mut touched = 0;
        for (i, id) in self.node_ids.iter().enumerate() {
            if let Some(node) = scene.node_mut(id) {
                if self.old_values[i].is_none() {
                    self.old_values[i] = Some(read_old(node, &self.property));
                }
                write_new(node, &self.property);
                touched += 1;
            }
        }
        if touched == 0 {
            return Ok(Execution::no_op());
        }
        // Names show up in the hierarchy snapshot, so refresh it too.
        ctx.document.commit_nodes_changed();
        Ok(Execution::mutated())
    }

    fn post_commit(&mut self, _ctx: &mut CommandContext) -> Option<HistoryEntry> {
        let label = match &self.property {
            NodeProperty::Name(_) => "Rename node".to_string(),
            NodeProperty::InstancePath(_) => "Set instance path".to_string(),
            NodeProperty::Bag(key, _) => format!("Set {key}"),
        };
        Some(HistoryEntry::new(
            label,
            SetNodePropertiesEdit {
                node_ids: std::mem::take(&mut self.node_ids),
                property: self.property.clone(),
                old_values: std::mem::take(&mut self.old_values),
            },
        ))
    }
}

struct SetNodePropertiesEdit {
    node_ids: Vec<NodeId>,
    property: NodeProperty,
    old_values: Vec<Option<OldValue>>,
}

impl Edit for SetNodePropertiesEdit {
    fn undo(&mut self, document: &mut SceneDocument) {
        let Some(scene) = document.scene_mut() else {
            return;
        };
        for (i, id) in self.node_ids.iter().enumerate() {
            if let (Some(node), Some(old)) = (scene.node_mut(id), &self.old_values[i]) {
                write_old(node, &self.property, old);
            }
        }
        document.commit_nodes_changed();
    }

    fn redo(&mut self, document: &mut SceneDocument) {
        let Some(scene) = document.scene_mut() else {
            return;
        };
        for id in &self.node_ids {
            if let Some(node) = scene.node_mut(id) {
                write_new(node, &self.property);
            }
        }
        document.commit_nodes_changed();
    }
}
