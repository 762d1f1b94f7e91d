//! Selection state management
//!
//! Tracks the set of selected nodes plus the primary node (the one whose
//! properties are shown in the inspector). Kept separate from the scene
//! graph so read-only UI can take it without touching the document.

use crate::node::NodeId;
use crate::scene::SceneGraph;
use serde::{Deserialize, Serialize};

/// Selection state for one editor tab
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    /// Currently selected node ids, in selection order
    node_ids: Vec<NodeId>,

    /// The primary selected node
    primary: Option<NodeId>,
}

impl Selection {
    /// Create a new empty selection
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node to the selection; first addition becomes primary
    pub fn add(&mut self, id: NodeId) {
        if !self.node_ids.contains(&id) {
            if self.primary.is_none() {
                self.primary = Some(id.clone());
            }
            self.node_ids.push(id);
        }
    }

    /// Remove a node from the selection
    pub fn remove(&mut self, id: &NodeId) {
        self.node_ids.retain(|n| n != id);
        if self.primary.as_ref() == Some(id) {
            self.primary = self.node_ids.first().cloned();
        }
    }

    /// Toggle a node's selection state
    pub fn toggle(&mut self, id: NodeId) {
        if self.contains(&id) {
            self.remove(&id);
        } else {
            self.add(id);
        }
    }

    /// Replace the selection with a single node
    pub fn select_only(&mut self, id: NodeId) {
        self.node_ids.clear();
        self.node_ids.push(id.clone());
        self.primary = Some(id);
    }

    /// Replace the selection with multiple nodes; the first becomes primary
    pub fn select_many(&mut self, ids: &[NodeId]) {
        self.node_ids.clear();
        for id in ids {
            if !self.node_ids.contains(id) {
                self.node_ids.push(id.clone());
            }
        }
        self.primary = self.node_ids.first().cloned();
    }

    /// Clear the selection
    pub fn clear(&mut self) {
        self.node_ids.clear();
        self.primary = None;
    }

    /// Drop every selected id that no longer exists in the graph
    pub fn drop_missing(&mut self, graph: &SceneGraph) {
        self.node_ids.retain(|id| graph.contains(id));
        if let Some(primary) = &self.primary {
            if !graph.contains(primary) {
                self.primary = self.node_ids.first().cloned();
            }
        }
    }

    /// Drop the given ids from the selection
    pub fn drop_ids(&mut self, removed: &[NodeId]) {
        self.node_ids.retain(|id| !removed.contains(id));
        if let Some(primary) = &self.primary {
            if removed.contains(primary) {
                self.primary = self.node_ids.first().cloned();
            }
        }
    }

    /// Whether a node is selected
    pub fn contains(&self, id: &NodeId) -> bool {
        self.node_ids.contains(id)
    }

    /// Whether nothing is selected
    pub fn is_empty(&self) -> bool {
        self.node_ids.is_empty()
    }

    /// Number of selected nodes
    pub fn len(&self) -> usize {
        self.node_ids.len()
    }

    /// The selected node ids, in selection order
    pub fn node_ids(&self) -> &[NodeId] {
        &self.node_ids
    }

    /// The primary selected node
    pub fn primary_node_id(&self) -> Option<&NodeId> {
        self.primary.as_ref()
    }
}
