//! Scene graph store
//!
//! The graph owns every [`Node`] in an id-keyed map; the tree shape is
//! expressed through parent/children id links. Every node reachable from the
//! root collection appears exactly once in the map, and a node is never its
//! own ancestor. Structural edits go through [`SceneGraph::insert_node`],
//! [`SceneGraph::remove_subtree`], and [`SceneGraph::restore_subtree`] so the
//! map and the links can never drift apart.

use crate::node::{Node, NodeId, PropertyBag};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Current on-disk format version
pub const SCENE_FORMAT_VERSION: u32 = 1;

/// Structural errors raised by the scene graph
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("node id {0} already exists in this scene")]
    DuplicateNodeId(NodeId),

    #[error("node {0} does not exist")]
    MissingNode(NodeId),

    #[error("parent node {0} does not exist")]
    MissingParent(NodeId),

    #[error("attaching {node} under {parent} would create a cycle")]
    WouldCycle { node: NodeId, parent: NodeId },

    #[error("unknown node type {0:?}")]
    UnknownNodeType(String),

    #[error("scene graph invariant violated: {0}")]
    Corrupt(String),
}

/// A subtree detached from the graph, restorable at its original position
///
/// Holds the removed [`Node`] values themselves (preorder, subtree root
/// first). Restoring re-inserts the same values, so references keyed by node
/// id stay valid across undo/redo cycles.
#[derive(Clone, Debug)]
pub struct DetachedSubtree {
    nodes: Vec<Node>,
    parent: Option<NodeId>,
    index: usize,
}

impl DetachedSubtree {
    /// Id of the subtree root
    pub fn root_id(&self) -> &NodeId {
        self.nodes[0].id()
    }

    /// Ids of every node in the subtree, root first
    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.iter().map(|n| n.id())
    }
}

/// The document root: a tree of typed nodes with an id index
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SceneGraph {
    /// File format version this graph was loaded from / will save as
    pub format_version: u32,

    /// Free-form description shown in scene metadata panels
    #[serde(default)]
    pub description: String,

    /// Free-form scene metadata
    #[serde(default, skip_serializing_if = "PropertyBag::is_empty")]
    pub metadata: PropertyBag,

    /// Ordered root node ids
    roots: Vec<NodeId>,

    /// Every node in the graph, keyed by id
    nodes: HashMap<NodeId, Node>,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    /// Create an empty scene graph at the current format version
    pub fn new() -> Self {
        Self {
            format_version: SCENE_FORMAT_VERSION,
            description: String::new(),
            metadata: PropertyBag::new(),
            roots: Vec::new(),
            nodes: HashMap::new(),
        }
    }

    /// Number of nodes in the graph
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph holds no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether an id is present
    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Look up a node by id
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Mutable node access, for commands and the active transform session
    pub(crate) fn node_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Ordered root node ids
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Child ids of a node; empty if the id is unknown
    pub fn children_of(&self, id: &NodeId) -> &[NodeId] {
        self.nodes.get(id).map(|n| n.children()).unwrap_or(&[])
    }

    /// Iterate over all nodes in unspecified order
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Ids of a subtree in depth-first preorder, starting at `id`
    pub fn subtree_ids(&self, id: &NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id.clone()];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get(&current) {
                out.push(current);
                for child in node.children().iter().rev() {
                    stack.push(child.clone());
                }
            }
        }
        out
    }

    /// Whether `ancestor` is a strict ancestor of `id`
    pub fn is_ancestor(&self, ancestor: &NodeId, id: &NodeId) -> bool {
        let mut current = self.nodes.get(id).and_then(|n| n.parent().cloned());
        while let Some(parent) = current {
            if &parent == ancestor {
                return true;
            }
            current = self.nodes.get(&parent).and_then(|n| n.parent().cloned());
        }
        false
    }

    /// Generate a fresh id guaranteed not to collide with the current map
    pub fn allocate_node_id(&self, tag: &str) -> NodeId {
        loop {
            let id = NodeId::generate(tag);
            if !self.nodes.contains_key(&id) {
                return id;
            }
        }
    }

    /// Insert a node under `parent` (or as a root) at `index`
    ///
    /// `index` is clamped to the sibling count; `None` appends. The node must
    /// not bring children of its own — subtrees re-enter the graph through
    /// [`SceneGraph::restore_subtree`].
    pub fn insert_node(
        &mut self,
        mut node: Node,
        parent: Option<&NodeId>,
        index: Option<usize>,
    ) -> Result<(), SceneError> {
        if self.nodes.contains_key(node.id()) {
            return Err(SceneError::DuplicateNodeId(node.id().clone()));
        }
        let id = node.id().clone();
        match parent {
            Some(parent_id) => {
                let parent_node = self
                    .nodes
                    .get_mut(parent_id)
                    .ok_or_else(|| SceneError::MissingParent(parent_id.clone()))?;
                let at = index
                    .unwrap_or(parent_node.children.len())
                    .min(parent_node.children.len());
                parent_node.children.insert(at, id.clone());
                node.parent = Some(parent_id.clone());
            }
            None => {
                let at = index.unwrap_or(self.roots.len()).min(self.roots.len());
                self.roots.insert(at, id.clone());
                node.parent = None;
            }
        }
        node.children.clear();
        self.nodes.insert(id, node);
        Ok(())
    }

    /// Detach a node and all its descendants
    ///
    /// Returns the removed nodes together with the position they were
    /// detached from, or `None` if the id is unknown.
    pub fn remove_subtree(&mut self, id: &NodeId) -> Option<DetachedSubtree> {
        if !self.nodes.contains_key(id) {
            return None;
        }
        let ids = self.subtree_ids(id);
        let mut nodes = Vec::with_capacity(ids.len());
        for node_id in &ids {
            if let Some(node) = self.nodes.remove(node_id) {
                nodes.push(node);
            }
        }
        let parent = nodes[0].parent().cloned();
        let index = match &parent {
            Some(parent_id) => {
                let parent_node = self.nodes.get_mut(parent_id)?;
                let index = parent_node.children.iter().position(|c| c == id)?;
                parent_node.children.remove(index);
                index
            }
            None => {
                let index = self.roots.iter().position(|c| c == id)?;
                self.roots.remove(index);
                index
            }
        };
        Some(DetachedSubtree {
            nodes,
            parent,
            index,
        })
    }

    /// Re-insert a previously detached subtree at its original position
    ///
    /// The stored node values go back into the map untouched, so their ids,
    /// links, and field state are exactly what was removed.
    pub fn restore_subtree(&mut self, subtree: DetachedSubtree) -> Result<(), SceneError> {
        let DetachedSubtree {
            nodes,
            parent,
            index,
        } = subtree;
        let root_id = nodes[0].id().clone();
        if self.nodes.contains_key(&root_id) {
            return Err(SceneError::DuplicateNodeId(root_id));
        }
        match &parent {
            Some(parent_id) => {
                let parent_node = self
                    .nodes
                    .get_mut(parent_id)
                    .ok_or_else(|| SceneError::MissingParent(parent_id.clone()))?;
                let at = index.min(parent_node.children.len());
                parent_node.children.insert(at, root_id);
            }
            None => {
                let at = index.min(self.roots.len());
                self.roots.insert(at, root_id);
            }
        }
        for node in nodes {
            self.nodes.insert(node.id().clone(), node);
        }
        Ok(())
    }

    /// Check the reachability and linkage invariants
    ///
    /// Every node reachable from the roots must appear exactly once in the
    /// map, every map entry must be reachable, parent/child links must agree,
    /// and no node may be its own ancestor.
    pub fn validate(&self) -> Result<(), SceneError> {
        let mut seen: HashSet<&NodeId> = HashSet::new();
        let mut stack: Vec<(&NodeId, Option<&NodeId>)> =
            self.roots.iter().map(|id| (id, None)).collect();

        while let Some((id, expected_parent)) = stack.pop() {
            let node = self
                .nodes
                .get(id)
                .ok_or_else(|| SceneError::Corrupt(format!("{id} is linked but not stored")))?;
            if !seen.insert(id) {
                return Err(SceneError::Corrupt(format!(
                    "{id} is reachable more than once"
                )));
            }
            if node.parent() != expected_parent {
                return Err(SceneError::Corrupt(format!(
                    "{id} has a stale parent link"
                )));
            }
            for child in node.children() {
                stack.push((child, Some(id)));
            }
        }

        if seen.len() != self.nodes.len() {
            return Err(SceneError::Corrupt(format!(
                "{} stored node(s) unreachable from the roots",
                self.nodes.len() - seen.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{NodeKind, Transform2D};

    fn node2d(id: &str) -> Node {
        Node::new(
            NodeId::new(id),
            id.to_string(),
            NodeKind::Node2d(Transform2D::default()),
        )
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut graph = SceneGraph::new();
        graph.insert_node(node2d("a"), None, None).unwrap();
        graph
            .insert_node(node2d("b"), Some(&NodeId::new("a")), None)
            .unwrap();

        assert_eq!(graph.len(), 2);
        assert_eq!(graph.roots(), &[NodeId::new("a")]);
        assert_eq!(graph.children_of(&NodeId::new("a")), &[NodeId::new("b")]);
        assert_eq!(
            graph.node(&NodeId::new("b")).unwrap().parent(),
            Some(&NodeId::new("a"))
        );
        graph.validate().unwrap();
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut graph = SceneGraph::new();
        graph.insert_node(node2d("a"), None, None).unwrap();
        let err = graph.insert_node(node2d("a"), None, None).unwrap_err();
        assert_eq!(err, SceneError::DuplicateNodeId(NodeId::new("a")));
    }

    #[test]
    fn test_missing_parent_rejected() {
        let mut graph = SceneGraph::new();
        let err = graph
            .insert_node(node2d("a"), Some(&NodeId::new("ghost")), None)
            .unwrap_err();
        assert_eq!(err, SceneError::MissingParent(NodeId::new("ghost")));
    }

    #[test]
    fn test_remove_and_restore_subtree() {
        let mut graph = SceneGraph::new();
        graph.insert_node(node2d("root"), None, None).unwrap();
        graph
            .insert_node(node2d("child"), Some(&NodeId::new("root")), None)
            .unwrap();
        graph
            .insert_node(node2d("grandchild"), Some(&NodeId::new("child")), None)
            .unwrap();
        graph
            .insert_node(node2d("sibling"), Some(&NodeId::new("root")), None)
            .unwrap();

        let detached = graph.remove_subtree(&NodeId::new("child")).unwrap();
        assert_eq!(detached.node_ids().count(), 2);
        assert_eq!(graph.len(), 2);
        assert!(!graph.contains(&NodeId::new("grandchild")));
        graph.validate().unwrap();

        graph.restore_subtree(detached).unwrap();
        assert_eq!(graph.len(), 4);
        // Restored at its original index, before the sibling.
        assert_eq!(
            graph.children_of(&NodeId::new("root")),
            &[NodeId::new("child"), NodeId::new("sibling")]
        );
        graph.validate().unwrap();
    }

    #[test]
    fn test_subtree_preorder() {
        let mut graph = SceneGraph::new();
        graph.insert_node(node2d("r"), None, None).unwrap();
        graph
            .insert_node(node2d("a"), Some(&NodeId::new("r")), None)
            .unwrap();
        graph
            .insert_node(node2d("b"), Some(&NodeId::new("r")), None)
            .unwrap();
        graph
            .insert_node(node2d("a1"), Some(&NodeId::new("a")), None)
            .unwrap();

        let order = graph.subtree_ids(&NodeId::new("r"));
        assert_eq!(
            order,
            vec![
                NodeId::new("r"),
                NodeId::new("a"),
                NodeId::new("a1"),
                NodeId::new("b"),
            ]
        );
    }

    #[test]
    fn test_is_ancestor() {
        let mut graph = SceneGraph::new();
        graph.insert_node(node2d("r"), None, None).unwrap();
        graph
            .insert_node(node2d("a"), Some(&NodeId::new("r")), None)
            .unwrap();
        graph
            .insert_node(node2d("a1"), Some(&NodeId::new("a")), None)
            .unwrap();

        assert!(graph.is_ancestor(&NodeId::new("r"), &NodeId::new("a1")));
        assert!(graph.is_ancestor(&NodeId::new("a"), &NodeId::new("a1")));
        assert!(!graph.is_ancestor(&NodeId::new("a1"), &NodeId::new("r")));
        assert!(!graph.is_ancestor(&NodeId::new("a"), &NodeId::new("a")));
    }

    #[test]
    fn test_allocated_ids_do_not_collide() {
        let mut graph = SceneGraph::new();
        for _ in 0..64 {
            let id = graph.allocate_node_id("node2d");
            assert!(!graph.contains(&id));
            graph
                .insert_node(
                    Node::new(id, "n", NodeKind::Node2d(Transform2D::default())),
                    None,
                    None,
                )
                .unwrap();
        }
        assert_eq!(graph.len(), 64);
    }

    #[test]
    fn test_validate_detects_unreachable_node() {
        let mut graph = SceneGraph::new();
        graph.insert_node(node2d("a"), None, None).unwrap();
        // Sever the root link behind the store's back.
        graph.roots.clear();
        assert!(matches!(graph.validate(), Err(SceneError::Corrupt(_))));
    }
}
