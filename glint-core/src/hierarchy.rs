//! Cached hierarchy snapshot
//!
//! A flattened, read-only view of the scene tree for observers such as the
//! tree-view UI. Commands refresh it after every structural mutation so
//! observers never walk the live graph.

use crate::node::NodeId;
use crate::scene::SceneGraph;
use serde::{Deserialize, Serialize};

/// One row of the flattened tree view
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HierarchyRow {
    pub id: NodeId,
    pub name: String,
    pub type_tag: String,
    /// Nesting depth; roots are at 0
    pub depth: usize,
    pub child_count: usize,
    /// Whether the node references an external prefab
    pub instanced: bool,
}

/// Depth-first snapshot of the scene tree
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HierarchySnapshot {
    rows: Vec<HierarchyRow>,
}

impl HierarchySnapshot {
    /// Capture the current tree shape of a graph
    pub fn capture(graph: &SceneGraph) -> Self {
        let mut rows = Vec::with_capacity(graph.len());
        let mut stack: Vec<(NodeId, usize)> = graph
            .roots()
            .iter()
            .rev()
            .map(|id| (id.clone(), 0))
            .collect();

        while let Some((id, depth)) = stack.pop() {
            if let Some(node) = graph.node(&id) {
                rows.push(HierarchyRow {
                    id: id.clone(),
                    name: node.name.clone(),
                    type_tag: node.kind.type_tag().to_string(),
                    depth,
                    child_count: node.children().len(),
                    instanced: node.is_instance(),
                });
                for child in node.children().iter().rev() {
                    stack.push((child.clone(), depth + 1));
                }
            }
        }
        Self { rows }
    }

    /// The flattened rows, depth-first
    pub fn rows(&self) -> &[HierarchyRow] {
        &self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the snapshot is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Find the row for a node id
    pub fn row(&self, id: &NodeId) -> Option<&HierarchyRow> {
        self.rows.iter().find(|r| &r.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Node, NodeKind, Transform2D};

    fn node2d(id: &str, name: &str) -> Node {
        Node::new(
            NodeId::new(id),
            name,
            NodeKind::Node2d(Transform2D::default()),
        )
    }

    #[test]
    fn test_capture_orders_depth_first() {
        let mut graph = SceneGraph::new();
        graph.insert_node(node2d("r", "Root"), None, None).unwrap();
        graph
            .insert_node(node2d("a", "A"), Some(&NodeId::new("r")), None)
            .unwrap();
        graph
            .insert_node(node2d("a1", "A1"), Some(&NodeId::new("a")), None)
            .unwrap();
        graph
            .insert_node(node2d("b", "B"), Some(&NodeId::new("r")), None)
            .unwrap();

        let snapshot = HierarchySnapshot::capture(&graph);
        let names: Vec<_> = snapshot.rows().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Root", "A", "A1", "B"]);

        let depths: Vec<_> = snapshot.rows().iter().map(|r| r.depth).collect();
        assert_eq!(depths, vec![0, 1, 2, 1]);
    }

    #[test]
    fn test_row_lookup() {
        let mut graph = SceneGraph::new();
        graph.insert_node(node2d("r", "Root"), None, None).unwrap();
        graph
            .insert_node(node2d("a", "A"), Some(&NodeId::new("r")), None)
            .unwrap();

        let snapshot = HierarchySnapshot::capture(&graph);
        let row = snapshot.row(&NodeId::new("r")).unwrap();
        assert_eq!(row.child_count, 1);
        assert_eq!(row.type_tag, "node2d");
        assert!(snapshot.row(&NodeId::new("ghost")).is_none());
    }
}
