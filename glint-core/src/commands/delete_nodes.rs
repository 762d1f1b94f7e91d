//! Delete nodes command
//!
//! Deletes the selected nodes (or an explicit target list). Targets whose
//! ancestor is also targeted are skipped so a subtree is detached exactly
//! once; undo restores the detached subtrees — the same node values — at
//! their original positions.

use crate::command::{
    require_open_scene, Command, CommandContext, CommandError, CommandMeta, Execution, Precondition,
};
use crate::document::SceneDocument;
use crate::history::{Edit, HistoryEntry};
use crate::node::NodeId;
use crate::scene::{DetachedSubtree, SceneGraph};

/// Command that deletes nodes and their descendants
pub struct DeleteNodesCommand {
    /// Explicit targets; `None` deletes the current selection
    targets: Option<Vec<NodeId>>,

    /// Subtrees detached by execute, in removal order
    detached: Vec<DetachedSubtree>,

    /// Ids of the detached subtree roots, in removal order
    removed_ids: Vec<NodeId>,
}

impl DeleteNodesCommand {
    /// Delete the current selection
    pub fn selection() -> Self {
        Self {
            targets: None,
            detached: Vec::new(),
            removed_ids: Vec::new(),
        }
    }

    /// Delete an explicit list of nodes
    pub fn targets(ids: Vec<NodeId>) -> Self {
        Self {
            targets: Some(ids),
            detached: Vec::new(),
            removed_ids: Vec::new(),
        }
    }
}

/// Keep only targets that exist and have no targeted ancestor
fn topmost_targets(scene: &SceneGraph, ids: &[NodeId]) -> Vec<NodeId> {
    ids.iter()
        .filter(|&id| scene.contains(id))
        .filter(|&id| {
            !ids.iter()
                .any(|other| other != id && scene.is_ancestor(other, id))
        })
        .cloned()
        .collect()
}

impl Command for DeleteNodesCommand {
    fn meta(&self) -> CommandMeta {
        CommandMeta {
            id: "scene.deleteNodes",
            title: "Delete",
            shortcut: Some("Delete"),
            when: Some(SceneDocument::has_scene),
        }
    }

    fn preconditions(&self, document: &SceneDocument) -> Precondition {
        require_open_scene(document)
    }

    fn execute(&mut self, ctx: &mut CommandContext) -> Result<Execution, CommandError> {
        let requested = match &self.targets {
            Some(ids) => ids.clone(),
            None => ctx.document.selection().node_ids().to_vec(),
        };
        let scene = ctx.document.scene_mut().ok_or(CommandError::SceneClosed)?;

        let roots = topmost_targets(scene, &requested);
        if roots.is_empty() {
            // Nothing selected (or everything already gone): a no-op, not an error.
            return Ok(Execution::no_op());
        }

        self.detached.clear();
        self.removed_ids.clear();
        let mut all_removed = Vec::new();
        for id in roots {
            if let Some(subtree) = scene.remove_subtree(&id) {
                all_removed.extend(subtree.node_ids().cloned());
                self.removed_ids.push(id);
                self.detached.push(subtree);
            }
        }
        ctx.document.commit_removed(&all_removed);
        Ok(Execution::mutated())
    }

    fn post_commit(&mut self, _ctx: &mut CommandContext) -> Option<HistoryEntry> {
        let label = if self.removed_ids.len() == 1 {
            "Delete node".to_string()
        } else {
            format!("Delete {} nodes", self.removed_ids.len())
        };
        Some(HistoryEntry::new(
            label,
            DeleteNodesEdit {
                removed_ids: std::mem::take(&mut self.removed_ids),
                detached: std::mem::take(&mut self.detached),
            },
        ))
    }
}

/// Undo/redo transaction for deleted subtrees
struct DeleteNodesEdit {
    removed_ids: Vec<NodeId>,
    detached: Vec<DetachedSubtree>,
}

impl Edit for DeleteNodesEdit {
    fn undo(&mut self, document: &mut SceneDocument) {
        let Some(scene) = document.scene_mut() else {
            return;
        };
        // Restore in reverse removal order so sibling indices line up again.
        for subtree in self.detached.drain(..).rev() {
            let root = subtree.root_id().clone();
            if let Err(err) = scene.restore_subtree(subtree) {
                log::warn!("could not restore {root}: {err}");
            }
        }
        document.commit_nodes_changed();
        document.selection_mut().select_many(&self.removed_ids);
    }

    fn redo(&mut self, document: &mut SceneDocument) {
        let Some(scene) = document.scene_mut() else {
            return;
        };
        let mut all_removed = Vec::new();
        for id in &self.removed_ids {
            if let Some(subtree) = scene.remove_subtree(id) {
                all_removed.extend(subtree.node_ids().cloned());
                self.detached.push(subtree);
            }
        }
        document.commit_removed(&all_removed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::CreateNodeCommand;
    use crate::factory::Services;
    use crate::history::CommandEngine;

    fn engine_with_tree() -> (CommandEngine, NodeId, NodeId) {
        let mut engine = CommandEngine::new(
            SceneDocument::with_scene(SceneGraph::new()),
            Services::default(),
        );
        engine
            .invoke_and_push(Box::new(CreateNodeCommand::new("container2d")))
            .unwrap();
        let parent = engine.document().scene().unwrap().roots()[0].clone();
        engine
            .invoke_and_push(Box::new(
                CreateNodeCommand::new("sprite2d").with_parent(parent.clone()),
            ))
            .unwrap();
        let child = engine.document().scene().unwrap().children_of(&parent)[0].clone();
        (engine, parent, child)
    }

    #[test]
    fn test_delete_selection_round_trip() {
        let (mut engine, parent, child) = engine_with_tree();
        engine.document_mut().selection_mut().select_only(parent.clone());

        let outcome = engine
            .invoke_and_push(Box::new(DeleteNodesCommand::selection()))
            .unwrap();
        assert!(outcome.mutated());
        {
            let document = engine.document();
            assert!(document.scene().unwrap().is_empty());
            assert!(document.selection().is_empty());
        }

        assert!(engine.undo());
        {
            let document = engine.document();
            let scene = document.scene().unwrap();
            assert!(scene.contains(&parent));
            assert!(scene.contains(&child));
            assert_eq!(scene.children_of(&parent), &[child.clone()]);
            scene.validate().unwrap();
            assert!(document.selection().contains(&parent));
        }

        assert!(engine.redo());
        assert!(engine.document().scene().unwrap().is_empty());
    }

    #[test]
    fn test_nothing_selected_is_a_no_op() {
        let (mut engine, _, _) = engine_with_tree();
        engine.document_mut().selection_mut().clear();
        let depth = engine.undo_depth();

        let outcome = engine
            .invoke_and_push(Box::new(DeleteNodesCommand::selection()))
            .unwrap();
        assert!(!outcome.mutated());
        assert_eq!(engine.undo_depth(), depth);
    }

    #[test]
    fn test_descendant_of_target_is_skipped() {
        let (mut engine, parent, child) = engine_with_tree();

        let outcome = engine
            .invoke_and_push(Box::new(DeleteNodesCommand::targets(vec![
                parent.clone(),
                child.clone(),
            ])))
            .unwrap();
        assert!(outcome.mutated());
        assert!(engine.document().scene().unwrap().is_empty());

        // One subtree detach covered both nodes; undo restores the pair.
        engine.undo();
        let scene = engine.document().scene().unwrap();
        assert!(scene.contains(&parent) && scene.contains(&child));
        scene.validate().unwrap();
    }

    #[test]
    fn test_sibling_indices_restored() {
        let (mut engine, parent, child_a) = engine_with_tree();
        engine
            .invoke_and_push(Box::new(
                CreateNodeCommand::new("sprite2d").with_parent(parent.clone()),
            ))
            .unwrap();
        let child_b = engine.document().scene().unwrap().children_of(&parent)[1].clone();

        engine
            .invoke_and_push(Box::new(DeleteNodesCommand::targets(vec![child_a.clone()])))
            .unwrap();
        engine.undo();

        let scene = engine.document().scene().unwrap();
        assert_eq!(
            scene.children_of(&parent),
            &[child_a.clone(), child_b.clone()]
        );
    }
}
