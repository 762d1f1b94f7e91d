//! Command contract
//!
//! A command is a named, reversible user action. The engine runs each one
//! through a fixed pipeline: `preconditions` (pure check, never an error) →
//! `execute` (the mutation, reporting whether anything changed) →
//! `post_commit` (only after a mutation; packages the undo/redo edit for the
//! history stack). Execute failures are reported, not rolled back — command
//! authors order their mutations so a failure leaves the store inspectable
//! rather than torn.

use crate::document::SceneDocument;
use crate::factory::Services;
use crate::history::HistoryEntry;
use crate::node::NodeId;
use crate::scene::SceneError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Immutable command metadata
#[derive(Clone, Copy)]
pub struct CommandMeta {
    /// Stable id, e.g. `"scene.createNode"`
    pub id: &'static str,
    /// Menu/palette title
    pub title: &'static str,
    /// Optional keyboard binding hint
    pub shortcut: Option<&'static str>,
    /// Optional visibility predicate for menus
    pub when: Option<fn(&SceneDocument) -> bool>,
}

/// What part of editor state a blocked precondition refers to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockScope {
    /// No scene open, or the scene lacks a required node
    Scene,
    /// The selection does not support this command
    Selection,
    /// Application-level state (e.g. a modal flow in progress)
    App,
}

/// Result of a precondition check
#[derive(Clone, Debug, PartialEq)]
pub enum Precondition {
    Ready,
    Blocked {
        /// User-facing reason shown as a disabled-state or toast message
        reason: String,
        /// Whether the user can resolve this themselves
        recoverable: bool,
        scope: BlockScope,
    },
}

impl Precondition {
    /// Build a blocked result
    pub fn blocked(reason: impl Into<String>, recoverable: bool, scope: BlockScope) -> Self {
        Self::Blocked {
            reason: reason.into(),
            recoverable,
            scope,
        }
    }

    /// Whether the command may run
    pub fn is_ready(&self) -> bool {
        matches!(self, Precondition::Ready)
    }
}

/// Precondition shared by every scene-mutating command
pub fn require_open_scene(document: &SceneDocument) -> Precondition {
    if document.has_scene() {
        Precondition::Ready
    } else {
        Precondition::blocked("No scene is open", true, BlockScope::Scene)
    }
}

/// Outcome of a command's `execute`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Execution {
    /// False signals a no-op; no history entry is recorded
    pub did_mutate: bool,
}

impl Execution {
    /// The command mutated the document
    pub fn mutated() -> Self {
        Self { did_mutate: true }
    }

    /// The command had nothing to do
    pub fn no_op() -> Self {
        Self { did_mutate: false }
    }
}

/// Unexpected command failures
///
/// Distinct from [`Precondition::Blocked`]: these are reported via telemetry
/// status `failed` and returned to the caller.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("no scene is open")]
    SceneClosed,

    #[error("node {0} vanished mid-command")]
    MissingNode(NodeId),

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error("{0}")]
    Internal(String),
}

/// Everything a command receives while executing
pub struct CommandContext<'a> {
    /// The mutable document
    pub document: &'a mut SceneDocument,

    /// Read-only snapshot of the document as it was before `execute`
    ///
    /// Preserved by the engine's copy-on-write document handling.
    pub snapshot: Arc<SceneDocument>,

    /// Injected collaborator capabilities
    pub services: &'a Services,

    /// When the invocation was requested
    pub requested_at: DateTime<Utc>,
}

/// A reversible user action
///
/// Commands are constructed fresh per invocation and carry their own typed
/// payload between `execute` and `post_commit` as struct fields.
pub trait Command: Send {
    /// Immutable metadata
    fn meta(&self) -> CommandMeta;

    /// Pure, side-effect-free check run before `execute`
    fn preconditions(&self, _document: &SceneDocument) -> Precondition {
        Precondition::Ready
    }

    /// Perform the mutation
    fn execute(&mut self, ctx: &mut CommandContext) -> Result<Execution, CommandError>;

    /// Package the undo/redo edit after a mutating execute
    ///
    /// Only invoked when `execute` reported a mutation; all document side
    /// effects must already be durable by the time this runs.
    fn post_commit(&mut self, _ctx: &mut CommandContext) -> Option<HistoryEntry> {
        None
    }

    /// Extra metadata attached to this invocation's telemetry event
    fn telemetry_metadata(&self) -> BTreeMap<String, serde_json::Value> {
        BTreeMap::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_open_scene() {
        let empty = SceneDocument::empty();
        let blocked = require_open_scene(&empty);
        assert!(!blocked.is_ready());
        assert_eq!(
            blocked,
            Precondition::blocked("No scene is open", true, BlockScope::Scene)
        );

        let open = SceneDocument::with_scene(crate::scene::SceneGraph::new());
        assert!(require_open_scene(&open).is_ready());
    }

    #[test]
    fn test_execution_flags() {
        assert!(Execution::mutated().did_mutate);
        assert!(!Execution::no_op().did_mutate);
    }
}
