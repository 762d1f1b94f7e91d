//! Operation/history engine
//!
//! This module provides the engine that owns the document and its undo/redo
//! stacks. Permanent mutations only happen through [`CommandEngine::invoke`]
//! and [`CommandEngine::invoke_and_push`], which run the command pipeline and
//! (for the latter) record a [`HistoryEntry`] built by the command itself.
//!
//! ## Memory Model
//!
//! The document is stored in an `Arc<SceneDocument>` for efficient cloning to
//! read-only consumers. When mutation is needed, `Arc::make_mut()` provides
//! copy-on-write semantics: if other Arc holders exist (e.g., a snapshot
//! handed to a command context or a render pass), the document is cloned
//! before mutation, preserving their view.

use crate::command::{Command, CommandContext, CommandError, BlockScope, Precondition};
use crate::document::SceneDocument;
use crate::factory::Services;
use crate::telemetry::{CommandEvent, CommandStatus, TelemetryHub};
use chrono::Utc;
use std::sync::Arc;

/// One undoable transaction
///
/// `undo` must restore every field the transaction touched to its exact
/// prior value; `redo` must reproduce the exact post-transaction state,
/// including node identity for creation edits.
pub trait Edit: Send {
    /// Roll the transaction back
    fn undo(&mut self, document: &mut SceneDocument);

    /// Apply the transaction again
    fn redo(&mut self, document: &mut SceneDocument);
}

/// A record on the undo/redo stack: a label plus the paired edit
pub struct HistoryEntry {
    label: String,
    edit: Box<dyn Edit>,
}

impl HistoryEntry {
    /// Create an entry from a label and an edit
    pub fn new(label: impl Into<String>, edit: impl Edit + 'static) -> Self {
        Self {
            label: label.into(),
            edit: Box::new(edit),
        }
    }

    /// Human-readable label for UI display
    pub fn label(&self) -> &str {
        &self.label
    }

    fn undo(&mut self, document: &mut SceneDocument) {
        self.edit.undo(document);
    }

    fn redo(&mut self, document: &mut SceneDocument) {
        self.edit.redo(document);
    }
}

/// How an invocation ended
#[derive(Clone, Debug, PartialEq)]
pub enum DispatchOutcome {
    /// The command mutated the document
    Mutated,
    /// The command ran but had nothing to do
    NoOp,
    /// Preconditions refused the command
    Blocked {
        reason: String,
        recoverable: bool,
        scope: BlockScope,
    },
}

impl DispatchOutcome {
    /// Whether a mutation occurred
    pub fn mutated(&self) -> bool {
        matches!(self, DispatchOutcome::Mutated)
    }
}

/// Command dispatcher and owner of the undo/redo stacks
pub struct CommandEngine {
    /// The document being edited (wrapped in Arc for cheap snapshots)
    document: Arc<SceneDocument>,

    /// Injected collaborator capabilities handed to every command
    services: Services,

    /// Stack of committed transactions (for undo)
    undo_stack: Vec<HistoryEntry>,

    /// Stack of undone transactions (for redo)
    redo_stack: Vec<HistoryEntry>,

    /// Maximum number of entries to keep on the undo stack
    max_undo_depth: usize,
}

impl CommandEngine {
    /// Create an engine around a document
    pub fn new(document: SceneDocument, services: Services) -> Self {
        Self {
            document: Arc::new(document),
            services,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_undo_depth: 100,
        }
    }

    /// Read-only access to the document
    pub fn document(&self) -> &SceneDocument {
        &self.document
    }

    /// Cheap snapshot of the document for read-only consumers
    pub fn document_arc(&self) -> Arc<SceneDocument> {
        Arc::clone(&self.document)
    }

    /// Mutable document access with copy-on-write semantics
    ///
    /// Only for live previews (e.g. per-frame gesture updates); permanent
    /// changes go through the command pipeline so they can be undone.
    pub fn document_mut(&mut self) -> &mut SceneDocument {
        Arc::make_mut(&mut self.document)
    }

    /// The injected capabilities (telemetry hub, node factory)
    pub fn services(&self) -> &Services {
        &self.services
    }

    /// The command telemetry hub
    pub fn telemetry(&self) -> &TelemetryHub {
        &self.services.telemetry
    }

    /// Run a command without recording it in the history
    pub fn invoke(&mut self, mut command: Box<dyn Command>) -> Result<DispatchOutcome, CommandError> {
        self.dispatch(command.as_mut(), false)
    }

    /// Run a command and push its transaction onto the undo stack
    ///
    /// Returns whether a mutation occurred (via [`DispatchOutcome`]); pushing
    /// clears the redo stack since history is strictly linear.
    pub fn invoke_and_push(
        &mut self,
        mut command: Box<dyn Command>,
    ) -> Result<DispatchOutcome, CommandError> {
        self.dispatch(command.as_mut(), true)
    }

    /// Push an externally built transaction (e.g. from a completed gesture)
    pub fn push_entry(&mut self, entry: HistoryEntry) {
        self.redo_stack.clear();
        self.undo_stack.push(entry);
        if self.undo_stack.len() > self.max_undo_depth {
            self.undo_stack.remove(0);
        }
    }

    /// Undo the most recent transaction
    ///
    /// Returns true if a transaction was undone, false if the stack is empty.
    pub fn undo(&mut self) -> bool {
        if let Some(mut entry) = self.undo_stack.pop() {
            entry.undo(Arc::make_mut(&mut self.document));
            self.redo_stack.push(entry);
            true
        } else {
            false
        }
    }

    /// Redo the most recently undone transaction
    ///
    /// Returns true if a transaction was redone, false if the stack is empty.
    pub fn redo(&mut self) -> bool {
        if let Some(mut entry) = self.redo_stack.pop() {
            entry.redo(Arc::make_mut(&mut self.document));
            self.undo_stack.push(entry);
            true
        } else {
            false
        }
    }

    /// Whether undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Whether redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Label of the next transaction to undo
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.last().map(|e| e.label())
    }

    /// Label of the next transaction to redo
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.last().map(|e| e.label())
    }

    /// Number of transactions on the undo stack
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of transactions on the redo stack
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Clear all undo/redo history
    pub fn clear_history(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Set the maximum undo depth, trimming the stack if needed
    pub fn set_max_undo_depth(&mut self, depth: usize) {
        self.max_undo_depth = depth;
        if self.undo_stack.len() > depth {
            let remove_count = self.undo_stack.len() - depth;
            self.undo_stack.drain(0..remove_count);
        }
    }

    fn dispatch(
        &mut self,
        command: &mut dyn Command,
        record: bool,
    ) -> Result<DispatchOutcome, CommandError> {
        let requested_at = Utc::now();

        match command.preconditions(&self.document) {
            Precondition::Ready => {}
            Precondition::Blocked {
                reason,
                recoverable,
                scope,
            } => {
                self.emit(command, CommandStatus::Blocked, requested_at, None);
                return Ok(DispatchOutcome::Blocked {
                    reason,
                    recoverable,
                    scope,
                });
            }
        }

        // The snapshot keeps the pre-execute document alive; make_mut then
        // clones so the command mutates a fresh copy.
        let snapshot = Arc::clone(&self.document);
        let mut ctx = CommandContext {
            document: Arc::make_mut(&mut self.document),
            snapshot,
            services: &self.services,
            requested_at,
        };

        let executed = command.execute(&mut ctx);
        let (entry, result) = match executed {
            Err(err) => {
                drop(ctx);
                log::error!("command {} failed: {err}", command.meta().id);
                self.emit(
                    command,
                    CommandStatus::Failed,
                    requested_at,
                    Some(err.to_string()),
                );
                return Err(err);
            }
            Ok(execution) if !execution.did_mutate => (None, DispatchOutcome::NoOp),
            Ok(_) => {
                let entry = command.post_commit(&mut ctx);
                (entry, DispatchOutcome::Mutated)
            }
        };
        drop(ctx);

        if record {
            if let Some(entry) = entry {
                self.push_entry(entry);
            }
        }

        let status = match result {
            DispatchOutcome::Mutated => CommandStatus::Executed,
            _ => CommandStatus::NoOp,
        };
        self.emit(command, status, requested_at, None);
        Ok(result)
    }

    fn emit(
        &self,
        command: &dyn Command,
        status: CommandStatus,
        requested_at: chrono::DateTime<Utc>,
        error: Option<String>,
    ) {
        let completed_at = Utc::now();
        let duration_ms = (completed_at - requested_at)
            .to_std()
            .map(|d| d.as_secs_f64() * 1000.0)
            .unwrap_or(0.0);
        self.services.telemetry.emit(&CommandEvent {
            command_id: command.meta().id.to_string(),
            status,
            requested_at,
            completed_at,
            duration_ms,
            metadata: command.telemetry_metadata(),
            error,
        });
    }
}
