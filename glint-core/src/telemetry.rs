//! Command telemetry
//!
//! Every completed command invocation (blocked, executed, no-op, or failed)
//! is published as a [`CommandEvent`] to the hooks registered on the
//! document's [`TelemetryHub`]. The hub is an injected capability carried by
//! [`crate::factory::Services`], not a process-wide registry; registration
//! returns a [`TelemetryGuard`] that deregisters the hook when dropped.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

/// Outcome of one command invocation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CommandStatus {
    /// Preconditions refused the invocation
    Blocked,
    /// Executed and mutated the document
    Executed,
    /// Executed but reported nothing to do
    NoOp,
    /// `execute` returned an error
    Failed,
}

/// One telemetry record per completed invocation
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandEvent {
    pub command_id: String,
    pub status: CommandStatus,
    pub requested_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: f64,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

type Hook = Box<dyn Fn(&CommandEvent) -> Result<(), String> + Send>;
type HookMap = Mutex<BTreeMap<u64, Hook>>;

/// Registry of telemetry hooks
///
/// Cloning the hub shares the underlying hook set; the engine and any
/// interested observers hold clones of the same hub.
#[derive(Clone, Default)]
pub struct TelemetryHub {
    hooks: Arc<HookMap>,
    next_key: Arc<AtomicU64>,
}

impl TelemetryHub {
    /// Create an empty hub
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook; the returned guard removes it when dropped
    pub fn register_hook<F>(&self, hook: F) -> TelemetryGuard
    where
        F: Fn(&CommandEvent) -> Result<(), String> + Send + 'static,
    {
        let key = self.next_key.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut hooks) = self.hooks.lock() {
            hooks.insert(key, Box::new(hook));
        }
        TelemetryGuard {
            hooks: Arc::downgrade(&self.hooks),
            key,
        }
    }

    /// Number of registered hooks
    pub fn hook_count(&self) -> usize {
        self.hooks.lock().map(|h| h.len()).unwrap_or(0)
    }

    /// Deliver an event to every hook
    ///
    /// Hook failures are isolated: a failing hook is logged and the rest
    /// still run.
    pub fn emit(&self, event: &CommandEvent) {
        let Ok(hooks) = self.hooks.lock() else {
            return;
        };
        for (key, hook) in hooks.iter() {
            if let Err(err) = hook(event) {
                log::warn!(
                    "telemetry hook {key} failed for command {}: {err}",
                    event.command_id
                );
            }
        }
    }
}

/// Owned registration handle for one telemetry hook
///
/// Dropping the guard removes the hook from the hub it was registered on.
pub struct TelemetryGuard {
    hooks: Weak<HookMap>,
    key: u64,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(hooks) = self.hooks.upgrade() {
            if let Ok(mut hooks) = hooks.lock() {
                hooks.remove(&self.key);
            }
        }
    }
}
