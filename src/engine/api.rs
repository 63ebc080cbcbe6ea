// src/engine/api.rs

//! Wire types shared with the external scheduler.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle of a run (or of one job attempt inside it), as reported by
/// the scheduler.
///
/// Attempts move `queued -> running` and end in `succeeded` or `failed`.
/// A failed attempt with retry budget left is re-queued by the scheduler
/// after the retry delay; the run is `failed` only once the budget is
/// exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Queued,
    Running,
    Succeeded,
    Failed,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Succeeded | RunState::Failed)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunState::Queued => "queued",
            RunState::Running => "running",
            RunState::Succeeded => "succeeded",
            RunState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Response to a registration upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredPipeline {
    /// Scheduler-side identifier of the stored definition.
    pub handle: String,
    /// True when an existing definition with the same name was replaced.
    pub updated: bool,
}

/// Identifier of a run started by a trigger request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub String);

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Response to a trigger request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggeredRun {
    pub run_id: RunId,
}

/// Point-in-time state of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatus {
    pub state: RunState,
    /// Per-task states, when the scheduler reports them.
    #[serde(default)]
    pub tasks: BTreeMap<String, RunState>,
}
