// src/engine/result.rs
use std::fmt;
use serde::{Serialize, Deserialize};

/// Outcome of one (task, worker) job
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExecutionResult {
    Success {
        worker: String,
        output: String,
    },
    Failed(FailureMarker),
}

/// Slot placed in a result sequence when a job fails
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FailureMarker {
    pub worker: String,
    pub task: String,
    pub kind: FailureKind,
    pub reason: String,
}

/// Why a job produced no output
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The worker returned an error
    WorkerError,
    /// The worker panicked
    Panicked,
    /// The child process died without reporting a result
    ProcessCrashed,
}

impl ExecutionResult {
    pub fn success(worker: impl Into<String>, output: impl Into<String>) -> Self {
        ExecutionResult::Success {
            worker: worker.into(),
            output: output.into(),
        }
    }

    pub fn failed(
        worker: impl Into<String>,
        task: impl Into<String>,
        kind: FailureKind,
        reason: impl Into<String>,
    ) -> Self {
        ExecutionResult::Failed(FailureMarker {
            worker: worker.into(),
            task: task.into(),
            kind,
            reason: reason.into(),
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionResult::Success { .. })
    }

    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    /// The worker's output, if the job succeeded
    pub fn output(&self) -> Option<&str> {
        match self {
            ExecutionResult::Success { output, .. } => Some(output),
            ExecutionResult::Failed(_) => None,
        }
    }

    pub fn worker(&self) -> &str {
        match self {
            ExecutionResult::Success { worker, .. } => worker,
            ExecutionResult::Failed(marker) => &marker.worker,
        }
    }

    pub fn failure(&self) -> Option<&FailureMarker> {
        match self {
            ExecutionResult::Failed(marker) => Some(marker),
            ExecutionResult::Success { .. } => None,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::WorkerError => "worker error",
            FailureKind::Panicked => "panicked",
            FailureKind::ProcessCrashed => "process crashed",
        };
        f.write_str(label)
    }
}
