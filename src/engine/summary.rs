use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

use super::result::ExecutionResult;
use super::workflow::DispatchMode;

/// Overall outcome of a dispatch call
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    Partial,
    Failed,
    Empty,
}

/// Result of one dispatch call, as reported by the CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub workflow: String,
    pub mode: DispatchMode,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: i64,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<ExecutionResult>,
}

impl RunSummary {
    pub fn new(workflow: impl Into<String>, mode: DispatchMode, started_at: DateTime<Utc>, results: Vec<ExecutionResult>) -> Self {
        let finished_at = Utc::now();
        let succeeded = results.iter().filter(|r| r.is_success()).count();
        let failed = results.len() - succeeded;

        let status = if results.is_empty() {
            RunStatus::Empty
        } else if failed == 0 {
            RunStatus::Success
        } else if succeeded > 0 {
            RunStatus::Partial
        } else {
            RunStatus::Failed
        };

        Self {
            workflow: workflow.into(),
            mode,
            status,
            started_at,
            finished_at,
            duration_ms: (finished_at - started_at).num_milliseconds(),
            succeeded,
            failed,
            results,
        }
    }
}
