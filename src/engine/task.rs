// src/engine/task.rs
use std::fmt;
use std::path::Path;
use std::time::Duration;
use serde::{Serialize, Deserialize};
use tracing::{debug, warn};

use crate::error::{ErysaResult, ErysaError};

/// Unit of work handed to every worker of a workflow
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    #[serde(default = "new_task_id")]
    pub id: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<f64>,
}

fn new_task_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl Task {
    /// Create a task without a timeout
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            id: new_task_id(),
            description: description.into(),
            timeout_secs: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = Some(timeout.as_secs_f64());
        self
    }

    /// Deadline for a single process job. Non-finite or negative values are ignored.
    pub fn timeout(&self) -> Option<Duration> {
        let secs = self.timeout_secs?;
        match Duration::try_from_secs_f64(secs) {
            Ok(timeout) => Some(timeout),
            Err(_) => {
                warn!("Ignoring invalid timeout {} on task {}", secs, self.id);
                None
            }
        }
    }

    /// Load tasks from a file.
    ///
    /// `.json` files hold an array of tasks; any other file is read as one
    /// task description per non-empty line.
    pub fn load_all(path: &Path) -> ErysaResult<Vec<Task>> {
        debug!("Loading tasks from {}", path.display());
        let content = std::fs::read_to_string(path)
            .map_err(|e| ErysaError::FileError {
                path: path.to_path_buf(),
                message: format!("Failed to read file: {}", e),
            })?;

        let is_json = path.extension().map_or(false, |ext| ext == "json");
        if is_json {
            return serde_json::from_str(&content)
                .map_err(|e| ErysaError::SerializationError(format!("Failed to parse JSON: {}", e)));
        }

        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(Task::new)
            .collect())
    }

    /// Save tasks to a JSON file
    pub fn save_all(tasks: &[Task], path: &Path) -> ErysaResult<()> {
        debug!("Saving {} tasks to {}", tasks.len(), path.display());
        let content = serde_json::to_string_pretty(tasks)
            .map_err(|e| ErysaError::SerializationError(format!("Failed to serialize tasks: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| ErysaError::FileError {
                path: path.to_path_buf(),
                message: format!("Failed to write file: {}", e),
            })?;

        Ok(())
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

impl From<&str> for Task {
    fn from(description: &str) -> Self {
        Task::new(description)
    }
}

/// Arguments passed through a dispatch call to every worker invocation
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RunArgs {
    /// Extra arguments handed to `Worker::run`
    #[serde(default)]
    pub args: Vec<String>,
    /// Per-job deadline for `ProcessDispatcher::run`; takes precedence over the task's own
    #[serde(default)]
    pub timeout: Option<Duration>,
}

impl RunArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub(crate) fn timeout_for(&self, task: &Task) -> Option<Duration> {
        self.timeout.or_else(|| task.timeout())
    }
}
