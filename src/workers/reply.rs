use crate::core::worker::{Worker, WorkerSpec};
use crate::engine::{Task, RunArgs};
use crate::error::WorkerError;

/// Worker that answers every task with a fixed text
pub struct ReplyWorker {
    name: String,
    text: String,
}

impl ReplyWorker {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

impl Worker for ReplyWorker {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, _task: &Task, _args: &RunArgs) -> Result<String, WorkerError> {
        Ok(self.text.clone())
    }

    fn descriptor(&self) -> Option<WorkerSpec> {
        Some(WorkerSpec::Reply {
            name: self.name.clone(),
            text: self.text.clone(),
        })
    }
}
