use tracing::debug;

use crate::core::worker::{Worker, WorkerSpec};
use crate::engine::{Task, RunArgs};
use crate::error::WorkerError;

/// Worker that answers with the task description
pub struct EchoWorker {
    name: String,
    prefix: String,
}

impl EchoWorker {
    pub fn new(name: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.into(),
        }
    }
}

impl Worker for EchoWorker {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, task: &Task, args: &RunArgs) -> Result<String, WorkerError> {
        debug!("Echo worker {} handling task {}", self.name, task.id);

        let mut output = format!("{}{}", self.prefix, task.description);
        for arg in &args.args {
            output.push(' ');
            output.push_str(arg);
        }
        Ok(output)
    }

    fn descriptor(&self) -> Option<WorkerSpec> {
        Some(WorkerSpec::Echo {
            name: self.name.clone(),
            prefix: self.prefix.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_echo_appends_extra_args() {
        let worker = EchoWorker::new("echo", "> ");
        let args = RunArgs::new().with_args(["a", "b"]);

        assert_eq!(worker.run(&Task::new("ping"), &args).unwrap(), "> ping a b");
        assert_eq!(worker.run(&Task::new("ping"), &RunArgs::new()).unwrap(), "> ping");
    }
}
