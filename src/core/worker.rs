// src/core/worker.rs
use std::sync::Arc;
use serde::{Serialize, Deserialize};

use crate::engine::{Task, RunArgs};
use crate::error::WorkerError;
use crate::workers::{EchoWorker, ReplyWorker, ShellWorker};

/// Worker trait that every agent in a workflow must implement
pub trait Worker: Send + Sync {
    /// Display name, used for log attribution only
    fn name(&self) -> &str;

    /// Execute the task and produce an output
    fn run(&self, task: &Task, args: &RunArgs) -> Result<String, WorkerError>;

    /// Description a child process can rebuild this worker from.
    ///
    /// Workers that return `None` can only be dispatched on threads.
    fn descriptor(&self) -> Option<WorkerSpec> {
        None
    }
}

/// Serializable description of a built-in worker
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkerSpec {
    /// Answers with the task description, optionally prefixed
    Echo {
        name: String,
        #[serde(default)]
        prefix: String,
    },
    /// Answers every task with the same text
    Reply {
        name: String,
        text: String,
    },
    /// Runs an external program with the task description as an argument
    Shell {
        name: String,
        program: String,
        #[serde(default)]
        args: Vec<String>,
    },
}

impl WorkerSpec {
    pub fn name(&self) -> &str {
        match self {
            WorkerSpec::Echo { name, .. }
            | WorkerSpec::Reply { name, .. }
            | WorkerSpec::Shell { name, .. } => name,
        }
    }

    /// Instantiate the worker this spec describes
    pub fn build(&self) -> Arc<dyn Worker> {
        match self {
            WorkerSpec::Echo { name, prefix } => Arc::new(EchoWorker::new(name.clone(), prefix.clone())),
            WorkerSpec::Reply { name, text } => Arc::new(ReplyWorker::new(name.clone(), text.clone())),
            WorkerSpec::Shell { name, program, args } => {
                Arc::new(ShellWorker::new(name.clone(), program.clone(), args.clone()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_round_trips_through_build() {
        let specs = vec![
            WorkerSpec::Echo { name: "echo".to_string(), prefix: "> ".to_string() },
            WorkerSpec::Reply { name: "reply".to_string(), text: "pong".to_string() },
            WorkerSpec::Shell { name: "sh".to_string(), program: "sh".to_string(), args: vec!["-c".to_string()] },
        ];

        for spec in specs {
            let worker = spec.build();
            assert_eq!(worker.name(), spec.name());
            assert_eq!(worker.descriptor(), Some(spec));
        }
    }

    #[test]
    fn test_spec_deserializes_from_tagged_toml() {
        let spec: WorkerSpec = toml::from_str(r#"
            kind = "shell"
            name = "lister"
            program = "ls"
        "#).unwrap();

        assert_eq!(spec, WorkerSpec::Shell {
            name: "lister".to_string(),
            program: "ls".to_string(),
            args: Vec::new(),
        });
    }
}
