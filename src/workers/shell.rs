use tracing::debug;

use crate::core::worker::{Worker, WorkerSpec};
use crate::engine::{Task, RunArgs};
use crate::error::WorkerError;
use crate::utils::shell;

/// Worker that delegates each task to an external program.
///
/// The program is invoked as `program <args...> <task description> <extra args...>`
/// and its trimmed stdout becomes the result. A non-zero exit status is a
/// worker failure carrying the program's stderr.
pub struct ShellWorker {
    name: String,
    program: String,
    args: Vec<String>,
}

impl ShellWorker {
    pub fn new(name: impl Into<String>, program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args,
        }
    }

    fn command_args(&self, task: &Task, args: &RunArgs) -> Vec<String> {
        let mut command_args = self.args.clone();
        command_args.push(task.description.clone());
        command_args.extend(args.args.iter().cloned());
        command_args
    }
}

impl Worker for ShellWorker {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, task: &Task, args: &RunArgs) -> Result<String, WorkerError> {
        debug!("Shell worker {} running {} for task {}", self.name, self.program, task.id);

        let output = shell::execute_program(&self.program, &self.command_args(task, args))
            .map_err(|e| WorkerError::new(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(WorkerError::new(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn descriptor(&self) -> Option<WorkerSpec> {
        Some(WorkerSpec::Shell {
            name: self.name.clone(),
            program: self.program.clone(),
            args: self.args.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(name: &str, script: &str) -> ShellWorker {
        ShellWorker::new(name, "sh", vec!["-c".to_string(), script.to_string()])
    }

    #[test]
    fn test_task_is_passed_as_argument() {
        // With `sh -c`, the first trailing argument becomes $0
        let worker = sh("upper", "echo \"got $0 $1\"");
        let output = worker.run(&Task::new("ping"), &RunArgs::new().with_args(["extra"])).unwrap();
        assert_eq!(output, "got ping extra");
    }

    #[test]
    fn test_non_zero_exit_is_worker_error() {
        let worker = sh("broken", "echo oops >&2; exit 3");
        let err = worker.run(&Task::new("ping"), &RunArgs::new()).unwrap_err();
        assert!(err.message.contains("oops"));
    }

    #[test]
    fn test_missing_program_is_worker_error() {
        let worker = ShellWorker::new("ghost", "/nonexistent/erysa-program", Vec::new());
        assert!(worker.run(&Task::new("ping"), &RunArgs::new()).is_err());
    }
}
