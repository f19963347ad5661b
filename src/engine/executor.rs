// src/engine/executor.rs
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;
use tracing::{debug, error};

use crate::core::worker::Worker;
use super::result::{ExecutionResult, FailureKind};
use super::task::{Task, RunArgs};

/// Runs exactly one task against exactly one worker
pub struct TaskExecutor;

impl TaskExecutor {
    /// Execute a task, converting any worker failure into a failure marker.
    ///
    /// Nothing the worker does, error or panic, escapes this call.
    pub fn execute(task: &Task, worker: &dyn Worker, args: &RunArgs) -> ExecutionResult {
        debug!("Executing task {} on worker {}", task.id, worker.name());
        let start_time = Instant::now();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| worker.run(task, args)));

        let result = match outcome {
            Ok(Ok(output)) => ExecutionResult::success(worker.name(), output),
            Ok(Err(e)) => {
                error!("An error occurred during execution of task {} on worker {}: {}", task, worker.name(), e);
                ExecutionResult::failed(worker.name(), task.to_string(), FailureKind::WorkerError, e.message)
            }
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                error!("Worker {} panicked while executing task {}: {}", worker.name(), task, reason);
                ExecutionResult::failed(worker.name(), task.to_string(), FailureKind::Panicked, reason)
            }
        };

        debug!("Task {} on worker {} finished in {:?}", task.id, worker.name(), start_time.elapsed());
        result
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
