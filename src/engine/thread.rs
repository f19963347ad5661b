// src/engine/thread.rs
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error};

use crate::core::worker::Worker;
use crate::error::DispatchError;
use super::collector::ResultCollector;
use super::executor::TaskExecutor;
use super::pool::JobPool;
use super::result::ExecutionResult;
use super::task::{Task, RunArgs};
use super::workflow::WorkflowConfig;

/// Runs worker jobs on blocking OS threads, at most `concurrency_limit` at a time.
///
/// Suited to workers that spend their time waiting on I/O. Both modes return
/// results in completion order, which varies between runs.
pub struct ThreadDispatcher {
    config: Arc<WorkflowConfig>,
}

impl ThreadDispatcher {
    pub fn new(config: Arc<WorkflowConfig>) -> Self {
        Self { config }
    }

    /// Run one task on every worker
    pub async fn async_run(&self, task: &Task, args: &RunArgs) -> Option<Vec<ExecutionResult>> {
        let jobs = self
            .config
            .workers()
            .iter()
            .map(|worker| (task.clone(), worker.clone()))
            .collect();

        match self.dispatch(jobs, args).await {
            Ok(results) => Some(results),
            Err(e) => {
                error!("Error in async_run: {}", e);
                None
            }
        }
    }

    /// Run every task once, spreading tasks over the workers round robin.
    ///
    /// Yields one entry per task, or nothing when the workflow has no workers.
    pub async fn concurrent_run(&self, tasks: &[Task], args: &RunArgs) -> Option<Vec<ExecutionResult>> {
        let workers = self.config.workers();
        let jobs = if workers.is_empty() {
            Vec::new()
        } else {
            tasks
                .iter()
                .enumerate()
                .map(|(index, task)| (task.clone(), workers[index % workers.len()].clone()))
                .collect()
        };

        match self.dispatch(jobs, args).await {
            Ok(results) => Some(results),
            Err(e) => {
                error!("Error in concurrent_run: {}", e);
                None
            }
        }
    }

    async fn dispatch(&self, jobs: Vec<(Task, Arc<dyn Worker>)>, args: &RunArgs) -> Result<Vec<ExecutionResult>, DispatchError> {
        let pool = JobPool::new(self.config.concurrency_limit())?;
        let collector = ResultCollector::new(jobs.len());
        let args = Arc::new(args.clone());

        debug!("Dispatching {} jobs on up to {} threads", jobs.len(), pool.size());

        let mut pending = JoinSet::new();
        for (index, (task, worker)) in jobs.into_iter().enumerate() {
            let pool = pool.clone();
            let args = args.clone();
            let span = self.config.span().clone();

            pending.spawn(async move {
                let _permit = pool.acquire().await?;
                let result = tokio::task::spawn_blocking(move || {
                    span.in_scope(|| TaskExecutor::execute(&task, worker.as_ref(), &args))
                })
                .await?;
                Ok::<_, DispatchError>((index, result))
            });
        }

        // Only this task appends, in the order jobs finish
        while let Some(joined) = pending.join_next().await {
            let (index, result) = joined??;
            collector.append(index, result);
        }

        Ok(collector.drain_completion_order())
    }
}
