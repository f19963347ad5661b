use std::fmt;
use std::sync::Arc;
use serde::{Serialize, Deserialize};
use tracing::{info, info_span, Span};

use crate::config::Settings;
use crate::core::worker::Worker;
use super::process::{ProcessDispatcher, WorkerLauncher};
use super::result::ExecutionResult;
use super::task::{Task, RunArgs};
use super::thread::ThreadDispatcher;

/// Worker set and concurrency limit shared by both dispatchers.
///
/// Read-only once built.
pub struct WorkflowConfig {
    name: String,
    workers: Vec<Arc<dyn Worker>>,
    concurrency_limit: usize,
    span: Span,
}

impl WorkflowConfig {
    /// Create a workflow configuration.
    ///
    /// A missing or zero `max_workers` falls back to the number of available CPUs.
    pub fn new(name: impl Into<String>, workers: Vec<Arc<dyn Worker>>, max_workers: Option<usize>) -> Self {
        let name = name.into();
        let concurrency_limit = resolve_concurrency(max_workers);
        let span = info_span!("workflow", name = %name);

        info!("Initialized workflow {} with {} max workers", name, concurrency_limit);
        for worker in &workers {
            info!("Worker: {}", worker.name());
        }

        Self {
            name,
            workers,
            concurrency_limit,
            span,
        }
    }

    /// Build the configuration and worker set described by the settings
    pub fn from_settings(settings: &Settings) -> Self {
        let workers = settings.workers.iter().map(|spec| spec.build()).collect();
        Self::new(settings.workflow.name.clone(), workers, Some(settings.workflow.max_workers))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn workers(&self) -> &[Arc<dyn Worker>] {
        &self.workers
    }

    pub fn concurrency_limit(&self) -> usize {
        self.concurrency_limit
    }

    /// Span every job of this workflow runs in
    pub fn span(&self) -> &Span {
        &self.span
    }
}

fn resolve_concurrency(max_workers: Option<usize>) -> usize {
    match max_workers {
        Some(limit) if limit > 0 => limit,
        _ => num_cpus::get().max(1),
    }
}

/// The four ways a workflow can fan work out
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// One task, every worker, child processes
    Run,
    /// Task list in fixed-size batches, child processes
    BatchedRun,
    /// One task, every worker, threads
    AsyncRun,
    /// Task list, one job per task, threads
    ConcurrentRun,
}

impl fmt::Display for DispatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DispatchMode::Run => "run",
            DispatchMode::BatchedRun => "batched_run",
            DispatchMode::AsyncRun => "async_run",
            DispatchMode::ConcurrentRun => "concurrent_run",
        };
        f.write_str(label)
    }
}

/// A configured workflow with both dispatchers attached
pub struct Workflow {
    config: Arc<WorkflowConfig>,
    processes: ProcessDispatcher,
    threads: ThreadDispatcher,
}

impl Workflow {
    pub fn new(config: WorkflowConfig) -> Self {
        let config = Arc::new(config);
        Self {
            processes: ProcessDispatcher::new(config.clone()),
            threads: ThreadDispatcher::new(config.clone()),
            config,
        }
    }

    /// Program that serves child process jobs. `run` and `batched_run` need one.
    pub fn with_launcher(mut self, launcher: WorkerLauncher) -> Self {
        self.processes = self.processes.with_launcher(launcher);
        self
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub async fn run(&self, task: &Task, args: &RunArgs) -> Option<Vec<ExecutionResult>> {
        self.processes.run(task, args).await
    }

    pub async fn batched_run(&self, tasks: &[Task], batch_size: usize, args: &RunArgs) -> Option<Vec<ExecutionResult>> {
        self.processes.batched_run(tasks, batch_size, args).await
    }

    pub async fn async_run(&self, task: &Task, args: &RunArgs) -> Option<Vec<ExecutionResult>> {
        self.threads.async_run(task, args).await
    }

    pub async fn concurrent_run(&self, tasks: &[Task], args: &RunArgs) -> Option<Vec<ExecutionResult>> {
        self.threads.concurrent_run(tasks, args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::worker::WorkerSpec;
    use crate::workers::ReplyWorker;

    #[test]
    fn test_zero_or_missing_limit_uses_cpus() {
        let cpus = num_cpus::get().max(1);
        assert_eq!(resolve_concurrency(None), cpus);
        assert_eq!(resolve_concurrency(Some(0)), cpus);
        assert_eq!(resolve_concurrency(Some(3)), 3);
    }

    #[test]
    fn test_config_keeps_worker_order() {
        let workers: Vec<Arc<dyn Worker>> = vec![
            Arc::new(ReplyWorker::new("a", "x")),
            Arc::new(ReplyWorker::new("b", "y")),
        ];
        let config = WorkflowConfig::new("ordered", workers, Some(2));

        let names: Vec<_> = config.workers().iter().map(|w| w.name()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(config.concurrency_limit(), 2);
        assert_eq!(config.name(), "ordered");
    }

    #[test]
    fn test_from_settings_builds_workers() {
        let mut settings = Settings::default();
        settings.workflow.max_workers = 4;
        settings.workers = vec![WorkerSpec::Echo { name: "echo".to_string(), prefix: String::new() }];

        let config = WorkflowConfig::from_settings(&settings);
        assert_eq!(config.workers().len(), 1);
        assert_eq!(config.concurrency_limit(), 4);
    }

    #[test]
    fn test_empty_worker_set_is_allowed() {
        let config = WorkflowConfig::new("empty", Vec::new(), None);
        assert!(config.workers().is_empty());
        assert!(config.concurrency_limit() >= 1);
    }
}
