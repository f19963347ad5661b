// src/engine/process.rs
use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::{Output, Stdio};
use std::sync::Arc;
use std::time::Duration;
use serde::{Serialize, Deserialize};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn, Instrument};

use crate::core::worker::WorkerSpec;
use crate::error::{DispatchError, ErysaError, ErysaResult, TimeoutError};
use super::collector::ResultCollector;
use super::executor::TaskExecutor;
use super::pool::JobPool;
use super::result::{ExecutionResult, FailureKind};
use super::task::{Task, RunArgs};
use super::workflow::WorkflowConfig;

/// Message a parent writes to a child's stdin, one per child
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRequest {
    pub worker: WorkerSpec,
    pub task: Task,
    pub args: RunArgs,
}

/// How to start a child process that serves one job
#[derive(Debug, Clone)]
pub struct WorkerLauncher {
    program: PathBuf,
    args: Vec<String>,
}

impl WorkerLauncher {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Re-run the current executable as `<exe> worker`.
    ///
    /// Only valid when the current executable routes the `worker` subcommand
    /// to [`serve_job`], as the `erysa` binary does.
    pub fn current_exe() -> Result<Self, DispatchError> {
        let program = std::env::current_exe()?;
        Ok(Self::new(program, vec!["worker".to_string()]))
    }

    pub fn program(&self) -> &PathBuf {
        &self.program
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        // Everything the job starts shares one group so it can be killed together
        #[cfg(unix)]
        command.process_group(0);
        command
    }
}

/// Process group of one running job.
///
/// Dropping it before [`JobGroup::finish`] kills every process in the group,
/// which covers both a timeout and an aborted dispatch.
struct JobGroup {
    leader: Option<u32>,
}

impl JobGroup {
    fn new(leader: Option<u32>) -> Self {
        Self { leader }
    }

    /// The leader exited on its own; leave the group alone
    fn finish(mut self) {
        self.leader = None;
    }
}

impl Drop for JobGroup {
    fn drop(&mut self) {
        if let Some(leader) = self.leader.take() {
            kill_process_group(leader);
        }
    }
}

#[cfg(unix)]
fn kill_process_group(leader: u32) {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Ok(pgid) = i32::try_from(leader) else {
        return;
    };
    match killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
        Ok(()) => debug!("Killed worker process group {}", pgid),
        Err(Errno::ESRCH) => {}
        Err(e) => warn!("Failed to kill worker process group {}: {}", pgid, e),
    }
}

#[cfg(not(unix))]
fn kill_process_group(_leader: u32) {}

/// Runs worker jobs in child processes, at most `concurrency_limit` at a time.
///
/// Every job is a fresh child started by the dispatcher's [`WorkerLauncher`].
/// The launched program must read one [`JobRequest`] from stdin and answer
/// through [`serve_job`]; the `erysa` binary does this for its hidden `worker`
/// subcommand. Without a launcher, `run` and `batched_run` return `None`.
pub struct ProcessDispatcher {
    config: Arc<WorkflowConfig>,
    launcher: Option<WorkerLauncher>,
}

impl ProcessDispatcher {
    pub fn new(config: Arc<WorkflowConfig>) -> Self {
        Self {
            config,
            launcher: None,
        }
    }

    pub fn with_launcher(mut self, launcher: WorkerLauncher) -> Self {
        self.launcher = Some(launcher);
        self
    }

    /// Run one task on every worker, one child process per worker.
    ///
    /// Results come back in completion order, which is unspecified. A job that
    /// outlives the task's timeout is killed and leaves no entry, so the
    /// sequence holds at most one entry per worker. Returns `None` if the jobs
    /// could not be dispatched at all.
    pub async fn run(&self, task: &Task, args: &RunArgs) -> Option<Vec<ExecutionResult>> {
        match self.try_run(task, args).await {
            Ok(results) => Some(results),
            Err(e) => {
                error!("Error in run: {}", e);
                None
            }
        }
    }

    /// Run a task list in consecutive batches of `batch_size`.
    ///
    /// Every (task, worker) job of a batch runs in parallel and the whole batch
    /// finishes before the next one starts. Within a batch, results follow
    /// task order then worker order; batch `i` always precedes batch `i + 1`.
    pub async fn batched_run(&self, tasks: &[Task], batch_size: usize, args: &RunArgs) -> Option<Vec<ExecutionResult>> {
        match self.try_batched_run(tasks, batch_size, args).await {
            Ok(results) => Some(results),
            Err(e) => {
                error!("Error in batched_run: {}", e);
                None
            }
        }
    }

    async fn try_run(&self, task: &Task, args: &RunArgs) -> Result<Vec<ExecutionResult>, DispatchError> {
        let launcher = self.launcher()?;
        let pool = JobPool::new(self.config.concurrency_limit())?;
        let specs = self.worker_specs()?;

        let requests = build_requests(&specs, std::slice::from_ref(task), args);
        let collector = self.dispatch(requests, &launcher, &pool, args.timeout_for(task)).await?;

        Ok(collector.drain_completion_order())
    }

    async fn try_batched_run(&self, tasks: &[Task], batch_size: usize, args: &RunArgs) -> Result<Vec<ExecutionResult>, DispatchError> {
        if batch_size == 0 {
            return Err(DispatchError::InvalidBatchSize);
        }

        let launcher = self.launcher()?;
        let pool = JobPool::new(self.config.concurrency_limit())?;
        let specs = self.worker_specs()?;

        let mut results = Vec::with_capacity(tasks.len() * specs.len());
        for (batch_index, batch) in tasks.chunks(batch_size).enumerate() {
            debug!("Dispatching batch {} with {} tasks", batch_index, batch.len());

            let requests = build_requests(&specs, batch, args);
            let collector = self.dispatch(requests, &launcher, &pool, None).await?;
            results.extend(collector.drain_submission_order());
        }

        info!("Completed {} tasks in batches of {}", tasks.len(), batch_size);
        Ok(results)
    }

    /// Start one child per request and wait for all of them
    async fn dispatch(
        &self,
        requests: Vec<JobRequest>,
        launcher: &WorkerLauncher,
        pool: &JobPool,
        timeout: Option<Duration>,
    ) -> Result<ResultCollector, DispatchError> {
        let collector = ResultCollector::new(requests.len());
        let mut jobs = JoinSet::new();

        for (index, request) in requests.into_iter().enumerate() {
            let launcher = launcher.clone();
            let pool = pool.clone();
            let collector = collector.clone();

            let job = async move {
                let _permit = pool.acquire().await?;
                let outcome = run_job(&launcher, &request);

                let result = match timeout {
                    None => outcome.await?,
                    Some(limit) => match tokio::time::timeout(limit, outcome).await {
                        Ok(result) => result?,
                        Err(_) => {
                            let timeout_error = TimeoutError {
                                operation: format!("task {} on worker {}", request.task, request.worker.name()),
                                seconds: limit.as_secs_f64(),
                            };
                            error!("Abandoning job {}: {}", index, timeout_error);
                            return Ok(());
                        }
                    },
                };

                collector.append(index, result);
                Ok::<(), DispatchError>(())
            };
            jobs.spawn(job.instrument(self.config.span().clone()));
        }

        // Dropping the set on error aborts the remaining jobs and kills their children
        while let Some(joined) = jobs.join_next().await {
            joined??;
        }

        Ok(collector)
    }

    fn launcher(&self) -> Result<WorkerLauncher, DispatchError> {
        self.launcher.clone().ok_or(DispatchError::NoLauncher)
    }

    fn worker_specs(&self) -> Result<Vec<WorkerSpec>, DispatchError> {
        self.config
            .workers()
            .iter()
            .map(|worker| {
                worker.descriptor().ok_or_else(|| DispatchError::NotProcessSafe {
                    worker: worker.name().to_string(),
                })
            })
            .collect()
    }
}

fn build_requests(specs: &[WorkerSpec], tasks: &[Task], args: &RunArgs) -> Vec<JobRequest> {
    tasks
        .iter()
        .flat_map(|task| {
            specs.iter().map(move |spec| JobRequest {
                worker: spec.clone(),
                task: task.clone(),
                args: args.clone(),
            })
        })
        .collect()
}

/// Run one request in a fresh child process
async fn run_job(launcher: &WorkerLauncher, request: &JobRequest) -> Result<ExecutionResult, DispatchError> {
    let payload = serde_json::to_vec(request)
        .map_err(|e| DispatchError::Protocol(format!("Failed to encode job request: {}", e)))?;

    let mut child = launcher.command().spawn().map_err(|source| DispatchError::Spawn {
        program: launcher.program.clone(),
        source,
    })?;
    let group = JobGroup::new(child.id());
    debug!("Started worker process {:?} for {}", child.id(), request.worker.name());

    if let Some(mut stdin) = child.stdin.take() {
        // A child that dies before reading shows up as a crash below
        if let Err(e) = stdin.write_all(&payload).await {
            warn!("Failed to send job to worker process for {}: {}", request.worker.name(), e);
        }
    }

    let output = child.wait_with_output().await?;
    group.finish();
    Ok(read_outcome(request, &output))
}

fn read_outcome(request: &JobRequest, output: &Output) -> ExecutionResult {
    match serde_json::from_slice::<ExecutionResult>(&output.stdout) {
        Ok(result) if output.status.success() => result,
        parsed => {
            let reason = match parsed {
                Err(e) if output.status.success() => format!("unreadable result: {}", e),
                _ => format!("worker process exited with {}", output.status),
            };
            error!("An error occurred during execution of task {} on worker {}: {}",
                request.task, request.worker.name(), reason);
            ExecutionResult::failed(request.worker.name(), request.task.to_string(), FailureKind::ProcessCrashed, reason)
        }
    }
}

/// Child side of the process protocol: read one request, run it, write one result
pub fn serve_job<R: Read, W: Write>(mut input: R, mut output: W) -> ErysaResult<()> {
    let mut payload = Vec::new();
    input
        .read_to_end(&mut payload)
        .map_err(|e| ErysaError::InvalidInput(format!("Failed to read job request: {}", e)))?;

    let request: JobRequest = serde_json::from_slice(&payload)
        .map_err(|e| ErysaError::SerializationError(format!("Failed to parse job request: {}", e)))?;

    let worker = request.worker.build();
    let result = TaskExecutor::execute(&request.task, worker.as_ref(), &request.args);

    serde_json::to_writer(&mut output, &result)
        .map_err(|e| ErysaError::SerializationError(format!("Failed to write job result: {}", e)))?;
    output
        .flush()
        .map_err(|e| ErysaError::UnexpectedError(format!("Failed to flush job result: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::process::ExitStatusExt;
    use std::process::ExitStatus;

    fn reply_request(text: &str) -> JobRequest {
        JobRequest {
            worker: WorkerSpec::Reply { name: "b".to_string(), text: text.to_string() },
            task: Task::new("ping"),
            args: RunArgs::new(),
        }
    }

    #[test]
    fn test_serve_job_writes_result() {
        let request = reply_request("pong");
        let input = serde_json::to_vec(&request).unwrap();
        let mut output = Vec::new();

        serve_job(input.as_slice(), &mut output).unwrap();

        let result: ExecutionResult = serde_json::from_slice(&output).unwrap();
        assert_eq!(result, ExecutionResult::success("b", "pong"));
    }

    #[test]
    fn test_serve_job_rejects_garbage() {
        let mut output = Vec::new();
        let err = serve_job(&b"not json"[..], &mut output).unwrap_err();
        assert!(matches!(err, ErysaError::SerializationError(_)));
        assert!(output.is_empty());
    }

    #[test]
    fn test_build_requests_is_task_major() {
        let specs = vec![
            WorkerSpec::Reply { name: "a".to_string(), text: "x".to_string() },
            WorkerSpec::Reply { name: "b".to_string(), text: "y".to_string() },
        ];
        let tasks = vec![Task::new("t1"), Task::new("t2")];

        let order: Vec<_> = build_requests(&specs, &tasks, &RunArgs::new())
            .iter()
            .map(|r| format!("{}:{}", r.task, r.worker.name()))
            .collect();
        assert_eq!(order, vec!["t1:a", "t1:b", "t2:a", "t2:b"]);
    }

    #[test]
    fn test_crashed_child_becomes_marker() {
        let request = reply_request("pong");
        let output = Output {
            status: ExitStatus::from_raw(9),
            stdout: Vec::new(),
            stderr: Vec::new(),
        };

        let result = read_outcome(&request, &output);
        let marker = result.failure().unwrap();
        assert_eq!(marker.kind, FailureKind::ProcessCrashed);
        assert_eq!(marker.worker, "b");
    }

    #[test]
    fn test_clean_exit_with_result_is_kept() {
        let request = reply_request("pong");
        let output = Output {
            status: ExitStatus::from_raw(0),
            stdout: serde_json::to_vec(&ExecutionResult::success("b", "pong")).unwrap(),
            stderr: Vec::new(),
        };

        assert_eq!(read_outcome(&request, &output).output(), Some("pong"));
    }
}
