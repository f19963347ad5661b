mod collector;
mod executor;
mod pool;
mod process;
mod result;
mod summary;
mod task;
mod thread;
mod workflow;

pub use collector::ResultCollector;
pub use executor::TaskExecutor;
pub use pool::JobPool;
pub use process::{serve_job, JobRequest, ProcessDispatcher, WorkerLauncher};
pub use result::{ExecutionResult, FailureKind, FailureMarker};
pub use summary::{RunStatus, RunSummary};
pub use task::{RunArgs, Task};
pub use thread::ThreadDispatcher;
pub use workflow::{DispatchMode, Workflow, WorkflowConfig};
