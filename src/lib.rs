pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod logging;
pub mod utils;
pub mod workers;

// Re-export main types for easier access
pub use crate::config::Settings;
pub use crate::core::worker::{Worker, WorkerSpec};
pub use engine::{
    ExecutionResult,
    FailureKind,
    FailureMarker,
    ProcessDispatcher,
    ResultCollector,
    RunArgs,
    Task,
    TaskExecutor,
    ThreadDispatcher,
    Workflow,
    WorkflowConfig,
};
pub use error::{DispatchError, ErysaError, ErysaResult, TimeoutError, WorkerError};
pub use logging::Logging;
