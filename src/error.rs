use std::path::PathBuf;
use thiserror::Error;

/// Crate-level errors for everything outside a single dispatch call
#[derive(Error, Debug)]
pub enum ErysaError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("File error: {path:?} - {message}")]
    FileError {
        path: PathBuf,
        message: String,
    },

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Logging error: {0}")]
    LoggingError(String),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Unexpected error: {0}")]
    UnexpectedError(String),
}

impl From<anyhow::Error> for ErysaError {
    fn from(error: anyhow::Error) -> Self {
        ErysaError::UnexpectedError(error.to_string())
    }
}

pub type ErysaResult<T> = std::result::Result<T, ErysaError>;

/// Failure raised inside a worker's `run`. Never crosses the executor boundary.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct WorkerError {
    pub message: String,
}

impl WorkerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Failure of the dispatch machinery itself. A dispatch call that hits one
/// of these returns `None`.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// Only reachable through `JobPool::new`; `WorkflowConfig` never resolves
    /// a limit below one.
    #[error("Pool cannot be built with {0} slots")]
    EmptyPool(usize),

    #[error("Job pool closed while jobs were pending")]
    PoolClosed,

    #[error("Batch size must be at least 1")]
    InvalidBatchSize,

    #[error("No worker launcher configured for child process jobs")]
    NoLauncher,

    #[error("Worker {worker} has no descriptor and cannot run in a child process")]
    NotProcessSafe {
        worker: String,
    },

    #[error("Failed to spawn worker process {program:?}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error talking to worker process: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed job message: {0}")]
    Protocol(String),

    #[error("Job join failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("No async runtime available: {0}")]
    NoRuntime(String),
}

/// A process job ran past its deadline and was abandoned
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Timeout error: {operation} exceeded {seconds} seconds")]
pub struct TimeoutError {
    pub operation: String,
    pub seconds: f64,
}
