use thiserror::Error;

use crate::types::ProcessingState;

/// Errors raised by the [`WorkerPool`](crate::pool::WorkerPool) and the
/// handles it returns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("Worker pool is not running")]
    NotRunning,

    #[error("Task panicked: {0}")]
    Panicked(String),

    #[error("Task was dropped before it produced a result")]
    Abandoned,

    #[error("Timed out waiting for task result")]
    Timeout,
}

/// Errors that can occur in the batch engine.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Worker pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Batch engine is not idle (state: {0:?})")]
    NotIdle(ProcessingState),

    #[error("Job already exists: {0}")]
    DuplicateJob(String),

    #[error("Job queue is full ({0} jobs)")]
    QueueFull(usize),
}
