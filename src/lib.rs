//! # Voicebank Batch
//!
//! Batch execution engine for converting UTAU voice banks into a
//! conditioned output format.
//!
//! ## Key Features
//!
//! - **Bounded dispatch window**: at most `batch_size` jobs are admitted to
//!   the worker pool at once; each finished job admits the next one
//! - **Pause / resume / cancel**: pausing stops admissions, resuming refills
//!   the window, cancelling lets in-flight jobs finish and drops the rest
//! - **Resource monitoring**: background sampling of process memory with a
//!   peak value and an informational memory cap
//! - **Running-mean ETA**: completion estimates from the average duration
//!   of successful jobs, or from caller estimates before the first one
//! - **Consecutive-error policy**: stop the batch after too many failures
//!   in a row
//!
//! ## Quick Start
//!
//! 1. Implement [`JobProcessor`] (or pass a closure) for the conversion itself
//! 2. Create a [`BatchEngine`] and add jobs with [`BatchEngine::add_job`]
//! 3. Optionally attach a [`BatchObserver`] such as [`ConsoleReporter`]
//! 4. Call [`BatchEngine::start_batch`] and wait with
//!    [`BatchEngine::wait_for_completion`]

pub mod config;
pub mod console;
pub mod engine;
pub mod error;
pub mod eta;
pub mod events;
pub mod monitor;
pub mod pool;
pub mod types;

pub use config::{BatchConfig, BatchConfigBuilder};
pub use console::ConsoleReporter;
pub use engine::BatchEngine;
pub use error::{BatchError, PoolError};
pub use events::{BatchEvent, BatchObserver, ChannelObserver};
pub use monitor::ResourceMonitor;
pub use pool::{TaskHandle, WorkerPool};
pub use types::{BatchStats, Job, JobResult, ProcessingState};

/// Converts a single voice bank.
///
/// The engine fills in [`JobResult::job_id`] and
/// [`JobResult::processing_time`] itself. Returning `Err` or panicking marks
/// the job as failed; neither affects other jobs.
///
/// Any `Fn(&Job) -> anyhow::Result<JobResult>` closure is a processor.
///
/// # Example
///
/// ```ignore
/// use voicebank_batch::*;
///
/// struct Converter;
///
/// impl JobProcessor for Converter {
///     fn process(&self, job: &Job) -> anyhow::Result<JobResult> {
///         let written = convert(&job.input_path, &job.output_path)?;
///         Ok(JobResult::success().with_output_size(written))
///     }
/// }
/// ```
pub trait JobProcessor: Send + Sync + 'static {
    fn process(&self, job: &Job) -> anyhow::Result<JobResult>;
}

impl<F> JobProcessor for F
where
    F: Fn(&Job) -> anyhow::Result<JobResult> + Send + Sync + 'static,
{
    fn process(&self, job: &Job) -> anyhow::Result<JobResult> {
        self(job)
    }
}
