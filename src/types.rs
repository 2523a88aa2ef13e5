use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of the batch as a whole.
///
/// `Idle -> Running <-> Paused`, `Running/Paused -> Cancelling -> Idle`,
/// `Running -> Completed` on natural drain and `Running/Paused -> Failed`
/// when the consecutive-error policy trips. `Completed` and `Failed` are
/// resting states: the engine accepts job edits and a new batch from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProcessingState {
    Idle,
    Running,
    Paused,
    Cancelling,
    Completed,
    Failed,
}

impl ProcessingState {
    /// Whether a new batch may be configured and started from this state.
    pub fn is_resting(&self) -> bool {
        matches!(
            self,
            ProcessingState::Idle | ProcessingState::Completed | ProcessingState::Failed
        )
    }

    /// Whether a batch is currently in progress (including pause and cancel).
    pub fn is_active(&self) -> bool {
        !self.is_resting()
    }
}

/// One voice bank conversion.
///
/// Everything except the three lifecycle timestamps is fixed at creation.
/// `started_at` and `completed_at` are written by the engine from the worker
/// thread that runs the job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Unique job identifier.
    pub id: String,
    /// Voice bank directory to convert.
    pub input_path: PathBuf,
    /// Model file to produce.
    pub output_path: PathBuf,
    /// Opaque conditioning configuration handed to the processor.
    pub config: serde_json::Value,
    /// Display name, derived from the last component of `input_path`.
    pub voice_bank_name: String,
    /// Caller-supplied estimate used for ETA before any job has finished.
    pub estimated_duration_ms: u64,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(
        id: impl Into<String>,
        input_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
        config: serde_json::Value,
    ) -> Self {
        let input_path = input_path.into();
        let voice_bank_name = display_name(&input_path);
        Self {
            id: id.into(),
            input_path,
            output_path: output_path.into(),
            config,
            voice_bank_name,
            estimated_duration_ms: 0,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    /// Wall-clock time between start and completion, if both are known.
    pub fn elapsed(&self) -> Option<chrono::Duration> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }
}

fn display_name(input_path: &Path) -> String {
    input_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input_path.to_string_lossy().into_owned())
}

/// Outcome of a single job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResult {
    pub job_id: String,
    pub success: bool,
    /// Set iff `success` is false.
    pub error_message: Option<String>,
    pub warnings: Vec<String>,
    /// Measured by the engine around the processor call.
    pub processing_time: Duration,
    pub input_files_processed: usize,
    pub output_file_size_bytes: u64,
    pub compression_ratio: f64,
    /// Quality estimate in `0.0..=1.0`.
    pub estimated_quality_score: f64,
    pub quality_metrics: HashMap<String, f64>,
}

impl JobResult {
    pub fn success() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error_message: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn with_input_files(mut self, count: usize) -> Self {
        self.input_files_processed = count;
        self
    }

    pub fn with_output_size(mut self, bytes: u64) -> Self {
        self.output_file_size_bytes = bytes;
        self
    }

    pub fn with_quality(mut self, score: f64) -> Self {
        self.estimated_quality_score = score;
        self
    }

    pub fn with_compression_ratio(mut self, ratio: f64) -> Self {
        self.compression_ratio = ratio;
        self
    }

    pub fn with_metric(mut self, name: impl Into<String>, value: f64) -> Self {
        self.quality_metrics.insert(name.into(), value);
        self
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn processing_time_ms(&self) -> f64 {
        self.processing_time.as_secs_f64() * 1000.0
    }
}

/// Aggregate statistics for the current (or last) batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStats {
    pub total_jobs: usize,
    pub completed_jobs: usize,
    pub failed_jobs: usize,
    pub active_jobs: usize,
    pub queued_jobs: usize,

    pub average_processing_time_ms: f64,
    pub total_processing_time_ms: f64,
    pub total_input_files: usize,
    pub total_output_size_bytes: u64,

    pub peak_memory_usage_mb: f64,
    pub current_memory_usage_mb: f64,
    pub active_threads: usize,

    pub batch_start_time: DateTime<Utc>,
    pub estimated_completion_time: Option<DateTime<Utc>>,
}

impl Default for BatchStats {
    fn default() -> Self {
        Self {
            total_jobs: 0,
            completed_jobs: 0,
            failed_jobs: 0,
            active_jobs: 0,
            queued_jobs: 0,
            average_processing_time_ms: 0.0,
            total_processing_time_ms: 0.0,
            total_input_files: 0,
            total_output_size_bytes: 0,
            peak_memory_usage_mb: 0.0,
            current_memory_usage_mb: 0.0,
            active_threads: 0,
            batch_start_time: Utc::now(),
            estimated_completion_time: None,
        }
    }
}

impl BatchStats {
    /// Jobs that have finished, successfully or not.
    pub fn finished_jobs(&self) -> usize {
        self.completed_jobs + self.failed_jobs
    }

    /// Jobs not yet finished.
    pub fn remaining_jobs(&self) -> usize {
        self.total_jobs.saturating_sub(self.finished_jobs())
    }

    /// Percentage of successful jobs among all jobs; 0 for an empty batch.
    pub fn success_rate(&self) -> f64 {
        if self.total_jobs == 0 {
            0.0
        } else {
            100.0 * self.completed_jobs as f64 / self.total_jobs as f64
        }
    }

    /// `completed + failed + active + queued == total`.
    pub fn is_consistent(&self) -> bool {
        self.completed_jobs + self.failed_jobs + self.active_jobs + self.queued_jobs
            == self.total_jobs
    }
}
