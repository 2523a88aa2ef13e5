use chrono::{DateTime, Utc};
use crossbeam::channel::{self, Receiver, Sender};
use serde::Serialize;

use crate::types::{BatchStats, Job, JobResult};

/// Receives lifecycle and progress notifications from the batch engine.
///
/// Every method has a no-op default, so implementors only override what
/// they care about. Job-level and progress events are delivered on worker
/// threads; batch control events on the thread that issued the command.
pub trait BatchObserver: Send + Sync {
    fn on_batch_started(&self, _total_jobs: usize) {}
    fn on_batch_progress(&self, _stats: &BatchStats) {}
    fn on_batch_completed(&self, _stats: &BatchStats) {}
    fn on_batch_paused(&self) {}
    fn on_batch_resumed(&self) {}
    fn on_batch_cancelled(&self) {}
    /// The consecutive-error policy stopped the batch.
    fn on_batch_failed(&self, _stats: &BatchStats, _reason: &str) {}

    fn on_job_started(&self, _job: &Job) {}
    fn on_job_completed(&self, _job: &Job, _result: &JobResult) {}
    fn on_job_failed(&self, _job: &Job, _error: &str) {}

    fn on_memory_warning(&self, _current_mb: f64, _limit_mb: f64) {}
    fn on_eta_updated(&self, _estimated_completion: DateTime<Utc>) {}
}

/// Serializable form of every observer callback.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BatchEvent {
    #[serde(rename_all = "camelCase")]
    BatchStarted { total_jobs: usize },
    BatchProgress { stats: BatchStats },
    BatchCompleted { stats: BatchStats },
    BatchPaused,
    BatchResumed,
    BatchCancelled,
    BatchFailed { stats: BatchStats, reason: String },
    #[serde(rename_all = "camelCase")]
    JobStarted { job_id: String },
    #[serde(rename_all = "camelCase")]
    JobCompleted { job_id: String, result: JobResult },
    #[serde(rename_all = "camelCase")]
    JobFailed { job_id: String, error: String },
    #[serde(rename_all = "camelCase")]
    MemoryWarning { current_mb: f64, limit_mb: f64 },
    #[serde(rename_all = "camelCase")]
    EtaUpdated { estimated_completion: DateTime<Utc> },
}

/// Observer that forwards every callback as a [`BatchEvent`] over a channel,
/// for UIs that consume events on their own thread.
pub struct ChannelObserver {
    tx: Sender<BatchEvent>,
}

impl ChannelObserver {
    /// Create the observer and the receiving end of its event stream.
    pub fn channel() -> (Self, Receiver<BatchEvent>) {
        let (tx, rx) = channel::unbounded();
        (Self { tx }, rx)
    }

    fn send(&self, event: BatchEvent) {
        // A dropped receiver just means nobody is listening any more.
        let _ = self.tx.send(event);
    }
}

impl BatchObserver for ChannelObserver {
    fn on_batch_started(&self, total_jobs: usize) {
        self.send(BatchEvent::BatchStarted { total_jobs });
    }

    fn on_batch_progress(&self, stats: &BatchStats) {
        self.send(BatchEvent::BatchProgress {
            stats: stats.clone(),
        });
    }

    fn on_batch_completed(&self, stats: &BatchStats) {
        self.send(BatchEvent::BatchCompleted {
            stats: stats.clone(),
        });
    }

    fn on_batch_paused(&self) {
        self.send(BatchEvent::BatchPaused);
    }

    fn on_batch_resumed(&self) {
        self.send(BatchEvent::BatchResumed);
    }

    fn on_batch_cancelled(&self) {
        self.send(BatchEvent::BatchCancelled);
    }

    fn on_batch_failed(&self, stats: &BatchStats, reason: &str) {
        self.send(BatchEvent::BatchFailed {
            stats: stats.clone(),
            reason: reason.to_string(),
        });
    }

    fn on_job_started(&self, job: &Job) {
        self.send(BatchEvent::JobStarted {
            job_id: job.id.clone(),
        });
    }

    fn on_job_completed(&self, job: &Job, result: &JobResult) {
        self.send(BatchEvent::JobCompleted {
            job_id: job.id.clone(),
            result: result.clone(),
        });
    }

    fn on_job_failed(&self, job: &Job, error: &str) {
        self.send(BatchEvent::JobFailed {
            job_id: job.id.clone(),
            error: error.to_string(),
        });
    }

    fn on_memory_warning(&self, current_mb: f64, limit_mb: f64) {
        self.send(BatchEvent::MemoryWarning {
            current_mb,
            limit_mb,
        });
    }

    fn on_eta_updated(&self, estimated_completion: DateTime<Utc>) {
        self.send(BatchEvent::EtaUpdated {
            estimated_completion,
        });
    }
}
