#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use voicebank_batch::*;

/// Processor that sleeps for a fixed time and fails the listed job IDs.
pub struct SimulatedProcessor {
    pub duration: Duration,
    pub failing: HashSet<String>,
    pub current: AtomicUsize,
    pub max_concurrent: AtomicUsize,
    pub calls: AtomicUsize,
}

impl SimulatedProcessor {
    pub fn new(duration: Duration) -> Arc<Self> {
        Self::failing(duration, &[])
    }

    pub fn failing(duration: Duration, ids: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            duration,
            failing: ids.iter().map(|s| s.to_string()).collect(),
            current: AtomicUsize::new(0),
            max_concurrent: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Lets an `Arc<SimulatedProcessor>` be handed to the engine while the test
/// keeps its own reference for assertions.
pub struct SharedProcessor(pub Arc<SimulatedProcessor>);

impl JobProcessor for SharedProcessor {
    fn process(&self, job: &Job) -> anyhow::Result<JobResult> {
        let p = &self.0;
        p.calls.fetch_add(1, Ordering::SeqCst);
        let now = p.current.fetch_add(1, Ordering::SeqCst) + 1;
        p.max_concurrent.fetch_max(now, Ordering::SeqCst);

        thread::sleep(p.duration);

        p.current.fetch_sub(1, Ordering::SeqCst);
        if p.failing.contains(&job.id) {
            anyhow::bail!("bad oto.ini in {}", job.voice_bank_name);
        }
        Ok(JobResult::success()
            .with_input_files(3)
            .with_output_size(1024))
    }
}

/// What the observer should do to the engine from inside a callback.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    None,
    PauseOnStart,
    PauseAfterFirstCompletion,
}

/// Observer that records every callback.
pub struct RecordingObserver {
    pub hook: Hook,
    pub engine: OnceLock<Weak<BatchEngine>>,

    pub started_batches: AtomicUsize,
    pub completed_batches: AtomicUsize,
    pub cancelled_batches: AtomicUsize,
    pub failed_batches: AtomicUsize,
    pub paused: AtomicUsize,
    pub resumed: AtomicUsize,
    pub eta_updates: AtomicUsize,
    pub memory_warnings: AtomicUsize,

    pub started_jobs: Mutex<Vec<String>>,
    pub completed_jobs: Mutex<Vec<String>>,
    pub failed_jobs: Mutex<Vec<(String, String)>>,
    pub progress: Mutex<Vec<BatchStats>>,
    pub failure_reasons: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Self::with_hook(Hook::None)
    }

    pub fn with_hook(hook: Hook) -> Arc<Self> {
        Arc::new(Self {
            hook,
            engine: OnceLock::new(),
            started_batches: AtomicUsize::new(0),
            completed_batches: AtomicUsize::new(0),
            cancelled_batches: AtomicUsize::new(0),
            failed_batches: AtomicUsize::new(0),
            paused: AtomicUsize::new(0),
            resumed: AtomicUsize::new(0),
            eta_updates: AtomicUsize::new(0),
            memory_warnings: AtomicUsize::new(0),
            started_jobs: Mutex::new(Vec::new()),
            completed_jobs: Mutex::new(Vec::new()),
            failed_jobs: Mutex::new(Vec::new()),
            progress: Mutex::new(Vec::new()),
            failure_reasons: Mutex::new(Vec::new()),
        })
    }

    /// Attach to an engine the hooks can reach back into.
    pub fn attach(self: &Arc<Self>, engine: &Arc<BatchEngine>) {
        let _ = self.engine.set(Arc::downgrade(engine));
        engine.set_observer(self.clone());
    }

    fn pause_engine(&self) {
        if let Some(engine) = self.engine.get().and_then(Weak::upgrade) {
            engine.pause_batch();
        }
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    pub fn started_job_count(&self) -> usize {
        self.started_jobs.lock().len()
    }
}

impl BatchObserver for RecordingObserver {
    fn on_batch_started(&self, _total_jobs: usize) {
        self.started_batches.fetch_add(1, Ordering::SeqCst);
        if self.hook == Hook::PauseOnStart {
            self.pause_engine();
        }
    }

    fn on_batch_progress(&self, stats: &BatchStats) {
        self.progress.lock().push(stats.clone());
    }

    fn on_batch_completed(&self, _stats: &BatchStats) {
        self.completed_batches.fetch_add(1, Ordering::SeqCst);
    }

    fn on_batch_paused(&self) {
        self.paused.fetch_add(1, Ordering::SeqCst);
    }

    fn on_batch_resumed(&self) {
        self.resumed.fetch_add(1, Ordering::SeqCst);
    }

    fn on_batch_cancelled(&self) {
        self.cancelled_batches.fetch_add(1, Ordering::SeqCst);
    }

    fn on_batch_failed(&self, _stats: &BatchStats, reason: &str) {
        self.failed_batches.fetch_add(1, Ordering::SeqCst);
        self.failure_reasons.lock().push(reason.to_string());
    }

    fn on_job_started(&self, job: &Job) {
        self.started_jobs.lock().push(job.id.clone());
    }

    fn on_job_completed(&self, job: &Job, _result: &JobResult) {
        let first = {
            let mut completed = self.completed_jobs.lock();
            completed.push(job.id.clone());
            completed.len() == 1
        };
        if first && self.hook == Hook::PauseAfterFirstCompletion {
            self.pause_engine();
        }
    }

    fn on_job_failed(&self, job: &Job, error: &str) {
        self.failed_jobs
            .lock()
            .push((job.id.clone(), error.to_string()));
    }

    fn on_memory_warning(&self, _current_mb: f64, _limit_mb: f64) {
        self.memory_warnings.fetch_add(1, Ordering::SeqCst);
    }

    fn on_eta_updated(&self, _estimated_completion: chrono::DateTime<chrono::Utc>) {
        self.eta_updates.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn test_config(threads: usize, batch_size: usize) -> BatchConfig {
    BatchConfig::builder()
        .with_threads(threads)
        .with_batch_size(batch_size)
        .with_monitor_interval(Duration::from_millis(10))
        .build()
}

/// Add `count` jobs named `job-0`, `job-1`, ...
pub fn add_jobs(engine: &BatchEngine, count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            engine
                .add_job_with_id(
                    format!("job-{}", i),
                    format!("/banks/bank_{}", i),
                    format!("/out/bank_{}.nvm", i),
                    serde_json::json!({ "sampleRate": 44100 }),
                )
                .unwrap()
        })
        .collect()
}

/// Poll `condition` until it holds or `timeout` elapses.
pub fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}
