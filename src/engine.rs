use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use parking_lot::{Condvar, Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::config::BatchConfig;
use crate::error::BatchError;
use crate::eta;
use crate::events::BatchObserver;
use crate::monitor::ResourceMonitor;
use crate::pool::{panic_message, WorkerPool};
use crate::types::{BatchStats, Job, JobResult, ProcessingState};
use crate::JobProcessor;

/// Batch engine: runs a list of voice bank conversions on a worker pool
/// with a bounded dispatch window.
///
/// Jobs are added while the engine is idle, then [`start_batch`] admits up to
/// `batch_size` of them into the pool. Every finished job admits the next
/// queued one, so the number of jobs in flight stays at `batch_size` until
/// the queue drains.
///
/// Locks are taken in the order control → state → dispatch → jobs → stats;
/// the results list and error log are only ever locked on their own. Worker
/// threads never take the control lock, so holding it while the pool is
/// stopped or resized cannot deadlock.
///
/// [`start_batch`]: BatchEngine::start_batch
pub struct BatchEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    /// Serializes start, cancel and pool resizes.
    control: Mutex<()>,
    config: RwLock<BatchConfig>,
    processor: Box<dyn JobProcessor>,
    pool: WorkerPool,
    monitor: ResourceMonitor,
    observer: RwLock<Option<Arc<dyn BatchObserver>>>,

    state: Mutex<ProcessingState>,
    state_changed: Condvar,

    dispatch: Mutex<Dispatch>,
    jobs: Mutex<Vec<Job>>,
    results: Mutex<Vec<JobResult>>,
    stats: Mutex<RunStats>,
    error_log: Mutex<Vec<String>>,
}

/// Admission queue plus the number of admitted jobs not yet finished.
#[derive(Default)]
struct Dispatch {
    queue: VecDeque<usize>,
    in_flight: usize,
}

#[derive(Default)]
struct RunStats {
    stats: BatchStats,
    consecutive_failures: u32,
    /// Caller estimates captured at start, for ETA before the first success.
    job_estimates_ms: Vec<u64>,
}

impl BatchEngine {
    /// Create an idle engine. The pool and the monitor are started lazily by
    /// [`start_batch`](Self::start_batch).
    pub fn new<P>(config: BatchConfig, processor: P) -> Result<Self, BatchError>
    where
        P: JobProcessor,
    {
        config.validate()?;

        let monitor = ResourceMonitor::with_interval(config.monitor_interval());
        monitor.set_memory_limit_mb(config.max_memory_usage_mb);
        let pool = WorkerPool::new(config.num_worker_threads);

        info!(
            threads = pool.size(),
            batch_size = config.batch_size,
            "Batch engine created"
        );

        Ok(Self {
            inner: Arc::new(EngineInner {
                control: Mutex::new(()),
                config: RwLock::new(config),
                processor: Box::new(processor),
                pool,
                monitor,
                observer: RwLock::new(None),
                state: Mutex::new(ProcessingState::Idle),
                state_changed: Condvar::new(),
                dispatch: Mutex::new(Dispatch::default()),
                jobs: Mutex::new(Vec::new()),
                results: Mutex::new(Vec::new()),
                stats: Mutex::new(RunStats::default()),
                error_log: Mutex::new(Vec::new()),
            }),
        })
    }

    // -- Configuration --

    pub fn get_config(&self) -> BatchConfig {
        self.inner.config.read().clone()
    }

    /// Replace the configuration. Only allowed while no batch is active.
    pub fn set_config(&self, config: BatchConfig) -> Result<(), BatchError> {
        config.validate()?;
        let _control = self.inner.control.lock();
        self.inner.ensure_settled()?;

        self.inner.pool.resize(config.num_worker_threads);
        self.inner
            .monitor
            .set_memory_limit_mb(config.max_memory_usage_mb);
        self.inner.monitor.set_interval(config.monitor_interval());
        *self.inner.config.write() = config;
        Ok(())
    }

    pub fn set_observer(&self, observer: Arc<dyn BatchObserver>) {
        *self.inner.observer.write() = Some(observer);
    }

    pub fn remove_observer(&self) {
        *self.inner.observer.write() = None;
    }

    /// Set the memory cap in MB (`<= 0` disables it). The config and the
    /// monitor always hold the same value.
    pub fn set_memory_limit_mb(&self, limit: f64) {
        let limit = if limit.is_finite() { limit.max(0.0) } else { 0.0 };
        self.inner.config.write().max_memory_usage_mb = limit;
        self.inner.monitor.set_memory_limit_mb(limit);
    }

    /// Resize the worker pool. Refused while a batch is active, since a
    /// resize restarts the pool.
    pub fn set_thread_count(&self, count: usize) -> bool {
        let _control = self.inner.control.lock();
        if let Err(e) = self.inner.ensure_settled() {
            warn!("Cannot change thread count: {}", e);
            return false;
        }
        self.inner.config.write().num_worker_threads = count;
        self.inner.pool.resize(count);
        true
    }

    /// Pre-flight check: is at least the configured memory cap available?
    pub fn check_system_resources(&self) -> bool {
        let available = self.inner.monitor.available_memory_mb();
        let required = self.inner.monitor.memory_limit_mb();
        if available < required {
            warn!(
                available_mb = available,
                required_mb = required,
                "Insufficient memory for batch"
            );
            return false;
        }
        debug!(available_mb = available, required_mb = required, "System resources OK");
        true
    }

    /// Free disk space at `path` in MB, for checking output locations.
    pub fn disk_space_mb(&self, path: impl AsRef<std::path::Path>) -> f64 {
        self.inner.monitor.disk_space_mb(path)
    }

    // -- Job management --

    /// Add a job with a generated ID. Returns the job ID.
    pub fn add_job(
        &self,
        input_path: impl Into<std::path::PathBuf>,
        output_path: impl Into<std::path::PathBuf>,
        config: serde_json::Value,
    ) -> Result<String, BatchError> {
        let id = uuid::Uuid::new_v4().to_string();
        self.add_job_with_id(id, input_path, output_path, config)
    }

    /// Add a job with a caller-chosen ID.
    pub fn add_job_with_id(
        &self,
        id: impl Into<String>,
        input_path: impl Into<std::path::PathBuf>,
        output_path: impl Into<std::path::PathBuf>,
        config: serde_json::Value,
    ) -> Result<String, BatchError> {
        let job = Job::new(id, input_path, output_path, config);
        let limit = self.inner.config.read().queue_size_limit;

        let mut state = self.inner.state.lock();
        let mut dispatch = self.inner.dispatch.lock();
        if !is_settled(*state, &dispatch) {
            return Err(BatchError::NotIdle(*state));
        }
        let mut jobs = self.inner.jobs.lock();

        if jobs.iter().any(|j| j.id == job.id) {
            return Err(BatchError::DuplicateJob(job.id));
        }
        if limit > 0 && jobs.len() >= limit {
            return Err(BatchError::QueueFull(limit));
        }

        info!(job_id = %job.id, voice_bank = %job.voice_bank_name, "Added batch job");
        let id = job.id.clone();
        jobs.push(job);
        self.inner.reset_pending(&mut state, &mut dispatch, jobs.len());
        Ok(id)
    }

    /// Remove a job. Returns `false` if it does not exist or a batch is active.
    pub fn remove_job(&self, job_id: &str) -> bool {
        let mut state = self.inner.state.lock();
        let mut dispatch = self.inner.dispatch.lock();
        if !is_settled(*state, &dispatch) {
            warn!(job_id, "Cannot remove job while a batch is active");
            return false;
        }
        let mut jobs = self.inner.jobs.lock();

        let Some(pos) = jobs.iter().position(|j| j.id == job_id) else {
            return false;
        };
        jobs.remove(pos);
        info!(job_id, "Removed batch job");
        self.inner.reset_pending(&mut state, &mut dispatch, jobs.len());
        true
    }

    /// Remove every job and result. Returns `false` while a batch is active.
    pub fn clear_jobs(&self) -> bool {
        let mut state = self.inner.state.lock();
        let mut dispatch = self.inner.dispatch.lock();
        if !is_settled(*state, &dispatch) {
            warn!("Cannot clear jobs while a batch is active");
            return false;
        }
        self.inner.jobs.lock().clear();
        self.inner.results.lock().clear();
        self.inner.reset_pending(&mut state, &mut dispatch, 0);
        info!("Cleared all batch jobs");
        true
    }

    /// Attach a duration estimate used for ETA until the first job finishes.
    pub fn set_estimated_duration(&self, job_id: &str, estimate: Duration) -> bool {
        let state = self.inner.state.lock();
        let dispatch = self.inner.dispatch.lock();
        if !is_settled(*state, &dispatch) {
            return false;
        }
        let mut jobs = self.inner.jobs.lock();
        match jobs.iter_mut().find(|j| j.id == job_id) {
            Some(job) => {
                job.estimated_duration_ms = estimate.as_millis() as u64;
                true
            }
            None => false,
        }
    }

    // -- Batch control --

    /// Start processing every job. Returns `false` if a batch is already
    /// active or there is nothing to do.
    pub fn start_batch(&self) -> bool {
        let inner = &self.inner;
        let total = {
            let _control = inner.control.lock();
            let mut state = inner.state.lock();
            let mut dispatch = inner.dispatch.lock();
            if !is_settled(*state, &dispatch) {
                warn!(state = ?*state, "Cannot start batch: processor is not idle");
                return false;
            }

            let mut jobs = inner.jobs.lock();
            if jobs.is_empty() {
                warn!("Cannot start batch: no jobs queued");
                return false;
            }

            for job in jobs.iter_mut() {
                job.started_at = None;
                job.completed_at = None;
            }
            dispatch.queue = (0..jobs.len()).collect();
            dispatch.in_flight = 0;

            let total = jobs.len();
            *inner.stats.lock() = RunStats {
                stats: BatchStats {
                    total_jobs: total,
                    queued_jobs: total,
                    batch_start_time: Utc::now(),
                    ..Default::default()
                },
                consecutive_failures: 0,
                job_estimates_ms: jobs.iter().map(|j| j.estimated_duration_ms).collect(),
            };
            drop(jobs);
            drop(dispatch);

            inner.pool.start();
            inner.monitor.reset_peak_memory();
            inner.monitor.start_monitoring();

            *state = ProcessingState::Running;
            inner.state_changed.notify_all();
            total
        };

        inner.notify(|o| o.on_batch_started(total));
        inner.fill_window();

        info!(
            jobs = total,
            batch_size = inner.config.read().batch_size,
            "Batch processing started"
        );
        true
    }

    /// Stop admitting new jobs. Jobs already executing run to completion.
    pub fn pause_batch(&self) {
        {
            let mut state = self.inner.state.lock();
            if *state != ProcessingState::Running {
                return;
            }
            *state = ProcessingState::Paused;
            self.inner.state_changed.notify_all();
        }
        self.inner.notify(|o| o.on_batch_paused());
        info!("Batch processing paused");
    }

    /// Resume admissions and refill the dispatch window.
    pub fn resume_batch(&self) {
        {
            let mut state = self.inner.state.lock();
            if *state != ProcessingState::Paused {
                return;
            }
            *state = ProcessingState::Running;
            self.inner.state_changed.notify_all();
        }
        self.inner.notify(|o| o.on_batch_resumed());
        info!("Batch processing resumed");
        self.inner.fill_window();
    }

    /// Cancel the batch.
    ///
    /// Jobs never admitted to the pool are abandoned; jobs already admitted
    /// and executing run to completion and keep their results. Blocks until
    /// the pool has drained, then returns the engine to `Idle`.
    pub fn cancel_batch(&self) {
        let _control = self.inner.control.lock();
        let previous = {
            let mut state = self.inner.state.lock();
            let previous = *state;
            match previous {
                ProcessingState::Idle | ProcessingState::Cancelling => return,
                ProcessingState::Running | ProcessingState::Paused => {
                    *state = ProcessingState::Cancelling;
                    self.inner.state_changed.notify_all();
                }
                ProcessingState::Completed | ProcessingState::Failed => {}
            }
            previous
        };

        self.inner.pool.stop();
        self.inner.monitor.stop_monitoring();
        {
            let mut dispatch = self.inner.dispatch.lock();
            dispatch.queue.clear();
            dispatch.in_flight = 0;
        }
        {
            let mut state = self.inner.state.lock();
            *state = ProcessingState::Idle;
            self.inner.state_changed.notify_all();
        }

        if previous.is_active() {
            self.inner.notify(|o| o.on_batch_cancelled());
            info!("Batch processing cancelled");
        } else {
            debug!(previous = ?previous, "Batch engine reset to idle");
        }
    }

    /// Block until the batch leaves `Running`/`Paused`/`Cancelling` and no
    /// admitted job is still executing, or until the timeout elapses.
    /// Returns the state at that moment.
    pub fn wait_for_completion(&self, timeout: Duration) -> ProcessingState {
        let deadline = Instant::now() + timeout;
        let mut state = self.inner.state.lock();
        while !is_settled(*state, &self.inner.dispatch.lock()) {
            if self
                .inner
                .state_changed
                .wait_until(&mut state, deadline)
                .timed_out()
            {
                break;
            }
        }
        *state
    }

    // -- Status --

    pub fn state(&self) -> ProcessingState {
        *self.inner.state.lock()
    }

    pub fn is_running(&self) -> bool {
        self.state() == ProcessingState::Running
    }

    pub fn is_paused(&self) -> bool {
        self.state() == ProcessingState::Paused
    }

    /// Snapshot of the statistics, with live memory and thread figures.
    pub fn get_stats(&self) -> BatchStats {
        self.inner.stats_snapshot()
    }

    pub fn get_jobs(&self) -> Vec<Job> {
        self.inner.jobs.lock().clone()
    }

    pub fn get_job(&self, job_id: &str) -> Option<Job> {
        self.inner
            .jobs
            .lock()
            .iter()
            .find(|j| j.id == job_id)
            .cloned()
    }

    pub fn get_results(&self) -> Vec<JobResult> {
        self.inner.results.lock().clone()
    }

    pub fn get_error_log(&self) -> Vec<String> {
        self.inner.error_log.lock().clone()
    }

    pub fn clear_error_log(&self) {
        self.inner.error_log.lock().clear();
    }

    /// Worker threads in the pool.
    pub fn thread_count(&self) -> usize {
        self.inner.pool.size()
    }
}

impl Drop for BatchEngine {
    fn drop(&mut self) {
        self.cancel_batch();
        self.inner.pool.stop();
        self.inner.monitor.stop_monitoring();
    }
}

impl EngineInner {
    fn ensure_settled(&self) -> Result<(), BatchError> {
        let state = self.state.lock();
        let dispatch = self.dispatch.lock();
        if is_settled(*state, &dispatch) {
            Ok(())
        } else {
            Err(BatchError::NotIdle(*state))
        }
    }

    fn notify(&self, f: impl FnOnce(&dyn BatchObserver)) {
        let observer = self.observer.read().clone();
        if let Some(observer) = observer {
            f(observer.as_ref());
        }
    }

    fn stats_snapshot(&self) -> BatchStats {
        let mut stats = self.stats.lock().stats.clone();
        stats.current_memory_usage_mb = self.monitor.current_memory_mb();
        stats.peak_memory_usage_mb = self.monitor.peak_memory_mb();
        stats.active_threads = self.pool.active_jobs();
        stats
    }

    /// Editing the job list discards the previous run and starts a fresh,
    /// not-yet-started batch.
    fn reset_pending(&self, state: &mut ProcessingState, dispatch: &mut Dispatch, total: usize) {
        *state = ProcessingState::Idle;
        dispatch.queue.clear();
        dispatch.in_flight = 0;
        *self.stats.lock() = RunStats {
            stats: BatchStats {
                total_jobs: total,
                queued_jobs: total,
                ..Default::default()
            },
            ..Default::default()
        };
    }

    /// Admit queued jobs until the window is full, the queue is empty, or
    /// the batch is no longer running.
    fn fill_window(self: &Arc<Self>) {
        let batch_size = self.config.read().batch_size;
        loop {
            let index = {
                let state = self.state.lock();
                if *state != ProcessingState::Running {
                    return;
                }
                let mut dispatch = self.dispatch.lock();
                if dispatch.in_flight >= batch_size {
                    return;
                }
                let Some(index) = dispatch.queue.pop_front() else {
                    return;
                };
                dispatch.in_flight += 1;
                index
            };

            let inner = Arc::clone(self);
            if let Err(e) = self.pool.submit(move || inner.run_job(index)) {
                {
                    let mut dispatch = self.dispatch.lock();
                    dispatch.in_flight = dispatch.in_flight.saturating_sub(1);
                    dispatch.queue.push_front(index);
                }
                let state = *self.state.lock();
                if submit_failure_expected(state) {
                    debug!(job_index = index, state = ?state, "Job not submitted: {}", e);
                } else {
                    error!(job_index = index, "Failed to submit job to worker pool: {}", e);
                }
                return;
            }
        }
    }

    /// Give back a window slot. Returns `true` when nothing is left in flight
    /// and every job has finished, which only the last job to release its
    /// slot can observe.
    fn release_slot(&self) -> bool {
        let finished = {
            let mut dispatch = self.dispatch.lock();
            dispatch.in_flight = dispatch.in_flight.saturating_sub(1);
            if dispatch.in_flight > 0 {
                return false;
            }
            let run = self.stats.lock();
            run.stats.total_jobs > 0 && run.stats.finished_jobs() >= run.stats.total_jobs
        };
        // Waiters in `wait_for_completion` also watch the in-flight count.
        let _state = self.state.lock();
        self.state_changed.notify_all();
        finished
    }

    /// Runs on a worker thread for every admitted job.
    fn run_job(self: Arc<Self>, index: usize) {
        {
            let mut state = self.state.lock();
            while *state == ProcessingState::Paused {
                self.state_changed.wait(&mut state);
            }
            if *state != ProcessingState::Running {
                debug!(job_index = index, state = ?*state, "Job abandoned before start");
                drop(state);
                self.release_slot();
                return;
            }
        }

        let Some(job) = self.mark_started(index) else {
            error!(job_index = index, "Invalid job index");
            self.release_slot();
            return;
        };
        self.notify(|o| o.on_job_started(&job));
        info!(job_id = %job.id, voice_bank = %job.voice_bank_name, "Processing job");

        let result = self.execute(&job);
        let job = self.mark_completed(index).unwrap_or(job);
        self.results.lock().push(result.clone());

        self.record_result(&job, &result);

        if self.release_slot() {
            self.complete_batch();
        } else {
            self.fill_window();
        }
    }

    fn mark_started(&self, index: usize) -> Option<Job> {
        let job = {
            let mut jobs = self.jobs.lock();
            let job = jobs.get_mut(index)?;
            job.started_at = Some(Utc::now());
            job.clone()
        };
        let mut run = self.stats.lock();
        run.stats.active_jobs += 1;
        run.stats.queued_jobs = run.stats.queued_jobs.saturating_sub(1);
        Some(job)
    }

    fn mark_completed(&self, index: usize) -> Option<Job> {
        let mut jobs = self.jobs.lock();
        let job = jobs.get_mut(index)?;
        job.completed_at = Some(Utc::now());
        Some(job.clone())
    }

    /// Call the processor, turning errors and panics into failed results.
    fn execute(&self, job: &Job) -> JobResult {
        let started = Instant::now();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.processor.process(job)));
        let elapsed = started.elapsed();

        let mut result = match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => JobResult::failure(format!("{:#}", e)),
            Err(payload) => JobResult::failure(format!(
                "Processor panicked: {}",
                panic_message(payload.as_ref())
            )),
        };

        result.job_id = job.id.clone();
        result.processing_time = elapsed;
        if result.success {
            result.error_message = None;
        } else if result.error_message.is_none() {
            result.error_message = Some("Unknown error".to_string());
        }
        result
    }

    /// Fold one result into the statistics and report it.
    fn record_result(&self, job: &Job, result: &JobResult) {
        let config = self.config.read().clone();

        let (mut snapshot, eta, consecutive_failures) = {
            let mut guard = self.stats.lock();
            let run = &mut *guard;
            let stats = &mut run.stats;
            stats.active_jobs = stats.active_jobs.saturating_sub(1);

            if result.success {
                stats.completed_jobs += 1;
                stats.total_input_files += result.input_files_processed;
                stats.total_output_size_bytes += result.output_file_size_bytes;
                stats.total_processing_time_ms += result.processing_time_ms();
                stats.average_processing_time_ms =
                    stats.total_processing_time_ms / stats.completed_jobs as f64;
            } else {
                stats.failed_jobs += 1;
            }

            let eta = eta::estimate_completion(
                Utc::now(),
                stats.remaining_jobs(),
                stats.average_processing_time_ms,
                &run.job_estimates_ms,
            );
            if eta.is_some() {
                stats.estimated_completion_time = eta;
            }

            if result.success {
                run.consecutive_failures = 0;
            } else {
                run.consecutive_failures += 1;
            }
            (run.stats.clone(), eta, run.consecutive_failures)
        };
        snapshot.current_memory_usage_mb = self.monitor.current_memory_mb();
        snapshot.peak_memory_usage_mb = self.monitor.peak_memory_mb();
        snapshot.active_threads = self.pool.active_jobs();

        let error_message = result.error_message.as_deref().unwrap_or("Unknown error");
        if !result.success {
            self.log_error(format!("Job failed: {} - {}", job.id, error_message));
        } else {
            info!(
                job_id = %job.id,
                elapsed_ms = result.processing_time_ms(),
                output_bytes = result.output_file_size_bytes,
                "Job completed"
            );
        }

        if config.enable_progress_reporting {
            self.notify(|o| o.on_batch_progress(&snapshot));
        }
        if config.show_eta {
            if let Some(eta) = eta {
                self.notify(|o| o.on_eta_updated(eta));
            }
        }

        if result.success {
            self.notify(|o| o.on_job_completed(job, result));
        } else {
            self.notify(|o| o.on_job_failed(job, error_message));
        }

        if self.monitor.is_memory_limit_exceeded() {
            let current = self.monitor.current_memory_mb();
            let limit = self.monitor.memory_limit_mb();
            warn!(current_mb = current, limit_mb = limit, "Memory limit exceeded");
            self.notify(|o| o.on_memory_warning(current, limit));
        }

        if !result.success {
            if let Some(reason) = failure_policy_reason(&config, job, consecutive_failures) {
                self.fail_batch(&snapshot, &reason);
            }
        }
    }

    /// Stop admissions after the error policy tripped.
    fn fail_batch(&self, stats: &BatchStats, reason: &str) {
        {
            let mut state = self.state.lock();
            if !matches!(*state, ProcessingState::Running | ProcessingState::Paused) {
                return;
            }
            *state = ProcessingState::Failed;
            self.state_changed.notify_all();
        }
        self.monitor.stop_monitoring();
        error!(reason, "Batch processing stopped");
        self.notify(|o| o.on_batch_failed(stats, reason));
    }

    /// Transition to `Completed` after the last job finished and every
    /// job event has been delivered.
    fn complete_batch(&self) {
        let state = *self.state.lock();
        if !matches!(state, ProcessingState::Running | ProcessingState::Paused) {
            return;
        }

        self.monitor.stop_monitoring();
        let stats = self.stats_snapshot();
        // Delivered before the state flips so `wait_for_completion` callers
        // see the event already fired.
        self.notify(|o| o.on_batch_completed(&stats));

        {
            let mut state = self.state.lock();
            if matches!(*state, ProcessingState::Running | ProcessingState::Paused) {
                *state = ProcessingState::Completed;
                self.state_changed.notify_all();
            }
        }
        info!(
            completed = stats.completed_jobs,
            failed = stats.failed_jobs,
            "Batch processing completed"
        );
    }

    fn log_error(&self, message: String) {
        error!("{}", message);
        self.error_log.lock().push(message);
    }
}

/// A cancel or failure stopping the pool races with admissions; only a
/// running batch losing its pool is an error.
fn submit_failure_expected(state: ProcessingState) -> bool {
    state != ProcessingState::Running
}

/// Resting and with no admitted job still executing.
fn is_settled(state: ProcessingState, dispatch: &Dispatch) -> bool {
    state.is_resting() && dispatch.in_flight == 0
}

fn failure_policy_reason(config: &BatchConfig, job: &Job, consecutive: u32) -> Option<String> {
    if !config.continue_on_error {
        return Some(format!(
            "Job {} failed and continue-on-error is disabled",
            job.id
        ));
    }
    if config.max_consecutive_errors > 0 && consecutive >= config.max_consecutive_errors {
        return Some(format!("{} consecutive job failures", consecutive));
    }
    None
}
