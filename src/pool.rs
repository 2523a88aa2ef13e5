use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::error::PoolError;

type Task = Box<dyn FnOnce() + Send + 'static>;

/// Used when the platform cannot report its available parallelism.
const FALLBACK_THREADS: usize = 4;

/// Fixed-size pool of worker threads draining a shared FIFO queue.
///
/// Stopping the pool closes the queue to new submissions but lets the
/// workers finish everything already queued before they exit.
pub struct WorkerPool {
    num_threads: AtomicUsize,
    state: Mutex<PoolState>,
    active: Arc<AtomicUsize>,
}

struct PoolState {
    sender: Option<Sender<Task>>,
    workers: Vec<JoinHandle<()>>,
}

impl PoolState {
    /// Accept submissions only when at least one worker is alive to run them.
    fn activate(&mut self, sender: Sender<Task>, workers: Vec<JoinHandle<()>>) -> bool {
        if workers.is_empty() {
            error!("No worker thread could be spawned; pool stays stopped");
            return false;
        }
        info!(threads = workers.len(), "Worker pool started");
        self.sender = Some(sender);
        self.workers = workers;
        true
    }
}

/// Resolves to the return value of a submitted unit of work.
pub struct TaskHandle<T> {
    rx: Receiver<Result<T, PoolError>>,
}

impl<T> TaskHandle<T> {
    /// Block until the unit finishes.
    pub fn wait(self) -> Result<T, PoolError> {
        self.rx.recv().unwrap_or(Err(PoolError::Abandoned))
    }

    /// Block for at most `timeout`. The result can only be taken once; later
    /// calls report [`PoolError::Abandoned`].
    pub fn wait_timeout(&self, timeout: Duration) -> Result<T, PoolError> {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(PoolError::Timeout),
            Err(RecvTimeoutError::Disconnected) => Err(PoolError::Abandoned),
        }
    }

    /// Non-blocking poll. `None` while the unit is still queued or running.
    pub fn try_get(&self) -> Option<Result<T, PoolError>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(PoolError::Abandoned)),
        }
    }
}

impl WorkerPool {
    /// Create a stopped pool. `num_threads == 0` picks one thread per
    /// available core.
    pub fn new(num_threads: usize) -> Self {
        let num_threads = resolve_thread_count(num_threads);
        debug!(threads = num_threads, "Worker pool created");
        Self {
            num_threads: AtomicUsize::new(num_threads),
            state: Mutex::new(PoolState {
                sender: None,
                workers: Vec::new(),
            }),
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Spawn the worker threads. No-op if already running.
    pub fn start(&self) {
        let mut state = self.state.lock();
        if state.sender.is_some() {
            return;
        }

        let count = self.num_threads.load(Ordering::SeqCst);
        let (tx, rx) = channel::unbounded::<Task>();
        let mut workers = Vec::with_capacity(count);

        for id in 0..count {
            let rx = rx.clone();
            let active = Arc::clone(&self.active);
            let spawned = thread::Builder::new()
                .name(format!("batch-worker-{}", id))
                .spawn(move || worker_loop(id, rx, active));
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => error!(worker = id, "Failed to spawn worker thread: {}", e),
            }
        }

        state.activate(tx, workers);
    }

    /// Stop accepting work, let the workers drain the queue, and join them.
    pub fn stop(&self) {
        let (sender, workers) = {
            let mut state = self.state.lock();
            (state.sender.take(), std::mem::take(&mut state.workers))
        };
        if sender.is_none() && workers.is_empty() {
            return;
        }
        // Dropping the last sender disconnects the channel once it is empty.
        drop(sender);

        let current = thread::current().id();
        for handle in workers {
            if handle.thread().id() == current {
                warn!("Worker pool stopped from one of its own workers; not joining self");
                continue;
            }
            if handle.join().is_err() {
                error!("Worker thread terminated abnormally");
            }
        }
        info!("Worker pool stopped");
    }

    /// Change the worker count by restarting the pool.
    ///
    /// Only safe while nothing is pending: queued units are drained by the
    /// old workers before the new ones start.
    pub fn resize(&self, new_size: usize) {
        let new_size = resolve_thread_count(new_size);
        if new_size == self.size() {
            return;
        }
        let was_running = self.is_running();
        self.stop();
        self.num_threads.store(new_size, Ordering::SeqCst);
        if was_running {
            self.start();
        }
        info!(threads = new_size, "Worker pool resized");
    }

    /// Queue a unit of work. Never blocks.
    pub fn submit<F, T>(&self, f: F) -> Result<TaskHandle<T>, PoolError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (result_tx, result_rx) = channel::bounded(1);
        let task: Task = Box::new(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
                let message = panic_message(payload.as_ref());
                error!("Worker task panicked: {}", message);
                PoolError::Panicked(message)
            });
            // The caller may have dropped the handle.
            let _ = result_tx.send(outcome);
        });

        let state = self.state.lock();
        let sender = state.sender.as_ref().ok_or(PoolError::NotRunning)?;
        sender.send(task).map_err(|_| PoolError::NotRunning)?;
        Ok(TaskHandle { rx: result_rx })
    }

    /// Configured number of worker threads.
    pub fn size(&self) -> usize {
        self.num_threads.load(Ordering::SeqCst)
    }

    /// Units waiting for a worker.
    pub fn queued_jobs(&self) -> usize {
        self.state
            .lock()
            .sender
            .as_ref()
            .map(|s| s.len())
            .unwrap_or(0)
    }

    /// Units currently executing.
    pub fn active_jobs(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().sender.is_some()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_loop(id: usize, rx: Receiver<Task>, active: Arc<AtomicUsize>) {
    debug!(worker = id, "Worker started");
    // `recv` keeps yielding queued tasks after disconnect until the queue is empty.
    while let Ok(task) = rx.recv() {
        active.fetch_add(1, Ordering::SeqCst);
        task();
        active.fetch_sub(1, Ordering::SeqCst);
    }
    debug!(worker = id, "Worker exiting");
}

fn resolve_thread_count(requested: usize) -> usize {
    if requested > 0 {
        return requested;
    }
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(FALLBACK_THREADS)
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_auto_thread_count() {
        let pool = WorkerPool::new(0);
        assert!(pool.size() >= 1);
        assert!(!pool.is_running());
    }

    #[test]
    fn test_submit_before_start_fails() {
        let pool = WorkerPool::new(2);
        let result = pool.submit(|| 1);
        assert!(matches!(result, Err(PoolError::NotRunning)));
    }

    #[test]
    fn test_submit_returns_value() {
        let pool = WorkerPool::new(2);
        pool.start();
        let handle = pool.submit(|| 21 * 2).unwrap();
        assert_eq!(handle.wait(), Ok(42));
        pool.stop();
    }

    #[test]
    fn test_submit_after_stop_fails() {
        let pool = WorkerPool::new(1);
        pool.start();
        pool.stop();
        assert!(!pool.is_running());
        assert!(matches!(pool.submit(|| ()), Err(PoolError::NotRunning)));
    }

    #[test]
    fn test_panic_is_contained() {
        let pool = WorkerPool::new(1);
        pool.start();

        let bad = pool
            .submit(|| -> u32 { panic!("broken voice bank") })
            .unwrap();
        match bad.wait() {
            Err(PoolError::Panicked(msg)) => assert!(msg.contains("broken voice bank")),
            other => panic!("unexpected result: {:?}", other),
        }

        // The single worker must still be alive.
        let good = pool.submit(|| "still alive").unwrap();
        assert_eq!(good.wait(), Ok("still alive"));
        pool.stop();
    }

    #[test]
    fn test_stop_drains_queue() {
        let pool = WorkerPool::new(1);
        pool.start();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..10 {
            let counter = Arc::clone(&counter);
            pool.submit(move || {
                thread::sleep(Duration::from_millis(5));
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }

        pool.stop();
        assert_eq!(counter.load(Ordering::SeqCst), 10);
        assert_eq!(pool.queued_jobs(), 0);
    }

    #[test]
    fn test_active_and_queued_counts() {
        let pool = WorkerPool::new(1);
        pool.start();
        let (release_tx, release_rx) = channel::bounded::<()>(0);

        let blocker = pool
            .submit(move || {
                let _ = release_rx.recv();
            })
            .unwrap();
        let queued = pool.submit(|| ()).unwrap();

        let deadline = Instant::now() + Duration::from_secs(2);
        while pool.active_jobs() == 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(pool.active_jobs(), 1);
        assert_eq!(pool.queued_jobs(), 1);
        assert!(queued.try_get().is_none());

        release_tx.send(()).unwrap();
        blocker.wait().unwrap();
        queued.wait().unwrap();
        pool.stop();
    }

    #[test]
    fn test_wait_timeout() {
        let pool = WorkerPool::new(1);
        pool.start();
        let handle = pool
            .submit(|| thread::sleep(Duration::from_millis(200)))
            .unwrap();
        assert_eq!(
            handle.wait_timeout(Duration::from_millis(10)),
            Err(PoolError::Timeout)
        );
        assert_eq!(handle.wait_timeout(Duration::from_secs(2)), Ok(()));
        pool.stop();
    }

    #[test]
    fn test_resize_restarts_running_pool() {
        let pool = WorkerPool::new(2);
        pool.start();
        pool.resize(3);
        assert_eq!(pool.size(), 3);
        assert!(pool.is_running());
        assert_eq!(pool.submit(|| 7).unwrap().wait(), Ok(7));
        pool.stop();
    }

    #[test]
    fn test_resize_stopped_pool_stays_stopped() {
        let pool = WorkerPool::new(2);
        pool.resize(5);
        assert_eq!(pool.size(), 5);
        assert!(!pool.is_running());
    }

    #[test]
    fn test_pool_without_workers_stays_stopped() {
        let pool = WorkerPool::new(2);
        let (tx, _rx) = channel::unbounded::<Task>();
        assert!(!pool.state.lock().activate(tx, Vec::new()));

        assert!(!pool.is_running());
        assert!(matches!(pool.submit(|| 1), Err(PoolError::NotRunning)));
    }

    #[test]
    fn test_restart_after_stop() {
        let pool = WorkerPool::new(2);
        pool.start();
        pool.stop();
        pool.start();
        assert_eq!(pool.submit(|| 1).unwrap().wait(), Ok(1));
    }
}
