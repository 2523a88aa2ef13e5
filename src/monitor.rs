use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use sysinfo::{Disks, MemoryRefreshKind, RefreshKind, System};
use tracing::{debug, error, warn};

const MIB: f64 = 1024.0 * 1024.0;
const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);

/// `f64` stored as raw bits in an `AtomicU64`.
struct AtomicF64(AtomicU64);

impl AtomicF64 {
    fn new(value: f64) -> Self {
        Self(AtomicU64::new(value.to_bits()))
    }

    fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::SeqCst))
    }

    fn store(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::SeqCst);
    }

    fn fetch_max(&self, value: f64) {
        let _ = self
            .0
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |bits| {
                (value > f64::from_bits(bits)).then_some(value.to_bits())
            });
    }
}

/// Values written by the sampler thread and read by everyone else.
struct Samples {
    current_memory_mb: AtomicF64,
    peak_memory_mb: AtomicF64,
    cpu_usage_percent: AtomicF64,
}

impl Samples {
    fn record_memory(&self, mb: f64) {
        self.current_memory_mb.store(mb);
        self.peak_memory_mb.fetch_max(mb);
    }
}

/// Background sampler of process memory, plus one-shot system queries used
/// for pre-flight admission checks.
///
/// The memory limit is informational: the monitor never pauses or rejects
/// work on its own, it only answers [`is_memory_limit_exceeded`].
///
/// [`is_memory_limit_exceeded`]: ResourceMonitor::is_memory_limit_exceeded
pub struct ResourceMonitor {
    active: Arc<AtomicBool>,
    samples: Arc<Samples>,
    memory_limit_mb: AtomicF64,
    interval: Mutex<Duration>,
    sampler: Mutex<Option<JoinHandle<()>>>,
}

impl Default for ResourceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceMonitor {
    pub fn new() -> Self {
        Self::with_interval(DEFAULT_INTERVAL)
    }

    /// Create a monitor sampling every `interval`.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            active: Arc::new(AtomicBool::new(false)),
            samples: Arc::new(Samples {
                current_memory_mb: AtomicF64::new(0.0),
                peak_memory_mb: AtomicF64::new(0.0),
                cpu_usage_percent: AtomicF64::new(0.0),
            }),
            memory_limit_mb: AtomicF64::new(0.0),
            interval: Mutex::new(interval),
            sampler: Mutex::new(None),
        }
    }

    /// Change the sampling interval. Takes effect on the next start.
    pub fn set_interval(&self, interval: Duration) {
        *self.interval.lock() = interval;
    }

    /// Launch the sampler thread. No-op if it is already running.
    pub fn start_monitoring(&self) {
        if self.active.swap(true, Ordering::SeqCst) {
            return;
        }

        let active = Arc::clone(&self.active);
        let samples = Arc::clone(&self.samples);
        let interval = *self.interval.lock();

        let spawned = thread::Builder::new()
            .name("resource-monitor".to_string())
            .spawn(move || sample_loop(active, samples, interval));

        match spawned {
            Ok(handle) => {
                *self.sampler.lock() = Some(handle);
                debug!(interval_ms = interval.as_millis() as u64, "Resource monitoring started");
            }
            Err(e) => {
                self.active.store(false, Ordering::SeqCst);
                error!("Failed to spawn resource monitor thread: {}", e);
            }
        }
    }

    /// Stop and join the sampler thread.
    pub fn stop_monitoring(&self) {
        self.active.store(false, Ordering::SeqCst);
        let handle = self.sampler.lock().take();
        if let Some(handle) = handle {
            handle.thread().unpark();
            if handle.join().is_err() {
                warn!("Resource monitor thread terminated abnormally");
            }
            debug!("Resource monitoring stopped");
        }
    }

    pub fn is_monitoring(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Resident memory of this process at the last sample, in MB.
    pub fn current_memory_mb(&self) -> f64 {
        self.samples.current_memory_mb.load()
    }

    /// Highest resident memory seen since creation or the last reset, in MB.
    pub fn peak_memory_mb(&self) -> f64 {
        self.samples.peak_memory_mb.load()
    }

    /// Lower the peak to the current value.
    pub fn reset_peak_memory(&self) {
        self.samples
            .peak_memory_mb
            .store(self.samples.current_memory_mb.load());
    }

    /// Global CPU usage at the last sample.
    pub fn cpu_usage_percent(&self) -> f64 {
        self.samples.cpu_usage_percent.load()
    }

    pub fn cpu_core_count(&self) -> usize {
        thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }

    /// Set the memory cap in MB (`<= 0` disables it).
    pub fn set_memory_limit_mb(&self, limit: f64) {
        self.memory_limit_mb.store(limit);
    }

    pub fn memory_limit_mb(&self) -> f64 {
        self.memory_limit_mb.load()
    }

    /// Whether the last sampled memory usage is above the configured cap.
    pub fn is_memory_limit_exceeded(&self) -> bool {
        let limit = self.memory_limit_mb.load();
        limit > 0.0 && self.current_memory_mb() > limit
    }

    /// Memory the OS reports as available for new allocations, in MB.
    pub fn available_memory_mb(&self) -> f64 {
        let mut system = System::new_with_specifics(
            RefreshKind::new().with_memory(MemoryRefreshKind::everything()),
        );
        system.refresh_memory();
        system.available_memory() as f64 / MIB
    }

    /// Free space on the disk holding `path`, in MB (0 when unknown).
    ///
    /// `path` does not have to exist yet; its nearest existing ancestor is
    /// used to find the mount point.
    pub fn disk_space_mb(&self, path: impl AsRef<Path>) -> f64 {
        let target = existing_ancestor(path.as_ref());
        let disks = Disks::new_with_refreshed_list();
        disks
            .list()
            .iter()
            .filter(|disk| target.starts_with(disk.mount_point()))
            .max_by_key(|disk| disk.mount_point().as_os_str().len())
            .map(|disk| disk.available_space() as f64 / MIB)
            .unwrap_or(0.0)
    }
}

impl Drop for ResourceMonitor {
    fn drop(&mut self) {
        self.stop_monitoring();
    }
}

fn sample_loop(active: Arc<AtomicBool>, samples: Arc<Samples>, interval: Duration) {
    let mut system = System::new();
    let pid = match sysinfo::get_current_pid() {
        Ok(pid) => Some(pid),
        Err(e) => {
            warn!("Cannot determine own pid, memory sampling disabled: {}", e);
            None
        }
    };

    while active.load(Ordering::SeqCst) {
        if let Some(pid) = pid {
            if system.refresh_process(pid) {
                if let Some(process) = system.process(pid) {
                    samples.record_memory(process.memory() as f64 / MIB);
                }
            }
        }

        system.refresh_cpu();
        samples
            .cpu_usage_percent
            .store(system.global_cpu_info().cpu_usage() as f64);

        // Unparked early by `stop_monitoring`.
        thread::park_timeout(interval);
    }
}

fn existing_ancestor(path: &Path) -> PathBuf {
    path.ancestors()
        .find_map(|p| std::fs::canonicalize(p).ok())
        .unwrap_or_else(|| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_peak_tracks_maximum() {
        let monitor = ResourceMonitor::new();
        monitor.samples.record_memory(120.0);
        monitor.samples.record_memory(300.0);
        monitor.samples.record_memory(200.0);

        assert_eq!(monitor.current_memory_mb(), 200.0);
        assert_eq!(monitor.peak_memory_mb(), 300.0);

        monitor.reset_peak_memory();
        assert_eq!(monitor.peak_memory_mb(), 200.0);
    }

    #[test]
    fn test_memory_limit() {
        let monitor = ResourceMonitor::new();
        monitor.samples.record_memory(512.0);

        // No limit configured
        assert!(!monitor.is_memory_limit_exceeded());

        monitor.set_memory_limit_mb(256.0);
        assert!(monitor.is_memory_limit_exceeded());

        monitor.set_memory_limit_mb(1024.0);
        assert!(!monitor.is_memory_limit_exceeded());
        assert_eq!(monitor.memory_limit_mb(), 1024.0);
    }

    #[test]
    fn test_sampler_start_stop() {
        let monitor = ResourceMonitor::with_interval(Duration::from_millis(10));
        monitor.start_monitoring();
        assert!(monitor.is_monitoring());

        // Starting twice is harmless
        monitor.start_monitoring();
        thread::sleep(Duration::from_millis(60));

        monitor.stop_monitoring();
        assert!(!monitor.is_monitoring());
        assert!(monitor.peak_memory_mb() >= monitor.current_memory_mb());

        // Stopping twice is harmless
        monitor.stop_monitoring();
    }

    #[test]
    fn test_one_shot_queries() {
        let monitor = ResourceMonitor::new();
        assert!(monitor.available_memory_mb() >= 0.0);
        assert!(monitor.cpu_core_count() >= 1);

        let dir = tempdir().unwrap();
        let not_yet_created = dir.path().join("out").join("teto.nvm");
        assert!(monitor.disk_space_mb(&not_yet_created) >= 0.0);
    }

    #[test]
    fn test_existing_ancestor() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("a").join("b");
        let resolved = existing_ancestor(&missing);
        assert_eq!(resolved, std::fs::canonicalize(dir.path()).unwrap());
    }
}
