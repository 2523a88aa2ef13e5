use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::BatchError;

/// Configuration for the batch engine.
///
/// Use [`BatchConfig::builder()`] for ergonomic construction, or
/// [`BatchConfig::default()`] for sensible defaults (auto thread count,
/// window of 10 jobs, 2 GiB memory cap).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BatchConfig {
    /// Worker threads in the pool (0 = one per available core).
    pub num_worker_threads: usize,

    /// Maximum number of jobs the engine accepts (0 = unlimited).
    pub queue_size_limit: usize,

    /// Dispatch window: jobs admitted to the pool at the same time.
    pub batch_size: usize,

    /// Memory cap in MB, used for the pre-flight check and memory warnings
    /// (0 = no cap).
    pub max_memory_usage_mb: f64,

    /// Emit `on_batch_progress` after every job.
    pub enable_progress_reporting: bool,

    /// Minimum interval between console progress redraws.
    pub progress_update_interval_ms: u64,

    /// Emit `on_eta_updated` after every job.
    pub show_eta: bool,

    /// Keep admitting jobs after a failure.
    pub continue_on_error: bool,

    /// Stop admitting after this many failures in a row (0 = unlimited).
    pub max_consecutive_errors: u32,

    /// Sampling interval of the resource monitor.
    pub monitor_interval_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            num_worker_threads: 0,
            queue_size_limit: 1000,
            batch_size: 10,
            max_memory_usage_mb: 2048.0,
            enable_progress_reporting: true,
            progress_update_interval_ms: 100,
            show_eta: true,
            continue_on_error: true,
            max_consecutive_errors: 10,
            monitor_interval_ms: 100,
        }
    }
}

impl BatchConfig {
    /// Start building a config with the builder pattern.
    pub fn builder() -> BatchConfigBuilder {
        BatchConfigBuilder::default()
    }

    pub fn progress_update_interval(&self) -> Duration {
        Duration::from_millis(self.progress_update_interval_ms)
    }

    pub fn monitor_interval(&self) -> Duration {
        Duration::from_millis(self.monitor_interval_ms)
    }

    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> Result<(), BatchError> {
        if self.batch_size == 0 {
            return Err(BatchError::InvalidConfig(
                "batchSize must be at least 1".to_string(),
            ));
        }
        if !self.max_memory_usage_mb.is_finite() || self.max_memory_usage_mb < 0.0 {
            return Err(BatchError::InvalidConfig(
                "maxMemoryUsageMb must be a non-negative number".to_string(),
            ));
        }
        if self.monitor_interval_ms == 0 {
            return Err(BatchError::InvalidConfig(
                "monitorIntervalMs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Load a JSON config file. Missing fields fall back to defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BatchError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: BatchConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the config as pretty-printed JSON, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), BatchError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Builder for [`BatchConfig`].
#[derive(Default)]
pub struct BatchConfigBuilder {
    config: BatchConfig,
}

impl BatchConfigBuilder {
    /// Set the worker thread count (0 = auto-detect).
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.config.num_worker_threads = threads;
        self
    }

    /// Set the dispatch window size.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.config.batch_size = size;
        self
    }

    /// Set the maximum number of jobs accepted.
    pub fn with_queue_size_limit(mut self, limit: usize) -> Self {
        self.config.queue_size_limit = limit;
        self
    }

    /// Set the memory cap in MB.
    pub fn with_memory_limit_mb(mut self, limit: f64) -> Self {
        self.config.max_memory_usage_mb = limit;
        self
    }

    /// Enable or disable per-job progress events.
    pub fn with_progress_reporting(mut self, enabled: bool) -> Self {
        self.config.enable_progress_reporting = enabled;
        self
    }

    /// Set the minimum interval between console redraws.
    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.config.progress_update_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Enable or disable ETA events.
    pub fn with_eta(mut self, enabled: bool) -> Self {
        self.config.show_eta = enabled;
        self
    }

    /// Keep going after failures, or stop at the first one.
    pub fn with_continue_on_error(mut self, enabled: bool) -> Self {
        self.config.continue_on_error = enabled;
        self
    }

    /// Stop admitting after `max` failures in a row (0 = unlimited).
    pub fn with_max_consecutive_errors(mut self, max: u32) -> Self {
        self.config.max_consecutive_errors = max;
        self
    }

    /// Set the resource monitor sampling interval.
    pub fn with_monitor_interval(mut self, interval: Duration) -> Self {
        self.config.monitor_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Build the final [`BatchConfig`].
    pub fn build(self) -> BatchConfig {
        self.config
    }
}
