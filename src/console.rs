use std::time::Duration;

use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use parking_lot::Mutex;

use crate::events::BatchObserver;
use crate::types::{BatchStats, Job, JobResult};

const BAR_TEMPLATE: &str = "{bar:40} {percent}% [{pos}/{len}] {msg}";

/// Terminal observer: an `indicatif` progress bar on stderr plus start,
/// failure and completion summaries on stdout.
pub struct ConsoleReporter {
    bar: ProgressBar,
    eta: Mutex<Option<DateTime<Utc>>>,
}

impl ConsoleReporter {
    /// Redraw the bar at most once per `update_interval`.
    pub fn new(update_interval: Duration) -> Self {
        let millis = update_interval.as_millis().max(1);
        let hz = (1000 / millis).clamp(1, u8::MAX as u128) as u8;
        Self::with_draw_target(ProgressDrawTarget::stderr_with_hz(hz))
    }

    fn with_draw_target(target: ProgressDrawTarget) -> Self {
        let style = ProgressStyle::with_template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▌ ");
        let bar = ProgressBar::with_draw_target(Some(0), target);
        bar.set_style(style);
        Self {
            bar,
            eta: Mutex::new(None),
        }
    }

    fn print(&self, line: &str) {
        self.bar.suspend(|| println!("{}", line));
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}

impl BatchObserver for ConsoleReporter {
    fn on_batch_started(&self, total_jobs: usize) {
        *self.eta.lock() = None;
        self.bar.reset();
        self.bar.set_length(total_jobs as u64);
        self.bar.set_position(0);
        self.bar.set_message("");
        self.print(&format!("Starting batch of {} voice bank(s)", total_jobs));
    }

    fn on_batch_progress(&self, stats: &BatchStats) {
        let eta = *self.eta.lock();
        self.bar.set_length(stats.total_jobs as u64);
        self.bar.set_position(stats.finished_jobs() as u64);
        self.bar.set_message(render_status(stats, eta, Utc::now()));
    }

    fn on_batch_completed(&self, stats: &BatchStats) {
        self.bar.finish();
        self.print(&render_summary(stats));
    }

    fn on_batch_paused(&self) {
        self.bar.set_message("Paused");
        self.print("Batch paused");
    }

    fn on_batch_resumed(&self) {
        self.print("Batch resumed");
    }

    fn on_batch_cancelled(&self) {
        self.bar.abandon_with_message("Cancelled");
        self.print("Batch cancelled");
    }

    fn on_batch_failed(&self, stats: &BatchStats, reason: &str) {
        self.bar.abandon_with_message("Stopped");
        self.print(&format!("Batch stopped: {}\n{}", reason, render_summary(stats)));
    }

    fn on_job_failed(&self, job: &Job, error: &str) {
        self.print(&failure_line(job, error));
    }

    fn on_job_completed(&self, job: &Job, result: &JobResult) {
        for warning in &result.warnings {
            self.print(&warning_line(job, warning));
        }
    }

    fn on_memory_warning(&self, current_mb: f64, limit_mb: f64) {
        self.print(&format!(
            "  Memory usage {:.1} MB exceeds limit of {:.1} MB",
            current_mb, limit_mb
        ));
    }

    fn on_eta_updated(&self, estimated_completion: DateTime<Utc>) {
        *self.eta.lock() = Some(estimated_completion);
    }
}

/// Compact duration: `45s`, `1m5s`, `2h3m`.
pub fn format_duration(duration: Duration) -> String {
    let seconds = duration.as_secs();
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m{}s", seconds / 60, seconds % 60)
    } else {
        format!("{}h{}m", seconds / 3600, (seconds % 3600) / 60)
    }
}

/// Human-readable byte count.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit = 0;

    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

fn failure_line(job: &Job, error: &str) -> String {
    format!("  ✗ {}: {}", job.voice_bank_name, error)
}

fn warning_line(job: &Job, warning: &str) -> String {
    format!("  ! {}: {}", job.voice_bank_name, warning)
}

/// Trailing bar message: active jobs, sampled memory and, while work
/// remains, the time left until the estimated completion.
fn render_status(stats: &BatchStats, eta: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let mut status = format!(
        "Active: {} Memory: {:.0} MB",
        stats.active_jobs, stats.current_memory_usage_mb,
    );

    if let Some(eta) = eta.filter(|_| stats.remaining_jobs() > 0) {
        let remaining = (eta - now).to_std().unwrap_or(Duration::ZERO);
        status.push_str(&format!(" ETA: {}", format_duration(remaining)));
    }
    status
}

fn render_summary(stats: &BatchStats) -> String {
    let elapsed = (Utc::now() - stats.batch_start_time)
        .to_std()
        .unwrap_or(Duration::ZERO);
    format!(
        "Batch finished in {}: {} succeeded, {} failed ({:.1}% success)\n  \
         Output: {} from {} input file(s), average {:.0} ms per voice bank",
        format_duration(elapsed),
        stats.completed_jobs,
        stats.failed_jobs,
        stats.success_rate(),
        format_file_size(stats.total_output_size_bytes),
        stats.total_input_files,
        stats.average_processing_time_ms,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hidden_reporter() -> ConsoleReporter {
        ConsoleReporter::with_draw_target(ProgressDrawTarget::hidden())
    }

    fn running_stats() -> BatchStats {
        BatchStats {
            total_jobs: 10,
            completed_jobs: 3,
            failed_jobs: 1,
            active_jobs: 2,
            queued_jobs: 4,
            current_memory_usage_mb: 128.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(0)), "0s");
        assert_eq!(format_duration(Duration::from_secs(59)), "59s");
        assert_eq!(format_duration(Duration::from_secs(65)), "1m5s");
        assert_eq!(format_duration(Duration::from_secs(3661)), "1h1m");
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn test_status_message() {
        let now = Utc::now();
        let stats = running_stats();
        let status = render_status(&stats, Some(now + chrono::Duration::seconds(65)), now);
        assert_eq!(status, "Active: 2 Memory: 128 MB ETA: 1m5s");

        let status = render_status(&stats, None, now);
        assert!(!status.contains("ETA"));
    }

    #[test]
    fn test_bar_tracks_progress() {
        let reporter = hidden_reporter();
        reporter.on_batch_started(10);
        assert_eq!(reporter.bar.length(), Some(10));
        assert_eq!(reporter.bar.position(), 0);

        reporter.on_eta_updated(Utc::now() + chrono::Duration::seconds(30));
        reporter.on_batch_progress(&running_stats());
        assert_eq!(reporter.bar.position(), 4);
        assert!(reporter.bar.message().starts_with("Active: 2 Memory: 128 MB ETA: "));

        reporter.on_batch_completed(&running_stats());
        assert!(reporter.bar.is_finished());

        // A new batch starts from an empty bar
        reporter.on_batch_started(3);
        assert_eq!(reporter.bar.length(), Some(3));
        assert_eq!(reporter.bar.position(), 0);
        assert!(reporter.bar.message().is_empty());
    }

    #[test]
    fn test_job_lines_name_the_voice_bank() {
        let job = Job::new("3f2a-uuid", "/banks/teto_cv", "/out/teto.nvm", serde_json::Value::Null);
        assert_eq!(warning_line(&job, "clipped samples"), "  ! teto_cv: clipped samples");
        assert_eq!(failure_line(&job, "missing oto.ini"), "  ✗ teto_cv: missing oto.ini");
    }
}
