// Session metrics module
//
// Lightweight counters for what the engine did during a session

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Session metrics
///
/// Uses atomic operations so signal threads, the UI thread and remux workers
/// can all record without locking. Logged on shutdown.
#[derive(Debug)]
pub struct Metrics {
    /// Files moved to a new name
    pub files_renamed: AtomicUsize,

    /// Rename events dropped (missing file, host remux, setting off)
    pub renames_skipped: AtomicUsize,

    /// Filesystem renames that failed
    pub rename_failures: AtomicUsize,

    /// Prompts shown to the operator
    pub prompts_shown: AtomicUsize,

    /// Remux jobs accepted by the queue
    pub remux_jobs_queued: AtomicUsize,

    /// Remux jobs rejected (queue full or closed)
    pub remux_jobs_dropped: AtomicUsize,

    /// Individual files remuxed successfully
    pub remux_completed: AtomicUsize,

    /// Individual files that failed to remux
    pub remux_failed: AtomicUsize,

    /// Vendor requests handled
    pub vendor_requests: AtomicU64,

    /// Application start time
    start_time: Instant,
}

impl Metrics {
    /// Create a new Metrics instance
    pub fn new() -> Self {
        Self {
            files_renamed: AtomicUsize::new(0),
            renames_skipped: AtomicUsize::new(0),
            rename_failures: AtomicUsize::new(0),
            prompts_shown: AtomicUsize::new(0),
            remux_jobs_queued: AtomicUsize::new(0),
            remux_jobs_dropped: AtomicUsize::new(0),
            remux_completed: AtomicUsize::new(0),
            remux_failed: AtomicUsize::new(0),
            vendor_requests: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_file_renamed(&self) {
        self.files_renamed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rename_skipped(&self) {
        self.renames_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rename_failed(&self) {
        self.rename_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_prompt_shown(&self) {
        self.prompts_shown.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_remux_queued(&self) {
        self.remux_jobs_queued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_remux_dropped(&self) {
        self.remux_jobs_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_remux_completed(&self) {
        self.remux_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_remux_failed(&self) {
        self.remux_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_vendor_request(&self) {
        self.vendor_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Get total uptime
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Record Rename Session Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Renames: {} done, {} skipped, {} failed, {} prompts",
            self.files_renamed.load(Ordering::Relaxed),
            self.renames_skipped.load(Ordering::Relaxed),
            self.rename_failures.load(Ordering::Relaxed),
            self.prompts_shown.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Remux: {} jobs queued, {} dropped, {} files done, {} failed",
            self.remux_jobs_queued.load(Ordering::Relaxed),
            self.remux_jobs_dropped.load(Ordering::Relaxed),
            self.remux_completed.load(Ordering::Relaxed),
            self.remux_failed.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Vendor requests: {}",
            self.vendor_requests.load(Ordering::Relaxed)
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
