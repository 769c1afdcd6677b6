//! Deletes stale files from the Temp Store.
//!
//! Liveness comes from the [`JobRegistry`]: any file claimed by a
//! non-terminal job is left alone regardless of its age.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, SystemTime};

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::job::JobRegistry;
use crate::temp_store::{TempStore, TempStoreError};

/// Default age after which temp files are considered abandoned.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(24 * 60 * 60);

/// What a sweep did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Files removed.
    pub deleted: Vec<PathBuf>,
    /// Stale files kept because a live job owns them.
    pub skipped_live: Vec<PathBuf>,
    /// Stale files that could not be removed.
    pub failed: Vec<PathBuf>,
}

impl SweepReport {
    /// True when nothing was deleted, skipped or failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deleted.is_empty() && self.skipped_live.is_empty() && self.failed.is_empty()
    }
}

/// Age-based cleanup of the Temp Store.
#[derive(Debug, Clone)]
pub struct CleanupSweeper {
    store: TempStore,
    threshold: Duration,
    registry: Arc<JobRegistry>,
}

impl CleanupSweeper {
    #[must_use]
    pub fn new(store: TempStore, registry: Arc<JobRegistry>) -> Self {
        Self {
            store,
            threshold: DEFAULT_STALE_AFTER,
            registry,
        }
    }

    #[must_use]
    pub fn with_threshold(mut self, threshold: Duration) -> Self {
        self.threshold = threshold;
        self
    }

    #[must_use]
    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Sweeps using the current wall clock.
    ///
    /// # Errors
    ///
    /// Returns [`TempStoreError`] when the Temp Store cannot be listed.
    pub fn sweep(&self) -> Result<SweepReport, TempStoreError> {
        self.sweep_at(SystemTime::now())
    }

    /// Deletes every file older than the threshold as of `now`.
    ///
    /// Failed deletions are logged and recorded; the sweep continues.
    ///
    /// # Errors
    ///
    /// Returns [`TempStoreError`] when the Temp Store cannot be listed.
    pub fn sweep_at(&self, now: SystemTime) -> Result<SweepReport, TempStoreError> {
        let mut report = SweepReport::default();
        let claimed = self.registry.claimed_paths();

        for record in self.store.records()? {
            if record.age_at(now) <= self.threshold {
                continue;
            }
            if claimed.contains(&record.path) {
                debug!(path = %record.path.display(), "stale temp file owned by live job, keeping");
                report.skipped_live.push(record.path);
                continue;
            }
            match std::fs::remove_file(&record.path) {
                Ok(()) => {
                    debug!(path = %record.path.display(), "deleted stale temp file");
                    report.deleted.push(record.path);
                }
                Err(e) => {
                    warn!(path = %record.path.display(), error = %e, "failed to delete stale temp file");
                    report.failed.push(record.path);
                }
            }
        }

        if !report.is_empty() {
            info!(
                deleted = report.deleted.len(),
                skipped_live = report.skipped_live.len(),
                failed = report.failed.len(),
                "temp store sweep finished"
            );
        }
        Ok(report)
    }

    /// Runs [`Self::sweep`] every `period` until the returned handle is stopped.
    ///
    /// The first sweep happens one `period` after spawning; the startup sweep
    /// already covers time zero.
    #[must_use]
    pub fn spawn_periodic(self, period: Duration) -> SweeperHandle {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            loop {
                ticker.tick().await;
                if stop_flag.load(Ordering::Relaxed) {
                    break;
                }
                if let Err(e) = self.sweep() {
                    warn!(error = %e, "periodic sweep failed");
                }
            }
        });
        SweeperHandle { stop, task }
    }
}

/// Handle to a periodic sweeper task.
#[derive(Debug)]
pub struct SweeperHandle {
    stop: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Stops the task and waits for it to exit.
    pub async fn stop(self) {
        self.stop.store(true, Ordering::Relaxed);
        self.task.abort();
        let _ = self.task.await;
    }
}
