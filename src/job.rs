//! Download job state machine and the registry of live jobs.
//!
//! A [`DownloadJob`] is created when a URL is submitted and is dropped once it
//! reaches a terminal status. The [`JobRegistry`] is how other components (the
//! cleanup sweeper in particular) learn which temp files still belong to a
//! running job; there is no lock on the Temp Store itself.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use thiserror::Error;
use tracing::debug;

use crate::progress::clean_title;
use crate::ytdlp::Quality;

/// Identifier assigned by [`JobRegistry::next_id`].
pub type JobId = u64;

/// Lifecycle status of a download job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    /// Submitted, subprocess not yet started.
    Pending,
    /// yt-dlp is running.
    InProgress,
    /// yt-dlp exited successfully; the temp file waits to be moved.
    AwaitingReconciliation,
    /// Reconciled (moved, renamed, replaced or deliberately skipped).
    Resolved,
    /// Terminal failure; the user has to resubmit.
    Failed,
}

impl JobStatus {
    /// Returns the stable lowercase label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::AwaitingReconciliation => "awaiting_reconciliation",
            Self::Resolved => "resolved",
            Self::Failed => "failed",
        }
    }

    /// True for `Resolved` and `Failed`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved | Self::Failed)
    }

    /// Whether the state machine allows moving from `self` to `next`.
    #[must_use]
    pub fn can_transition_to(&self, next: Self) -> bool {
        match (self, next) {
            (Self::Pending, Self::InProgress)
            | (Self::InProgress, Self::AwaitingReconciliation)
            | (Self::AwaitingReconciliation, Self::Resolved) => true,
            (from, Self::Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "awaiting_reconciliation" => Ok(Self::AwaitingReconciliation),
            "resolved" => Ok(Self::Resolved),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("invalid job status: {value}")),
        }
    }
}

/// Errors from job transitions and registry bookkeeping.
#[derive(Debug, Error)]
pub enum JobError {
    /// The requested status change is not allowed.
    #[error("job {id}: invalid transition {from} -> {to}")]
    InvalidTransition {
        /// Job identifier.
        id: JobId,
        /// Current status.
        from: JobStatus,
        /// Rejected target status.
        to: JobStatus,
    },

    /// Reconciliation was requested before a temp file was known.
    #[error("job {id}: no temp file recorded")]
    MissingTempFile {
        /// Job identifier.
        id: JobId,
    },

    /// Another live job already writes to this temp file.
    #[error("temp file {path} is already owned by job {owner}")]
    TempPathInUse {
        /// Contested temp path.
        path: PathBuf,
        /// Job currently holding the path.
        owner: JobId,
    },
}

/// One requested video or audio acquisition.
#[derive(Debug, Clone)]
pub struct DownloadJob {
    id: JobId,
    url: String,
    quality: Quality,
    destination_dir: PathBuf,
    temp_path: Option<PathBuf>,
    title: Option<String>,
    extension: Option<String>,
    status: JobStatus,
    final_path: Option<PathBuf>,
    failure: Option<String>,
}

impl DownloadJob {
    /// Creates a `Pending` job.
    #[must_use]
    pub fn new(
        id: JobId,
        url: impl Into<String>,
        quality: Quality,
        destination_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id,
            url: url.into(),
            quality,
            destination_dir: destination_dir.into(),
            temp_path: None,
            title: None,
            extension: None,
            status: JobStatus::Pending,
            final_path: None,
            failure: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> JobId {
        self.id
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn quality(&self) -> Quality {
        self.quality
    }

    #[must_use]
    pub fn destination_dir(&self) -> &Path {
        &self.destination_dir
    }

    #[must_use]
    pub fn temp_path(&self) -> Option<&Path> {
        self.temp_path.as_deref()
    }

    /// Video title derived from the temp file name, format codes removed.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Extension including the leading dot (`.mp4`), or empty when the file has none.
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    #[must_use]
    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Where the file ended up; `None` for skipped or failed jobs.
    #[must_use]
    pub fn final_path(&self) -> Option<&Path> {
        self.final_path.as_deref()
    }

    /// Human-readable failure message for `Failed` jobs.
    #[must_use]
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// `<destination>/<title><ext>`, once the temp file is known.
    #[must_use]
    pub fn destination_path(&self) -> Option<PathBuf> {
        let title = self.title.as_deref()?;
        let extension = self.extension.as_deref().unwrap_or("");
        Some(self.destination_dir.join(format!("{title}{extension}")))
    }

    /// `Pending` → `InProgress`.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::InvalidTransition`] from any other status.
    pub fn start(&mut self) -> Result<(), JobError> {
        self.transition(JobStatus::InProgress)
    }

    /// Records the temp file produced by yt-dlp and derives title/extension from it.
    pub fn set_temp_file(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.title = Some(clean_title(&stem));
        self.extension = Some(
            path.extension()
                .map(|ext| format!(".{}", ext.to_string_lossy()))
                .unwrap_or_default(),
        );
        self.temp_path = Some(path);
    }

    /// `InProgress` → `AwaitingReconciliation`.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::MissingTempFile`] when no temp file was recorded,
    /// or [`JobError::InvalidTransition`] from any status but `InProgress`.
    pub fn await_reconciliation(&mut self) -> Result<(), JobError> {
        if self.temp_path.is_none() {
            return Err(JobError::MissingTempFile { id: self.id });
        }
        self.transition(JobStatus::AwaitingReconciliation)
    }

    /// `AwaitingReconciliation` → `Resolved`. `final_path` is `None` when the
    /// user chose to skip.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::InvalidTransition`] from any other status.
    pub fn resolve(&mut self, final_path: Option<PathBuf>) -> Result<(), JobError> {
        self.transition(JobStatus::Resolved)?;
        self.final_path = final_path;
        Ok(())
    }

    /// Any non-terminal status → `Failed`.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::InvalidTransition`] when the job already finished.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), JobError> {
        self.transition(JobStatus::Failed)?;
        self.failure = Some(message.into());
        Ok(())
    }

    fn transition(&mut self, next: JobStatus) -> Result<(), JobError> {
        if !self.status.can_transition_to(next) {
            return Err(JobError::InvalidTransition {
                id: self.id,
                from: self.status,
                to: next,
            });
        }
        debug!(job = self.id, from = %self.status, to = %next, "job transition");
        self.status = next;
        Ok(())
    }
}

/// Live (non-terminal) jobs and the temp files they own.
#[derive(Debug, Default)]
pub struct JobRegistry {
    next_id: AtomicU64,
    statuses: DashMap<JobId, JobStatus>,
    claims: DashMap<PathBuf, JobId>,
}

impl JobRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh job id.
    pub fn next_id(&self) -> JobId {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Records the job's current status and temp file.
    ///
    /// Terminal jobs are dropped from the registry along with their claims.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::TempPathInUse`] when another live job already
    /// claimed the same temp file.
    pub fn track(&self, job: &DownloadJob) -> Result<(), JobError> {
        if job.status().is_terminal() {
            self.forget(job.id());
            return Ok(());
        }

        if let Some(path) = job.temp_path() {
            self.claim_path(job.id(), path)?;
        }
        self.statuses.insert(job.id(), job.status());
        Ok(())
    }

    /// Marks `path` as owned by job `id` until the job is forgotten.
    ///
    /// Used while yt-dlp is still running, before the job knows its final
    /// temp file, so the sweeper spares everything the job has touched.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::TempPathInUse`] when another job owns `path`.
    pub fn claim_path(&self, id: JobId, path: &Path) -> Result<(), JobError> {
        match self.claims.entry(path.to_path_buf()) {
            Entry::Occupied(entry) if *entry.get() != id => Err(JobError::TempPathInUse {
                path: path.to_path_buf(),
                owner: *entry.get(),
            }),
            Entry::Occupied(_) => Ok(()),
            Entry::Vacant(entry) => {
                entry.insert(id);
                Ok(())
            }
        }
    }

    /// Removes a job and releases its temp file claims.
    pub fn forget(&self, id: JobId) {
        self.statuses.remove(&id);
        self.claims.retain(|_, owner| *owner != id);
    }

    /// Status of a live job.
    #[must_use]
    pub fn status(&self, id: JobId) -> Option<JobStatus> {
        self.statuses.get(&id).map(|entry| *entry.value())
    }

    /// Number of live jobs.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.statuses.len()
    }

    /// True when a live job owns `path`.
    #[must_use]
    pub fn is_claimed(&self, path: &Path) -> bool {
        self.claims.contains_key(path)
    }

    /// Snapshot of every temp file owned by a live job.
    #[must_use]
    pub fn claimed_paths(&self) -> HashSet<PathBuf> {
        self.claims.iter().map(|entry| entry.key().clone()).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn job(id: JobId) -> DownloadJob {
        DownloadJob::new(id, "https://youtu.be/abc", Quality::Best, "/dest")
    }

    #[test]
    fn test_happy_path_transitions() {
        let mut job = job(1);
        assert_eq!(job.status(), JobStatus::Pending);
        job.start().unwrap();
        job.set_temp_file("/tmp/qt/Test Video.mp4");
        job.await_reconciliation().unwrap();
        job.resolve(Some(PathBuf::from("/dest/Test Video.mp4")))
            .unwrap();
        assert_eq!(job.status(), JobStatus::Resolved);
        assert_eq!(job.final_path().unwrap(), Path::new("/dest/Test Video.mp4"));
    }

    #[test]
    fn test_set_temp_file_derives_title_and_extension() {
        let mut job = job(1);
        job.set_temp_file("/tmp/qt/Test Video.f399.mp4");
        assert_eq!(job.title(), Some("Test Video"));
        assert_eq!(job.extension(), Some(".mp4"));
        assert_eq!(
            job.destination_path().unwrap(),
            PathBuf::from("/dest/Test Video.mp4")
        );
    }

    #[test]
    fn test_await_reconciliation_requires_temp_file() {
        let mut job = job(3);
        job.start().unwrap();
        assert!(matches!(
            job.await_reconciliation(),
            Err(JobError::MissingTempFile { id: 3 })
        ));
    }

    #[test]
    fn test_cannot_skip_states() {
        let mut job = job(1);
        let err = job.resolve(None).unwrap_err();
        assert!(err.to_string().contains("pending -> resolved"));
    }

    #[test]
    fn test_failed_is_terminal() {
        let mut job = job(1);
        job.start().unwrap();
        job.fail("yt-dlp exited with code 1").unwrap();
        assert_eq!(job.failure(), Some("yt-dlp exited with code 1"));
        assert!(job.fail("again").is_err());
        assert!(job.start().is_err());
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            JobStatus::Pending,
            JobStatus::InProgress,
            JobStatus::AwaitingReconciliation,
            JobStatus::Resolved,
            JobStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<JobStatus>().unwrap(), status);
        }
        assert!("bogus".parse::<JobStatus>().is_err());
    }

    #[test]
    fn test_registry_rejects_second_claim_on_same_temp_file() {
        let registry = JobRegistry::new();
        let mut first = job(registry.next_id());
        let mut second = job(registry.next_id());
        first.start().unwrap();
        second.start().unwrap();
        first.set_temp_file("/tmp/qt/Same.mp4");
        second.set_temp_file("/tmp/qt/Same.mp4");

        registry.track(&first).unwrap();
        let err = registry.track(&second).unwrap_err();
        assert!(matches!(err, JobError::TempPathInUse { owner, .. } if owner == first.id()));
    }

    #[test]
    fn test_registry_releases_claims_on_terminal_status() {
        let registry = JobRegistry::new();
        let mut job = job(registry.next_id());
        job.start().unwrap();
        job.set_temp_file("/tmp/qt/A.mp4");
        registry.track(&job).unwrap();
        assert!(registry.is_claimed(Path::new("/tmp/qt/A.mp4")));
        assert_eq!(registry.live_count(), 1);

        job.fail("boom").unwrap();
        registry.track(&job).unwrap();
        assert!(!registry.is_claimed(Path::new("/tmp/qt/A.mp4")));
        assert_eq!(registry.live_count(), 0);
        assert!(registry.claimed_paths().is_empty());
    }

    #[test]
    fn test_registry_claim_path_holds_every_streamed_file_until_forget() {
        let registry = JobRegistry::new();
        let id = registry.next_id();
        registry.claim_path(id, Path::new("/tmp/qt/A.f137.mp4")).unwrap();
        registry.claim_path(id, Path::new("/tmp/qt/A.mp4")).unwrap();
        registry.claim_path(id, Path::new("/tmp/qt/A.mp4")).unwrap();
        assert_eq!(registry.claimed_paths().len(), 2);

        let other = registry.next_id();
        assert!(matches!(
            registry.claim_path(other, Path::new("/tmp/qt/A.mp4")),
            Err(JobError::TempPathInUse { owner, .. }) if owner == id
        ));

        registry.forget(id);
        assert!(registry.claimed_paths().is_empty());
    }

    #[test]
    fn test_registry_ids_are_unique() {
        let registry = JobRegistry::new();
        let a = registry.next_id();
        let b = registry.next_id();
        assert_ne!(a, b);
    }
}
