//! Moving finished downloads from the Temp Store into the destination folder.
//!
//! When `<dest>/<title><ext>` is free the file is moved straight in. When it
//! is taken the decision belongs to the user: a [`ConflictResolver`] is asked
//! and may only answer with one of the three [`ConflictChoice`] outcomes.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use async_trait::async_trait;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::job::{DownloadJob, JobError, JobStatus};

/// What happened to a finished temp file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconciliationDecision {
    /// No collision; moved to `<dest>/<title><ext>`.
    MoveDirect,
    /// Collision; temp file discarded, destination untouched.
    Skip,
    /// Collision; moved to the first free `<title> (n)<ext>`.
    RenameAndMove,
    /// Collision; existing file deleted, temp file moved in its place.
    Replace,
}

impl ReconciliationDecision {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MoveDirect => "move_direct",
            Self::Skip => "skip",
            Self::RenameAndMove => "rename_and_move",
            Self::Replace => "replace",
        }
    }
}

impl fmt::Display for ReconciliationDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An answer to a destination collision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictChoice {
    Skip,
    RenameAndMove,
    Replace,
}

impl From<ConflictChoice> for ReconciliationDecision {
    fn from(choice: ConflictChoice) -> Self {
        match choice {
            ConflictChoice::Skip => Self::Skip,
            ConflictChoice::RenameAndMove => Self::RenameAndMove,
            ConflictChoice::Replace => Self::Replace,
        }
    }
}

impl FromStr for ConflictChoice {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "skip" | "s" => Ok(Self::Skip),
            "rename" | "r" => Ok(Self::RenameAndMove),
            "replace" | "overwrite" | "o" => Ok(Self::Replace),
            _ => Err(format!(
                "invalid conflict choice '{value}': expected skip, rename or replace"
            )),
        }
    }
}

/// Everything the user needs to decide a collision.
#[derive(Debug, Clone)]
pub struct Conflict {
    /// Finished file in the Temp Store.
    pub temp_path: PathBuf,
    /// Existing file in the destination folder.
    pub destination: PathBuf,
    /// Video title.
    pub title: String,
}

/// Source of collision decisions, typically an interactive prompt.
#[async_trait]
pub trait ConflictResolver: Send + Sync {
    async fn resolve(&self, conflict: &Conflict) -> ConflictChoice;
}

/// Answers every collision the same way (`--on-conflict skip|rename|replace`).
#[derive(Debug, Clone, Copy)]
pub struct FixedChoice(pub ConflictChoice);

#[async_trait]
impl ConflictResolver for FixedChoice {
    async fn resolve(&self, _conflict: &Conflict) -> ConflictChoice {
        self.0
    }
}

/// Errors raised while reconciling a job.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// A filesystem operation failed; the job has been marked failed.
    #[error("failed to {op} {path}: {source}")]
    Io {
        /// Operation that failed (`move`, `delete`, `create`).
        op: &'static str,
        /// Path being operated on.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The job was not ready for reconciliation.
    #[error(transparent)]
    Job(JobError),
}

impl ReconcileError {
    fn io(op: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            op,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result of a successful reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub decision: ReconciliationDecision,
    /// Where the file now lives; `None` for [`ReconciliationDecision::Skip`].
    pub final_path: Option<PathBuf>,
}

/// Applies reconciliation decisions to jobs awaiting reconciliation.
pub struct Reconciler<'a> {
    resolver: &'a dyn ConflictResolver,
}

impl<'a> Reconciler<'a> {
    #[must_use]
    pub fn new(resolver: &'a dyn ConflictResolver) -> Self {
        Self { resolver }
    }

    /// Moves the job's temp file into its destination folder.
    ///
    /// On success the job is `Resolved`. A failing move or delete marks the
    /// job `Failed` and is returned; nothing is retried.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::Job`] when the job is not awaiting
    /// reconciliation and [`ReconcileError::Io`] when the filesystem refuses.
    pub async fn reconcile(
        &self,
        job: &mut DownloadJob,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        if job.status() != JobStatus::AwaitingReconciliation {
            return Err(ReconcileError::Job(JobError::InvalidTransition {
                id: job.id(),
                from: job.status(),
                to: JobStatus::Resolved,
            }));
        }
        let (Some(temp_path), Some(destination)) =
            (job.temp_path().map(Path::to_path_buf), job.destination_path())
        else {
            return Err(ReconcileError::Job(JobError::MissingTempFile { id: job.id() }));
        };

        match self.apply(job, &temp_path, &destination).await {
            Ok(outcome) => {
                job.resolve(outcome.final_path.clone())
                    .map_err(ReconcileError::Job)?;
                info!(
                    job = job.id(),
                    decision = %outcome.decision,
                    path = ?outcome.final_path,
                    "reconciled download"
                );
                Ok(outcome)
            }
            Err(e) => {
                warn!(job = job.id(), error = %e, "reconciliation failed");
                job.fail(e.to_string()).map_err(ReconcileError::Job)?;
                Err(e)
            }
        }
    }

    async fn apply(
        &self,
        job: &DownloadJob,
        temp_path: &Path,
        destination: &Path,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let dest_dir = job.destination_dir();
        fs::create_dir_all(dest_dir)
            .await
            .map_err(|e| ReconcileError::io("create", dest_dir, e))?;

        if !fs::try_exists(destination).await.unwrap_or(false) {
            move_file(temp_path, destination).await?;
            return Ok(ReconcileOutcome {
                decision: ReconciliationDecision::MoveDirect,
                final_path: Some(destination.to_path_buf()),
            });
        }

        let conflict = Conflict {
            temp_path: temp_path.to_path_buf(),
            destination: destination.to_path_buf(),
            title: job.title().unwrap_or_default().to_string(),
        };
        let choice = self.resolver.resolve(&conflict).await;
        debug!(job = job.id(), ?choice, "collision resolved by user");

        let final_path = match choice {
            ConflictChoice::Skip => {
                fs::remove_file(temp_path)
                    .await
                    .map_err(|e| ReconcileError::io("delete", temp_path, e))?;
                None
            }
            ConflictChoice::RenameAndMove => {
                let target = next_free_name(destination);
                move_file(temp_path, &target).await?;
                Some(target)
            }
            ConflictChoice::Replace => {
                fs::remove_file(destination)
                    .await
                    .map_err(|e| ReconcileError::io("delete", destination, e))?;
                move_file(temp_path, destination).await?;
                Some(destination.to_path_buf())
            }
        };

        Ok(ReconcileOutcome {
            decision: choice.into(),
            final_path,
        })
    }
}

/// First path of the form `<stem> (n)<ext>`, n starting at 2, that does not exist.
#[must_use]
pub fn next_free_name(destination: &Path) -> PathBuf {
    let dir = destination.parent().unwrap_or_else(|| Path::new(""));
    let stem = destination
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = destination
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut n = 2_u32;
    loop {
        let candidate = dir.join(format!("{stem} ({n}){ext}"));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

/// Renames `from` to `to`, copying and deleting when they sit on different filesystems.
///
/// # Errors
///
/// Returns [`ReconcileError::Io`] when neither rename nor copy succeeds.
pub async fn move_file(from: &Path, to: &Path) -> Result<(), ReconcileError> {
    if let Err(rename_err) = fs::rename(from, to).await {
        debug!(from = %from.display(), to = %to.display(), error = %rename_err, "rename failed, copying");
        fs::copy(from, to)
            .await
            .map_err(|e| ReconcileError::io("move", from, e))?;
        fs::remove_file(from)
            .await
            .map_err(|e| ReconcileError::io("delete", from, e))?;
    }
    Ok(())
}
