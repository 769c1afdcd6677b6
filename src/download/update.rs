//! Messages from download workers to the single UI consumer.

use std::path::PathBuf;

use crate::codec::MediaInfo;
use crate::job::{JobId, JobStatus};
use crate::progress::ProgressEvent;
use crate::reconcile::ReconciliationDecision;

/// Sender half handed to the engine; sends never block.
pub type UpdateSender = tokio::sync::mpsc::UnboundedSender<JobUpdate>;

/// Receiver half owned by the UI task.
pub type UpdateReceiver = tokio::sync::mpsc::UnboundedReceiver<JobUpdate>;

/// One thing the UI should know about.
#[derive(Debug, Clone)]
pub enum JobUpdate {
    /// A job was created for `url`.
    Queued {
        job_id: JobId,
        url: String,
        /// `(n, total)` within a channel download.
        position: Option<(usize, usize)>,
    },
    /// A classified yt-dlp output line.
    Event { job_id: JobId, event: ProgressEvent },
    /// The job changed status.
    Status { job_id: JobId, status: JobStatus },
    /// The finished file was placed.
    Reconciled {
        job_id: JobId,
        decision: ReconciliationDecision,
        path: Option<PathBuf>,
    },
    /// ffprobe results for the finished file.
    Compatibility { job_id: JobId, info: Box<MediaInfo> },
    /// Conversion progress, 0..=100 when known.
    Converting { job_id: JobId, percent: Option<f32> },
    /// Free-form message (warnings that do not fail the job).
    Notice { job_id: JobId, message: String },
}

impl JobUpdate {
    #[must_use]
    pub fn job_id(&self) -> JobId {
        match self {
            Self::Queued { job_id, .. }
            | Self::Event { job_id, .. }
            | Self::Status { job_id, .. }
            | Self::Reconciled { job_id, .. }
            | Self::Compatibility { job_id, .. }
            | Self::Converting { job_id, .. }
            | Self::Notice { job_id, .. } => *job_id,
        }
    }
}

/// Creates an update channel.
#[must_use]
pub fn channel() -> (UpdateSender, UpdateReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}
