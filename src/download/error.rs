//! Error types for the download module.

use thiserror::Error;

use crate::job::JobError;
use crate::process::ProcessError;
use crate::reconcile::ReconcileError;
use crate::source::SourceError;
use crate::temp_store::TempStoreError;

/// Remediation shown when YouTube demands a signed-in session.
pub const AUTH_SUGGESTION: &str = "sign in to YouTube in your browser, then pass \
     --cookies-from-browser <browser> (or refresh the exported cookies file)";

/// Errors that end a download job.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The URL is not something yt-dlp should be given.
    #[error(transparent)]
    Source(SourceError),

    /// yt-dlp could not be started.
    #[error("could not run yt-dlp for {url}: {source}")]
    Spawn {
        url: String,
        #[source]
        source: ProcessError,
    },

    /// yt-dlp exited non-zero.
    #[error("yt-dlp failed for {url} (exit code {code:?})\n{tail}")]
    Subprocess {
        url: String,
        code: Option<i32>,
        /// Last lines of yt-dlp output.
        tail: String,
    },

    /// YouTube refused anonymous access (bot check, age gate, members-only).
    #[error("[AUTH] authentication required for {url}\n  Suggestion: {suggestion}")]
    AuthRequired { url: String, suggestion: String },

    /// yt-dlp succeeded but no finished file could be found in the Temp Store.
    #[error("yt-dlp finished but no downloaded file was found for {url}")]
    MissingOutput { url: String },

    /// A channel listing returned no videos.
    #[error("no videos found for channel {url}")]
    EmptyChannel { url: String },

    #[error(transparent)]
    TempStore(TempStoreError),

    #[error(transparent)]
    Reconcile(ReconcileError),

    #[error(transparent)]
    Job(JobError),
}

impl DownloadError {
    /// Creates an [`DownloadError::AuthRequired`] with the standard suggestion.
    #[must_use]
    pub fn auth_required(url: &str) -> Self {
        Self::AuthRequired {
            url: url.to_string(),
            suggestion: AUTH_SUGGESTION.to_string(),
        }
    }

    /// Creates a [`DownloadError::Subprocess`].
    #[must_use]
    pub fn subprocess(url: &str, code: Option<i32>, tail: impl Into<String>) -> Self {
        Self::Subprocess {
            url: url.to_string(),
            code,
            tail: tail.into(),
        }
    }

    /// True for authentication failures.
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::AuthRequired { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_message_carries_suggestion() {
        let message = DownloadError::auth_required("https://youtu.be/x").to_string();
        assert!(message.starts_with("[AUTH]"));
        assert!(message.contains("--cookies-from-browser"));
    }

    #[test]
    fn test_subprocess_message_includes_tail() {
        let message =
            DownloadError::subprocess("u", Some(1), "ERROR: Video unavailable").to_string();
        assert!(message.contains("exit code Some(1)"));
        assert!(message.contains("Video unavailable"));
    }
}
