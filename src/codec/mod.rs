//! Playback compatibility of finished downloads.
//!
//! Files are inspected with ffprobe, rated against a fixed codec table and,
//! on request, re-encoded with ffmpeg. Failures here never fail the download
//! that triggered the check.

mod batch;
mod compat;
mod convert;
mod probe;

use std::path::PathBuf;

use thiserror::Error;

use crate::process::ProcessError;

pub use batch::{CompatibilitySummary, VIDEO_EXTENSIONS, batch_analyze, find_video_files};
pub use compat::{Assessment, AudioCodec, CompatibilityLevel, VideoCodec, assess};
pub use convert::{
    ConversionPlan, ConversionProgress, conversion_args, convert, default_output_path,
    parse_ffmpeg_time, parse_progress_line,
};
pub use probe::{MediaInfo, parse_probe_json, probe, probe_args};

/// Classification and conversion failures.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The media file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// ffprobe or ffmpeg could not be started.
    #[error(transparent)]
    Tool(ProcessError),

    /// The tool ran but exited non-zero.
    #[error("{tool} failed on {path} (exit code {code:?})")]
    ToolFailed {
        tool: &'static str,
        path: PathBuf,
        code: Option<i32>,
    },

    /// ffprobe printed something that is not its JSON report.
    #[error("unreadable ffprobe output for {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl CodecError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
