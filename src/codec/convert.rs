//! ffmpeg re-encoding for wider playback support.

use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use super::CodecError;
use crate::process::run_streaming;

/// Which streams to re-encode; the rest are copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionPlan {
    /// Re-encode video to H.264 (slow; fixes VP9/AV1).
    pub video: bool,
    /// Re-encode audio to AAC (fixes Opus in MP4).
    pub audio: bool,
}

impl Default for ConversionPlan {
    fn default() -> Self {
        Self {
            video: false,
            audio: true,
        }
    }
}

/// Progress of a running conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConversionProgress {
    /// Seconds of output written so far.
    pub current: f64,
    /// 0..=100; `None` when the input duration is unknown.
    pub percent: Option<f32>,
}

/// `<stem>_compatible.mp4` next to the input.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{stem}_compatible.mp4"))
}

/// ffmpeg arguments for converting `input` into `output`.
#[must_use]
pub fn conversion_args(input: &Path, output: &Path, plan: ConversionPlan) -> Vec<String> {
    let mut args = vec![
        "-y".to_string(),
        "-i".to_string(),
        input.to_string_lossy().into_owned(),
    ];
    if plan.video {
        args.extend(["-c:v", "libx264", "-crf", "23", "-preset", "medium"].map(String::from));
    } else {
        args.extend(["-c:v", "copy"].map(String::from));
    }
    if plan.audio {
        args.extend(["-c:a", "aac", "-b:a", "192k"].map(String::from));
    } else {
        args.extend(["-c:a", "copy"].map(String::from));
    }
    args.extend(["-movflags", "+faststart"].map(String::from));
    args.push(output.to_string_lossy().into_owned());
    args
}

/// Parses ffmpeg's `HH:MM:SS.ss` clock.
#[must_use]
pub fn parse_ffmpeg_time(value: &str) -> Option<f64> {
    let mut parts = value.trim().split(':');
    let hours: f64 = parts.next()?.parse().ok()?;
    let minutes: f64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || hours < 0.0 || minutes < 0.0 || seconds < 0.0 {
        return None;
    }
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// Extracts progress from an ffmpeg status line such as
/// `frame= 240 fps=60 ... time=00:00:08.00 bitrate=...`.
#[must_use]
pub fn parse_progress_line(line: &str, total_duration: f64) -> Option<ConversionProgress> {
    let idx = line.find("time=")?;
    let clock = line[idx + 5..].split_whitespace().next()?;
    let current = parse_ffmpeg_time(clock)?;
    let percent = (total_duration > 0.0).then(|| {
        #[allow(clippy::cast_possible_truncation)]
        let pct = (current / total_duration * 100.0) as f32;
        pct.clamp(0.0, 100.0)
    });
    Some(ConversionProgress { current, percent })
}

/// Converts `input` to `output`, reporting progress as ffmpeg writes it.
///
/// `total_duration` (seconds, from a prior probe) enables percentages.
///
/// # Errors
///
/// Returns [`CodecError::Tool`] when ffmpeg cannot start and
/// [`CodecError::ToolFailed`] when it exits non-zero.
#[instrument(skip(ffmpeg, on_progress), fields(input = %input.display()))]
pub async fn convert<F>(
    ffmpeg: &Path,
    input: &Path,
    output: &Path,
    plan: ConversionPlan,
    total_duration: f64,
    mut on_progress: F,
) -> Result<(), CodecError>
where
    F: FnMut(ConversionProgress) + Send,
{
    let args = conversion_args(input, output, plan);
    let outcome = run_streaming(ffmpeg, &args, |line| {
        if let Some(progress) = parse_progress_line(line, total_duration) {
            on_progress(progress);
        }
    })
    .await
    .map_err(CodecError::Tool)?;

    if !outcome.success {
        return Err(CodecError::ToolFailed {
            tool: "ffmpeg",
            path: input.to_path_buf(),
            code: outcome.code,
        });
    }
    on_progress(ConversionProgress {
        current: total_duration,
        percent: Some(100.0),
    });
    info!(output = %output.display(), "conversion finished");
    Ok(())
}
