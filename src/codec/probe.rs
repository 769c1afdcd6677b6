//! ffprobe inspection of finished files.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::CodecError;
use super::compat::{AudioCodec, CompatibilityLevel, VideoCodec, assess};
use crate::process::run_captured;

#[derive(Debug, Default, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Default, Deserialize)]
struct ProbeStream {
    #[serde(default)]
    codec_type: String,
    #[serde(default)]
    codec_name: String,
    #[serde(default)]
    profile: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    bit_rate: Option<String>,
    sample_rate: Option<String>,
    channels: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct ProbeFormat {
    #[serde(default)]
    format_name: String,
    duration: Option<String>,
}

/// Codec details and compatibility rating of one media file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaInfo {
    pub path: PathBuf,
    pub file_size: u64,
    /// Seconds; zero when ffprobe reported none.
    pub duration: f64,
    /// ffprobe `format_name`.
    pub container: String,

    pub video_codec: VideoCodec,
    pub video_codec_raw: String,
    pub video_profile: String,
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
    pub video_bitrate: u64,

    pub audio_codec: AudioCodec,
    pub audio_codec_raw: String,
    pub sample_rate: u32,
    pub channels: u32,
    pub audio_bitrate: u64,

    pub compatibility: CompatibilityLevel,
    pub issues: Vec<String>,
}

impl MediaInfo {
    /// `WIDTHxHEIGHT`, or `Unknown` for audio-only files.
    #[must_use]
    pub fn resolution(&self) -> String {
        if self.width > 0 && self.height > 0 {
            format!("{}x{}", self.width, self.height)
        } else {
            "Unknown".to_string()
        }
    }

    #[must_use]
    pub fn needs_conversion(&self) -> bool {
        self.compatibility.needs_conversion()
    }

    /// VP9 and AV1 video need a re-encode.
    #[must_use]
    pub fn video_needs_conversion(&self) -> bool {
        matches!(self.video_codec, VideoCodec::Vp9 | VideoCodec::Av1)
    }

    #[must_use]
    pub fn audio_needs_conversion(&self) -> bool {
        self.audio_codec == AudioCodec::Opus
    }
}

/// Arguments for a JSON stream/format dump of `path`.
#[must_use]
pub fn probe_args(path: &Path) -> Vec<String> {
    vec![
        "-v".to_string(),
        "quiet".to_string(),
        "-print_format".to_string(),
        "json".to_string(),
        "-show_format".to_string(),
        "-show_streams".to_string(),
        path.to_string_lossy().into_owned(),
    ]
}

/// Runs ffprobe on `path` and rates the result.
///
/// # Errors
///
/// Returns [`CodecError`] when the file is missing, ffprobe cannot run or
/// exits non-zero, or its output is not valid JSON.
pub async fn probe(ffprobe: &Path, path: &Path) -> Result<MediaInfo, CodecError> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| CodecError::io(path, e))?;
    let output = run_captured(ffprobe, &probe_args(path))
        .await
        .map_err(CodecError::Tool)?;
    if !output.success {
        return Err(CodecError::ToolFailed {
            tool: "ffprobe",
            path: path.to_path_buf(),
            code: output.code,
        });
    }
    let info = parse_probe_json(path, metadata.len(), &output.stdout)?;
    debug!(
        path = %path.display(),
        video = %info.video_codec,
        audio = %info.audio_codec,
        level = %info.compatibility,
        "probed media file"
    );
    Ok(info)
}

/// Builds a [`MediaInfo`] from ffprobe JSON. With several streams of one
/// kind, the last one is reported.
///
/// # Errors
///
/// Returns [`CodecError::Parse`] when `json` is not ffprobe output.
pub fn parse_probe_json(path: &Path, file_size: u64, json: &str) -> Result<MediaInfo, CodecError> {
    let parsed: ProbeOutput = serde_json::from_str(json).map_err(|source| CodecError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let format = parsed.format.unwrap_or_default();
    let mut info = MediaInfo {
        path: path.to_path_buf(),
        file_size,
        duration: parse_number(format.duration.as_deref()),
        container: format.format_name,
        video_codec: VideoCodec::Unknown,
        video_codec_raw: String::new(),
        video_profile: String::new(),
        width: 0,
        height: 0,
        frame_rate: 0.0,
        video_bitrate: 0,
        audio_codec: AudioCodec::Unknown,
        audio_codec_raw: String::new(),
        sample_rate: 0,
        channels: 0,
        audio_bitrate: 0,
        compatibility: CompatibilityLevel::Excellent,
        issues: Vec::new(),
    };

    for stream in parsed.streams {
        let name = stream.codec_name.to_ascii_lowercase();
        match stream.codec_type.as_str() {
            "video" => {
                info.video_codec = VideoCodec::from_name(&name);
                info.video_codec_raw = name;
                info.video_profile = stream.profile.unwrap_or_default();
                info.width = stream.width.unwrap_or(0);
                info.height = stream.height.unwrap_or(0);
                info.frame_rate = parse_frame_rate(stream.r_frame_rate.as_deref());
                info.video_bitrate = parse_u64(stream.bit_rate.as_deref());
            }
            "audio" => {
                info.audio_codec = AudioCodec::from_name(&name);
                info.audio_codec_raw = name;
                info.sample_rate = parse_u64(stream.sample_rate.as_deref())
                    .try_into()
                    .unwrap_or(0);
                info.channels = stream.channels.unwrap_or(0);
                info.audio_bitrate = parse_u64(stream.bit_rate.as_deref());
            }
            _ => {}
        }
    }

    let assessment = assess(info.video_codec, info.audio_codec, &info.container);
    info.compatibility = assessment.level;
    info.issues = assessment.issues;
    Ok(info)
}

fn parse_number(value: Option<&str>) -> f64 {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(0.0)
}

fn parse_u64(value: Option<&str>) -> u64 {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(0)
}

/// `30000/1001` → 29.97; zero denominators and garbage give 0.
fn parse_frame_rate(value: Option<&str>) -> f64 {
    let Some(value) = value else {
        return 0.0;
    };
    match value.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().unwrap_or(0.0);
            let den: f64 = den.trim().parse().unwrap_or(0.0);
            if den > 0.0 { num / den } else { 0.0 }
        }
        None => value.trim().parse().unwrap_or(0.0),
    }
}
