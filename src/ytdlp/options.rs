//! User-selectable download options and their parsing.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Requested video quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Quality {
    /// Highest resolution available, preferring H.264.
    #[default]
    Best,
    /// Cap the video height (e.g. 1080, 720).
    MaxHeight(u32),
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Best => f.write_str("best"),
            Self::MaxHeight(height) => write!(f, "{height}p"),
        }
    }
}

impl FromStr for Quality {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        if normalized == "best" {
            return Ok(Self::Best);
        }
        let digits = normalized.strip_suffix('p').unwrap_or(&normalized);
        match digits.parse::<u32>() {
            Ok(height) if (144..=4320).contains(&height) => Ok(Self::MaxHeight(height)),
            _ => Err(format!(
                "invalid quality '{value}': expected 'best' or a height such as 1080, 720p"
            )),
        }
    }
}

impl TryFrom<String> for Quality {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Quality> for String {
    fn from(value: Quality) -> Self {
        value.to_string()
    }
}

/// Container yt-dlp merges streams into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Mp4,
    Webm,
    Mkv,
}

impl OutputFormat {
    /// yt-dlp's name for the container.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Webm => "webm",
            Self::Mkv => "mkv",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mp4" => Ok(Self::Mp4),
            "webm" => Ok(Self::Webm),
            "mkv" => Ok(Self::Mkv),
            _ => Err(format!(
                "invalid output format '{value}': expected mp4, webm or mkv"
            )),
        }
    }
}

/// A time range to download instead of the whole video (preview clips).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipSection {
    start: String,
    end: String,
}

impl ClipSection {
    /// Value for yt-dlp's `--download-sections`.
    #[must_use]
    pub fn to_arg(&self) -> String {
        format!("*{}-{}", self.start, self.end)
    }
}

impl FromStr for ClipSection {
    type Err = String;

    /// Parses `START-END` where each side is seconds or `[HH:]MM:SS`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (start, end) = value
            .trim()
            .split_once('-')
            .ok_or_else(|| format!("invalid section '{value}': expected START-END"))?;
        let (start, end) = (start.trim(), end.trim());
        let start_secs =
            parse_timestamp(start).ok_or_else(|| format!("invalid section start '{start}'"))?;
        let end_secs =
            parse_timestamp(end).ok_or_else(|| format!("invalid section end '{end}'"))?;
        if end_secs <= start_secs {
            return Err(format!("invalid section '{value}': end must be after start"));
        }
        Ok(Self {
            start: start.to_string(),
            end: end.to_string(),
        })
    }
}

/// Parses seconds, `MM:SS` or `HH:MM:SS` (fractional seconds allowed) into seconds.
#[must_use]
pub fn parse_timestamp(value: &str) -> Option<f64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let mut total = 0.0_f64;
    let parts: Vec<&str> = value.split(':').collect();
    if parts.len() > 3 {
        return None;
    }
    for part in &parts {
        let number: f64 = part.parse().ok()?;
        if number < 0.0 {
            return None;
        }
        total = total * 60.0 + number;
    }
    Some(total)
}

/// How yt-dlp should authenticate to YouTube.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CookieSource {
    /// Anonymous access.
    #[default]
    None,
    /// Netscape-format cookies file exported from a browser.
    File(PathBuf),
    /// Read cookies straight from a browser profile (`firefox`, `chrome`, ...).
    Browser(String),
}

/// Everything that shapes a yt-dlp invocation besides the URL.
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub quality: Quality,
    pub audio_only: bool,
    pub format: OutputFormat,
    /// Sort H.264 first when picking the best stream.
    pub prefer_h264: bool,
    pub section: Option<ClipSection>,
    pub cookies: CookieSource,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            quality: Quality::Best,
            audio_only: false,
            format: OutputFormat::Mp4,
            prefer_h264: true,
            section: None,
            cookies: CookieSource::None,
        }
    }
}
