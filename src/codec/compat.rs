//! Codec identification and the playback compatibility table.

use std::fmt;

use serde::Serialize;

/// Video codec family of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoCodec {
    H264,
    H265,
    Vp9,
    Av1,
    Unknown,
}

impl VideoCodec {
    /// Maps an ffprobe `codec_name`.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "h264" | "avc" | "avc1" => Self::H264,
            "hevc" | "h265" | "hev1" => Self::H265,
            "vp9" => Self::Vp9,
            "av1" => Self::Av1,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::H264 => "h264",
            Self::H265 => "hevc",
            Self::Vp9 => "vp9",
            Self::Av1 => "av1",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for VideoCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audio codec family of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioCodec {
    Aac,
    Mp3,
    Opus,
    Flac,
    Ac3,
    Vorbis,
    Unknown,
}

impl AudioCodec {
    /// Maps an ffprobe `codec_name`.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "aac" => Self::Aac,
            "mp3" => Self::Mp3,
            "opus" => Self::Opus,
            "flac" => Self::Flac,
            "ac3" | "eac3" => Self::Ac3,
            "vorbis" => Self::Vorbis,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aac => "aac",
            Self::Mp3 => "mp3",
            Self::Opus => "opus",
            Self::Flac => "flac",
            Self::Ac3 => "ac3",
            Self::Vorbis => "vorbis",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for AudioCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How widely a file plays, best first. `Ord` follows declaration order, so
/// the maximum of several levels is the worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompatibilityLevel {
    Excellent,
    Good,
    Moderate,
    Poor,
    VeryPoor,
}

impl CompatibilityLevel {
    /// All levels, best first.
    pub const ALL: [Self; 5] = [
        Self::Excellent,
        Self::Good,
        Self::Moderate,
        Self::Poor,
        Self::VeryPoor,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Moderate => "moderate",
            Self::Poor => "poor",
            Self::VeryPoor => "very_poor",
        }
    }

    /// Poor and VeryPoor files should be converted.
    #[must_use]
    pub fn needs_conversion(&self) -> bool {
        matches!(self, Self::Poor | Self::VeryPoor)
    }
}

impl fmt::Display for CompatibilityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Overall rating plus one message per problem found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assessment {
    pub level: CompatibilityLevel,
    pub issues: Vec<String>,
}

/// Rates a codec combination. `container` is ffprobe's `format_name`
/// (e.g. `mov,mp4,m4a,3gp,3g2,mj2`).
#[must_use]
pub fn assess(video: VideoCodec, audio: AudioCodec, container: &str) -> Assessment {
    let mut findings: Vec<(CompatibilityLevel, &str)> = Vec::new();

    match video {
        VideoCodec::Av1 => findings.push((
            CompatibilityLevel::VeryPoor,
            "AV1 video: very limited device support",
        )),
        VideoCodec::Vp9 => findings.push((
            CompatibilityLevel::Poor,
            "VP9 video: limited hardware decoding on mobile devices",
        )),
        VideoCodec::H265 => findings.push((
            CompatibilityLevel::Moderate,
            "HEVC/H.265 video: some older devices lack support",
        )),
        VideoCodec::H264 | VideoCodec::Unknown => {}
    }

    let container = container.to_ascii_lowercase();
    match audio {
        AudioCodec::Opus if container.contains("mp4") || container.contains("mov") => findings
            .push((
                CompatibilityLevel::Poor,
                "Opus audio in MP4: not supported on most mobile devices",
            )),
        AudioCodec::Opus => findings.push((
            CompatibilityLevel::Moderate,
            "Opus audio: may have compatibility issues",
        )),
        AudioCodec::Vorbis => findings.push((
            CompatibilityLevel::Moderate,
            "Vorbis audio: limited support outside WebM",
        )),
        AudioCodec::Flac => findings.push((
            CompatibilityLevel::Good,
            "FLAC audio: not all devices support it in video containers",
        )),
        AudioCodec::Aac | AudioCodec::Mp3 | AudioCodec::Ac3 | AudioCodec::Unknown => {}
    }

    Assessment {
        level: findings
            .iter()
            .map(|(level, _)| *level)
            .max()
            .unwrap_or(CompatibilityLevel::Excellent),
        issues: findings.into_iter().map(|(_, msg)| msg.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MP4: &str = "mov,mp4,m4a,3gp,3g2,mj2";
    const WEBM: &str = "matroska,webm";

    #[test]
    fn test_codec_name_mapping() {
        assert_eq!(VideoCodec::from_name("avc1"), VideoCodec::H264);
        assert_eq!(VideoCodec::from_name("HEVC"), VideoCodec::H265);
        assert_eq!(VideoCodec::from_name("mpeg4"), VideoCodec::Unknown);
        assert_eq!(AudioCodec::from_name("eac3"), AudioCodec::Ac3);
        assert_eq!(AudioCodec::from_name("pcm_s16le"), AudioCodec::Unknown);
    }

    #[test]
    fn test_table_rows() {
        let cases = [
            (VideoCodec::H264, AudioCodec::Aac, MP4, CompatibilityLevel::Excellent),
            (VideoCodec::Av1, AudioCodec::Aac, MP4, CompatibilityLevel::VeryPoor),
            (VideoCodec::Vp9, AudioCodec::Aac, WEBM, CompatibilityLevel::Poor),
            (VideoCodec::H265, AudioCodec::Aac, MP4, CompatibilityLevel::Moderate),
            (VideoCodec::H264, AudioCodec::Opus, MP4, CompatibilityLevel::Poor),
            (VideoCodec::H264, AudioCodec::Opus, WEBM, CompatibilityLevel::Moderate),
            (VideoCodec::H264, AudioCodec::Vorbis, WEBM, CompatibilityLevel::Moderate),
            (VideoCodec::H264, AudioCodec::Flac, "matroska", CompatibilityLevel::Good),
        ];
        for (video, audio, container, expected) in cases {
            assert_eq!(
                assess(video, audio, container).level,
                expected,
                "{video}/{audio} in {container}"
            );
        }
    }

    #[test]
    fn test_worst_row_wins_and_issues_accumulate() {
        let assessment = assess(VideoCodec::Av1, AudioCodec::Opus, MP4);
        assert_eq!(assessment.level, CompatibilityLevel::VeryPoor);
        assert_eq!(assessment.issues.len(), 2);

        let assessment = assess(VideoCodec::H265, AudioCodec::Flac, "matroska");
        assert_eq!(assessment.level, CompatibilityLevel::Moderate);
    }

    #[test]
    fn test_needs_conversion_threshold() {
        assert!(!CompatibilityLevel::Moderate.needs_conversion());
        assert!(CompatibilityLevel::Poor.needs_conversion());
        assert!(CompatibilityLevel::VeryPoor.needs_conversion());
    }
}
