//! YouTube URL validation and classification.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};
use thiserror::Error;
use url::Url;

/// Maximum accepted URL length.
const MAX_URL_LENGTH: usize = 2000;

#[allow(clippy::expect_used)]
static VIDEO_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(youtube\.com/watch\?(?:.*&)?v=|youtu\.be/|youtube\.com/shorts/)")
        .expect("video URL regex is valid")
});

#[allow(clippy::expect_used)]
static CHANNEL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)youtube\.com/(@|channel/|c/|user/)").expect("channel URL regex is valid")
});

/// Errors for URLs QuickTube will not hand to yt-dlp.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("invalid URL '{url}': {reason}")]
    Malformed { url: String, reason: String },

    #[error("not a YouTube video or channel URL: {url}")]
    NotYouTube { url: String },
}

/// What a validated URL points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// A single video (watch, youtu.be or shorts link).
    Video,
    /// A channel page (`@handle`, `/channel/`, `/c/`, `/user/`).
    Channel,
}

impl SourceKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Channel => "channel",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Checks that `raw` is an http(s) YouTube URL and says what it points at.
///
/// Video patterns win over channel patterns, so a watch link on a channel
/// host is still a video.
///
/// # Errors
///
/// Returns [`SourceError::Malformed`] for unparseable or non-http URLs and
/// [`SourceError::NotYouTube`] for URLs matching no known pattern.
pub fn validate_url(raw: &str) -> Result<SourceKind, SourceError> {
    let raw = raw.trim();
    if raw.len() > MAX_URL_LENGTH {
        return Err(SourceError::Malformed {
            url: raw.to_string(),
            reason: format!("longer than {MAX_URL_LENGTH} characters"),
        });
    }
    let parsed = Url::parse(raw).map_err(|e| SourceError::Malformed {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(SourceError::Malformed {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }

    if VIDEO_PATTERN.is_match(raw) {
        Ok(SourceKind::Video)
    } else if CHANNEL_PATTERN.is_match(raw) {
        Ok(SourceKind::Channel)
    } else {
        Err(SourceError::NotYouTube {
            url: raw.to_string(),
        })
    }
}

/// First 12 hex characters of the URL's SHA-256; stable per URL.
#[must_use]
pub fn url_key(url: &str) -> String {
    let digest = format!("{:x}", Sha256::digest(url.as_bytes()));
    digest[..12].to_string()
}

/// YouTube video id from `v=`, `youtu.be/` or `shorts/` URLs, otherwise
/// the [`url_key`] of the URL.
#[must_use]
pub fn extract_video_id(url: &str) -> String {
    if let Ok(parsed) = Url::parse(url) {
        if let Some((_, id)) = parsed.query_pairs().find(|(key, _)| key == "v")
            && !id.is_empty()
        {
            return id.into_owned();
        }
        let host = parsed.host_str().unwrap_or_default();
        let mut segments = parsed.path_segments().into_iter().flatten();
        if host.ends_with("youtu.be")
            && let Some(id) = segments.next().filter(|s| !s.is_empty())
        {
            return id.to_string();
        }
        let mut segments = parsed.path_segments().into_iter().flatten();
        if segments.next() == Some("shorts")
            && let Some(id) = segments.next().filter(|s| !s.is_empty())
        {
            return id.to_string();
        }
    }
    url_key(url)
}
