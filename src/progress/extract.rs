//! Field extraction from individual yt-dlp output lines.

use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

#[allow(clippy::expect_used)]
static PERCENT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{1,3}(?:\.\d+)?)%").expect("percent regex is valid") // Static pattern, safe to panic
});

#[allow(clippy::expect_used)]
static CACHE_HIT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[download\]\s+(.+?)\s+has already been downloaded")
        .expect("cache hit regex is valid")
});

#[allow(clippy::expect_used)]
static DESTINATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[(download|ExtractAudio|VideoConvertor)\]\s+Destination:\s+(.+)$")
        .expect("destination regex is valid")
});

#[allow(clippy::expect_used)]
static MERGER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\[Merger\]\s+Merging formats into\s+"(.+)"$"#).expect("merger regex is valid")
});

#[allow(clippy::expect_used)]
static FORMAT_CODE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.f\d+$").expect("format code regex is valid"));

#[allow(clippy::expect_used)]
static STREAM_FRAGMENT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.f\d+\.[a-z0-9]+(?:\.part)?$").expect("stream fragment regex is valid")
});

#[allow(clippy::expect_used)]
static PLAYLIST_ITEM_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Downloading (?:item|video) (\d+) of (\d+)").expect("playlist item regex is valid")
});

/// Phrases yt-dlp uses when YouTube refuses to serve without a signed-in session.
const AUTH_WALL_PHRASES: [&str; 6] = [
    "sign in to confirm",
    "not a bot",
    "confirm your age",
    "login required",
    "use --cookies",
    "members-only content",
];

/// Where an output path mentioned on a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputSource {
    /// `[download] Destination: ...` (may be a single-format stream fragment).
    Download,
    /// `[ExtractAudio] Destination: ...` or `[VideoConvertor] Destination: ...`.
    PostProcessor,
    /// `[Merger] Merging formats into "..."`, the final merged file.
    Merger,
}

/// Extracts the first percentage on the line, clamped to `0.0..=100.0`.
#[must_use]
pub fn parse_percent(line: &str) -> Option<f32> {
    let captures = PERCENT_PATTERN.captures(line)?;
    let value: f32 = captures.get(1)?.as_str().parse().ok()?;
    Some(value.clamp(0.0, 100.0))
}

/// Extracts the file path from an "already downloaded" line.
#[must_use]
pub fn extract_cache_hit_path(line: &str) -> Option<PathBuf> {
    let captures = CACHE_HIT_PATTERN.captures(line.trim())?;
    let path = captures.get(1)?.as_str().trim();
    (!path.is_empty()).then(|| PathBuf::from(path))
}

/// Extracts an output path and its source from destination/merger lines.
#[must_use]
pub fn extract_output(line: &str) -> Option<(OutputSource, PathBuf)> {
    let line = line.trim();
    if let Some(captures) = MERGER_PATTERN.captures(line) {
        let path = captures.get(1)?.as_str();
        return Some((OutputSource::Merger, PathBuf::from(path)));
    }

    let captures = DESTINATION_PATTERN.captures(line)?;
    let source = match captures.get(1)?.as_str() {
        "download" => OutputSource::Download,
        _ => OutputSource::PostProcessor,
    };
    let path = captures.get(2)?.as_str().trim();
    (!path.is_empty()).then(|| (source, PathBuf::from(path)))
}

/// Extracts an output path from destination/merger lines, ignoring its source.
#[must_use]
pub fn extract_output_path(line: &str) -> Option<PathBuf> {
    extract_output(line).map(|(_, path)| path)
}

/// Strips a yt-dlp format-code suffix (`.f399`) from a file stem.
#[must_use]
pub fn clean_title(stem: &str) -> String {
    FORMAT_CODE_SUFFIX.replace(stem, "").into_owned()
}

/// Returns true for single-format stream files yt-dlp leaves before merging
/// (`Title.f251.webm`), including their in-flight `.part` form.
#[must_use]
pub fn is_stream_fragment(file_name: &str) -> bool {
    STREAM_FRAGMENT_PATTERN.is_match(file_name)
}

/// Extracts `(item, total)` from "Downloading item N of M" lines.
#[must_use]
pub fn parse_playlist_item(line: &str) -> Option<(u32, u32)> {
    let captures = PLAYLIST_ITEM_PATTERN.captures(line)?;
    let item = captures.get(1)?.as_str().parse().ok()?;
    let total = captures.get(2)?.as_str().parse().ok()?;
    Some((item, total))
}

/// Returns true when the line reports a bot check, sign-in or age wall.
#[must_use]
pub fn is_auth_wall(line: &str) -> bool {
    let lower = line.to_lowercase();
    AUTH_WALL_PHRASES.iter().any(|phrase| lower.contains(phrase))
}
