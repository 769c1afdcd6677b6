//! Ordered rule table mapping one output line to one event.

use std::fmt;
use std::path::{Path, PathBuf};

use super::extract::{extract_cache_hit_path, extract_output_path, parse_percent};

/// Tag yt-dlp prefixes to every downloader line.
pub const DOWNLOAD_TAG: &str = "[download]";

/// Marker present on the final progress line of a stream.
pub const COMPLETE_MARKER: &str = "100%";

/// Marker yt-dlp prints when the target file already exists in the output folder.
pub const CACHE_HIT_MARKER: &str = "has already been downloaded";

/// Prefix of fatal yt-dlp diagnostics.
pub const ERROR_PREFIX: &str = "ERROR:";

/// Semantic kind of a classified output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Partial download progress, usually with a percentage.
    Progress,
    /// A stream reached 100%.
    Complete,
    /// yt-dlp reused a file it downloaded earlier.
    CacheHit,
    /// Any other informational line worth surfacing.
    Info,
    /// A fatal diagnostic from yt-dlp.
    Error,
}

impl EventKind {
    /// Returns the stable lowercase label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Progress => "progress",
            Self::Complete => "complete",
            Self::CacheHit => "cache_hit",
            Self::Info => "info",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One classified line of subprocess output.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    kind: EventKind,
    raw: String,
    percent: Option<f32>,
    path: Option<PathBuf>,
}

impl ProgressEvent {
    /// Kind selected by the first matching rule.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// The trimmed line the event was derived from.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Percentage in `0.0..=100.0` for progress and completion events.
    #[must_use]
    pub fn percent(&self) -> Option<f32> {
        self.percent
    }

    /// File path named by the line (cache hit, destination, merger output).
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

struct Rule {
    name: &'static str,
    matches: fn(&str) -> bool,
    kind: EventKind,
}

fn is_cache_hit(line: &str) -> bool {
    line.contains(CACHE_HIT_MARKER)
}

fn is_complete(line: &str) -> bool {
    line.contains(DOWNLOAD_TAG) && line.contains(COMPLETE_MARKER)
}

fn is_progress(line: &str) -> bool {
    line.contains(DOWNLOAD_TAG) && line.contains('%')
}

fn is_download_info(line: &str) -> bool {
    line.contains(DOWNLOAD_TAG)
}

fn is_error(line: &str) -> bool {
    line.starts_with(ERROR_PREFIX)
}

fn is_bracketed(line: &str) -> bool {
    line.starts_with('[')
}

// First match wins. "100%" lines also satisfy the progress rule, so the
// completion rule has to come first.
const RULES: [Rule; 6] = [
    Rule {
        name: "cache_hit",
        matches: is_cache_hit,
        kind: EventKind::CacheHit,
    },
    Rule {
        name: "complete",
        matches: is_complete,
        kind: EventKind::Complete,
    },
    Rule {
        name: "progress",
        matches: is_progress,
        kind: EventKind::Progress,
    },
    Rule {
        name: "download_info",
        matches: is_download_info,
        kind: EventKind::Info,
    },
    Rule {
        name: "error",
        matches: is_error,
        kind: EventKind::Error,
    },
    Rule {
        name: "bracketed",
        matches: is_bracketed,
        kind: EventKind::Info,
    },
];

/// Returns the rule table in evaluation order as `(rule name, kind)` pairs.
pub fn rule_order() -> impl Iterator<Item = (&'static str, EventKind)> {
    RULES.iter().map(|rule| (rule.name, rule.kind))
}

/// Classifies a single line of yt-dlp output.
///
/// Returns `None` for blank lines and lines no rule recognises; those are
/// not surfaced to the user. Never fails: a line that looks like progress but
/// carries no parseable percentage still yields a `Progress` event with
/// `percent() == None`.
#[must_use]
pub fn classify_line(line: &str) -> Option<ProgressEvent> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    let rule = RULES.iter().find(|rule| (rule.matches)(trimmed))?;
    let (percent, path) = match rule.kind {
        EventKind::CacheHit => (None, extract_cache_hit_path(trimmed)),
        EventKind::Complete => (Some(100.0), None),
        EventKind::Progress => (parse_percent(trimmed), None),
        EventKind::Info => (None, extract_output_path(trimmed)),
        EventKind::Error => (None, None),
    };

    Some(ProgressEvent {
        kind: rule.kind,
        raw: trimmed.to_string(),
        percent,
        path,
    })
}
