//! Failure classification and user-facing descriptors for download errors.

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FailureCategory {
    Auth,
    InputSource,
    Tool,
    Filesystem,
    Other,
}

impl FailureCategory {
    #[must_use]
    pub fn icon(self) -> &'static str {
        match self {
            Self::Auth => "🔐",
            Self::InputSource => "❌",
            Self::Tool => "🔧",
            Self::Filesystem => "📁",
            Self::Other => "⚠️",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Auth => "Authentication",
            Self::InputSource => "Input/Source",
            Self::Tool => "External tool",
            Self::Filesystem => "Filesystem",
            Self::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureDescriptor {
    pub category: FailureCategory,
    pub what: &'static str,
    pub why: &'static str,
    pub fix: &'static str,
}

/// Classifies an error message string into a category and descriptor.
#[must_use]
pub fn classify_failure(error: &str) -> FailureDescriptor {
    let lower = error.to_lowercase();
    if error.starts_with("[AUTH]") {
        FailureDescriptor {
            category: FailureCategory::Auth,
            what: "Authentication required",
            why: "YouTube wants a signed-in session (bot check, age gate or members-only video).",
            fix: "Sign in to YouTube in your browser, then rerun with --cookies-from-browser <browser> or a fresh --cookies file.",
        }
    } else if error.starts_with("invalid URL") || error.starts_with("not a YouTube") {
        FailureDescriptor {
            category: FailureCategory::InputSource,
            what: "Input is not a YouTube link",
            why: "Only watch, youtu.be, shorts and channel URLs are accepted.",
            fix: "Copy the link from the video or channel page and retry.",
        }
    } else if lower.contains("video unavailable")
        || lower.contains("private video")
        || lower.contains("has been removed")
        || error.starts_with("no videos found for channel")
    {
        FailureDescriptor {
            category: FailureCategory::InputSource,
            what: "Video not available",
            why: "The video or channel is private, removed, or has nothing to list.",
            fix: "Open the link in a browser to confirm it still exists.",
        }
    } else if error.starts_with("could not run yt-dlp") {
        FailureDescriptor {
            category: FailureCategory::Tool,
            what: "yt-dlp could not be started",
            why: "The yt-dlp executable was not found or is not runnable.",
            fix: "Install yt-dlp or set `ytdlp_path` in the config file.",
        }
    } else if error.starts_with("yt-dlp failed") {
        FailureDescriptor {
            category: FailureCategory::Tool,
            what: "yt-dlp reported an error",
            why: "yt-dlp exited with a non-zero status; its last output lines are shown above.",
            fix: "Update yt-dlp (`yt-dlp -U`) and retry.",
        }
    } else if error.starts_with("failed to move")
        || error.starts_with("failed to delete")
        || error.starts_with("failed to create")
        || error.starts_with("IO error in temp store")
    {
        FailureDescriptor {
            category: FailureCategory::Filesystem,
            what: "File could not be placed",
            why: "A move, delete or folder creation was refused by the filesystem.",
            fix: "Check free space and permissions on the destination and temp folders.",
        }
    } else {
        FailureDescriptor {
            category: FailureCategory::Other,
            what: "Unhandled failure",
            why: "The error did not match a known category and needs closer inspection.",
            fix: "Rerun with -v for detailed logs.",
        }
    }
}

/// Extracts the remediation from an `[AUTH]` message.
#[must_use]
pub fn auth_suggestion(error: &str) -> Option<&str> {
    if !error.starts_with("[AUTH]") {
        return None;
    }
    let (_, suggestion) = error.split_once("Suggestion:")?;
    let suggestion = suggestion.trim();
    (!suggestion.is_empty()).then_some(suggestion)
}
