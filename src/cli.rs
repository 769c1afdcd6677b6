//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use quicktube_core::history::HISTORY_LIMIT;
use quicktube_core::reconcile::ConflictChoice;
use quicktube_core::ytdlp::{ClipSection, OutputFormat, Quality};

/// Download YouTube videos and channels through yt-dlp.
///
/// Files are staged in a temp folder and moved into the destination once
/// complete; name collisions are resolved explicitly.
#[derive(Parser, Debug)]
#[command(name = "quicktube")]
#[command(author, version, about)]
pub struct Cli {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Trace-level logging for troubleshooting
    #[arg(long, global = true)]
    pub debug: bool,

    /// Disable colored log output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download one or more videos
    Download(DownloadArgs),
    /// Download every video of a channel into <dest>/<uploader>/
    Channel(ChannelArgs),
    /// Delete stale files from the temp folder
    Sweep(SweepArgs),
    /// Show recent downloads
    History(HistoryArgs),
    /// Check playback compatibility of a file, or summarize a folder
    Probe(ProbeArgs),
    /// Re-encode a file for wider playback support
    Convert(ConvertArgs),
    /// Show or change saved preferences
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
    /// Show cached scene-analysis results for a video
    Analysis(AnalysisArgs),
}

/// What to do when the destination file already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ConflictPolicy {
    /// Prompt for each collision (skip when stdin is not a terminal)
    #[default]
    Ask,
    /// Keep the existing file and discard the download
    Skip,
    /// Save as "<name> (2)", "<name> (3)", ...
    Rename,
    /// Overwrite the existing file
    Replace,
}

impl ConflictPolicy {
    /// Fixed answer for non-interactive policies.
    #[must_use]
    pub fn fixed_choice(self) -> Option<ConflictChoice> {
        match self {
            Self::Ask => None,
            Self::Skip => Some(ConflictChoice::Skip),
            Self::Rename => Some(ConflictChoice::RenameAndMove),
            Self::Replace => Some(ConflictChoice::Replace),
        }
    }
}

/// Options shared by `download` and `channel`.
#[derive(Args, Debug, Clone, Default)]
pub struct MediaArgs {
    /// Destination folder (defaults to the saved download folder)
    #[arg(short, long, value_name = "DIR")]
    pub dest: Option<PathBuf>,

    /// "best" or a maximum height such as 1080 or 720p
    #[arg(long, value_name = "Q")]
    pub quality: Option<Quality>,

    /// Extract audio only
    #[arg(long)]
    pub audio_only: bool,

    /// Container to merge into
    #[arg(long, value_name = "FMT")]
    pub format: Option<OutputFormat>,

    /// Netscape cookies file exported from a signed-in browser
    #[arg(long, value_name = "FILE", conflicts_with = "cookies_from_browser")]
    pub cookies: Option<PathBuf>,

    /// Read cookies from a browser profile (firefox, chrome, ...)
    #[arg(long, value_name = "BROWSER")]
    pub cookies_from_browser: Option<String>,

    /// Collision handling
    #[arg(long, value_enum, default_value_t = ConflictPolicy::Ask)]
    pub on_conflict: ConflictPolicy,
}

#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// YouTube video URLs
    #[arg(required = true, value_name = "URL")]
    pub urls: Vec<String>,

    #[command(flatten)]
    pub media: MediaArgs,

    /// Only download START-END (seconds or [HH:]MM:SS)
    #[arg(long, value_name = "START-END")]
    pub section: Option<ClipSection>,
}

#[derive(Args, Debug)]
pub struct ChannelArgs {
    /// Channel URL (@handle, /channel/, /c/ or /user/)
    #[arg(value_name = "URL")]
    pub url: String,

    #[command(flatten)]
    pub media: MediaArgs,

    /// Start without asking for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct SweepArgs {
    /// Override the stale threshold in hours
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..=720))]
    pub max_age_hours: Option<u64>,
}

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Number of entries to show
    #[arg(short = 'n', long, default_value_t = HISTORY_LIMIT)]
    pub limit: usize,

    /// Only show entries whose title, URL or file name match
    #[arg(short, long, value_name = "QUERY")]
    pub search: Option<String>,
}

#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Media file or folder
    pub path: PathBuf,
}

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// File to convert
    pub file: PathBuf,

    /// Re-encode video to H.264 (slow)
    #[arg(long)]
    pub video: bool,

    /// Copy the audio stream instead of re-encoding it to AAC
    #[arg(long)]
    pub keep_audio: bool,

    /// Output path (defaults to <stem>_compatible.mp4)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    /// Print every setting
    Show,
    /// Change one setting
    Set {
        key: String,
        value: String,
    },
}

#[derive(Args, Debug)]
pub struct AnalysisArgs {
    /// Video URL the analysis was run for
    pub url: String,

    /// Only keep detections matching these comma-separated keywords
    #[arg(short, long, value_delimiter = ',')]
    pub keywords: Vec<String>,

    /// Merge detections into clips
    #[arg(long)]
    pub clips: bool,
}
