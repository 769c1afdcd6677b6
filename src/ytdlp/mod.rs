//! yt-dlp invocation contract.
//!
//! Builds argument lists for single-video downloads and channel enumeration.
//! Running the process lives in [`crate::process`]; interpreting its output
//! lives in [`crate::progress`].

mod args;
mod options;

pub use args::{
    ChannelEntry, OUTPUT_TEMPLATE, UNKNOWN_UPLOADER, channel_listing_args, parse_channel_listing,
    sanitize_folder_name, video_args,
};
pub use options::{
    ClipSection, CookieSource, DownloadOptions, OutputFormat, Quality, parse_timestamp,
};
