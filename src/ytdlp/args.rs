//! Command-line construction for yt-dlp invocations.
//!
//! Every download is pointed at the Temp Store; the destination folder is
//! never handed to yt-dlp.

use std::path::Path;

use super::options::{CookieSource, DownloadOptions, Quality};

/// Output file name template, relative to the Temp Store.
pub const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

/// Field yt-dlp prints per entry when enumerating a channel.
const CHANNEL_PRINT_TEMPLATE: &str =
    "%(playlist_uploader,playlist_channel,uploader,channel|Unknown)s\t%(url)s";

/// Placeholder used when a channel listing names no uploader.
pub const UNKNOWN_UPLOADER: &str = "Unknown";

/// Arguments for downloading exactly one video into `temp_dir`.
#[must_use]
pub fn video_args(url: &str, temp_dir: &Path, options: &DownloadOptions) -> Vec<String> {
    let template = temp_dir.join(OUTPUT_TEMPLATE);
    let mut args = vec![
        "-o".to_string(),
        template.to_string_lossy().into_owned(),
        "--no-playlist".to_string(),
        "--progress".to_string(),
        "--newline".to_string(),
        "--no-colors".to_string(),
    ];

    push_format_args(&mut args, options);

    if let Some(section) = &options.section {
        args.push("--download-sections".to_string());
        args.push(section.to_arg());
    }

    push_cookie_args(&mut args, &options.cookies);

    args.push("--".to_string());
    args.push(url.to_string());
    args
}

/// Arguments that print one `<uploader>\t<url>` line per channel entry
/// without downloading anything.
#[must_use]
pub fn channel_listing_args(url: &str, cookies: &CookieSource) -> Vec<String> {
    let mut args = vec![
        "--flat-playlist".to_string(),
        "--yes-playlist".to_string(),
        "--no-warnings".to_string(),
        "--no-colors".to_string(),
        "--print".to_string(),
        CHANNEL_PRINT_TEMPLATE.to_string(),
    ];
    push_cookie_args(&mut args, cookies);
    args.push("--".to_string());
    args.push(url.to_string());
    args
}

fn push_format_args(args: &mut Vec<String>, options: &DownloadOptions) {
    if options.audio_only {
        args.extend(["-f", "bestaudio", "-x"].map(String::from));
        return;
    }

    args.push("--merge-output-format".to_string());
    args.push(options.format.as_str().to_string());

    match options.quality {
        Quality::Best => {
            args.push("-f".to_string());
            args.push("bestvideo*+bestaudio/best".to_string());
            if options.prefer_h264 {
                args.push("-S".to_string());
                args.push("res,vcodec:h264".to_string());
            }
        }
        Quality::MaxHeight(height) => {
            args.push("-f".to_string());
            args.push(format!("bestvideo[height<={height}]+bestaudio/best"));
        }
    }
}

fn push_cookie_args(args: &mut Vec<String>, cookies: &CookieSource) {
    match cookies {
        CookieSource::None => {}
        CookieSource::File(path) => {
            args.push("--cookies".to_string());
            args.push(path.to_string_lossy().into_owned());
        }
        CookieSource::Browser(browser) => {
            args.push("--cookies-from-browser".to_string());
            args.push(browser.clone());
        }
    }
}

/// One video discovered in a channel listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelEntry {
    /// Uploader or channel name, `Unknown` when yt-dlp had none.
    pub uploader: String,
    /// Watch URL of the video.
    pub url: String,
}

impl ChannelEntry {
    /// Uploader made safe for use as a single folder name.
    #[must_use]
    pub fn folder_name(&self) -> String {
        sanitize_folder_name(&self.uploader)
    }
}

/// Parses the stdout of a [`channel_listing_args`] run.
///
/// Lines without a tab or without an http(s) URL are ignored.
#[must_use]
pub fn parse_channel_listing(stdout: &str) -> Vec<ChannelEntry> {
    stdout
        .lines()
        .filter_map(|line| {
            let (uploader, url) = line.trim().split_once('\t')?;
            let url = url.trim();
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return None;
            }
            let uploader = match uploader.trim() {
                "" | "NA" => UNKNOWN_UPLOADER,
                name => name,
            };
            Some(ChannelEntry {
                uploader: uploader.to_string(),
                url: url.to_string(),
            })
        })
        .collect()
}

/// Replaces characters that are invalid in folder names on common filesystems.
#[must_use]
pub fn sanitize_folder_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = sanitized.trim().trim_matches('.');
    if trimmed.is_empty() {
        UNKNOWN_UPLOADER.to_string()
    } else {
        trimmed.to_string()
    }
}
