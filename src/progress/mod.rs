//! yt-dlp output scraping.
//!
//! yt-dlp has no structured progress channel when run with `--newline`; every
//! state change is a human-readable line. This module turns those lines into
//! [`ProgressEvent`] values and pulls out the few facts the download pipeline
//! depends on (temp file paths, titles, playlist positions, auth walls).
//!
//! # Example
//!
//! ```
//! use quicktube_core::progress::{EventKind, classify_line};
//!
//! let event = classify_line("[download]  42.5% of 10.00MiB at 1.00MiB/s ETA 00:05").unwrap();
//! assert_eq!(event.kind(), EventKind::Progress);
//! assert_eq!(event.percent(), Some(42.5));
//! ```

mod classifier;
mod extract;

pub use classifier::{
    CACHE_HIT_MARKER, COMPLETE_MARKER, DOWNLOAD_TAG, ERROR_PREFIX, EventKind, ProgressEvent,
    classify_line, rule_order,
};
pub use extract::{
    OutputSource, clean_title, extract_cache_hit_path, extract_output, extract_output_path,
    is_auth_wall, is_stream_fragment, parse_percent, parse_playlist_item,
};
