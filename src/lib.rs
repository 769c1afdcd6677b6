//! QuickTube core library
//!
//! Downloads YouTube videos and channels through `yt-dlp`, staging every
//! file in a temp folder before moving it into place with explicit
//! collision handling.
//!
//! # Architecture
//!
//! The reconciliation pipeline, leaf to root:
//! - [`progress`] - classifies yt-dlp output lines into progress events
//! - [`temp_store`] - the staging folder yt-dlp writes into
//! - [`reconcile`] - moves, renames, replaces or discards finished files
//! - [`sweeper`] - deletes abandoned temp files
//!
//! Around it:
//! - [`job`] - job state machine and the registry of live jobs
//! - [`ytdlp`] / [`process`] - argument building and line-streamed subprocesses
//! - [`download`] - runs jobs end to end and reports through a channel
//! - [`codec`] - ffprobe compatibility checks and ffmpeg conversion
//! - [`settings`], [`history`], [`analysis`] - JSON persistence
//! - [`source`] - YouTube URL validation
//! - [`config`] - explicit application configuration

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod analysis;
pub mod codec;
pub mod config;
pub mod download;
pub mod history;
pub mod job;
pub mod json_store;
pub mod process;
pub mod progress;
pub mod reconcile;
pub mod settings;
pub mod source;
pub mod sweeper;
pub mod temp_store;
pub mod ytdlp;

// Re-export commonly used types
pub use config::{AppConfig, ConfigError};
pub use download::{ChannelReport, DownloadEngine, DownloadError, JobReport, JobUpdate};
pub use job::{DownloadJob, JobId, JobRegistry, JobStatus};
pub use progress::{EventKind, ProgressEvent, classify_line};
pub use reconcile::{
    Conflict, ConflictChoice, ConflictResolver, FixedChoice, ReconciliationDecision, Reconciler,
};
pub use sweeper::{CleanupSweeper, SweepReport};
pub use temp_store::{TempFileRecord, TempStore};
pub use ytdlp::{DownloadOptions, Quality};
