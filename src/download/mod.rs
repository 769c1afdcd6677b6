//! yt-dlp download jobs.
//!
//! [`DownloadEngine`] runs one job at a time: yt-dlp writes into the Temp
//! Store, [`TempPathTracker`] works out which file it produced, and the
//! [`Reconciler`](crate::reconcile::Reconciler) moves that file into place.
//! Progress flows to a single consumer as [`JobUpdate`] values.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use quicktube_core::config::AppConfig;
//! use quicktube_core::download::{DownloadEngine, channel};
//! use quicktube_core::job::JobRegistry;
//! use quicktube_core::reconcile::{ConflictChoice, FixedChoice};
//! use quicktube_core::ytdlp::DownloadOptions;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::from_env()?;
//! let (tx, _rx) = channel();
//! let engine = DownloadEngine::new(
//!     config,
//!     Arc::new(JobRegistry::new()),
//!     Arc::new(FixedChoice(ConflictChoice::RenameAndMove)),
//! )
//! .with_updates(tx);
//! let report = engine
//!     .download_video(
//!         "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
//!         Path::new("./videos"),
//!         &DownloadOptions::default(),
//!     )
//!     .await?;
//! println!("{:?} -> {:?}", report.decision, report.final_path);
//! # Ok(())
//! # }
//! ```

mod engine;
mod error;
mod tracker;
mod update;

pub use engine::{ChannelReport, DownloadEngine, JobReport};
pub use error::{AUTH_SUGGESTION, DownloadError};
pub use tracker::TempPathTracker;
pub use update::{JobUpdate, UpdateReceiver, UpdateSender, channel};
