//! The staging directory yt-dlp writes into before files are reconciled.
//!
//! Every download lands here first; nothing in the Temp Store belongs to the
//! user's destination folder until the reconciler moves it out. The store is
//! also the fallback source of truth when yt-dlp output did not name the
//! produced file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use thiserror::Error;
use tracing::{debug, warn};

use crate::progress::{clean_title, is_stream_fragment};

/// Suffixes yt-dlp uses for files it is still writing.
const IN_FLIGHT_SUFFIXES: [&str; 3] = [".part", ".ytdl", ".temp"];

/// Errors raised while inspecting the Temp Store.
#[derive(Debug, Error)]
pub enum TempStoreError {
    /// Directory listing or creation failed.
    #[error("IO error in temp store at {path}: {source}")]
    Io {
        /// Path that could not be read or created.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl TempStoreError {
    /// Creates an IO error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// A file sitting in the Temp Store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TempFileRecord {
    /// Absolute path of the file.
    pub path: PathBuf,
    /// Last modification time reported by the filesystem.
    pub modified: SystemTime,
}

impl TempFileRecord {
    /// Age of the file relative to `now`; zero when the timestamp is in the future.
    #[must_use]
    pub fn age_at(&self, now: SystemTime) -> Duration {
        now.duration_since(self.modified).unwrap_or(Duration::ZERO)
    }

    /// File name as UTF-8, if representable.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|name| name.to_str())
    }

    /// True for finished, user-facing media files (not fragments or `.part` files).
    #[must_use]
    pub fn is_candidate(&self) -> bool {
        self.file_name()
            .is_some_and(|name| !is_stream_fragment(name) && !is_in_flight(name))
    }
}

fn is_in_flight(file_name: &str) -> bool {
    IN_FLIGHT_SUFFIXES
        .iter()
        .any(|suffix| file_name.ends_with(suffix))
}

/// Video title a temp file belongs to: `Clip.f137.mp4.part` -> `Clip`.
fn title_of(file_name: &str) -> String {
    let finished = IN_FLIGHT_SUFFIXES
        .iter()
        .find_map(|suffix| file_name.strip_suffix(suffix))
        .unwrap_or(file_name);
    let stem = Path::new(finished)
        .file_stem()
        .map_or_else(|| finished.to_string(), |stem| stem.to_string_lossy().into_owned());
    clean_title(&stem)
}

/// Handle to the staging directory.
#[derive(Debug, Clone)]
pub struct TempStore {
    root: PathBuf,
}

impl TempStore {
    /// Creates a handle; the directory is not touched until used.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The staging directory path.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the staging directory if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`TempStoreError::Io`] when the directory cannot be created.
    pub fn ensure_exists(&self) -> Result<(), TempStoreError> {
        fs::create_dir_all(&self.root).map_err(|e| TempStoreError::io(&self.root, e))
    }

    /// True when `path` lives directly inside the staging directory.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        path.parent().is_some_and(|parent| parent == self.root)
    }

    /// Lists every regular file directly inside the staging directory.
    ///
    /// A missing directory yields an empty list. Entries whose metadata cannot
    /// be read (removed mid-scan, permission issues) are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`TempStoreError::Io`] when the directory exists but cannot be listed.
    pub fn records(&self) -> Result<Vec<TempFileRecord>, TempStoreError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(TempStoreError::io(&self.root, e)),
        };

        let mut records = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| TempStoreError::io(&self.root, e))?;
            let path = entry.path();
            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "skipping unreadable temp entry");
                    continue;
                }
            };
            if !metadata.is_file() {
                continue;
            }
            let Ok(modified) = metadata.modified() else {
                debug!(path = %path.display(), "skipping temp entry without mtime");
                continue;
            };
            records.push(TempFileRecord { path, modified });
        }
        Ok(records)
    }

    /// Finished media files, newest first.
    ///
    /// # Errors
    ///
    /// Propagates [`TempStore::records`] errors.
    pub fn candidates(&self) -> Result<Vec<TempFileRecord>, TempStoreError> {
        let mut candidates: Vec<TempFileRecord> = self
            .records()?
            .into_iter()
            .filter(TempFileRecord::is_candidate)
            .collect();
        candidates.sort_by(|a, b| b.modified.cmp(&a.modified));
        Ok(candidates)
    }

    /// The single most recently modified finished file.
    ///
    /// This is the last-resort way to find a job's output when yt-dlp did not
    /// name it. Ordering is by modification time descending so a stale file
    /// left by an earlier session is never picked over the fresh one.
    ///
    /// # Errors
    ///
    /// Propagates [`TempStore::records`] errors.
    pub fn most_recent(&self) -> Result<Option<TempFileRecord>, TempStoreError> {
        Ok(self.candidates()?.into_iter().next())
    }

    /// Newest finished file whose title is exactly `title`.
    ///
    /// # Errors
    ///
    /// Propagates [`TempStore::records`] errors.
    pub fn find_by_title(&self, title: &str) -> Result<Option<TempFileRecord>, TempStoreError> {
        if title.is_empty() {
            return Ok(None);
        }
        Ok(self.candidates()?.into_iter().find(|record| {
            record
                .file_name()
                .is_some_and(|name| title_of(name) == title)
        }))
    }

    /// Deletes leftover stream fragments, optionally only those for `title`.
    ///
    /// Best effort: failures are logged and the file is left in place for the
    /// sweeper. Returns the paths that were removed.
    pub fn remove_fragments(&self, title: Option<&str>) -> Vec<PathBuf> {
        let records = match self.records() {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "could not list temp store for fragment cleanup");
                return Vec::new();
            }
        };

        let mut removed = Vec::new();
        for record in records {
            let Some(name) = record.file_name() else {
                continue;
            };
            if !is_stream_fragment(name) {
                continue;
            }
            if title.is_some_and(|title| title_of(name) != title) {
                continue;
            }
            match fs::remove_file(&record.path) {
                Ok(()) => {
                    debug!(path = %record.path.display(), "removed stream fragment");
                    removed.push(record.path);
                }
                Err(e) => {
                    warn!(path = %record.path.display(), error = %e, "failed to remove stream fragment");
                }
            }
        }
        removed
    }
}
