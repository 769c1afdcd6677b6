//! Cache of visual-analysis results.
//!
//! Scene classification itself runs elsewhere; this module keeps its
//! results keyed by URL so a video is never analyzed twice, and turns the
//! stored detections into clips.
//!
//! ```
//! use quicktube_core::analysis::seconds_to_timestamp;
//!
//! assert_eq!(seconds_to_timestamp(3725.0), "01:02:05");
//! ```

mod clips;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::json_store::{StoreError, load_or_default, save_pretty};
use crate::source::url_key;

pub use clips::{
    Clip, ClipParams, Detection, filter_by_keywords, merge_detections_into_clips,
    seconds_to_timestamp,
};

/// Stored result of analyzing one video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub video_id: String,
    pub video_url: String,
    #[serde(default)]
    pub video_title: String,
    #[serde(default)]
    pub duration_seconds: f64,
    /// RFC 3339 timestamp of the analysis run.
    #[serde(default)]
    pub analyzed_date: String,
    #[serde(default)]
    pub total_detections: usize,
    #[serde(default)]
    pub detections: Vec<Detection>,
    /// Free-form parameters of the run (model, thresholds, sampling rate).
    #[serde(default)]
    pub analysis_params: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct CacheDocument {
    #[serde(default)]
    videos: BTreeMap<String, AnalysisRecord>,
    #[serde(default)]
    last_updated: Option<String>,
}

/// The on-disk analysis cache.
#[derive(Debug, Clone)]
pub struct AnalysisCache {
    path: PathBuf,
    document: CacheDocument,
}

impl AnalysisCache {
    /// Loads the cache, starting empty when the file is missing or corrupt.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            document: load_or_default(path),
        }
    }

    /// Previously stored result for `url`.
    #[must_use]
    pub fn lookup(&self, url: &str) -> Option<&AnalysisRecord> {
        self.document.videos.get(&url_key(url))
    }

    #[must_use]
    pub fn contains(&self, url: &str) -> bool {
        self.lookup(url).is_some()
    }

    /// Stores `record` under its URL's key, replacing any earlier result.
    pub fn insert(&mut self, record: AnalysisRecord) {
        let key = url_key(&record.video_url);
        debug!(key = %key, url = %record.video_url, "caching analysis result");
        self.document.videos.insert(key, record);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.document.videos.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.document.videos.is_empty()
    }

    #[must_use]
    pub fn last_updated(&self) -> Option<&str> {
        self.document.last_updated.as_deref()
    }

    /// Stamps `last_updated` and writes the cache back.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the file cannot be written.
    pub fn save(&mut self) -> Result<(), StoreError> {
        self.document.last_updated = Some(Utc::now().to_rfc3339());
        save_pretty(&self.path, &self.document)
    }
}
