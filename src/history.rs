//! Recent-downloads list.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::json_store::{StoreError, load_or_default, save_pretty};

/// Maximum number of entries kept.
pub const HISTORY_LIMIT: usize = 20;

/// One completed download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub title: String,
    pub url: String,
    /// File name in the destination folder.
    pub filename: String,
    /// Seconds since the Unix epoch.
    pub timestamp: u64,
}

impl HistoryEntry {
    /// Creates an entry stamped with the current time.
    #[must_use]
    pub fn now(
        title: impl Into<String>,
        url: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            title: title.into(),
            url: url.into(),
            filename: filename.into(),
            timestamp,
        }
    }
}

/// Download history, newest first, unique by URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    /// Loads history, starting empty when the file is missing or corrupt.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        let mut history: Self = load_or_default(path);
        history.entries.truncate(HISTORY_LIMIT);
        history
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] when the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        save_pretty(path, self)
    }

    /// Puts `entry` at the front, dropping any older entry for the same URL
    /// and anything beyond [`HISTORY_LIMIT`].
    pub fn record(&mut self, entry: HistoryEntry) {
        self.entries.retain(|existing| existing.url != entry.url);
        self.entries.insert(0, entry);
        self.entries.truncate(HISTORY_LIMIT);
    }

    #[must_use]
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Loads, records and saves in one step.
///
/// # Errors
///
/// Returns [`StoreError`] when the file cannot be written.
pub fn append(path: &Path, entry: HistoryEntry) -> Result<(), StoreError> {
    let mut history = History::load(path);
    history.record(entry);
    history.save(path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(n: usize) -> HistoryEntry {
        HistoryEntry {
            title: format!("Video {n}"),
            url: format!("https://youtu.be/{n}"),
            filename: format!("Video {n}.mp4"),
            timestamp: n as u64,
        }
    }

    #[test]
    fn test_newest_first_and_limited() {
        let mut history = History::default();
        for n in 0..25 {
            history.record(entry(n));
        }
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history.entries()[0].title, "Video 24");
        assert_eq!(history.entries()[HISTORY_LIMIT - 1].title, "Video 5");
    }

    #[test]
    fn test_same_url_moves_to_front() {
        let mut history = History::default();
        history.record(entry(1));
        history.record(entry(2));
        let mut again = entry(1);
        again.timestamp = 99;
        history.record(again);

        assert_eq!(history.len(), 2);
        assert_eq!(history.entries()[0].timestamp, 99);
        assert_eq!(history.entries()[1].title, "Video 2");
    }

    #[test]
    fn test_append_round_trips_through_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("download_history.json");
        append(&path, entry(1)).unwrap();
        append(&path, entry(2)).unwrap();

        let history = History::load(&path);
        assert_eq!(history.len(), 2);
        assert_eq!(history.entries()[0].url, "https://youtu.be/2");
        assert!(std::fs::read_to_string(&path).unwrap().starts_with('['));
    }

    #[test]
    fn test_corrupt_history_loads_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("download_history.json");
        std::fs::write(&path, "[{\"title\": 1}").unwrap();
        assert!(History::load(&path).is_empty());
    }
}
