//! Working out which Temp Store file a yt-dlp run produced.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::progress::{EventKind, OutputSource, ProgressEvent, clean_title, extract_output, is_stream_fragment};
use crate::temp_store::{TempStore, TempStoreError};

/// Collects file paths named in yt-dlp output.
///
/// Priority when resolving: cache hit, merger output, post-processor
/// destination, last non-fragment download destination, newest file with
/// the same title, newest file in the store.
#[derive(Debug, Default, Clone)]
pub struct TempPathTracker {
    cache_hit: Option<PathBuf>,
    merger: Option<PathBuf>,
    post_processor: Option<PathBuf>,
    destination: Option<PathBuf>,
    title: Option<String>,
}

impl TempPathTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records any path `event` mentions and returns it, fragments included.
    pub fn observe(&mut self, event: &ProgressEvent) -> Option<PathBuf> {
        if event.kind() == EventKind::CacheHit {
            let path = event.path()?.to_path_buf();
            self.note_title(&path);
            self.cache_hit = Some(path.clone());
            return Some(path);
        }

        let (source, path) = extract_output(event.raw())?;
        self.note_title(&path);
        match source {
            OutputSource::Merger => self.merger = Some(path.clone()),
            OutputSource::PostProcessor => self.post_processor = Some(path.clone()),
            OutputSource::Download => {
                let is_fragment = path
                    .file_name()
                    .is_some_and(|name| is_stream_fragment(&name.to_string_lossy()));
                if !is_fragment {
                    self.destination = Some(path.clone());
                }
            }
        }
        Some(path)
    }

    /// Title derived from the first file name yt-dlp reported.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    #[must_use]
    pub fn cache_hit(&self) -> Option<&Path> {
        self.cache_hit.as_deref()
    }

    fn note_title(&mut self, path: &Path) {
        if self.title.is_some() {
            return;
        }
        if let Some(stem) = path.file_stem() {
            let title = clean_title(&stem.to_string_lossy());
            if !title.is_empty() {
                self.title = Some(title);
            }
        }
    }

    /// Picks the produced file, checking that it exists on disk.
    ///
    /// # Errors
    ///
    /// Returns [`TempStoreError`] when the fallback scan cannot list the store.
    pub fn resolve(&self, store: &TempStore) -> Result<Option<PathBuf>, TempStoreError> {
        let reported = [
            &self.cache_hit,
            &self.merger,
            &self.post_processor,
            &self.destination,
        ];
        for candidate in reported.into_iter().flatten() {
            if let Some(path) = existing(store, candidate) {
                debug!(path = %path.display(), "temp file named by yt-dlp output");
                return Ok(Some(path));
            }
        }

        if let Some(title) = self.title.as_deref()
            && let Some(record) = store.find_by_title(title)?
        {
            debug!(path = %record.path.display(), "temp file matched by title");
            return Ok(Some(record.path));
        }

        let fallback = store.most_recent()?.map(|record| record.path);
        if let Some(path) = &fallback {
            debug!(path = %path.display(), "temp file chosen by modification time");
        }
        Ok(fallback)
    }
}

/// `candidate` if it exists; relative paths are also tried under the store root.
fn existing(store: &TempStore, candidate: &Path) -> Option<PathBuf> {
    if candidate.is_file() {
        return Some(candidate.to_path_buf());
    }
    if candidate.is_relative() {
        let joined = store.root().join(candidate.file_name()?);
        if joined.is_file() {
            return Some(joined);
        }
    }
    None
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::progress::classify_line;
    use std::fs::File;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn feed(tracker: &mut TempPathTracker, line: &str) -> Option<PathBuf> {
        classify_line(line).and_then(|event| tracker.observe(&event))
    }

    fn touch(dir: &TempDir, name: &str, age: Duration) -> PathBuf {
        let path = dir.path().join(name);
        let file = File::create(&path).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
        path
    }

    #[test]
    fn test_merger_beats_destination() {
        let dir = TempDir::new().unwrap();
        let merged = touch(&dir, "Clip.mp4", Duration::from_secs(10));
        let store = TempStore::new(dir.path());

        let mut tracker = TempPathTracker::new();
        feed(&mut tracker, &format!("[download] Destination: {}/Clip.f137.mp4", dir.path().display()));
        feed(&mut tracker, &format!("[Merger] Merging formats into \"{}\"", merged.display()));

        assert_eq!(tracker.resolve(&store).unwrap(), Some(merged));
        assert_eq!(tracker.title(), Some("Clip"));
    }

    #[test]
    fn test_cache_hit_overrides_newer_files() {
        let dir = TempDir::new().unwrap();
        let cached = touch(&dir, "Old Video.mp4", Duration::from_secs(3600));
        touch(&dir, "Newer.mp4", Duration::from_secs(1));
        let store = TempStore::new(dir.path());

        let mut tracker = TempPathTracker::new();
        feed(
            &mut tracker,
            &format!("[download] {} has already been downloaded", cached.display()),
        );
        assert_eq!(tracker.cache_hit(), Some(cached.as_path()));
        assert_eq!(tracker.resolve(&store).unwrap(), Some(cached));
    }

    #[test]
    fn test_missing_reported_path_falls_back_to_title_then_mtime() {
        let dir = TempDir::new().unwrap();
        let titled = touch(&dir, "Song.webm", Duration::from_secs(60));
        touch(&dir, "Other.mp4", Duration::from_secs(1));
        let store = TempStore::new(dir.path());

        let mut tracker = TempPathTracker::new();
        feed(&mut tracker, &format!("[download] Destination: {}/Song.f251.webm", dir.path().display()));
        assert_eq!(tracker.resolve(&store).unwrap(), Some(titled));

        let untitled = TempPathTracker::new();
        assert_eq!(
            untitled.resolve(&store).unwrap(),
            Some(dir.path().join("Other.mp4"))
        );
    }

    #[test]
    fn test_observe_reports_fragment_paths_without_resolving_to_them() {
        let dir = TempDir::new().unwrap();
        let fragment = dir.path().join("Clip.f137.mp4");
        let mut tracker = TempPathTracker::new();

        let seen = feed(&mut tracker, &format!("[download] Destination: {}", fragment.display()));
        assert_eq!(seen, Some(fragment));
        assert_eq!(feed(&mut tracker, "[download]  42.0% of 10.00MiB at 1.00MiB/s ETA 00:05"), None);
        assert!(tracker.destination.is_none());
    }

    #[test]
    fn test_empty_store_resolves_to_none() {
        let dir = TempDir::new().unwrap();
        let store = TempStore::new(dir.path());
        assert_eq!(TempPathTracker::new().resolve(&store).unwrap(), None);
    }
}
