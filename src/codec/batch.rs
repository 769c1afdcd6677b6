//! Folder-wide compatibility analysis.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::warn;
use walkdir::WalkDir;

use super::compat::CompatibilityLevel;
use super::probe::{MediaInfo, probe};

/// Extensions scanned by [`batch_analyze`].
pub const VIDEO_EXTENSIONS: [&str; 6] = ["mp4", "mkv", "mov", "webm", "avi", "m4v"];

/// Video files under `folder`, recursively, sorted by path.
#[must_use]
pub fn find_video_files(folder: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(folder)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry.path().extension().is_some_and(|ext| {
                let ext = ext.to_string_lossy().to_ascii_lowercase();
                VIDEO_EXTENSIONS.contains(&ext.as_str())
            })
        })
        .map(walkdir::DirEntry::into_path)
        .collect();
    files.sort();
    files
}

/// Probes every video file under `folder`. Files ffprobe cannot read are
/// logged and left out.
pub async fn batch_analyze(ffprobe: &Path, folder: &Path) -> Vec<MediaInfo> {
    let mut results = Vec::new();
    for path in find_video_files(folder) {
        match probe(ffprobe, &path).await {
            Ok(info) => results.push(info),
            Err(e) => warn!(path = %path.display(), error = %e, "could not analyze file"),
        }
    }
    results
}

/// Counts over a set of analyzed files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompatibilitySummary {
    pub total: usize,
    pub by_compatibility: BTreeMap<String, usize>,
    pub by_video_codec: BTreeMap<String, usize>,
    pub by_audio_codec: BTreeMap<String, usize>,
    pub files_needing_conversion: Vec<PathBuf>,
}

impl CompatibilitySummary {
    #[must_use]
    pub fn from_infos(infos: &[MediaInfo]) -> Self {
        let mut summary = Self {
            total: infos.len(),
            by_compatibility: CompatibilityLevel::ALL
                .iter()
                .map(|level| (level.as_str().to_string(), 0))
                .collect(),
            ..Self::default()
        };
        for info in infos {
            *summary
                .by_compatibility
                .entry(info.compatibility.as_str().to_string())
                .or_default() += 1;
            *summary
                .by_video_codec
                .entry(info.video_codec.as_str().to_string())
                .or_default() += 1;
            *summary
                .by_audio_codec
                .entry(info.audio_codec.as_str().to_string())
                .or_default() += 1;
            if info.needs_conversion() {
                summary.files_needing_conversion.push(info.path.clone());
            }
        }
        summary
    }

    #[must_use]
    pub fn needs_conversion(&self) -> usize {
        self.files_needing_conversion.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::codec::probe::parse_probe_json;
    use std::fs;
    use tempfile::TempDir;

    fn info(name: &str, video: &str, audio: &str) -> MediaInfo {
        let json = format!(
            r#"{{"streams": [
                {{"codec_type": "video", "codec_name": "{video}"}},
                {{"codec_type": "audio", "codec_name": "{audio}"}}
            ], "format": {{"format_name": "mov,mp4"}}}}"#
        );
        parse_probe_json(Path::new(name), 0, &json).unwrap()
    }

    #[test]
    fn test_find_video_files_is_recursive_and_filtered() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("a.mp4"), b"").unwrap();
        fs::write(dir.path().join("sub").join("b.MKV"), b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"").unwrap();
        fs::write(dir.path().join("c.part"), b"").unwrap();

        let files = find_video_files(dir.path());
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("a.mp4"));
        assert!(files[1].ends_with("sub/b.MKV"));
    }

    #[test]
    fn test_summary_counts() {
        let infos = vec![
            info("a.mp4", "h264", "aac"),
            info("b.mp4", "vp9", "opus"),
            info("c.mp4", "av1", "aac"),
        ];
        let summary = CompatibilitySummary::from_infos(&infos);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.by_compatibility["excellent"], 1);
        assert_eq!(summary.by_compatibility["poor"], 1);
        assert_eq!(summary.by_compatibility["very_poor"], 1);
        assert_eq!(summary.by_compatibility["moderate"], 0);
        assert_eq!(summary.by_video_codec["vp9"], 1);
        assert_eq!(summary.by_audio_codec["aac"], 2);
        assert_eq!(summary.needs_conversion(), 2);
        assert_eq!(
            summary.files_needing_conversion,
            vec![PathBuf::from("b.mp4"), PathBuf::from("c.mp4")]
        );
    }
}
