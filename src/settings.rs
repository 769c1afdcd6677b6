//! Persisted user preferences.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::json_store::{StoreError, load_or_default, save_pretty};
use crate::ytdlp::{DownloadOptions, OutputFormat, Quality};

/// Keys accepted by [`Settings::set`], in display order.
pub const SETTING_KEYS: [&str; 7] = [
    "video_quality",
    "audio_only",
    "output_format",
    "download_folder",
    "check_compatibility",
    "auto_convert",
    "prefer_h264",
];

/// User preferences stored as `settings.json`.
///
/// Unknown fields are ignored and missing ones take their defaults, so older
/// files keep loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub video_quality: Quality,
    pub audio_only: bool,
    pub output_format: OutputFormat,
    /// Overrides the configured download directory when set.
    pub download_folder: Option<PathBuf>,
    /// Probe finished downloads with ffprobe.
    pub check_compatibility: bool,
    /// Convert poorly compatible downloads automatically.
    pub auto_convert: bool,
    pub prefer_h264: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            video_quality: Quality::Best,
            audio_only: false,
            output_format: OutputFormat::Mp4,
            download_folder: None,
            check_compatibility: true,
            auto_convert: false,
            prefer_h264: true,
        }
    }
}

impl Settings {
    /// Loads settings, using defaults when the file is missing or corrupt.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        load_or_default(path)
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] when the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        save_pretty(path, self)
    }

    /// Download options implied by these settings.
    #[must_use]
    pub fn download_options(&self) -> DownloadOptions {
        DownloadOptions {
            quality: self.video_quality,
            audio_only: self.audio_only,
            format: self.output_format,
            prefer_h264: self.prefer_h264,
            ..DownloadOptions::default()
        }
    }

    /// Current value of `key` as text.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownKey`] for keys outside [`SETTING_KEYS`].
    pub fn get(&self, key: &str) -> Result<String, StoreError> {
        let value = match key {
            "video_quality" => self.video_quality.to_string(),
            "audio_only" => self.audio_only.to_string(),
            "output_format" => self.output_format.to_string(),
            "download_folder" => self
                .download_folder
                .as_ref()
                .map_or_else(String::new, |p| p.display().to_string()),
            "check_compatibility" => self.check_compatibility.to_string(),
            "auto_convert" => self.auto_convert.to_string(),
            "prefer_h264" => self.prefer_h264.to_string(),
            _ => {
                return Err(StoreError::UnknownKey {
                    key: key.to_string(),
                });
            }
        };
        Ok(value)
    }

    /// Parses `value` and assigns it to `key`. An empty `download_folder`
    /// clears the override.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownKey`] or [`StoreError::InvalidValue`].
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        match key {
            "video_quality" => {
                self.video_quality = value
                    .parse()
                    .map_err(|e: String| StoreError::invalid_value(key, e))?;
            }
            "audio_only" => self.audio_only = parse_bool(key, value)?,
            "output_format" => {
                self.output_format = value
                    .parse()
                    .map_err(|e: String| StoreError::invalid_value(key, e))?;
            }
            "download_folder" => {
                let value = value.trim();
                self.download_folder = (!value.is_empty()).then(|| PathBuf::from(value));
            }
            "check_compatibility" => self.check_compatibility = parse_bool(key, value)?,
            "auto_convert" => self.auto_convert = parse_bool(key, value)?,
            "prefer_h264" => self.prefer_h264 = parse_bool(key, value)?,
            _ => {
                return Err(StoreError::UnknownKey {
                    key: key.to_string(),
                });
            }
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, StoreError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(StoreError::invalid_value(key, "expected true or false")),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.video_quality, Quality::Best);
        assert!(settings.check_compatibility);
        assert!(!settings.auto_convert);
        assert!(settings.prefer_h264);
    }

    #[test]
    fn test_round_trip_through_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let mut settings = Settings::default();
        settings.set("video_quality", "720").unwrap();
        settings.set("audio_only", "yes").unwrap();
        settings.set("download_folder", "/media/videos").unwrap();
        settings.save(&path).unwrap();

        let loaded = Settings::load(&path);
        assert_eq!(loaded, settings);
        assert_eq!(loaded.get("video_quality").unwrap(), "720p");
        assert_eq!(loaded.get("download_folder").unwrap(), "/media/videos");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"audio_only": true, "theme": "dark"}"#).unwrap();
        let settings = Settings::load(&path);
        assert!(settings.audio_only);
        assert_eq!(settings.output_format, OutputFormat::Mp4);
    }

    #[test]
    fn test_set_rejects_bad_input() {
        let mut settings = Settings::default();
        assert!(matches!(
            settings.set("colour", "red"),
            Err(StoreError::UnknownKey { .. })
        ));
        assert!(matches!(
            settings.set("auto_convert", "maybe"),
            Err(StoreError::InvalidValue { .. })
        ));
        assert!(settings.set("output_format", "avi").is_err());
    }

    #[test]
    fn test_every_key_is_readable() {
        let settings = Settings::default();
        for key in SETTING_KEYS {
            assert!(settings.get(key).is_ok(), "{key}");
        }
    }

    #[test]
    fn test_download_options_follow_settings() {
        let mut settings = Settings::default();
        settings.set("prefer_h264", "false").unwrap();
        settings.set("output_format", "mkv").unwrap();
        let options = settings.download_options();
        assert!(!options.prefer_h264);
        assert_eq!(options.format, OutputFormat::Mkv);
    }
}
