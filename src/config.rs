//! Explicit application configuration.
//!
//! Every component receives the paths and tool locations it needs from an
//! [`AppConfig`]; nothing reads environment variables after start-up.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::sweeper::DEFAULT_STALE_AFTER;
use crate::ytdlp::CookieSource;

/// Application directory name under the platform data/config roots.
pub const APP_DIR_NAME: &str = "quicktube";

/// Accepted range for the stale-file threshold, in hours.
pub const STALE_AFTER_HOURS_RANGE: std::ops::RangeInclusive<u64> = 1..=720;

const SETTINGS_FILE: &str = "settings.json";
const HISTORY_FILE: &str = "download_history.json";
const ANALYSIS_CACHE_FILE: &str = "analysis_cache.json";

/// Errors building an [`AppConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Neither `XDG_DATA_HOME` nor `HOME` is set.
    #[error("cannot determine data directory: set XDG_DATA_HOME or HOME")]
    NoDataDir,

    /// `stale_after_hours` outside the accepted range.
    #[error("invalid stale_after_hours {value}: expected 1..=720")]
    InvalidStaleAfter {
        /// Rejected value.
        value: u64,
    },

    /// Both a cookies file and a browser were configured.
    #[error("cookies_file and cookies_from_browser are mutually exclusive")]
    ConflictingCookies,
}

/// Resolved paths, tool locations and thresholds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Temp Store; yt-dlp writes here only.
    pub temp_dir: PathBuf,
    /// Default destination folder.
    pub download_dir: PathBuf,
    /// Settings, history and analysis cache live here.
    pub data_dir: PathBuf,
    pub ytdlp_path: PathBuf,
    pub ffprobe_path: PathBuf,
    pub ffmpeg_path: PathBuf,
    /// Age after which the sweeper deletes temp files.
    pub stale_after: Duration,
    pub cookies: CookieSource,
}

impl AppConfig {
    /// Builds the default configuration from the process environment.
    ///
    /// Data lives in `$XDG_DATA_HOME/quicktube` (or `~/.local/share/quicktube`),
    /// downloads go to `~/Downloads/QuickTube`, and tools are looked up on `PATH`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoDataDir`] when no data directory can be derived.
    pub fn from_env() -> Result<Self, ConfigError> {
        let data_dir = default_data_dir().ok_or(ConfigError::NoDataDir)?;
        let download_dir = env_var_non_empty_os("HOME").map_or_else(
            || data_dir.join("downloads"),
            |home| PathBuf::from(home).join("Downloads").join("QuickTube"),
        );
        let mut config = Self::with_root(&data_dir);
        config.download_dir = download_dir;
        Ok(config)
    }

    /// Self-contained layout under `root`: `temp/`, `downloads/`, and `root`
    /// itself as the data directory.
    #[must_use]
    pub fn with_root(root: &Path) -> Self {
        Self {
            temp_dir: root.join("temp"),
            download_dir: root.join("downloads"),
            data_dir: root.to_path_buf(),
            ytdlp_path: PathBuf::from("yt-dlp"),
            ffprobe_path: PathBuf::from("ffprobe"),
            ffmpeg_path: PathBuf::from("ffmpeg"),
            stale_after: DEFAULT_STALE_AFTER,
            cookies: CookieSource::None,
        }
    }

    /// Sets the stale threshold from hours.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidStaleAfter`] outside 1..=720.
    pub fn set_stale_after_hours(&mut self, hours: u64) -> Result<(), ConfigError> {
        if !STALE_AFTER_HOURS_RANGE.contains(&hours) {
            return Err(ConfigError::InvalidStaleAfter { value: hours });
        }
        self.stale_after = Duration::from_secs(hours * 3600);
        Ok(())
    }

    /// Sets the cookie source from the two mutually exclusive options.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ConflictingCookies`] when both are given.
    pub fn set_cookies(
        &mut self,
        file: Option<PathBuf>,
        browser: Option<String>,
    ) -> Result<(), ConfigError> {
        self.cookies = match (file, browser) {
            (Some(_), Some(_)) => return Err(ConfigError::ConflictingCookies),
            (Some(file), None) => CookieSource::File(file),
            (None, Some(browser)) => CookieSource::Browser(browser),
            (None, None) => CookieSource::None,
        };
        Ok(())
    }

    #[must_use]
    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join(SETTINGS_FILE)
    }

    #[must_use]
    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join(HISTORY_FILE)
    }

    #[must_use]
    pub fn analysis_cache_path(&self) -> PathBuf {
        self.data_dir.join(ANALYSIS_CACHE_FILE)
    }
}

/// `$XDG_DATA_HOME/quicktube`, falling back to `$HOME/.local/share/quicktube`.
#[must_use]
pub fn default_data_dir() -> Option<PathBuf> {
    if let Some(xdg) = env_var_non_empty_os("XDG_DATA_HOME") {
        return Some(PathBuf::from(xdg).join(APP_DIR_NAME));
    }
    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR_NAME),
    )
}

/// `$XDG_CONFIG_HOME/quicktube/config.toml`, falling back to
/// `$HOME/.config/quicktube/config.toml`.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    if let Some(xdg) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg).join(APP_DIR_NAME).join("config.toml"));
    }
    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(APP_DIR_NAME)
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_with_root_layout() {
        let config = AppConfig::with_root(Path::new("/srv/qt"));
        assert_eq!(config.temp_dir, PathBuf::from("/srv/qt/temp"));
        assert_eq!(config.download_dir, PathBuf::from("/srv/qt/downloads"));
        assert_eq!(config.settings_path(), PathBuf::from("/srv/qt/settings.json"));
        assert_eq!(
            config.history_path(),
            PathBuf::from("/srv/qt/download_history.json")
        );
        assert_eq!(config.stale_after, DEFAULT_STALE_AFTER);
        assert_ne!(config.temp_dir, config.download_dir);
    }

    #[test]
    fn test_stale_after_hours_range() {
        let mut config = AppConfig::with_root(Path::new("/x"));
        config.set_stale_after_hours(48).unwrap();
        assert_eq!(config.stale_after, Duration::from_secs(48 * 3600));
        assert!(matches!(
            config.set_stale_after_hours(0),
            Err(ConfigError::InvalidStaleAfter { value: 0 })
        ));
        assert!(config.set_stale_after_hours(721).is_err());
    }

    #[test]
    fn test_cookies_are_exclusive() {
        let mut config = AppConfig::with_root(Path::new("/x"));
        config
            .set_cookies(None, Some("firefox".to_string()))
            .unwrap();
        assert_eq!(config.cookies, CookieSource::Browser("firefox".to_string()));
        assert!(matches!(
            config.set_cookies(Some(PathBuf::from("c.txt")), Some("chrome".to_string())),
            Err(ConfigError::ConflictingCookies)
        ));
    }
}
