//! Optional config file with defaults for paths, tools and verbosity.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use quicktube_core::config::{STALE_AFTER_HOURS_RANGE, default_config_path};

/// Values read from `config.toml`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    pub temp_dir: Option<PathBuf>,
    pub download_dir: Option<PathBuf>,
    /// Settings, history and analysis cache location.
    pub data_dir: Option<PathBuf>,
    pub ytdlp_path: Option<PathBuf>,
    pub ffprobe_path: Option<PathBuf>,
    pub ffmpeg_path: Option<PathBuf>,
    /// Age in hours after which temp files are swept.
    pub stale_after_hours: Option<u64>,
    pub cookies_file: Option<PathBuf>,
    pub cookies_from_browser: Option<String>,
    pub verbosity: Option<VerbositySetting>,
}

impl FileConfig {
    /// Validates values that parse but are out of range or contradictory.
    pub fn validate(&self) -> Result<()> {
        if let Some(hours) = self.stale_after_hours
            && !STALE_AFTER_HOURS_RANGE.contains(&hours)
        {
            bail!(
                "Invalid config value for `stale_after_hours`: {hours}. Expected range: {}..={}",
                STALE_AFTER_HOURS_RANGE.start(),
                STALE_AFTER_HOURS_RANGE.end()
            );
        }
        if self.cookies_file.is_some() && self.cookies_from_browser.is_some() {
            bail!("`cookies_file` and `cookies_from_browser` cannot both be set");
        }
        if let Some(browser) = &self.cookies_from_browser
            && browser.trim().is_empty()
        {
            bail!("Invalid config value for `cookies_from_browser`: expected a browser name");
        }
        Ok(())
    }
}

/// Supported config verbosity labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbositySetting {
    Default,
    Verbose,
    Quiet,
    Debug,
}

impl VerbositySetting {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Verbose => "verbose",
            Self::Quiet => "quiet",
            Self::Debug => "debug",
        }
    }
}

/// Where the config came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when the file exists.
    pub config: Option<FileConfig>,
}

impl LoadedConfig {
    #[must_use]
    pub fn loaded_from_file(&self) -> bool {
        self.config.is_some()
    }
}

/// Loads config from the default path if present.
pub fn load_default_file_config() -> Result<LoadedConfig> {
    let path = default_config_path();
    let config = match path.as_deref() {
        Some(path) if path.exists() => Some(load_file_config(path)?),
        _ => None,
    };
    Ok(LoadedConfig { path, config })
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line_no = line_index + 1;
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_no}: expected key = value");
        };
        let key = raw_key.trim();
        let value = raw_value.trim();
        let invalid = || format!("Invalid `{key}` value on line {line_no}");

        match key {
            "temp_dir" => cfg.temp_dir = Some(parse_path(value).with_context(invalid)?),
            "download_dir" => cfg.download_dir = Some(parse_path(value).with_context(invalid)?),
            "data_dir" => cfg.data_dir = Some(parse_path(value).with_context(invalid)?),
            "ytdlp_path" => cfg.ytdlp_path = Some(parse_path(value).with_context(invalid)?),
            "ffprobe_path" => cfg.ffprobe_path = Some(parse_path(value).with_context(invalid)?),
            "ffmpeg_path" => cfg.ffmpeg_path = Some(parse_path(value).with_context(invalid)?),
            "cookies_file" => cfg.cookies_file = Some(parse_path(value).with_context(invalid)?),
            "stale_after_hours" => {
                cfg.stale_after_hours = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "cookies_from_browser" => {
                cfg.cookies_from_browser =
                    Some(parse_string_literal(value).with_context(invalid)?);
            }
            "verbosity" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                cfg.verbosity = Some(parse_verbosity(&parsed).with_context(|| {
                    format!("Invalid `verbosity` value '{parsed}' on line {line_no}")
                })?);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_no}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_path(raw_value: &str) -> Result<PathBuf> {
    let value = parse_string_literal(raw_value)?;
    if value.trim().is_empty() {
        bail!("Expected a non-empty path");
    }
    Ok(PathBuf::from(value))
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

fn parse_verbosity(value: &str) -> Result<VerbositySetting> {
    match value {
        "default" => Ok(VerbositySetting::Default),
        "verbose" => Ok(VerbositySetting::Verbose),
        "quiet" => Ok(VerbositySetting::Quiet),
        "debug" => Ok(VerbositySetting::Debug),
        _ => bail!("Expected one of: default, verbose, quiet, debug"),
    }
}
