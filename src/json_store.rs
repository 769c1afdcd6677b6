//! Pretty-printed JSON documents on disk.
//!
//! Missing or corrupt documents load as their default value with a warning;
//! saves go through a sibling temp file and a rename.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors reading, writing or editing persisted documents.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A settings key that does not exist.
    #[error("unknown setting '{key}'")]
    UnknownKey { key: String },

    /// A settings value that does not parse for its key.
    #[error("invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_value(key: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

/// Reads `path` as JSON, falling back to `T::default()` when the file is
/// missing, unreadable or malformed.
#[must_use]
pub fn load_or_default<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no saved document, using defaults");
            return T::default();
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read document, using defaults");
            return T::default();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "corrupt document, using defaults");
            T::default()
        }
    }
}

/// Writes `value` as pretty JSON, creating parent directories.
///
/// # Errors
///
/// Returns [`StoreError::Json`] if encoding fails and [`StoreError::Io`] if
/// the file cannot be written or renamed into place.
pub fn save_pretty<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let encoded = serde_json::to_string_pretty(value).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }
    let mut staging = path.as_os_str().to_owned();
    staging.push(".tmp");
    let staging = PathBuf::from(staging);
    fs::write(&staging, encoded).map_err(|e| StoreError::io(&staging, e))?;
    fs::rename(&staging, path).map_err(|e| StoreError::io(path, e))?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Doc {
        name: String,
        count: u32,
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let doc: Doc = load_or_default(&dir.path().join("absent.json"));
        assert_eq!(doc, Doc::default());
    }

    #[test]
    fn test_corrupt_file_is_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.json");
        fs::write(&path, "{ not json").unwrap();
        let doc: Doc = load_or_default(&path);
        assert_eq!(doc, Doc::default());
    }

    #[test]
    fn test_save_creates_parents_and_leaves_no_staging_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("doc.json");
        let doc = Doc {
            name: "x".to_string(),
            count: 3,
        };
        save_pretty(&path, &doc).unwrap();
        assert_eq!(load_or_default::<Doc>(&path), doc);
        assert!(!dir.path().join("nested").join("doc.json.tmp").exists());
        assert!(fs::read_to_string(&path).unwrap().contains("\n  \"name\""));
    }
}
