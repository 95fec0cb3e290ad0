//! Persisted invocation cache.
//!
//! Maps a CLI name to the token list of its last successful invocation so a
//! cacheable CLI invoked bare can replay it.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Read/write access to cached token lists.
pub trait Cache {
    /// Whether anything was modified since load.
    fn changed(&self) -> bool;
    fn mark_changed(&mut self);
    fn cache(&mut self) -> &mut BTreeMap<String, Vec<String>>;
}

/// In-memory cache, used when persistence is disabled.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    entries: BTreeMap<String, Vec<String>>,
    changed: bool,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Cache for MemoryCache {
    fn changed(&self) -> bool {
        self.changed
    }

    fn mark_changed(&mut self) {
        self.changed = true;
    }

    fn cache(&mut self) -> &mut BTreeMap<String, Vec<String>> {
        &mut self.entries
    }
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Failed to read cache file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse cache file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write cache file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheFile {
    #[serde(default)]
    entries: BTreeMap<String, Vec<String>>,
}

/// JSON-file backed cache.
#[derive(Debug)]
pub struct FileCache {
    path: PathBuf,
    entries: BTreeMap<String, Vec<String>>,
    changed: bool,
}

impl FileCache {
    /// Load the cache file. A missing file is an empty cache.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let path = path.into();
        let entries = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|e| CacheError::ReadError {
                path: path.clone(),
                source: e,
            })?;
            let file: CacheFile =
                serde_json::from_str(&content).map_err(|e| CacheError::ParseError {
                    path: path.clone(),
                    source: e,
                })?;
            file.entries
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path,
            entries,
            changed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the cache back, only if it changed.
    pub fn save(&self) -> Result<(), CacheError> {
        if !self.changed {
            return Ok(());
        }
        let write_error = |e| CacheError::WriteError {
            path: self.path.clone(),
            source: e,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_error)?;
        }
        let file = CacheFile {
            entries: self.entries.clone(),
        };
        let content = serde_json::to_string_pretty(&file).map_err(|e| CacheError::WriteError {
            path: self.path.clone(),
            source: e.into(),
        })?;
        fs::write(&self.path, content).map_err(write_error)?;
        tracing::debug!(path = %self.path.display(), "cache saved");
        Ok(())
    }
}

impl Cache for FileCache {
    fn changed(&self) -> bool {
        self.changed
    }

    fn mark_changed(&mut self) {
        self.changed = true;
    }

    fn cache(&mut self) -> &mut BTreeMap<String, Vec<String>> {
        &mut self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = FileCache::load(dir.path().join("cache.json")).unwrap();
        assert!(cache.cache().is_empty());
        assert!(!cache.changed());
    }

    #[test]
    fn test_save_only_when_changed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cache.json");

        let mut cache = FileCache::load(&path).unwrap();
        cache.cache().insert("goto".into(), vec!["/tmp".into()]);
        cache.save().unwrap();
        assert!(!path.exists());

        cache.mark_changed();
        cache.save().unwrap();
        let mut reloaded = FileCache::load(&path).unwrap();
        assert_eq!(reloaded.cache().get("goto").unwrap(), &["/tmp".to_string()]);
    }

    #[test]
    fn test_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(&path, "not json").unwrap();
        let err = FileCache::load(&path).unwrap_err();
        assert!(matches!(err, CacheError::ParseError { .. }));
    }
}
