//! On-disk store for cached HTTP responses
//!
//! Holds a flat `key -> JSON value` mapping that is read from a single JSON file
//! at startup and rewritten in full whenever an entry is added.

use serde_json::{Map, Value};
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default file name for the cache, relative to the working directory
pub const DEFAULT_CACHE_FILE: &str = "nps_cache.json";

/// A flat key/value cache backed by a JSON object on disk
///
/// Entries never expire. Once a key is written it stays until the backing
/// file is removed.
#[derive(Debug, Clone)]
pub struct CacheStore {
    /// Path of the backing JSON file
    path: PathBuf,
    /// In-memory copy of the cached entries
    entries: Map<String, Value>,
}

impl CacheStore {
    /// Creates an empty store that will persist to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: Map::new(),
        }
    }

    /// Loads the store from `path`
    ///
    /// Any failure (missing file, unreadable file, malformed JSON, or a JSON
    /// document that is not an object) yields an empty store. The caller is
    /// never failed because of a bad cache file.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<Value>(&content) {
                Ok(Value::Object(map)) => map,
                Ok(_) => {
                    warn!(path = %path.display(), "cache file is not a JSON object, starting empty");
                    Map::new()
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "cache file is malformed, starting empty");
                    Map::new()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no cache file yet");
                Map::new()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cache file is unreadable, starting empty");
                Map::new()
            }
        };

        debug!(path = %path.display(), entries = entries.len(), "cache loaded");
        Self { path, entries }
    }

    /// Writes the full mapping to disk
    ///
    /// The JSON is written to a sibling temp file which is then renamed over
    /// the backing file, so readers never observe a half-written cache.
    pub fn save(&self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string(&self.entries)
            .map_err(|e| io::Error::new(ErrorKind::InvalidData, e))?;

        let temp_path = self.temp_path();
        fs::write(&temp_path, json)?;
        if let Err(e) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }
        Ok(())
    }

    /// Returns the cached value for `key`, if any
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Stores `value` under `key` in memory, replacing any previous value
    ///
    /// Call [`CacheStore::save`] to persist the change.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.entries.insert(key.into(), value);
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| DEFAULT_CACHE_FILE.into());
        name.push(format!(".{}.tmp", std::process::id()));
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn cache_path(temp_dir: &TempDir) -> PathBuf {
        temp_dir.path().join(DEFAULT_CACHE_FILE)
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");

        let store = CacheStore::load(cache_path(&temp_dir));

        assert!(store.is_empty());
    }

    #[test]
    fn test_load_malformed_file_is_empty() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = cache_path(&temp_dir);
        fs::write(&path, "{not json").expect("Should write file");

        let store = CacheStore::load(&path);

        assert!(store.is_empty());
        // Loading again is still a no-op
        assert!(CacheStore::load(&path).is_empty());
    }

    #[test]
    fn test_load_non_object_is_empty() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = cache_path(&temp_dir);
        fs::write(&path, "[1, 2, 3]").expect("Should write file");

        assert!(CacheStore::load(&path).is_empty());
    }

    #[test]
    fn test_load_directory_path_is_empty() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");

        let store = CacheStore::load(temp_dir.path());

        assert!(store.is_empty());
    }

    #[test]
    fn test_save_then_load_roundtrip() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = cache_path(&temp_dir);

        let mut store = CacheStore::new(&path);
        store.insert("https://www.nps.gov/state/mi/index.htm", json!("<html></html>"));
        store.insert(
            "http://www.mapquestapi.com/search/v2/radius?origin=49931",
            json!({"searchResults": [{"name": "Cafe"}]}),
        );
        store.save().expect("Save should succeed");

        let loaded = CacheStore::load(&path);

        assert_eq!(loaded.len(), 2);
        assert_eq!(
            loaded.get("https://www.nps.gov/state/mi/index.htm"),
            Some(&json!("<html></html>"))
        );
        assert_eq!(
            loaded.get("http://www.mapquestapi.com/search/v2/radius?origin=49931"),
            Some(&json!({"searchResults": [{"name": "Cafe"}]}))
        );
    }

    #[test]
    fn test_save_writes_single_json_object() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = cache_path(&temp_dir);

        let mut store = CacheStore::new(&path);
        store.insert("a", json!("b"));
        store.save().expect("Save should succeed");

        let content = fs::read_to_string(&path).expect("Should read file");
        let value: Value = serde_json::from_str(&content).expect("Should be valid JSON");
        assert_eq!(value, json!({"a": "b"}));
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = cache_path(&temp_dir);

        let mut store = CacheStore::new(&path);
        store.insert("a", json!(1));
        store.save().expect("Save should succeed");

        let files: Vec<_> = fs::read_dir(temp_dir.path())
            .expect("Should list dir")
            .filter_map(|e| e.ok())
            .map(|e| e.file_name())
            .collect();
        assert_eq!(files, vec![std::ffi::OsString::from(DEFAULT_CACHE_FILE)]);
    }

    #[test]
    fn test_save_creates_parent_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("nested").join("cache.json");

        let mut store = CacheStore::new(&path);
        store.insert("k", json!("v"));
        store.save().expect("Save should succeed");

        assert!(path.exists());
    }

    #[test]
    fn test_insert_overwrites_existing_key() {
        let mut store = CacheStore::new("unused.json");
        store.insert("k", json!("first"));
        store.insert("k", json!("second"));

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("k"), Some(&json!("second")));
        assert!(store.get("other").is_none());
    }
}
