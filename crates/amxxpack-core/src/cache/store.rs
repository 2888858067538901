use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

use super::{CacheError, Result};

/// Key-value backing of the plugins cache
///
/// Loaded and persisted wholesale; callers never stream entries.
pub trait CacheStore: Send {
    fn get(&self, key: &str) -> Option<&str>;
    fn set(&mut self, key: String, value: String);
    fn delete(&mut self, key: &str);

    /// Replace the contents with the persisted state at `path`.
    ///
    /// A missing or unreadable file yields an empty store.
    fn load(&mut self, path: &Path);

    fn save(&self, path: &Path) -> Result<()>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Flat key -> hex digest map persisted as one JSON object
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsonCacheStore {
    entries: BTreeMap<String, String>,
}

impl JsonCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }
}

impl CacheStore for JsonCacheStore {
    fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    fn set(&mut self, key: String, value: String) {
        self.entries.insert(key, value);
    }

    fn delete(&mut self, key: &str) {
        self.entries.remove(key);
    }

    fn load(&mut self, path: &Path) {
        self.entries.clear();

        if !path.exists() {
            debug!("No cache file found at {}", path.display());
            return;
        }

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read cache file {}: {}", path.display(), e);
                return;
            }
        };

        match serde_json::from_str::<BTreeMap<String, String>>(&content) {
            Ok(entries) => {
                debug!("Loaded {} cache entries", entries.len());
                self.entries = entries;
            }
            Err(e) => warn!("Corrupted cache file {}: {}", path.display(), e),
        }
    }

    fn save(&self, path: &Path) -> Result<()> {
        let io_error = |source| CacheError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }

        let json = serde_json::to_string(&self.entries)?;
        std::fs::write(path, json).map_err(io_error)?;

        debug!("Saved {} cache entries", self.entries.len());
        Ok(())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
