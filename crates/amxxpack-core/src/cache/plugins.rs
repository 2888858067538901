use std::path::{Path, PathBuf};
use tracing::debug;

use super::{
    cache_key, hash_file, hash_include_dirs, CacheStore, CacheValueKind, JsonCacheStore, Result,
    INCLUDES_SUBJECT,
};
use crate::INCLUDE_EXT;

/// Tracks which plugins are up to date with their sources.
///
/// A plugin is up to date when the source hash, the plugin hash and the
/// include fingerprint all match what was recorded after its last
/// successful compile. The include fingerprint is project-wide: any change
/// under any include root invalidates every plugin.
pub struct PluginsCache {
    project_root: PathBuf,
    store: Box<dyn CacheStore>,
}

impl PluginsCache {
    /// Create an empty cache backed by a JSON store
    pub fn new(project_root: &Path) -> Self {
        Self::with_store(project_root, Box::new(JsonCacheStore::new()))
    }

    /// Create a cache over a custom backing store
    pub fn with_store(project_root: &Path, store: Box<dyn CacheStore>) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            store,
        }
    }

    pub fn load(&mut self, cache_file: &Path) {
        self.store.load(cache_file);
    }

    pub fn save(&self, cache_file: &Path) -> Result<()> {
        self.store.save(cache_file)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Check whether `plugin_path` is a current build of `src_path`.
    ///
    /// Never fails: missing entries, missing files and read errors all
    /// count as "not up to date".
    pub fn is_up_to_date(&self, src_path: &Path, plugin_path: &Path) -> bool {
        let Some(cached_src) = self.get(src_path, CacheValueKind::Source) else {
            return false;
        };

        match hash_file(src_path) {
            Ok(hash) if hash == cached_src => {}
            _ => return false,
        }

        let Some(cached_plugin) = self.get(src_path, CacheValueKind::Compiled) else {
            return false;
        };

        match hash_file(plugin_path) {
            Ok(hash) if hash == cached_plugin => {}
            _ => return false,
        }

        let current_includes = self.store.get(&self.key(INCLUDES_SUBJECT, CacheValueKind::Includes));
        let recorded_includes = self.get(src_path, CacheValueKind::Includes);

        current_includes.is_some() && current_includes == recorded_includes
    }

    /// Record the state of a freshly compiled plugin.
    ///
    /// Only call after a successful compile. A file that cannot be hashed
    /// leaves its entry absent, so the next check reports "not up to date".
    pub fn record_compiled(&mut self, src_path: &Path, plugin_path: &Path) {
        self.record_file(src_path, src_path, CacheValueKind::Source);
        self.record_file(src_path, plugin_path, CacheValueKind::Compiled);

        let includes_key = self.key_for(src_path, CacheValueKind::Includes);
        let fingerprint = self
            .store
            .get(&self.key(INCLUDES_SUBJECT, CacheValueKind::Includes))
            .map(str::to_string);

        match fingerprint {
            Some(fingerprint) => self.store.set(includes_key, fingerprint),
            None => self.store.delete(&includes_key),
        }
    }

    /// Forget everything recorded for `src_path`
    pub fn invalidate(&mut self, src_path: &Path) {
        for kind in [
            CacheValueKind::Source,
            CacheValueKind::Compiled,
            CacheValueKind::Includes,
        ] {
            let key = self.key_for(src_path, kind);
            self.store.delete(&key);
        }
    }

    /// Recompute the project-wide include fingerprint.
    ///
    /// Call once per build pass, before any `is_up_to_date` check.
    pub fn refresh_include_fingerprint(&mut self, include_dirs: &[PathBuf]) {
        let fingerprint = hash_include_dirs(include_dirs, INCLUDE_EXT);
        debug!("Include fingerprint: {}", fingerprint);

        let key = self.key(INCLUDES_SUBJECT, CacheValueKind::Includes);
        self.store.set(key, fingerprint);
    }

    fn record_file(&mut self, subject: &Path, file: &Path, kind: CacheValueKind) {
        let key = self.key_for(subject, kind);
        match hash_file(file) {
            Ok(hash) => self.store.set(key, hash),
            Err(_) => self.store.delete(&key),
        }
    }

    fn get(&self, subject: &Path, kind: CacheValueKind) -> Option<&str> {
        self.store.get(&self.key_for(subject, kind))
    }

    fn key_for(&self, subject: &Path, kind: CacheValueKind) -> String {
        self.key(&subject.to_string_lossy(), kind)
    }

    fn key(&self, subject: &str, kind: CacheValueKind) -> String {
        cache_key(&self.project_root, subject, kind)
    }
}
