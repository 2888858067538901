use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use walkdir::WalkDir;

/// Kind of value recorded for a cache subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheValueKind {
    /// Hash of the script source
    Source,
    /// Hash of the compiled plugin
    Compiled,
    /// Include fingerprint the plugin was compiled against
    Includes,
}

impl CacheValueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheValueKind::Source => "src",
            CacheValueKind::Compiled => "compiled",
            CacheValueKind::Includes => "includes",
        }
    }
}

/// Compute Blake3 hash of raw bytes, hex-encoded
pub fn hash_bytes(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}

/// Compute Blake3 hash of file content
pub fn hash_file(path: &Path) -> std::io::Result<String> {
    let content = std::fs::read(path)?;
    Ok(hash_bytes(&content))
}

/// Derive the fixed-length store key for a subject.
///
/// Hashing keeps file system paths out of the persisted cache.
pub fn cache_key(project_root: &Path, subject: &str, kind: CacheValueKind) -> String {
    let raw = format!("{}:{}?{}", project_root.display(), subject, kind.as_str());
    hash_bytes(raw.as_bytes())
}

/// Fingerprint every file with the given extension under `dirs`.
///
/// Feeds `path:size:mtime` of each matching file into one running hash,
/// in traversal order (entries sorted by name). Content is not read, so a
/// touch without edits still changes the fingerprint. Missing directories
/// are skipped.
pub fn hash_include_dirs(dirs: &[PathBuf], extension: &str) -> String {
    let mut hasher = blake3::Hasher::new();

    for dir in dirs {
        if !dir.is_dir() {
            continue;
        }

        for entry in WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(extension) {
                continue;
            }

            let Ok(metadata) = entry.metadata() else {
                continue;
            };

            let modified_ns = metadata
                .modified()
                .ok()
                .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
                .map(|duration| duration.as_nanos())
                .unwrap_or(0);

            let data = format!("{}:{}:{}", path.display(), metadata.len(), modified_ns);
            hasher.update(data.as_bytes());
        }
    }

    hasher.finalize().to_hex().to_string()
}
