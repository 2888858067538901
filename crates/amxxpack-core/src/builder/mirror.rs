//! File discovery and the plain-copy mirroring stages.

use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use walkdir::WalkDir;

use crate::errors::{BuildError, Result};

/// List files under `root` relative to it, sorted by path.
///
/// With `extension` set, only files carrying it are returned. A missing
/// root yields an empty list.
pub fn find_files(root: &Path, extension: Option<&str>) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|source| BuildError::Walk {
            path: root.to_path_buf(),
            source,
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        if let Some(extension) = extension {
            if entry.path().extension().and_then(|ext| ext.to_str()) != Some(extension) {
                continue;
            }
        }

        if let Ok(relative) = entry.path().strip_prefix(root) {
            files.push(relative.to_path_buf());
        }
    }

    Ok(files)
}

/// `root` followed by every directory nested below it, depth-first by name
pub fn nested_dirs(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|entry| entry.file_type().is_dir())
        .map(|entry| entry.into_path())
        .collect()
}

/// Copy `src` to `dest`, creating the destination directory
pub fn copy_file(src: &Path, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;
    }

    std::fs::copy(src, dest).map_err(|e| BuildError::io(src, e))?;
    Ok(())
}

/// Relative path of `path` under `root`, tolerating symlinked roots
pub fn relative_to(root: &Path, path: &Path) -> Option<PathBuf> {
    if let Ok(relative) = path.strip_prefix(root) {
        return Some(relative.to_path_buf());
    }

    let canonical_root = root.canonicalize().ok()?;
    let canonical_path = path.canonicalize().ok()?;
    canonical_path
        .strip_prefix(canonical_root)
        .ok()
        .map(Path::to_path_buf)
}

/// Asset filter compiled from glob patterns.
///
/// A file passes when it matches at least one positive pattern (or there
/// are none) and no `!`-prefixed pattern. Patterns are tried against the
/// path relative to the asset root and against the bare file name.
#[derive(Debug, Clone, Default)]
pub struct AssetFilter {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl AssetFilter {
    pub fn new(patterns: &[String]) -> Result<Self> {
        let compile = |pattern: &str| {
            Pattern::new(pattern).map_err(|source| BuildError::Pattern {
                pattern: pattern.to_string(),
                source,
            })
        };

        let mut filter = Self::default();
        for pattern in patterns {
            match pattern.strip_prefix('!') {
                Some(negated) => filter.exclude.push(compile(negated)?),
                None => filter.include.push(compile(pattern)?),
            }
        }

        Ok(filter)
    }

    pub fn matches(&self, relative: &Path) -> bool {
        let hit = |pattern: &Pattern| matches_path(pattern, relative);

        (self.include.is_empty() || self.include.iter().any(hit)) && !self.exclude.iter().any(hit)
    }
}

/// Match against the full relative path or just the file name
pub fn matches_path(pattern: &Pattern, relative: &Path) -> bool {
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: false,
        require_literal_leading_dot: false,
    };

    pattern.matches_path_with(relative, options)
        || relative
            .file_name()
            .is_some_and(|name| pattern.matches_with(&name.to_string_lossy(), options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "").unwrap();
    }

    #[test]
    fn test_find_files_filters_extension() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "b.sma");
        touch(temp_dir.path(), "a.sma");
        touch(temp_dir.path(), "nested/c.sma");
        touch(temp_dir.path(), "readme.txt");

        let files = find_files(temp_dir.path(), Some("sma")).unwrap();

        assert_eq!(
            files,
            vec![
                PathBuf::from("a.sma"),
                PathBuf::from("b.sma"),
                PathBuf::from("nested/c.sma"),
            ]
        );
    }

    #[test]
    fn test_find_files_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        let files = find_files(&temp_dir.path().join("missing"), None).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_nested_dirs_lists_root_first() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "b/x.inc");
        touch(temp_dir.path(), "a/deep/y.inc");

        let root = temp_dir.path();
        assert_eq!(
            nested_dirs(root),
            vec![
                root.to_path_buf(),
                root.join("a"),
                root.join("a/deep"),
                root.join("b"),
            ]
        );
    }

    #[test]
    fn test_copy_file_creates_parent() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "src/a.sma");

        let dest = temp_dir.path().join("out/deep/a.sma");
        copy_file(&temp_dir.path().join("src/a.sma"), &dest).unwrap();

        assert!(dest.is_file());
    }

    #[test]
    fn test_asset_filter() {
        let filter =
            AssetFilter::new(&["!*.mdl".to_string(), "!maps/*".to_string()]).unwrap();

        assert!(filter.matches(Path::new("sound/test.wav")));
        assert!(!filter.matches(Path::new("models/test.mdl")));
        assert!(!filter.matches(Path::new("maps/test.bsp")));
    }

    #[test]
    fn test_asset_filter_positive_patterns() {
        let filter = AssetFilter::new(&["*.wav".to_string(), "*.spr".to_string()]).unwrap();

        assert!(filter.matches(Path::new("sound/test.wav")));
        assert!(filter.matches(Path::new("sprites/test.spr")));
        assert!(!filter.matches(Path::new("models/test.mdl")));
    }

    #[test]
    fn test_empty_filter_accepts_everything() {
        let filter = AssetFilter::new(&[]).unwrap();
        assert!(filter.matches(Path::new("anything/at/all.bin")));
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(matches!(
            AssetFilter::new(&["[".to_string()]),
            Err(BuildError::Pattern { .. })
        ));
    }
}
