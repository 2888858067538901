use std::path::PathBuf;
use thiserror::Error;

use crate::cache::CacheError;
use crate::config::ConfigError;

/// Errors raised at the build orchestrator boundary
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("Failed to compile {path}: \"{message}\"")]
    Compile { path: PathBuf, message: String },

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to traverse {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Invalid pattern \"{pattern}\": {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("Watcher failure: {0}")]
    Watch(#[from] notify::Error),

    #[error("Output \"{0}\" is disabled in the project config")]
    OutputDisabled(&'static str),
}

impl BuildError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, BuildError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_error_display() {
        let err = BuildError::Compile {
            path: PathBuf::from("src/scripts/test.sma"),
            message: "Compilation error".to_string(),
        };

        assert_eq!(
            err.to_string(),
            "Failed to compile src/scripts/test.sma: \"Compilation error\""
        );
    }

    #[test]
    fn test_output_disabled_display() {
        let err = BuildError::OutputDisabled("plugins");
        assert_eq!(
            err.to_string(),
            "Output \"plugins\" is disabled in the project config"
        );
    }
}
