use std::path::{Path, PathBuf};
use tracing::debug;

use super::error::{ConfigError, Result};
use super::overrides::ProjectOverrides;
use super::resolve::resolve;
use super::ProjectConfig;

/// Default config file name, looked up in the project directory
pub const CONFIG_FILE_NAME: &str = ".amxxpack.json";

/// Load and resolve the project config.
///
/// `config_path` is resolved against `project_dir`; the project directory
/// itself is made absolute against the working directory first.
pub fn load(config_path: Option<&Path>, project_dir: &Path) -> Result<ProjectConfig> {
    let project_dir = std::path::absolute(project_dir).map_err(ConfigError::WorkingDir)?;
    let config_path = project_dir.join(config_path.unwrap_or(Path::new(CONFIG_FILE_NAME)));

    let content = std::fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
        path: config_path.clone(),
        source,
    })?;

    debug!("Loaded config file {}", config_path.display());

    let overrides = parse_overrides(&content, &config_path)?;
    Ok(resolve(overrides, &project_dir))
}

/// Parse a config document; YAML for `.yaml`/`.yml`, JSON otherwise
pub fn parse_overrides(content: &str, path: &Path) -> Result<ProjectOverrides> {
    let is_yaml = matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    );

    if is_yaml {
        serde_yaml::from_str(content).map_err(|source| ConfigError::Yaml {
            path: PathBuf::from(path),
            source,
        })
    } else {
        serde_json::from_str(content).map_err(|source| ConfigError::Json {
            path: PathBuf::from(path),
            source,
        })
    }
}
