//! Project configuration: user overrides, built-in defaults and the
//! fully resolved form consumed by the builder.

mod error;
mod loader;
mod overrides;
mod resolve;

use std::path::PathBuf;

pub use error::{ConfigError, Result};
pub use loader::{load, parse_overrides, CONFIG_FILE_NAME};
pub use overrides::{
    AssetInputSpec, CompilerOverrides, Dependency, InputOverrides, OneOrMany, Override,
    OutputOverrides, ProjectOverrides, RulesOverrides, ThirdpartyOverrides,
};
pub use resolve::{resolve, resolve_path};

/// Built-in defaults, relative to the project directory
pub mod defaults {
    pub const INPUT_SCRIPTS: &str = "./src/scripts";
    pub const INPUT_INCLUDE: &str = "./src/include";
    pub const INPUT_ASSETS: &str = "./assets";

    pub const OUTPUT_SCRIPTS: &str = "./dist/addons/amxmodx/scripting";
    pub const OUTPUT_PLUGINS: &str = "./dist/addons/amxmodx/plugins";
    pub const OUTPUT_INCLUDE: &str = "./dist/addons/amxmodx/scripting/include";
    pub const OUTPUT_ASSETS: &str = "./dist";

    pub const COMPILER_DIR: &str = "./.compiler";
    pub const COMPILER_VERSION: &str = "1.8.2";
    pub const COMPILER_EXECUTABLE: &str = "amxxpc";

    pub const THIRDPARTY_DIR: &str = "./.thirdparty";

    pub const FLAT_COMPILATION: bool = true;
}

/// Fully resolved project configuration
///
/// Built once per invocation and never mutated afterwards. Every path is
/// absolute (given an absolute project directory); `None` outputs are
/// disabled mirroring stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    pub project_dir: PathBuf,
    pub input: InputPaths,
    pub output: OutputPaths,
    pub compiler: CompilerSettings,
    pub thirdparty: ThirdpartySettings,
    /// Extra include directories passed to the compiler verbatim
    pub include: Vec<PathBuf>,
    pub rules: Rules,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputPaths {
    pub scripts: Vec<PathBuf>,
    pub include: Vec<PathBuf>,
    pub assets: Vec<AssetInput>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetInput {
    pub dir: PathBuf,
    /// Subdirectory of the assets output to copy into
    pub dest: Option<PathBuf>,
    /// Glob patterns; `!`-prefixed patterns exclude
    pub filter: Vec<String>,
}

impl AssetInput {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            dest: None,
            filter: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub scripts: Option<PathBuf>,
    pub plugins: Option<PathBuf>,
    pub include: Option<PathBuf>,
    pub assets: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerSettings {
    pub dir: PathBuf,
    pub version: String,
    pub dev: bool,
    pub addons: Vec<String>,
    pub executable: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThirdpartySettings {
    pub dir: PathBuf,
    pub dependencies: Vec<Dependency>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rules {
    /// Place every plugin directly in the plugins output instead of
    /// mirroring the script tree
    pub flat_compilation: bool,
}

impl ProjectConfig {
    /// Path to the compiler executable
    pub fn compiler_executable(&self) -> PathBuf {
        self.compiler.dir.join(&self.compiler.executable)
    }

    /// Include directories shipped with the compiler
    pub fn compiler_include_dirs(&self) -> Vec<PathBuf> {
        vec![self.compiler.dir.join("include")]
    }
}
