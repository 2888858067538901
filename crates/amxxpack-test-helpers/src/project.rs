//! Temporary project directories laid out like a real AMXXPack project

use std::path::{Path, PathBuf};

use amxxpack_core::config::{self, CONFIG_FILE_NAME};
use amxxpack_core::{Builder, ProjectConfig};
use tempfile::TempDir;

use crate::fixtures;
use crate::mocks::MockCompiler;

/// A project rooted in a temporary directory that is removed on drop
pub struct TestProject {
    dir: TempDir,
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

impl TestProject {
    /// An empty project with a `{}` config file
    pub fn new() -> Self {
        let project = Self {
            dir: TempDir::new().expect("failed to create temp dir"),
        };
        project.config("{}");
        project
    }

    /// A project with three scripts and one shared include
    pub fn with_sample_sources() -> Self {
        let project = Self::new();
        for name in ["alpha", "beta", "gamma"] {
            project.script(&format!("{name}.sma"), &fixtures::script_source(name));
        }
        project.include("shared.inc", fixtures::include_source());
        project
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file relative to the project root, creating parents
    pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create parent dir");
        }
        std::fs::write(&path, contents).expect("failed to write file");
        path
    }

    pub fn read(&self, relative: &str) -> String {
        std::fs::read_to_string(self.path().join(relative)).expect("failed to read file")
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.path().join(relative).exists()
    }

    /// Write a script under the default script root
    pub fn script(&self, relative: &str, contents: &str) -> PathBuf {
        self.write(&format!("src/scripts/{relative}"), contents)
    }

    /// Write an include file under the default include root
    pub fn include(&self, relative: &str, contents: &str) -> PathBuf {
        self.write(&format!("src/include/{relative}"), contents)
    }

    /// Write an asset under the default asset root
    pub fn asset(&self, relative: &str, contents: &str) -> PathBuf {
        self.write(&format!("assets/{relative}"), contents)
    }

    /// Write the project config file
    pub fn config(&self, json: &str) -> PathBuf {
        self.write(CONFIG_FILE_NAME, json)
    }

    pub fn resolve(&self) -> ProjectConfig {
        config::load(None, self.path()).expect("failed to load project config")
    }

    /// Builder over `compiler` sharing the mock's recorded state
    pub fn builder(&self, compiler: &MockCompiler) -> Builder {
        Builder::with_compiler(self.resolve(), compiler.boxed())
    }

    /// Install [`fixtures::FAKE_AMXXPC`] as the project's compiler
    #[cfg(unix)]
    pub fn install_fake_compiler(&self) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = self.write(".compiler/amxxpc", fixtures::FAKE_AMXXPC);
        let mut permissions = std::fs::metadata(&path)
            .expect("failed to stat compiler")
            .permissions();
        permissions.set_mode(0o755);
        std::fs::set_permissions(&path, permissions).expect("failed to make compiler executable");
        path
    }

    /// Plugin path under the default plugins output
    pub fn plugin(&self, relative: &str) -> PathBuf {
        self.path()
            .join("dist/addons/amxmodx/plugins")
            .join(relative)
    }
}
