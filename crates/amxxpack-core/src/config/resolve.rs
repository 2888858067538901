use std::path::{Component, Path, PathBuf};

use super::defaults;
use super::overrides::{AssetInputSpec, OneOrMany, Override, ProjectOverrides};
use super::{
    AssetInput, CompilerSettings, InputPaths, OutputPaths, ProjectConfig, Rules,
    ThirdpartySettings,
};

/// Resolve user overrides against the built-in defaults.
///
/// Precedence per field: an absent key takes the default, `null` disables
/// the field (empty list for inputs, `None` for outputs), a value wins.
/// Relative paths are resolved against `project_dir`, or against
/// `output.base` for output paths when a base is given. Pure path math:
/// nothing here touches the filesystem.
pub fn resolve(overrides: ProjectOverrides, project_dir: &Path) -> ProjectConfig {
    let ProjectOverrides {
        input,
        output,
        compiler,
        thirdparty,
        include,
        rules,
    } = overrides;

    let input = InputPaths {
        scripts: resolve_list(input.scripts, defaults::INPUT_SCRIPTS, project_dir),
        include: resolve_list(input.include, defaults::INPUT_INCLUDE, project_dir),
        assets: layer(input.assets, || OneOrMany::One(defaults::INPUT_ASSETS.into()))
            .map(OneOrMany::into_vec)
            .unwrap_or_default()
            .into_iter()
            .map(|spec| resolve_asset(spec, project_dir))
            .collect(),
    };

    let output_base = match output.base {
        Override::Set(base) => resolve_path(project_dir, &base),
        Override::Inherit | Override::Disable => project_dir.to_path_buf(),
    };
    let resolve_output = |value: Override<String>, default: &str| {
        layer(value, || default.to_string()).map(|path| resolve_path(&output_base, &path))
    };

    let output = OutputPaths {
        scripts: resolve_output(output.scripts, defaults::OUTPUT_SCRIPTS),
        plugins: resolve_output(output.plugins, defaults::OUTPUT_PLUGINS),
        include: resolve_output(output.include, defaults::OUTPUT_INCLUDE),
        assets: resolve_output(output.assets, defaults::OUTPUT_ASSETS),
    };

    let compiler = CompilerSettings {
        dir: resolve_dir(compiler.dir, defaults::COMPILER_DIR, project_dir),
        version: compiler
            .version
            .unwrap_or_else(|| defaults::COMPILER_VERSION.to_string()),
        dev: compiler.dev.unwrap_or(false),
        addons: compiler.addons.unwrap_or_default(),
        executable: compiler
            .executable
            .unwrap_or_else(|| defaults::COMPILER_EXECUTABLE.to_string()),
    };

    let thirdparty = ThirdpartySettings {
        dir: resolve_dir(thirdparty.dir, defaults::THIRDPARTY_DIR, project_dir),
        dependencies: thirdparty.dependencies.unwrap_or_default(),
    };

    let include = layer(include, Vec::new)
        .unwrap_or_default()
        .iter()
        .map(|path| resolve_path(project_dir, path))
        .collect();

    ProjectConfig {
        project_dir: project_dir.to_path_buf(),
        input,
        output,
        compiler,
        thirdparty,
        include,
        rules: Rules {
            flat_compilation: rules
                .flat_compilation
                .unwrap_or(defaults::FLAT_COMPILATION),
        },
    }
}

/// Apply one override layer over a default; `None` means disabled.
fn layer<T>(value: Override<T>, default: impl FnOnce() -> T) -> Option<T> {
    match value {
        Override::Inherit => Some(default()),
        Override::Disable => None,
        Override::Set(value) => Some(value),
    }
}

fn resolve_list(value: Override<OneOrMany<String>>, default: &str, base: &Path) -> Vec<PathBuf> {
    layer(value, || OneOrMany::One(default.to_string()))
        .map(OneOrMany::into_vec)
        .unwrap_or_default()
        .iter()
        .map(|path| resolve_path(base, path))
        .collect()
}

// Directories the tool itself manages cannot be disabled; null falls back to the default
fn resolve_dir(value: Override<String>, default: &str, base: &Path) -> PathBuf {
    let path = layer(value, || default.to_string()).unwrap_or_else(|| default.to_string());
    resolve_path(base, &path)
}

fn resolve_asset(spec: AssetInputSpec, base: &Path) -> AssetInput {
    match spec {
        AssetInputSpec::Dir(dir) => AssetInput::new(resolve_path(base, &dir)),
        AssetInputSpec::Detailed { dir, dest, filter } => AssetInput {
            dir: resolve_path(base, &dir),
            dest: dest.map(PathBuf::from),
            filter: filter.map(OneOrMany::into_vec).unwrap_or_default(),
        },
    }
}

/// Lexically resolve `path` against `base`.
///
/// Absolute paths replace the base, an empty path yields the base itself,
/// and `.`/`..` components are folded without consulting the filesystem.
pub fn resolve_path(base: &Path, path: &str) -> PathBuf {
    let mut resolved = PathBuf::new();

    for component in base.join(path).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match resolved.components().next_back() {
                Some(Component::Normal(_)) => {
                    resolved.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => resolved.push(".."),
            },
            other => resolved.push(other.as_os_str()),
        }
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::overrides::{InputOverrides, OutputOverrides};

    fn project_dir() -> PathBuf {
        PathBuf::from("/tmp/amxxpack-project")
    }

    fn in_project(path: &str) -> PathBuf {
        resolve_path(&project_dir(), path)
    }

    fn resolve_overrides(overrides: ProjectOverrides) -> ProjectConfig {
        resolve(overrides, &project_dir())
    }

    #[test]
    fn test_resolve_path_folds_dots() {
        let base = Path::new("/projects/demo");
        assert_eq!(resolve_path(base, "./src/../dist"), PathBuf::from("/projects/demo/dist"));
        assert_eq!(resolve_path(base, ""), PathBuf::from("/projects/demo"));
        assert_eq!(resolve_path(base, "/abs/path"), PathBuf::from("/abs/path"));
        assert_eq!(resolve_path(Path::new("/"), ".."), PathBuf::from("/"));
    }

    #[test]
    fn test_unset_fields_resolve_to_defaults() {
        let config = resolve_overrides(ProjectOverrides::default());

        assert_eq!(config.input.scripts, vec![in_project(defaults::INPUT_SCRIPTS)]);
        assert_eq!(config.input.include, vec![in_project(defaults::INPUT_INCLUDE)]);
        assert_eq!(
            config.input.assets,
            vec![AssetInput::new(in_project(defaults::INPUT_ASSETS))]
        );
        assert_eq!(config.output.scripts, Some(in_project(defaults::OUTPUT_SCRIPTS)));
        assert_eq!(config.output.plugins, Some(in_project(defaults::OUTPUT_PLUGINS)));
        assert_eq!(config.output.include, Some(in_project(defaults::OUTPUT_INCLUDE)));
        assert_eq!(config.output.assets, Some(in_project(defaults::OUTPUT_ASSETS)));
        assert_eq!(config.compiler.dir, in_project(defaults::COMPILER_DIR));
        assert_eq!(config.compiler.executable, "amxxpc");
        assert_eq!(config.thirdparty.dir, in_project(defaults::THIRDPARTY_DIR));
        assert!(config.include.is_empty());
        assert!(config.rules.flat_compilation);
    }

    #[test]
    fn test_null_outputs_stay_disabled() {
        let config = resolve_overrides(ProjectOverrides {
            output: OutputOverrides {
                scripts: Override::Disable,
                plugins: Override::Disable,
                include: Override::Disable,
                assets: Override::Disable,
                ..Default::default()
            },
            ..Default::default()
        });

        assert_eq!(config.output.scripts, None);
        assert_eq!(config.output.plugins, None);
        assert_eq!(config.output.include, None);
        assert_eq!(config.output.assets, None);
    }

    #[test]
    fn test_null_inputs_resolve_to_empty_lists() {
        let config = resolve_overrides(ProjectOverrides {
            input: InputOverrides {
                scripts: Override::Disable,
                include: Override::Disable,
                assets: Override::Disable,
            },
            ..Default::default()
        });

        assert!(config.input.scripts.is_empty());
        assert!(config.input.include.is_empty());
        assert!(config.input.assets.is_empty());
    }

    #[test]
    fn test_empty_paths_resolve_to_project_root() {
        let config = resolve_overrides(ProjectOverrides {
            input: InputOverrides {
                scripts: Override::Set("".to_string().into()),
                include: Override::Set("".to_string().into()),
                assets: Override::Set(AssetInputSpec::from("").into()),
            },
            output: OutputOverrides {
                scripts: Override::set(""),
                plugins: Override::set(""),
                include: Override::set(""),
                assets: Override::set(""),
                ..Default::default()
            },
            include: Override::Set(vec![String::new()]),
            ..Default::default()
        });

        let root = project_dir();
        assert_eq!(config.input.scripts, vec![root.clone()]);
        assert_eq!(config.input.include, vec![root.clone()]);
        assert_eq!(config.input.assets, vec![AssetInput::new(root.clone())]);
        assert_eq!(config.output.scripts, Some(root.clone()));
        assert_eq!(config.output.plugins, Some(root.clone()));
        assert_eq!(config.output.include, Some(root.clone()));
        assert_eq!(config.output.assets, Some(root.clone()));
        assert_eq!(config.include, vec![root]);
    }

    #[test]
    fn test_single_script_root_becomes_list() {
        let config = resolve_overrides(ProjectOverrides {
            input: InputOverrides {
                scripts: Override::Set("scripts".to_string().into()),
                ..Default::default()
            },
            ..Default::default()
        });

        assert_eq!(config.input.scripts, vec![in_project("scripts")]);
    }

    #[test]
    fn test_absolute_paths_are_kept() {
        let config = resolve_overrides(ProjectOverrides {
            input: InputOverrides {
                scripts: Override::Set(OneOrMany::Many(vec!["/abs/scripts".to_string()])),
                ..Default::default()
            },
            output: OutputOverrides {
                plugins: Override::set("/abs/plugins"),
                ..Default::default()
            },
            ..Default::default()
        });

        assert_eq!(config.input.scripts, vec![PathBuf::from("/abs/scripts")]);
        assert_eq!(config.output.plugins, Some(PathBuf::from("/abs/plugins")));
    }

    #[test]
    fn test_output_paths_use_base_dir() {
        let config = resolve_overrides(ProjectOverrides {
            output: OutputOverrides {
                base: Override::set("./out"),
                scripts: Override::set("./scripts"),
                plugins: Override::set("./plugins"),
                include: Override::Disable,
                assets: Override::set(""),
            },
            ..Default::default()
        });

        assert_eq!(config.output.scripts, Some(in_project("out/scripts")));
        assert_eq!(config.output.plugins, Some(in_project("out/plugins")));
        assert_eq!(config.output.include, None);
        assert_eq!(config.output.assets, Some(in_project("out")));
    }

    #[test]
    fn test_detailed_asset_input() {
        let config = resolve_overrides(ProjectOverrides {
            input: InputOverrides {
                assets: Override::Set(
                    AssetInputSpec::Detailed {
                        dir: "./sounds".to_string(),
                        dest: Some("sound".to_string()),
                        filter: Some(OneOrMany::Many(vec![
                            "*.wav".to_string(),
                            "!*.tmp".to_string(),
                        ])),
                    }
                    .into(),
                ),
                ..Default::default()
            },
            ..Default::default()
        });

        assert_eq!(
            config.input.assets,
            vec![AssetInput {
                dir: in_project("sounds"),
                dest: Some(PathBuf::from("sound")),
                filter: vec!["*.wav".to_string(), "!*.tmp".to_string()],
            }]
        );
    }

    #[test]
    fn test_compiler_paths() {
        let config = resolve_overrides(ProjectOverrides::default());

        assert_eq!(
            config.compiler_executable(),
            in_project(".compiler").join("amxxpc")
        );
        assert_eq!(
            config.compiler_include_dirs(),
            vec![in_project(".compiler").join("include")]
        );
    }
}
