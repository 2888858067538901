#![cfg(unix)]

use std::path::Path;

use amxxpack_core::{BuildError, BuildOptions, Builder};
use amxxpack_test_helpers::{fixtures, TestProject};

fn canonical(path: &Path) -> std::path::PathBuf {
    path.canonicalize().unwrap()
}

#[test]
fn test_fake_compiler_end_to_end() {
    let project = TestProject::with_sample_sources();
    project.install_fake_compiler();

    let mut builder = Builder::new(project.resolve());
    assert!(builder.build(BuildOptions::default()).unwrap());

    for name in ["alpha", "beta", "gamma"] {
        assert_eq!(
            std::fs::read_to_string(project.plugin(&format!("{name}.amxx"))).unwrap(),
            fixtures::script_source(name)
        );
    }

    let cwd = project.read(".compiler/last-cwd");
    assert_eq!(
        canonical(Path::new(cwd.trim())),
        canonical(&project.path().join(".compiler"))
    );

    // Second pass never launches the compiler
    std::fs::remove_file(project.path().join(".compiler/last-cwd")).unwrap();
    let mut builder = Builder::new(project.resolve());
    assert!(builder.build(BuildOptions::default()).unwrap());
    assert!(!project.exists(".compiler/last-cwd"));
}

#[test]
fn test_fake_compiler_error_fails_job() {
    let project = TestProject::new();
    project.script("broken.sma", "public plugin_init() { foo(); }\n");
    project.install_fake_compiler();

    let mut builder = Builder::new(project.resolve());
    let result = builder.build(BuildOptions::default());

    assert!(matches!(result, Err(BuildError::Compile { .. })));
    assert!(!project.plugin("broken.amxx").exists());
}
