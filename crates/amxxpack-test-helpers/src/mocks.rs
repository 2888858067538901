//! Mock implementations for testing

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use amxxpack_core::compiler::{parse_output, CompileOutcome, CompileRequest, Compiler};

use crate::fixtures;

/// A compiler that records every request instead of spawning `amxxpc`.
///
/// Clones share state, so a test keeps one clone for assertions and hands
/// another to the builder. Successful compiles write a fake plugin derived
/// from the script bytes, so editing a script changes its artifact hash.
#[derive(Debug, Clone, Default)]
pub struct MockCompiler {
    calls: Arc<Mutex<Vec<CompileRequest>>>,
    outputs: Arc<Mutex<HashMap<String, String>>>,
}

impl MockCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn boxed(&self) -> Box<dyn Compiler> {
        Box::new(self.clone())
    }

    /// Make compiles of the script named `file_name` fail with an error
    pub fn fail_on(&self, file_name: &str) {
        self.respond_with(file_name, fixtures::error_output(file_name));
    }

    /// Make compiles of `file_name` print `output` instead of a clean run
    pub fn respond_with(&self, file_name: &str, output: impl Into<String>) {
        self.outputs
            .lock()
            .unwrap()
            .insert(file_name.to_string(), output.into());
    }

    /// Restore the clean response for `file_name`
    pub fn reset(&self, file_name: &str) {
        self.outputs.lock().unwrap().remove(file_name);
    }

    pub fn calls(&self) -> Vec<CompileRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// File names of compiled scripts, in call order
    pub fn compiled_scripts(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|request| file_name(&request.script))
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

impl Compiler for MockCompiler {
    fn compile(&self, request: &CompileRequest) -> CompileOutcome {
        self.calls.lock().unwrap().push(request.clone());

        let plugin_file_name = file_name(&request.dest);
        let script_name = file_name(&request.script);
        let output = self
            .outputs
            .lock()
            .unwrap()
            .get(&script_name)
            .cloned()
            .unwrap_or_else(fixtures::success_output);
        let parsed = parse_output(&output);

        if parsed.had_error {
            return CompileOutcome::finalize(plugin_file_name, parsed, None);
        }

        let launch_error = write_artifact(request).err().map(|e| e.to_string());
        CompileOutcome::finalize(plugin_file_name, parsed, launch_error)
    }
}

fn write_artifact(request: &CompileRequest) -> std::io::Result<()> {
    if let Some(parent) = request.dest.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut artifact = b"AMXX".to_vec();
    artifact.extend(std::fs::read(&request.script)?);
    std::fs::write(&request.dest, artifact)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
