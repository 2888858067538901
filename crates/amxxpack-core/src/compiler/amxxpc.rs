use std::ffi::OsString;
use std::io::Read;
use std::process::{Command, Stdio};
use tracing::debug;

use super::{parse_output, CompileOutcome, CompileRequest, Compiler, ParsedOutput};

/// Runs the `amxxpc` executable as a child process
///
/// The compiler is started in its own directory because it resolves some
/// of its resources relative to its install location. Stdout is collected
/// and parsed; stderr is inherited. No timeout is applied.
#[derive(Debug, Clone, Copy, Default)]
pub struct AmxxpcCompiler;

impl AmxxpcCompiler {
    pub fn new() -> Self {
        Self
    }
}

/// Build the compiler command line:
/// `<script> -o<dest> -i<dir1> -i<dir2> ...`
pub fn format_args(request: &CompileRequest) -> Vec<OsString> {
    let mut args = Vec::with_capacity(request.include_dirs.len() + 2);
    args.push(request.script.clone().into_os_string());

    let mut out_arg = OsString::from("-o");
    out_arg.push(&request.dest);
    args.push(out_arg);

    for dir in &request.include_dirs {
        let mut include_arg = OsString::from("-i");
        include_arg.push(dir);
        args.push(include_arg);
    }

    args
}

impl Compiler for AmxxpcCompiler {
    fn compile(&self, request: &CompileRequest) -> CompileOutcome {
        let plugin_file_name = request
            .dest
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        match run(request) {
            Ok(output) => CompileOutcome::finalize(plugin_file_name, parse_output(&output), None),
            Err(e) => {
                CompileOutcome::finalize(plugin_file_name, ParsedOutput::default(), Some(e.to_string()))
            }
        }
    }
}

fn run(request: &CompileRequest) -> std::io::Result<String> {
    if let Some(dest_dir) = request.dest.parent() {
        std::fs::create_dir_all(dest_dir)?;
    }

    let mut command = Command::new(&request.executable);
    command
        .args(format_args(request))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit());

    if let Some(compiler_dir) = request.executable.parent() {
        if !compiler_dir.as_os_str().is_empty() {
            command.current_dir(compiler_dir);
        }
    }

    debug!("Running {:?}", command);

    let mut child = command.spawn()?;

    let mut raw = Vec::new();
    if let Some(mut stdout) = child.stdout.take() {
        stdout.read_to_end(&mut raw)?;
    }
    let status = child.wait()?;
    debug!("Compiler exited with {}", status);

    Ok(String::from_utf8_lossy(&raw).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_format_args_keeps_include_order() {
        let request = CompileRequest {
            script: PathBuf::from("/project/src/scripts/test.sma"),
            dest: PathBuf::from("/project/dist/plugins/test.amxx"),
            executable: PathBuf::from("/project/.compiler/amxxpc"),
            include_dirs: vec![
                PathBuf::from("/project/.compiler/include"),
                PathBuf::from("/project/third/include"),
                PathBuf::from("/project/src/include"),
            ],
        };

        assert_eq!(
            format_args(&request),
            vec![
                OsString::from("/project/src/scripts/test.sma"),
                OsString::from("-o/project/dist/plugins/test.amxx"),
                OsString::from("-i/project/.compiler/include"),
                OsString::from("-i/project/third/include"),
                OsString::from("-i/project/src/include"),
            ]
        );
    }

    #[test]
    fn test_missing_executable_reports_launch_error() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let request = CompileRequest {
            script: temp_dir.path().join("test.sma"),
            dest: temp_dir.path().join("out/test.amxx"),
            executable: temp_dir.path().join("compiler/amxxpc-missing"),
            include_dirs: Vec::new(),
        };

        let outcome = AmxxpcCompiler::new().compile(&request);

        assert!(!outcome.success);
        assert!(outcome.error_message.is_some());
        assert_eq!(outcome.plugin_file_name, "test.amxx");
        assert!(temp_dir.path().join("out").is_dir());
    }
}
