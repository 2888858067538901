//! AMXX compiler integration: the process invoker and the parser for its
//! textual diagnostics.

mod amxxpc;
mod diagnostics;

use std::path::PathBuf;

pub use amxxpc::{format_args, AmxxpcCompiler};
pub use diagnostics::{parse_line, parse_output, Diagnostic, ParsedOutput, Severity, SINGLE_LINE};

/// Generic error message for a compile whose output reported errors
pub const COMPILATION_ERROR: &str = "Compilation error";

/// Everything needed to compile one script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileRequest {
    pub script: PathBuf,
    pub dest: PathBuf,
    pub executable: PathBuf,
    /// Include search path; order decides symbol resolution precedence
    pub include_dirs: Vec<PathBuf>,
}

/// Result of a single compiler invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOutcome {
    pub plugin_file_name: String,
    pub diagnostics: Vec<Diagnostic>,
    pub aborted: bool,
    pub had_error: bool,
    pub success: bool,
    pub error_message: Option<String>,
}

impl CompileOutcome {
    /// Combine parsed output with an optional launch failure.
    ///
    /// A launch failure wins over parsed errors; `success` holds exactly
    /// when no error message was produced.
    pub fn finalize(
        plugin_file_name: impl Into<String>,
        parsed: ParsedOutput,
        launch_error: Option<String>,
    ) -> Self {
        let error_message = launch_error.or_else(|| {
            parsed
                .had_error
                .then(|| COMPILATION_ERROR.to_string())
        });

        Self {
            plugin_file_name: plugin_file_name.into(),
            diagnostics: parsed.diagnostics,
            aborted: parsed.aborted,
            had_error: parsed.had_error,
            success: error_message.is_none(),
            error_message,
        }
    }
}

/// Compiles one script into one plugin
///
/// The seam between the build orchestrator and the external compiler
/// process; tests substitute a recording implementation.
pub trait Compiler: Send {
    fn compile(&self, request: &CompileRequest) -> CompileOutcome;
}
