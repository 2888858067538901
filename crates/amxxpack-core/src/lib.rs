pub mod builder;
pub mod cache;
pub mod compiler;
pub mod config;
pub mod errors;

pub use builder::{BuildOptions, Builder, CompileJob, StopHandle, WatchSession};
pub use cache::{CacheStore, JsonCacheStore, PluginsCache};
pub use compiler::{
    parse_output, AmxxpcCompiler, CompileOutcome, CompileRequest, Compiler, Diagnostic,
    ParsedOutput, Severity,
};
pub use config::{ProjectConfig, ProjectOverrides};
pub use errors::BuildError;

/// File extension of compilable scripts
pub const SCRIPT_EXT: &str = "sma";

/// File extension of include files
pub const INCLUDE_EXT: &str = "inc";

/// File extension of compiled plugins
pub const PLUGIN_EXT: &str = "amxx";
