//! Build orchestration: mirrors assets and includes, compiles every script
//! that is not up to date, and keeps the plugins cache in sync.

mod mirror;
mod watch;

use std::path::{Path, PathBuf};

use glob::Pattern;
use tracing::{debug, error, info, warn};

use crate::cache::{PluginsCache, CACHE_FILE_NAME};
use crate::compiler::{
    AmxxpcCompiler, CompileRequest, Compiler, Diagnostic, Severity, COMPILATION_ERROR, SINGLE_LINE,
};
use crate::config::{AssetInput, ProjectConfig};
use crate::errors::{BuildError, Result};
use crate::{INCLUDE_EXT, PLUGIN_EXT, SCRIPT_EXT};

pub use mirror::{copy_file, find_files, matches_path, nested_dirs, relative_to, AssetFilter};
pub use watch::{StopHandle, WatchSession};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Log failed compiles and keep going instead of aborting the batch
    pub ignore_errors: bool,
    /// Neither consult nor update the plugins cache
    pub no_cache: bool,
}

/// One compile attempt for one script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileJob {
    pub script_root: PathBuf,
    pub relative_path: PathBuf,
    pub options: BuildOptions,
}

impl CompileJob {
    pub fn new(
        script_root: impl Into<PathBuf>,
        relative_path: impl Into<PathBuf>,
        options: BuildOptions,
    ) -> Self {
        Self {
            script_root: script_root.into(),
            relative_path: relative_path.into(),
            options,
        }
    }

    pub fn script_path(&self) -> PathBuf {
        self.script_root.join(&self.relative_path)
    }
}

/// Plugin destination for a script: `<plugins>/<nesting?>/<stem>.amxx`
pub fn plugin_path(plugins_dir: &Path, relative_script: &Path, flat: bool) -> PathBuf {
    let mut dir = plugins_dir.to_path_buf();
    if !flat {
        if let Some(parent) = relative_script.parent() {
            dir.push(parent);
        }
    }

    let mut file_name = relative_script.file_stem().unwrap_or_default().to_os_string();
    file_name.push(".");
    file_name.push(PLUGIN_EXT);

    dir.join(file_name)
}

/// Incremental builder for one project
pub struct Builder {
    config: ProjectConfig,
    cache: PluginsCache,
    cache_file: PathBuf,
    compiler: Box<dyn Compiler>,
    working_dir: PathBuf,
}

impl Builder {
    /// Create a builder that runs the configured `amxxpc` executable
    pub fn new(config: ProjectConfig) -> Self {
        Self::with_compiler(config, Box::new(AmxxpcCompiler::new()))
    }

    /// Create a builder over a custom compiler (for testing)
    pub fn with_compiler(config: ProjectConfig, compiler: Box<dyn Compiler>) -> Self {
        let cache_file = config.project_dir.join(CACHE_FILE_NAME);
        let mut cache = PluginsCache::new(&config.project_dir);
        cache.load(&cache_file);

        let working_dir =
            std::env::current_dir().unwrap_or_else(|_| config.project_dir.clone());

        Self {
            config,
            cache,
            cache_file,
            compiler,
            working_dir,
        }
    }

    /// Persist the cache at `cache_file` instead of the project default
    pub fn with_cache_file(mut self, cache_file: impl Into<PathBuf>) -> Self {
        self.cache_file = cache_file.into();
        self.cache.load(&self.cache_file);
        self
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn cache(&self) -> &PluginsCache {
        &self.cache
    }

    pub fn cache_file(&self) -> &Path {
        &self.cache_file
    }

    pub fn save_cache(&self) -> Result<()> {
        self.cache.save(&self.cache_file)?;
        Ok(())
    }

    /// Mirror assets and includes, then compile every script.
    ///
    /// Returns whether every compile succeeded.
    pub fn build(&mut self, options: BuildOptions) -> Result<bool> {
        info!("Building...");

        self.build_assets()?;
        self.build_include()?;
        let success = self.build_scripts(options)?;

        if success {
            info!("Build finished!");
        } else {
            warn!("Build finished with errors");
        }

        Ok(success)
    }

    /// Compile every script under every script root, in path order.
    ///
    /// The cache is saved afterwards unless `no_cache`, even when a compile
    /// aborted the batch.
    pub fn build_scripts(&mut self, options: BuildOptions) -> Result<bool> {
        self.run_batch(options, |builder| {
            let mut success = true;

            for root in builder.config.input.scripts.clone() {
                for relative in find_files(&root, Some(SCRIPT_EXT))? {
                    let job = CompileJob::new(&root, relative, options);
                    success &= builder.compile_one(&job)?;
                }
            }

            Ok(success)
        })
    }

    /// Compile scripts whose relative path or file name matches `pattern`
    pub fn compile_matching(&mut self, pattern: &str, options: BuildOptions) -> Result<bool> {
        let glob = Pattern::new(pattern).map_err(|source| BuildError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;

        self.run_batch(options, |builder| {
            let mut success = true;
            let mut matched = 0;

            for root in builder.config.input.scripts.clone() {
                for relative in find_files(&root, Some(SCRIPT_EXT))? {
                    if !matches_path(&glob, &relative) {
                        continue;
                    }

                    matched += 1;
                    let job = CompileJob::new(&root, relative, options);
                    success &= builder.compile_one(&job)?;
                }
            }

            if matched == 0 {
                warn!("No scripts match \"{}\"", pattern);
            }

            Ok(success)
        })
    }

    /// Compile a single script given by path.
    ///
    /// The script root containing it decides the plugin nesting; a script
    /// outside every root is treated as a root of its own.
    pub fn compile_path(&mut self, path: &Path, options: BuildOptions) -> Result<bool> {
        let path = std::path::absolute(path).map_err(|e| BuildError::io(path, e))?;

        let job = self
            .config
            .input
            .scripts
            .iter()
            .find_map(|root| {
                relative_to(root, &path).map(|relative| CompileJob::new(root, relative, options))
            })
            .unwrap_or_else(|| {
                let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
                let relative = path.file_name().map(PathBuf::from).unwrap_or_default();
                CompileJob::new(root, relative, options)
            });

        self.run_batch(options, |builder| builder.compile_one(&job))
    }

    /// Compile one script unless its plugin is up to date.
    ///
    /// Returns `Ok(false)` for a failed compile when `ignore_errors` is set;
    /// otherwise a failed compile is an error that aborts the batch.
    pub fn compile_one(&mut self, job: &CompileJob) -> Result<bool> {
        let plugins_dir = self
            .config
            .output
            .plugins
            .as_deref()
            .ok_or(BuildError::OutputDisabled("plugins"))?;

        let src_path = job.script_path();
        let dest_path = plugin_path(
            plugins_dir,
            &job.relative_path,
            self.config.rules.flat_compilation,
        );
        let display_path = self.display_path(&src_path);

        if !job.options.no_cache && self.cache.is_up_to_date(&src_path, &dest_path) {
            info!("Plugin already up to date: {}", display_path);
            return Ok(true);
        }

        let request = CompileRequest {
            script: src_path.clone(),
            dest: dest_path.clone(),
            executable: self.config.compiler_executable(),
            include_dirs: self.include_search_path(),
        };

        debug!("Compiling {}", display_path);
        let outcome = self.compiler.compile(&request);

        for diagnostic in &outcome.diagnostics {
            report_diagnostic(diagnostic, &display_path);
        }

        if outcome.success {
            if !job.options.no_cache {
                self.cache.record_compiled(&src_path, &dest_path);
            }

            self.update_script(job)?;

            info!("Compilation success: {}", display_path);
            info!("Plugin updated: {}", self.display_path(&dest_path));
            return Ok(true);
        }

        if !job.options.no_cache {
            self.cache.invalidate(&src_path);
        }

        let message = outcome
            .error_message
            .unwrap_or_else(|| COMPILATION_ERROR.to_string());

        if job.options.ignore_errors {
            error!("Failed to compile {}: \"{}\"", display_path, message);
            return Ok(false);
        }

        Err(BuildError::Compile {
            path: PathBuf::from(display_path),
            message,
        })
    }

    /// Copy every include file into the include output
    pub fn build_include(&self) -> Result<()> {
        if self.config.output.include.is_none() {
            debug!("Include output disabled, skipping includes");
            return Ok(());
        }

        for root in &self.config.input.include {
            for relative in find_files(root, Some(INCLUDE_EXT))? {
                self.update_include(root, &root.join(relative))?;
            }
        }

        Ok(())
    }

    /// Copy every asset passing its input's filter into the assets output
    pub fn build_assets(&self) -> Result<()> {
        if self.config.output.assets.is_none() {
            debug!("Assets output disabled, skipping assets");
            return Ok(());
        }

        for asset in &self.config.input.assets {
            let filter = AssetFilter::new(&asset.filter)?;
            for relative in find_files(&asset.dir, None)? {
                self.mirror_asset(asset, &filter, &asset.dir.join(relative))?;
            }
        }

        Ok(())
    }

    /// Mirror one script into the scripts output
    pub fn update_script(&self, job: &CompileJob) -> Result<()> {
        let Some(out_dir) = &self.config.output.scripts else {
            return Ok(());
        };

        let dest_path = out_dir.join(&job.relative_path);
        copy_file(&job.script_path(), &dest_path)?;
        info!("Script updated: {}", self.display_path(&dest_path));
        Ok(())
    }

    /// Mirror one include file found under `root`
    pub fn update_include(&self, root: &Path, path: &Path) -> Result<()> {
        let Some(out_dir) = &self.config.output.include else {
            return Ok(());
        };

        let relative = relative_to(root, path).unwrap_or_else(|| file_name_of(path));
        let dest_path = out_dir.join(relative);
        copy_file(path, &dest_path)?;
        info!("Include updated: {}", self.display_path(&dest_path));
        Ok(())
    }

    /// Mirror one asset file; returns `false` when the filter rejects it
    pub fn mirror_asset(&self, asset: &AssetInput, filter: &AssetFilter, path: &Path) -> Result<bool> {
        let Some(out_dir) = &self.config.output.assets else {
            return Ok(false);
        };

        let relative = relative_to(&asset.dir, path).unwrap_or_else(|| file_name_of(path));
        if !filter.matches(&relative) {
            debug!("Asset filtered out: {}", relative.display());
            return Ok(false);
        }

        let mut dest_path = out_dir.clone();
        if let Some(dest) = &asset.dest {
            dest_path.push(dest);
        }
        dest_path.push(relative);

        copy_file(path, &dest_path)?;
        info!("Asset updated: {}", self.display_path(&dest_path));
        Ok(true)
    }

    /// Recompute the include fingerprint over every include directory
    pub fn refresh_include_fingerprint(&mut self) {
        let mut dirs = self.config.compiler_include_dirs();
        dirs.extend(self.config.include.iter().cloned());
        dirs.extend(self.config.input.include.iter().cloned());

        self.cache.refresh_include_fingerprint(&dirs);
    }

    /// Existing project include roots, each followed by its nested directories
    pub fn project_include_dirs(&self) -> Vec<PathBuf> {
        self.config
            .input
            .include
            .iter()
            .filter(|root| root.is_dir())
            .flat_map(|root| nested_dirs(root))
            .collect()
    }

    /// Compiler include dirs, extra include dirs, then project include dirs
    pub fn include_search_path(&self) -> Vec<PathBuf> {
        let mut dirs = self.config.compiler_include_dirs();
        dirs.extend(self.config.include.iter().cloned());
        dirs.extend(self.project_include_dirs());
        dirs
    }

    fn run_batch(
        &mut self,
        options: BuildOptions,
        batch: impl FnOnce(&mut Self) -> Result<bool>,
    ) -> Result<bool> {
        if !options.no_cache {
            self.refresh_include_fingerprint();
        }

        let result = batch(self);

        if !options.no_cache {
            if let Err(e) = self.save_cache() {
                if result.is_ok() {
                    return Err(e);
                }
                warn!("Failed to save cache: {}", e);
            }
        }

        result
    }

    fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.working_dir)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

fn file_name_of(path: &Path) -> PathBuf {
    path.file_name().map(PathBuf::from).unwrap_or_default()
}

fn report_diagnostic(diagnostic: &Diagnostic, script: &str) {
    let file = diagnostic.filename.as_deref().unwrap_or(script);
    let location = match (diagnostic.start_line, diagnostic.end_line) {
        (Some(start), Some(end)) if end != SINGLE_LINE => format!("{file}({start} -- {end})"),
        (Some(start), _) => format!("{file}({start})"),
        (None, _) => file.to_string(),
    };
    let code = diagnostic
        .code
        .map(|code| format!(" {code}"))
        .unwrap_or_default();

    match diagnostic.severity {
        Severity::Error | Severity::FatalError => error!(
            "{} : {}{}: {}",
            location, diagnostic.severity, code, diagnostic.text
        ),
        Severity::Warning => warn!(
            "{} : {}{}: {}",
            location, diagnostic.severity, code, diagnostic.text
        ),
        Severity::Echo => debug!("{}", diagnostic.text),
    }
}
