use std::path::{Path, PathBuf};

use amxxpack_core::{config, BuildOptions, Builder, WatchSession};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

/// AMXXPack - incremental build tool for AMX Mod X plugins
#[derive(Parser, Debug)]
#[command(name = "amxxpack")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Mirror assets and includes, then compile every script
    Build {
        #[command(flatten)]
        common: CommonArgs,

        /// Keep watching for changes after the build
        #[arg(short, long)]
        watch: bool,

        /// Keep compiling after a script fails
        #[arg(long)]
        ignore: bool,
    },
    /// Compile scripts matching a glob pattern, or a single script path
    Compile {
        #[arg(value_name = "PATTERN")]
        pattern: String,

        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Path to the project config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Disable the plugins cache
    #[arg(long)]
    no_cache: bool,

    /// Show compiler echo output and internal details
    #[arg(long)]
    debug: bool,
}

impl CommonArgs {
    fn init_logging(&self) {
        let level = if self.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        };

        // RUST_LOG wins when set; --debug only moves the default
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(level.as_str()));

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }

    fn builder(&self) -> anyhow::Result<Builder> {
        let project_dir = std::env::current_dir()?;
        let config = config::load(self.config.as_deref(), &project_dir)?;
        debug!("Project directory: {}", config.project_dir.display());
        Ok(Builder::new(config))
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let common = match &cli.command {
        Command::Build { common, .. } | Command::Compile { common, .. } => common,
    };
    common.init_logging();

    match run(cli.command) {
        Ok(true) => Ok(()),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}

fn run(command: Command) -> anyhow::Result<bool> {
    match command {
        Command::Build {
            common,
            watch,
            ignore,
        } => {
            let options = BuildOptions {
                ignore_errors: ignore,
                no_cache: common.no_cache,
            };

            let mut builder = common.builder()?;

            if !watch {
                return Ok(builder.build(options)?);
            }

            watch_mode(builder, options)
        }
        Command::Compile { pattern, common } => {
            let options = BuildOptions {
                ignore_errors: true,
                no_cache: common.no_cache,
            };

            let mut builder = common.builder()?;

            let path = Path::new(&pattern);
            if path.is_file() {
                Ok(builder.compile_path(path, options)?)
            } else {
                Ok(builder.compile_matching(&pattern, options)?)
            }
        }
    }
}

/// Full build, then recompile on changes until the process is interrupted
fn watch_mode(mut builder: Builder, options: BuildOptions) -> anyhow::Result<bool> {
    // A failing initial build must not prevent watching
    let watch_options = BuildOptions {
        ignore_errors: true,
        ..options
    };

    if let Err(e) = builder.build(watch_options) {
        error!("{}", e);
    }

    info!("Press Ctrl+C to stop");
    let session = WatchSession::start(builder, watch_options)?;
    session.run()?;
    Ok(true)
}
