//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod build;
mod check;
mod chunks;

use crate::config::loader::{find_config, load_config_file};
use crate::config::{default_config, ConfigError, OutputMode, SiteConfig, TransformErrorPolicy};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Process exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// sitepack - static site build orchestrator
#[derive(Parser)]
#[command(name = "sitepack")]
#[command(about = "sitepack - build a static site from pages, modules and assets")]
#[command(version)]
pub struct Cli {
    /// Path to sitepack.toml or sitepack.json5 (default: search upward from the cwd)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the site
    Build {
        /// Output directory (overrides project.out)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Site origin used for absolute URLs (overrides site)
        #[arg(long)]
        site: Option<String>,

        /// Output mode: static, server or hybrid
        #[arg(long)]
        output: Option<OutputMode>,

        /// Number of asset transform workers
        #[arg(short, long)]
        jobs: Option<usize>,

        /// What to do when an asset service fails: fail or passthrough
        #[arg(long)]
        on_transform_error: Option<TransformErrorPolicy>,

        /// Run every phase but do not write any files
        #[arg(long)]
        dry_run: bool,

        /// Report progress as JSON lines on stderr
        #[arg(long)]
        json: bool,
    },

    /// Validate the configuration and show what a build would use
    Check,

    /// Show which manual chunk each module specifier lands in
    Chunks {
        /// Module specifiers to look up
        #[arg(required = true)]
        specifiers: Vec<String>,
    },
}

/// Install the tracing subscriber. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "sitepack=debug" } else { "warn" }));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .try_init();
}

/// Load the configuration and find the project root.
///
/// With an explicit path the file must exist. Otherwise the config is
/// searched for upward from the cwd, and defaults are used when none exists.
pub(crate) fn load_project(config: Option<&Path>) -> Result<(SiteConfig, PathBuf), ConfigError> {
    let cwd = std::env::current_dir()?;
    let path = match config {
        Some(p) => Some(if p.is_absolute() { p.to_path_buf() } else { cwd.join(p) }),
        None => find_config(),
    };

    match path {
        Some(path) => {
            let config = load_config_file(&path)?;
            let root = path.parent().map(Path::to_path_buf).unwrap_or(cwd);
            debug!(config = %path.display(), root = %root.display(), "using config");
            Ok((config, root))
        }
        None => {
            debug!(root = %cwd.display(), "no config file found, using defaults");
            Ok((default_config(), cwd))
        }
    }
}

/// Run the CLI
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Build { out, site, output, jobs, on_transform_error, dry_run, json } => {
            if jobs == Some(0) {
                eprintln!("Error: --jobs must be at least 1");
                return ExitCode::from(EXIT_INVALID_ARGS);
            }
            build::run_build(
                cli.config.as_deref(),
                build::BuildArgs { out, site, output, jobs, on_transform_error, dry_run, json },
                cli.verbose,
            )
        }
        Commands::Check => check::run_check(cli.config.as_deref()),
        Commands::Chunks { specifiers } => chunks::run_chunks(cli.config.as_deref(), &specifiers),
    }
}
