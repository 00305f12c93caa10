//! Build command implementation

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use super::{load_project, EXIT_ERROR, EXIT_SUCCESS};
use crate::build::{BuildContext, BuildPipeline, ConsoleProgress, DirWriter, JsonProgress};
use crate::config::loader::{merge_cli_overrides, CliOverrides};
use crate::config::{OutputMode, TransformErrorPolicy};

/// Flags of the build command
#[derive(Debug, Default)]
pub struct BuildArgs {
    pub out: Option<PathBuf>,
    pub site: Option<String>,
    pub output: Option<OutputMode>,
    pub jobs: Option<usize>,
    pub on_transform_error: Option<TransformErrorPolicy>,
    pub dry_run: bool,
    pub json: bool,
}

/// Run the build command
pub fn run_build(config_path: Option<&Path>, args: BuildArgs, verbose: bool) -> ExitCode {
    let (mut config, project_root) = match load_project(config_path) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let overrides = CliOverrides {
        out: args.out,
        site: args.site,
        output: args.output,
        jobs: args.jobs,
        on_transform_error: args.on_transform_error,
    };
    merge_cli_overrides(&mut config, &overrides);

    // Overrides may have introduced an invalid site origin
    let errors = config.validate();
    if !errors.is_empty() {
        for error in errors {
            eprintln!("Error: {}", error);
        }
        return ExitCode::from(EXIT_ERROR);
    }

    let context = BuildContext::new(config, project_root);
    let out_dir = context.out_dir();

    let pipeline = match BuildPipeline::new(context) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let pipeline = if args.json {
        pipeline.with_progress(JsonProgress::new())
    } else {
        pipeline.with_progress(ConsoleProgress::new().with_verbose(verbose))
    };

    let pipeline = if args.dry_run {
        println!("Dry run - nothing will be written to {}", out_dir.display());
        pipeline
    } else {
        pipeline.with_writer(DirWriter::new(&out_dir))
    };

    match pipeline.run() {
        Ok(artifact) => {
            if args.dry_run {
                for path in artifact.files.paths() {
                    println!("  would write {}", path);
                }
            }
            println!("{}", artifact.summary());
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Build error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
