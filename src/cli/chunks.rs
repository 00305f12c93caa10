//! Chunks command implementation

use std::path::Path;
use std::process::ExitCode;

use super::{load_project, EXIT_ERROR, EXIT_SUCCESS};
use crate::bundle::ChunkPlanner;

/// Print the manual chunk for each specifier, `(auto)` when none claims it.
pub fn run_chunks(config_path: Option<&Path>, specifiers: &[String]) -> ExitCode {
    let config = match load_project(config_path) {
        Ok((config, _)) => config,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let planner = ChunkPlanner::new(&config.bundling);
    for specifier in specifiers {
        println!("{}\t{}", specifier, planner.plan_chunk(specifier).unwrap_or("(auto)"));
    }
    ExitCode::from(EXIT_SUCCESS)
}
