//! sitepack - command-line static site build orchestrator

use std::process::ExitCode;

use sitepack::cli;

fn main() -> ExitCode {
    cli::run()
}
