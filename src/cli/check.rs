//! Check command implementation

use std::path::Path;
use std::process::ExitCode;

use super::{load_project, EXIT_ERROR, EXIT_SUCCESS};
use crate::assets::{AssetKind, ServiceResolver};
use crate::bundle::ChunkPlanner;
use crate::config::ConfigError;
use crate::integrations::{IntegrationCatalog, IntegrationRegistry};

/// Run the check command
pub fn run_check(config_path: Option<&Path>) -> ExitCode {
    match check(config_path) {
        Ok(report) => {
            print!("{}", report);
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn check(config_path: Option<&Path>) -> Result<String, ConfigError> {
    let (config, root) = load_project(config_path)?;
    let registry = IntegrationRegistry::from_refs(&config.integrations, IntegrationCatalog::builtin())?;
    let services = ServiceResolver::from_config(&config.imaging)?;
    let planner = ChunkPlanner::new(&config.bundling);

    let mut out = String::new();
    out.push_str(&format!("Project: {}\n", root.display()));
    out.push_str(&format!("Output mode: {}\n", config.output));
    out.push_str(&format!("Site: {}\n", config.site.as_deref().unwrap_or("(not set)")));

    out.push_str(&format!("Integrations ({}):\n", registry.ordered_handles().len()));
    for handle in registry.ordered_handles() {
        out.push_str(&format!("  {}. {}\n", handle.position() + 1, handle.name()));
    }

    out.push_str(&format!("Manual chunks ({}):\n", planner.chunk_names().len()));
    for chunk in config.bundling.manual_chunks.iter() {
        out.push_str(&format!("  {}: {}\n", chunk.name, chunk.modules.join(", ")));
    }
    for conflict in planner.conflicts() {
        out.push_str(&format!(
            "  warning: '{}' is listed in {} too; '{}' wins\n",
            conflict.specifier,
            conflict.shadowed.join(", "),
            conflict.winner
        ));
    }

    let image = services.resolve(AssetKind::Image);
    let entrypoint = config.imaging.service.as_ref().map(|s| s.entrypoint.as_str());
    out.push_str(&format!(
        "Image service: {}{}\n",
        image.name(),
        entrypoint.map(|e| format!(" ({})", e)).unwrap_or_default()
    ));

    out.push_str("Config OK\n");
    Ok(out)
}
