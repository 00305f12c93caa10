//! Chunk emission and automatic placement of unassigned modules.

use super::planner::PlannedChunk;
use crate::build::{Module, OutputFile};
use thiserror::Error;

/// Directory chunks are emitted into, relative to the output root.
pub const CHUNK_DIR: &str = "chunks";

/// A module could not be placed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot bundle {module}: {message}")]
pub struct BundleError {
    pub module: String,
    pub message: String,
}

impl BundleError {
    pub fn new(module: impl Into<String>, message: impl Into<String>) -> Self {
        Self { module: module.into(), message: message.into() }
    }
}

/// Places modules that no manual chunk claims.
///
/// This stands in for the bundler's own splitting heuristic.
pub trait AutoChunker: Send + Sync {
    fn name(&self) -> &str;

    /// Produce outputs for the given modules. Every module must end up in
    /// exactly one returned file.
    fn place(&self, modules: &[&Module]) -> Result<Vec<OutputFile>, BundleError>;
}

/// Keeps every unassigned module as its own output at its own path.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntryChunker;

impl AutoChunker for EntryChunker {
    fn name(&self) -> &str {
        "entry"
    }

    fn place(&self, modules: &[&Module]) -> Result<Vec<OutputFile>, BundleError> {
        modules
            .iter()
            .map(|module| {
                if module.specifier.is_empty() {
                    return Err(BundleError::new("<unnamed>", "module has an empty specifier"));
                }
                Ok(OutputFile::module(module.specifier.clone(), module.contents.clone()))
            })
            .collect()
    }
}

/// Output path of a named chunk.
pub fn chunk_path(name: &str) -> String {
    format!("{}/{}.js", CHUNK_DIR, name)
}

/// Concatenate a chunk's members, each preceded by a `// <specifier>` line.
pub fn render_chunk(chunk: &PlannedChunk<'_>) -> OutputFile {
    let mut contents = Vec::new();
    for module in &chunk.modules {
        contents.extend_from_slice(format!("// {}\n", module.specifier).as_bytes());
        contents.extend_from_slice(&module.contents);
        contents.push(b'\n');
    }
    OutputFile::chunk(chunk_path(&chunk.name), contents)
}
