//! Writing a finished artifact.

use crate::build::OutputSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// A file of the artifact could not be written.
#[derive(Debug, Error)]
#[error("failed to write {}: {source}", .path.display())]
pub struct EmitError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Persists an artifact somewhere.
pub trait ArtifactWriter: Send + Sync {
    /// Write every file, returning the paths written.
    fn write(&self, files: &OutputSet) -> Result<Vec<PathBuf>, EmitError>;
}

/// Writes the artifact below a directory.
#[derive(Debug, Clone)]
pub struct DirWriter {
    root: PathBuf,
}

impl DirWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Target path for an output path; rejects paths escaping the root.
    fn target(&self, rel: &str) -> Result<PathBuf, EmitError> {
        let rel_path = Path::new(rel);
        let escapes = rel_path
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes || rel.is_empty() {
            return Err(EmitError {
                path: rel_path.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "output path must be relative and stay inside the output directory",
                ),
            });
        }
        Ok(self.root.join(rel_path))
    }
}

impl ArtifactWriter for DirWriter {
    fn write(&self, files: &OutputSet) -> Result<Vec<PathBuf>, EmitError> {
        let mut written = Vec::with_capacity(files.len());
        for file in files.iter() {
            let target = self.target(&file.path)?;
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .map_err(|source| EmitError { path: parent.to_path_buf(), source })?;
            }
            fs::write(&target, &file.contents)
                .map_err(|source| EmitError { path: target.clone(), source })?;
            written.push(target);
        }
        debug!(root = %self.root.display(), files = written.len(), "artifact written");
        Ok(written)
    }
}
