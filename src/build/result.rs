//! Build result types.
//!
//! Contains the output set a build accumulates and the artifact it returns.

use crate::assets::AssetKind;
use crate::build::{BuildPhase, PhaseTiming};
use crate::config::OutputMode;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// What produced an output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputKind {
    /// Compiled page
    Page,
    /// Module kept at its own path
    Module,
    /// Manual chunk
    Chunk,
    /// Transformed asset
    Asset(AssetKind),
    /// Static file copied as-is
    Static,
    /// Written by an integration
    Generated,
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputKind::Page => write!(f, "page"),
            OutputKind::Module => write!(f, "module"),
            OutputKind::Chunk => write!(f, "chunk"),
            OutputKind::Asset(kind) => write!(f, "asset:{}", kind),
            OutputKind::Static => write!(f, "static"),
            OutputKind::Generated => write!(f, "generated"),
        }
    }
}

/// One file in the build output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    /// Path relative to the output directory, `/`-separated
    pub path: String,
    pub kind: OutputKind,
    pub contents: Vec<u8>,
}

impl OutputFile {
    pub fn new(path: String, kind: OutputKind, contents: Vec<u8>) -> Self {
        Self { path, kind, contents }
    }

    pub fn page(path: String, contents: Vec<u8>) -> Self {
        Self::new(path, OutputKind::Page, contents)
    }

    pub fn module(path: String, contents: Vec<u8>) -> Self {
        Self::new(path, OutputKind::Module, contents)
    }

    pub fn chunk(path: String, contents: Vec<u8>) -> Self {
        Self::new(path, OutputKind::Chunk, contents)
    }

    pub fn asset(path: String, kind: AssetKind, contents: Vec<u8>) -> Self {
        Self::new(path, OutputKind::Asset(kind), contents)
    }

    pub fn static_file(path: String, contents: Vec<u8>) -> Self {
        Self::new(path, OutputKind::Static, contents)
    }

    pub fn generated(path: String, contents: Vec<u8>) -> Self {
        Self::new(path, OutputKind::Generated, contents)
    }
}

/// Output files keyed by path. Iteration is sorted by path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputSet {
    files: BTreeMap<String, OutputFile>,
}

impl OutputSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a file, returning the one it replaced.
    pub fn insert(&mut self, file: OutputFile) -> Option<OutputFile> {
        self.files.insert(file.path.clone(), file)
    }

    pub fn remove(&mut self, path: &str) -> Option<OutputFile> {
        self.files.remove(path)
    }

    pub fn get(&self, path: &str) -> Option<&OutputFile> {
        self.files.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &OutputFile> {
        self.files.values()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn paths(&self) -> Vec<&str> {
        self.files.keys().map(String::as_str).collect()
    }

    /// Number of files of a given kind.
    pub fn count_kind(&self, kind: OutputKind) -> usize {
        self.files.values().filter(|f| f.kind == kind).count()
    }
}

impl FromIterator<OutputFile> for OutputSet {
    fn from_iter<I: IntoIterator<Item = OutputFile>>(iter: I) -> Self {
        let mut set = OutputSet::new();
        for file in iter {
            set.insert(file);
        }
        set
    }
}

/// A non-fatal problem recorded during a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildWarning {
    pub phase: BuildPhase,
    /// Integration name, asset path or module specifier
    pub source: Option<String>,
    pub message: String,
}

impl fmt::Display for BuildWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "[{}] {}: {}", self.phase, source, self.message),
            None => write!(f, "[{}] {}", self.phase, self.message),
        }
    }
}

/// Result of a complete build run.
#[derive(Debug, Clone)]
pub struct BuildArtifact {
    pub output_mode: OutputMode,
    pub files: OutputSet,
    /// Manual chunk name to member specifiers
    pub chunks: BTreeMap<String, Vec<String>>,
    pub warnings: Vec<BuildWarning>,
    /// Phases that ran, in order
    pub phases: Vec<PhaseTiming>,
    pub total_duration: Duration,
}

impl BuildArtifact {
    /// Phases that ran, in order.
    pub fn completed_phases(&self) -> Vec<BuildPhase> {
        self.phases.iter().map(|t| t.phase).collect()
    }

    /// Format a summary of the build.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!(
            "Build succeeded ({} output): {} files, {} chunks in {:?}",
            self.output_mode,
            self.files.len(),
            self.chunks.len(),
            self.total_duration
        ));

        if !self.warnings.is_empty() {
            lines.push(format!("Warnings ({}):", self.warnings.len()));
            for warning in self.warnings.iter().take(5) {
                lines.push(format!("  - {}", warning));
            }
            if self.warnings.len() > 5 {
                lines.push(format!("  ... and {} more", self.warnings.len() - 5));
            }
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_set_sorted_and_replacing() {
        let mut set = OutputSet::new();
        set.insert(OutputFile::page("b.html".to_string(), b"1".to_vec()));
        set.insert(OutputFile::page("a.html".to_string(), b"2".to_vec()));
        let replaced = set.insert(OutputFile::static_file("b.html".to_string(), b"3".to_vec()));

        assert_eq!(replaced.map(|f| f.contents), Some(b"1".to_vec()));
        assert_eq!(set.paths(), vec!["a.html", "b.html"]);
        assert_eq!(set.get("b.html").unwrap().kind, OutputKind::Static);
        assert_eq!(set.count_kind(OutputKind::Page), 1);
    }

    #[test]
    fn test_output_kind_display() {
        assert_eq!(OutputKind::Asset(AssetKind::Image).to_string(), "asset:image");
        assert_eq!(OutputKind::Generated.to_string(), "generated");
    }

    #[test]
    fn test_warning_display() {
        let warning = BuildWarning {
            phase: BuildPhase::TransformAssets,
            source: Some("img/a.png".to_string()),
            message: "kept original".to_string(),
        };
        assert_eq!(warning.to_string(), "[transformAssets] img/a.png: kept original");
    }

    #[test]
    fn test_summary_truncates_warnings() {
        let artifact = BuildArtifact {
            output_mode: OutputMode::Static,
            files: OutputSet::new(),
            chunks: BTreeMap::new(),
            warnings: (0..7)
                .map(|i| BuildWarning {
                    phase: BuildPhase::Emit,
                    source: None,
                    message: format!("w{}", i),
                })
                .collect(),
            phases: Vec::new(),
            total_duration: Duration::ZERO,
        };
        let summary = artifact.summary();
        assert!(summary.contains("Warnings (7):"));
        assert!(summary.contains("... and 2 more"));
    }
}
