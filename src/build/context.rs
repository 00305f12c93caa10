//! Build context containing configuration and state for a build.

use crate::assets::TransformParams;
use crate::build::{
    BuildArtifact, BuildPhase, BuildWarning, OutputFile, OutputSet, PhaseTiming, ResolvedSources,
};
use crate::config::{OutputMode, SiteConfig};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Mutable state threaded through every phase and hook of one build.
///
/// The configuration is shared and read-only. Everything else is owned by
/// the run: resolved sources, the growing output set, chunk assignments,
/// per-asset parameter overrides, warnings and a free-form metadata map
/// integrations may use to pass values to each other.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// The loaded configuration
    config: Arc<SiteConfig>,
    /// Project root directory (where sitepack.toml is located)
    project_root: PathBuf,
    phase: BuildPhase,
    sources: ResolvedSources,
    outputs: OutputSet,
    chunks: BTreeMap<String, Vec<String>>,
    asset_params: BTreeMap<String, TransformParams>,
    warnings: Vec<BuildWarning>,
    metadata: BTreeMap<String, serde_json::Value>,
}

impl BuildContext {
    /// Create a new build context.
    ///
    /// # Arguments
    /// - `config` - The loaded configuration
    /// - `project_root` - The project root directory
    pub fn new(config: SiteConfig, project_root: PathBuf) -> Self {
        Self::with_shared_config(Arc::new(config), project_root)
    }

    /// Create a context around an already shared configuration.
    pub fn with_shared_config(config: Arc<SiteConfig>, project_root: PathBuf) -> Self {
        Self {
            config,
            project_root,
            phase: BuildPhase::Init,
            sources: ResolvedSources::default(),
            outputs: OutputSet::new(),
            chunks: BTreeMap::new(),
            asset_params: BTreeMap::new(),
            warnings: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Shared handle to the configuration.
    pub fn shared_config(&self) -> Arc<SiteConfig> {
        Arc::clone(&self.config)
    }

    /// Get the project root directory.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Get the source directory (resolved to absolute path).
    pub fn src_dir(&self) -> PathBuf {
        self.resolve_path(&self.config.project.src)
    }

    /// Get the public directory (resolved to absolute path).
    pub fn public_dir(&self) -> PathBuf {
        self.resolve_path(&self.config.project.public)
    }

    /// Get the output directory (resolved to absolute path).
    pub fn out_dir(&self) -> PathBuf {
        self.resolve_path(&self.config.project.out)
    }

    /// Resolve a path relative to the project root.
    ///
    /// If the path is absolute, returns it unchanged.
    /// If relative, joins it with the project root.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        crate::config::loader::resolve_path(&self.project_root, path)
    }

    pub fn site(&self) -> Option<&str> {
        self.config.site.as_deref()
    }

    pub fn output_mode(&self) -> OutputMode {
        self.config.output
    }

    /// Phase the build is currently in.
    pub fn phase(&self) -> BuildPhase {
        self.phase
    }

    pub(crate) fn set_phase(&mut self, phase: BuildPhase) {
        self.phase = phase;
    }

    pub fn sources(&self) -> &ResolvedSources {
        &self.sources
    }

    /// Hooks running after resolve may add or drop sources before bundling.
    pub fn sources_mut(&mut self) -> &mut ResolvedSources {
        &mut self.sources
    }

    pub(crate) fn set_sources(&mut self, sources: ResolvedSources) {
        self.sources = sources;
    }

    pub fn outputs(&self) -> &OutputSet {
        &self.outputs
    }

    pub fn outputs_mut(&mut self) -> &mut OutputSet {
        &mut self.outputs
    }

    /// Add a file to the output set, replacing any file at the same path.
    pub fn add_output(&mut self, file: OutputFile) -> Option<OutputFile> {
        self.outputs.insert(file)
    }

    /// Manual chunk assignments recorded during bundling.
    pub fn chunks(&self) -> &BTreeMap<String, Vec<String>> {
        &self.chunks
    }

    pub fn record_chunk(&mut self, name: impl Into<String>, modules: Vec<String>) {
        self.chunks.insert(name.into(), modules);
    }

    /// Override transform parameters for one asset path.
    ///
    /// Set fields win over the service defaults from `imaging.service.options`.
    pub fn set_asset_params(&mut self, path: impl Into<String>, params: TransformParams) {
        self.asset_params.insert(path.into(), params);
    }

    pub fn asset_params(&self, path: &str) -> Option<&TransformParams> {
        self.asset_params.get(path)
    }

    /// Record a warning against the current phase.
    pub fn warn(&mut self, source: Option<&str>, message: impl Into<String>) {
        self.warnings.push(BuildWarning {
            phase: self.phase,
            source: source.map(str::to_string),
            message: message.into(),
        });
    }

    pub fn warnings(&self) -> &[BuildWarning] {
        &self.warnings
    }

    pub fn metadata(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.metadata
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.metadata.insert(key.into(), value);
    }

    pub fn get_metadata(&self, key: &str) -> Option<&serde_json::Value> {
        self.metadata.get(key)
    }

    /// Consume the context into the artifact of a finished run.
    pub fn into_artifact(self, phases: Vec<PhaseTiming>, total_duration: Duration) -> BuildArtifact {
        BuildArtifact {
            output_mode: self.config.output,
            files: self.outputs,
            chunks: self.chunks,
            warnings: self.warnings,
            phases,
            total_duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_config;
    use serde_json::json;

    #[test]
    fn test_build_context_new() {
        let root = PathBuf::from("/project");
        let ctx = BuildContext::new(default_config(), root.clone());

        assert_eq!(ctx.project_root(), &root);
        assert_eq!(ctx.phase(), BuildPhase::Init);
        assert!(ctx.outputs().is_empty());
        assert!(ctx.sources().is_empty());
    }

    #[test]
    fn test_build_context_dirs() {
        let ctx = BuildContext::new(default_config(), PathBuf::from("/project"));
        assert_eq!(ctx.src_dir(), PathBuf::from("/project/src"));
        assert_eq!(ctx.public_dir(), PathBuf::from("/project/public"));
        assert_eq!(ctx.out_dir(), PathBuf::from("/project/dist"));
        assert_eq!(ctx.resolve_path(Path::new("/abs")), PathBuf::from("/abs"));
    }

    #[test]
    fn test_warn_uses_current_phase() {
        let mut ctx = BuildContext::new(default_config(), PathBuf::from("/project"));
        ctx.set_phase(BuildPhase::Bundle);
        ctx.warn(Some("sitemap"), "no pages");
        assert_eq!(ctx.warnings()[0].phase, BuildPhase::Bundle);
        assert_eq!(ctx.warnings()[0].source.as_deref(), Some("sitemap"));
    }

    #[test]
    fn test_metadata_shared_between_callers() {
        let mut ctx = BuildContext::new(default_config(), PathBuf::from("/project"));
        ctx.set_metadata("build-id", json!("abc"));
        assert_eq!(ctx.get_metadata("build-id"), Some(&json!("abc")));
        assert_eq!(ctx.metadata().len(), 1);
    }

    #[test]
    fn test_into_artifact() {
        let mut ctx = BuildContext::new(default_config(), PathBuf::from("/project"));
        ctx.add_output(OutputFile::page("index.html".to_string(), vec![]));
        ctx.record_chunk("vendor", vec!["lib-a".to_string()]);
        let artifact = ctx.into_artifact(Vec::new(), Duration::ZERO);
        assert_eq!(artifact.files.len(), 1);
        assert_eq!(artifact.chunks["vendor"], vec!["lib-a".to_string()]);
        assert_eq!(artifact.output_mode, OutputMode::Static);
    }
}
