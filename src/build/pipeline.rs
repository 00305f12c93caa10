//! Build pipeline orchestration.
//!
//! The pipeline runs the five phases of a build in order, calling each
//! integration's hooks at the matching phase boundary:
//!
//! | Phase             | Work                                              |
//! |-------------------|---------------------------------------------------|
//! | `init`            | `config:setup` hooks, then `config:done` hooks    |
//! | `resolve`         | `build:start` hooks, then sources are resolved    |
//! | `bundle`          | `build:setup` hooks, then chunk planning          |
//! | `transformAssets` | asset transforms, then `build:generated` hooks    |
//! | `emit`            | `build:done` hooks, then the writer runs          |
//!
//! The first error stops the run; later phases never start.

use crate::assets::ServiceResolver;
use crate::build::{
    AssetJob, AssetStatus, BuildArtifact, BuildContext, BuildError, BuildPhase, DirWriter,
    FsResolver, NullProgress, OutputFile, PhaseTracker, ProgressEvent, ProgressReporter,
    SourceResolver, ArtifactWriter, TransformPool,
};
use crate::bundle::{render_chunk, AutoChunker, ChunkPlanner, EntryChunker};
use crate::config::loader::ensure_valid;
use crate::config::{ConfigError, SiteConfig, TransformErrorPolicy};
use crate::integrations::{Hook, IntegrationCatalog, IntegrationRegistry};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Build pipeline for executing builds.
pub struct BuildPipeline {
    context: BuildContext,
    registry: IntegrationRegistry,
    services: ServiceResolver,
    planner: ChunkPlanner,
    resolver: Box<dyn SourceResolver>,
    chunker: Box<dyn AutoChunker>,
    writer: Option<Box<dyn ArtifactWriter>>,
    progress: Box<dyn ProgressReporter>,
    pool: TransformPool,
    tracker: PhaseTracker,
}

impl std::fmt::Debug for BuildPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildPipeline")
            .field("registry", &self.registry)
            .field("services", &self.services)
            .field("chunker", &self.chunker.name())
            .field("writes", &self.writer.is_some())
            .field("jobs", &self.pool.jobs())
            .field("state", &self.tracker.state())
            .finish()
    }
}

impl BuildPipeline {
    /// Create a pipeline for the context's configuration, using the
    /// built-in integration catalog.
    ///
    /// Fails with [`BuildError::Config`] when the configuration does not
    /// validate or an integration or the image service cannot be set up.
    /// No phase has run at that point.
    pub fn new(context: BuildContext) -> Result<Self, BuildError> {
        Self::with_catalog(context, IntegrationCatalog::builtin())
    }

    /// Create a pipeline resolving integration names against `catalog`.
    pub fn with_catalog(
        context: BuildContext,
        catalog: IntegrationCatalog,
    ) -> Result<Self, BuildError> {
        let config = context.shared_config();
        ensure_valid(&config)?;
        let registry = IntegrationRegistry::from_refs(&config.integrations, catalog)
            .map_err(ConfigError::from)?;
        let services = ServiceResolver::from_config(&config.imaging)?;
        let planner = ChunkPlanner::new(&config.bundling);
        planner.warn_conflicts();

        Ok(Self {
            context,
            registry,
            services,
            planner,
            resolver: Box::new(FsResolver),
            chunker: Box::new(EntryChunker),
            writer: None,
            progress: Box::new(NullProgress),
            pool: TransformPool::new(config.effective_jobs()),
            tracker: PhaseTracker::new(),
        })
    }

    /// Replace the integration registry.
    pub fn with_registry(mut self, registry: IntegrationRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Replace the asset service bindings.
    pub fn with_services(mut self, services: ServiceResolver) -> Self {
        self.services = services;
        self
    }

    /// Use a different source resolver.
    pub fn with_resolver<R: SourceResolver + 'static>(mut self, resolver: R) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    /// Use a different automatic chunker.
    pub fn with_chunker<C: AutoChunker + 'static>(mut self, chunker: C) -> Self {
        self.chunker = Box::new(chunker);
        self
    }

    /// Write the artifact with `writer` at the end of `emit`.
    pub fn with_writer<W: ArtifactWriter + 'static>(mut self, writer: W) -> Self {
        self.writer = Some(Box::new(writer));
        self
    }

    pub fn with_progress<P: ProgressReporter + 'static>(mut self, progress: P) -> Self {
        self.progress = Box::new(progress);
        self
    }

    /// Registry of this run, for registering caller-built integrations.
    pub fn registry_mut(&mut self) -> &mut IntegrationRegistry {
        &mut self.registry
    }

    pub fn registry(&self) -> &IntegrationRegistry {
        &self.registry
    }

    pub fn context(&self) -> &BuildContext {
        &self.context
    }

    /// Run every phase and return the artifact.
    pub fn run(mut self) -> Result<BuildArtifact, BuildError> {
        let start = Instant::now();
        let integrations = self.registry.ordered_handles().len();
        info!(integrations, output = %self.context.output_mode(), "build started");
        self.progress.report(ProgressEvent::BuildStarted { integrations });

        for phase in BuildPhase::ALL {
            if let Err(err) = self.run_phase(phase) {
                self.tracker.fail();
                error!(phase = %err.phase(), integration = ?err.integration(), error = %err, "build failed");
                self.progress
                    .report(ProgressEvent::BuildFailed { phase: err.phase(), message: err.to_string() });
                return Err(err);
            }
        }

        let timings = self.tracker.timings().to_vec();
        let artifact = self.context.into_artifact(timings, start.elapsed());
        info!(
            files = artifact.files.len(),
            chunks = artifact.chunks.len(),
            warnings = artifact.warnings.len(),
            elapsed_ms = artifact.total_duration.as_millis() as u64,
            "build finished"
        );
        self.progress.report(ProgressEvent::BuildCompleted {
            files: artifact.files.len(),
            warnings: artifact.warnings.len(),
            duration_ms: artifact.total_duration.as_millis() as u64,
        });
        Ok(artifact)
    }

    fn run_phase(&mut self, phase: BuildPhase) -> Result<(), BuildError> {
        self.tracker.enter(phase)?;
        self.context.set_phase(phase);
        self.progress.report(ProgressEvent::PhaseStarted { phase });
        debug!(phase = %phase, "phase started");
        let warnings_before = self.context.warnings().len();

        match phase {
            BuildPhase::Init => {
                self.run_hooks(Hook::ConfigSetup)?;
                self.run_hooks(Hook::ConfigDone)?;
            }
            BuildPhase::Resolve => {
                self.run_hooks(Hook::BuildStart)?;
                self.resolve()?;
            }
            BuildPhase::Bundle => {
                self.run_hooks(Hook::BuildSetup)?;
                self.bundle()?;
            }
            BuildPhase::TransformAssets => {
                self.transform_assets()?;
                self.run_hooks(Hook::BuildGenerated)?;
            }
            BuildPhase::Emit => {
                self.run_hooks(Hook::BuildDone)?;
                self.emit()?;
            }
        }

        for warning in &self.context.warnings()[warnings_before..] {
            self.progress.report(ProgressEvent::Warning {
                source: warning.source.clone(),
                message: warning.message.clone(),
            });
        }

        self.tracker.finish()?;
        let duration_ms =
            self.tracker.timings().last().map(|t| t.duration.as_millis() as u64).unwrap_or(0);
        info!(phase = %phase, elapsed_ms = duration_ms, "phase finished");
        self.progress.report(ProgressEvent::PhaseCompleted { phase, duration_ms });
        Ok(())
    }

    /// Call `hook` on every integration in declaration order.
    fn run_hooks(&mut self, hook: Hook) -> Result<(), BuildError> {
        for handle in self.registry.handles_mut() {
            debug!(integration = %handle.name(), hook = %hook, "calling hook");
            handle.call(hook, &mut self.context).map_err(|e| BuildError::Hook {
                integration: handle.name().to_string(),
                phase: hook.phase(),
                hook,
                message: e.message,
            })?;
        }
        Ok(())
    }

    fn resolve(&mut self) -> Result<(), BuildError> {
        let sources = self.resolver.resolve(&self.context)?;
        let seeded: Vec<OutputFile> = sources.passthrough_outputs().collect();
        self.context.set_sources(sources);
        for file in seeded {
            self.add_output(file);
        }
        Ok(())
    }

    fn bundle(&mut self) -> Result<(), BuildError> {
        let (chunk_files, assignments, placed) = {
            let plan = self.planner.plan(&self.context.sources().modules);
            let chunk_files: Vec<OutputFile> = plan.chunks.iter().map(render_chunk).collect();
            let placed = self.chunker.place(&plan.unassigned)?;
            (chunk_files, plan.assignments(), placed)
        };

        info!(
            chunks = chunk_files.len(),
            placed = placed.len(),
            chunker = %self.chunker.name(),
            "modules bundled"
        );
        for file in chunk_files.into_iter().chain(placed) {
            self.add_output(file);
        }
        for (name, modules) in assignments {
            self.context.record_chunk(name, modules);
        }
        Ok(())
    }

    fn transform_assets(&mut self) -> Result<(), BuildError> {
        let policy = self.context.config().build.on_transform_error;

        let outcomes = {
            let jobs: Vec<AssetJob<'_>> = self
                .context
                .sources()
                .assets
                .iter()
                .map(|asset| {
                    let defaults = self.services.default_params(asset.kind);
                    let params = match self.context.asset_params(&asset.path) {
                        Some(overrides) => defaults.merged(overrides),
                        None => defaults,
                    };
                    AssetJob { asset, service: self.services.resolve(asset.kind), params }
                })
                .collect();
            debug!(assets = jobs.len(), workers = self.pool.jobs(), "transforming assets");
            self.pool.run(&jobs)
        };

        let mut files = Vec::with_capacity(outcomes.len());
        let mut kept = Vec::new();
        {
            let originals: HashMap<&str, &[u8]> = self
                .context
                .sources()
                .assets
                .iter()
                .map(|a| (a.path.as_str(), a.contents.as_slice()))
                .collect();

            for outcome in outcomes {
                let duration_ms = outcome.duration.as_millis() as u64;
                match outcome.result {
                    Ok(bytes) => {
                        self.progress.report(ProgressEvent::AssetTransformed {
                            path: outcome.path.clone(),
                            service: outcome.service,
                            status: AssetStatus::Transformed,
                            duration_ms,
                        });
                        files.push(OutputFile::asset(outcome.path, outcome.kind, bytes));
                    }
                    Err(err) if policy == TransformErrorPolicy::Passthrough => {
                        warn!(asset = %outcome.path, service = %outcome.service, error = %err.message, "keeping original asset");
                        self.progress.report(ProgressEvent::AssetTransformed {
                            path: outcome.path.clone(),
                            service: outcome.service,
                            status: AssetStatus::Passthrough(err.message.clone()),
                            duration_ms,
                        });
                        let original =
                            originals.get(outcome.path.as_str()).map(|b| b.to_vec()).unwrap_or_default();
                        files.push(OutputFile::asset(outcome.path.clone(), outcome.kind, original));
                        kept.push((outcome.path, err.to_string()));
                    }
                    Err(err) => {
                        self.progress.report(ProgressEvent::AssetTransformed {
                            path: outcome.path.clone(),
                            service: outcome.service,
                            status: AssetStatus::Failed(err.message.clone()),
                            duration_ms,
                        });
                        return Err(BuildError::from_transform(err, &outcome.path));
                    }
                }
            }
        }

        for file in files {
            self.add_output(file);
        }
        for (path, message) in kept {
            self.context.warn(Some(&path), format!("kept original bytes: {}", message));
        }
        Ok(())
    }

    /// Add a file to the outputs, recording a warning when it replaces
    /// one already emitted at the same path.
    fn add_output(&mut self, file: OutputFile) {
        let path = file.path.clone();
        let kind = file.kind;
        if let Some(replaced) = self.context.add_output(file) {
            warn!(path = %path, kind = %kind, replaced = %replaced.kind, "output path collision");
            self.context.warn(
                Some(&path),
                format!("{} output replaces {} output at the same path", kind, replaced.kind),
            );
        }
    }

    fn emit(&mut self) -> Result<(), BuildError> {
        match &self.writer {
            Some(writer) => {
                let written = writer.write(self.context.outputs())?;
                info!(files = written.len(), "artifact written");
            }
            None => debug!("no artifact writer configured, skipping write"),
        }
        Ok(())
    }
}

/// Build a project from disk: sources from `project.src` and
/// `project.public`, output written to `project.out`.
pub fn run_build(config: SiteConfig, project_root: PathBuf) -> Result<BuildArtifact, BuildError> {
    let context = BuildContext::new(config, project_root);
    let out_dir = context.out_dir();
    BuildPipeline::new(context)?.with_writer(DirWriter::new(out_dir)).run()
}
