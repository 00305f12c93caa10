//! The optional-capability interface every integration implements.

use crate::build::{BuildContext, BuildPhase};
use std::fmt;
use thiserror::Error;

/// Error raised by an integration hook.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HookError {
    pub message: String,
}

impl HookError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl From<String> for HookError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for HookError {
    fn from(message: &str) -> Self {
        Self { message: message.to_string() }
    }
}

/// Hook points, listed in the order a build reaches them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    ConfigSetup,
    ConfigDone,
    BuildStart,
    BuildSetup,
    BuildGenerated,
    BuildDone,
}

impl Hook {
    /// Every hook in execution order.
    pub const ALL: [Hook; 6] = [
        Hook::ConfigSetup,
        Hook::ConfigDone,
        Hook::BuildStart,
        Hook::BuildSetup,
        Hook::BuildGenerated,
        Hook::BuildDone,
    ];

    /// The phase during which this hook runs.
    pub fn phase(self) -> BuildPhase {
        match self {
            Hook::ConfigSetup | Hook::ConfigDone => BuildPhase::Init,
            Hook::BuildStart => BuildPhase::Resolve,
            Hook::BuildSetup => BuildPhase::Bundle,
            Hook::BuildGenerated => BuildPhase::TransformAssets,
            Hook::BuildDone => BuildPhase::Emit,
        }
    }

    /// Hook name as shown in errors and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Hook::ConfigSetup => "config:setup",
            Hook::ConfigDone => "config:done",
            Hook::BuildStart => "build:start",
            Hook::BuildSetup => "build:setup",
            Hook::BuildGenerated => "build:generated",
            Hook::BuildDone => "build:done",
        }
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named unit extending the build with optional phase hooks.
///
/// Every hook defaults to a no-op, so an integration implements only the
/// hooks it cares about. Hooks receive the build context mutably and run
/// one after another in declaration order.
pub trait Integration {
    /// Runs first during `init`. Config is already frozen; use the context
    /// metadata to publish settings for later hooks.
    fn on_config_setup(&mut self, _ctx: &mut BuildContext) -> Result<(), HookError> {
        Ok(())
    }

    /// Runs after every integration finished `on_config_setup`.
    fn on_config_done(&mut self, _ctx: &mut BuildContext) -> Result<(), HookError> {
        Ok(())
    }

    /// Runs at the start of `resolve`, before sources are read.
    fn on_build_start(&mut self, _ctx: &mut BuildContext) -> Result<(), HookError> {
        Ok(())
    }

    /// Runs at the start of `bundle`; resolved sources are available.
    fn on_build_setup(&mut self, _ctx: &mut BuildContext) -> Result<(), HookError> {
        Ok(())
    }

    /// Runs at the end of `transformAssets`; every output exists.
    fn on_build_generated(&mut self, _ctx: &mut BuildContext) -> Result<(), HookError> {
        Ok(())
    }

    /// Runs during `emit`, before the artifact is written. Files added here
    /// are part of the artifact.
    fn on_build_done(&mut self, _ctx: &mut BuildContext) -> Result<(), HookError> {
        Ok(())
    }
}

/// Dispatch a hook by tag.
pub fn call_hook(
    integration: &mut dyn Integration,
    hook: Hook,
    ctx: &mut BuildContext,
) -> Result<(), HookError> {
    match hook {
        Hook::ConfigSetup => integration.on_config_setup(ctx),
        Hook::ConfigDone => integration.on_config_done(ctx),
        Hook::BuildStart => integration.on_build_start(ctx),
        Hook::BuildSetup => integration.on_build_setup(ctx),
        Hook::BuildGenerated => integration.on_build_generated(ctx),
        Hook::BuildDone => integration.on_build_done(ctx),
    }
}
