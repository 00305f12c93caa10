//! Errors that abort a build run.

use crate::assets::{AssetError, TransformError};
use crate::build::{BuildPhase, DiscoveryError, PhaseOrderError};
use crate::bundle::BundleError;
use crate::config::ConfigError;
use crate::integrations::Hook;
use thiserror::Error;

/// Error during build execution.
///
/// Every variant names the phase it happened in, plus the integration,
/// module or asset involved where there is one.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BuildError {
    /// Configuration rejected before any phase ran
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An integration hook returned an error
    #[error("integration '{integration}' failed in {hook} ({phase}): {message}")]
    Hook { integration: String, phase: BuildPhase, hook: Hook, message: String },

    /// Sources could not be resolved
    #[error("resolve failed: {0}")]
    Resolve(#[from] DiscoveryError),

    /// A module could not be placed
    #[error("bundle failed: {0}")]
    Bundle(#[from] BundleError),

    /// An asset service failed and the policy is `fail`
    #[error("transformAssets failed on {asset} (service '{service}'): {message}")]
    Transform { asset: String, service: String, message: String },

    /// Asset kind or binding problem
    #[error("transformAssets failed: {0}")]
    Asset(#[from] AssetError),

    /// The artifact could not be written
    #[error("emit failed: {0}")]
    Emit(#[from] crate::build::EmitError),

    /// Phases were entered out of order
    #[error(transparent)]
    PhaseOrder(#[from] PhaseOrderError),
}

impl BuildError {
    /// Phase the error belongs to. Configuration errors count as `init`.
    pub fn phase(&self) -> BuildPhase {
        match self {
            BuildError::Config(_) => BuildPhase::Init,
            BuildError::Hook { phase, .. } => *phase,
            BuildError::Resolve(_) => BuildPhase::Resolve,
            BuildError::Bundle(_) => BuildPhase::Bundle,
            BuildError::Transform { .. } | BuildError::Asset(_) => BuildPhase::TransformAssets,
            BuildError::Emit(_) => BuildPhase::Emit,
            BuildError::PhaseOrder(e) => e.requested,
        }
    }

    /// Integration that raised the error, if an integration did.
    pub fn integration(&self) -> Option<&str> {
        match self {
            BuildError::Hook { integration, .. } => Some(integration),
            _ => None,
        }
    }

    /// Asset path or module specifier involved, if any.
    pub fn subject(&self) -> Option<&str> {
        match self {
            BuildError::Transform { asset, .. } => Some(asset),
            BuildError::Bundle(e) => Some(&e.module),
            _ => None,
        }
    }

    pub(crate) fn from_transform(err: TransformError, asset: &str) -> Self {
        BuildError::Transform {
            asset: err.asset.unwrap_or_else(|| asset.to_string()),
            service: err.service,
            message: err.message,
        }
    }
}
