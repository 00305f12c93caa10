//! Binding of asset services to asset kinds.
//!
//! At most one service is bound per [`AssetKind`]. Kinds without a binding
//! resolve to [`NullService`](super::NullService), so an unconfigured build
//! copies assets through untouched.

use super::kind::{AssetError, AssetKind};
use super::local::LocalImageService;
use super::params::TransformParams;
use super::remote::RemoteOptimizationService;
use super::service::ServiceHandle;
use super::NullService;
use crate::config::{ConfigError, ImagingConfig, ServiceRef};
use std::collections::HashMap;
use tracing::{debug, info};

/// Backend selected by an entrypoint string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceBackend {
    Local,
    Remote,
    Noop,
}

impl ServiceBackend {
    /// Map an entrypoint to a backend.
    ///
    /// Bare names (`local`, `remote`, `noop`) match directly. Module-style
    /// paths match on their last segment, so `astro/assets/services/sharp`
    /// selects the local backend.
    pub fn from_entrypoint(entrypoint: &str) -> Option<ServiceBackend> {
        let trimmed = entrypoint.trim().trim_end_matches('/');
        match trimmed {
            "local" | "sharp" | "squoosh" => return Some(ServiceBackend::Local),
            "remote" => return Some(ServiceBackend::Remote),
            "noop" => return Some(ServiceBackend::Noop),
            _ => {}
        }
        match trimmed.rsplit_once('/').map(|(_, last)| last) {
            Some("sharp") | Some("squoosh") => Some(ServiceBackend::Local),
            Some("noop") => Some(ServiceBackend::Noop),
            _ => None,
        }
    }
}

/// Per-kind service table.
#[derive(Debug, Default)]
pub struct ServiceResolver {
    bindings: HashMap<AssetKind, ServiceHandle>,
    defaults: HashMap<AssetKind, TransformParams>,
}

impl ServiceResolver {
    /// Resolver with no bindings. Every kind resolves to the null service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the resolver from the `imaging` section, binding the image kind.
    pub fn from_config(imaging: &ImagingConfig) -> Result<Self, ConfigError> {
        let mut resolver = Self::new();
        let Some(service_ref) = &imaging.service else {
            debug!("no image service configured");
            return Ok(resolver);
        };

        let handle = Self::service_for(service_ref)?;
        let defaults = TransformParams::from_options(&service_ref.options).map_err(|message| {
            ConfigError::ServiceOptions { entrypoint: service_ref.entrypoint.clone(), message }
        })?;

        info!(entrypoint = %service_ref.entrypoint, service = %handle.name(), "bound image service");
        resolver.bind(AssetKind::Image, handle)?;
        resolver.defaults.insert(AssetKind::Image, defaults);
        Ok(resolver)
    }

    /// Construct the service named by a [`ServiceRef`].
    pub fn service_for(service_ref: &ServiceRef) -> Result<ServiceHandle, ConfigError> {
        let backend = ServiceBackend::from_entrypoint(&service_ref.entrypoint).ok_or_else(|| {
            ConfigError::UnknownService { entrypoint: service_ref.entrypoint.clone() }
        })?;

        match backend {
            ServiceBackend::Local => Ok(ServiceHandle::new(LocalImageService::new())),
            ServiceBackend::Noop => Ok(ServiceHandle::new(NullService)),
            ServiceBackend::Remote => RemoteOptimizationService::from_options(&service_ref.options)
                .map(ServiceHandle::new)
                .map_err(|message| ConfigError::ServiceOptions {
                    entrypoint: service_ref.entrypoint.clone(),
                    message,
                }),
        }
    }

    /// Bind a service to a kind. Fails if the kind already has one.
    pub fn bind(&mut self, kind: AssetKind, handle: ServiceHandle) -> Result<(), AssetError> {
        if let Some(existing) = self.bindings.get(&kind) {
            return Err(AssetError::ServiceAlreadyBound { kind, service: existing.name().to_string() });
        }
        self.bindings.insert(kind, handle);
        Ok(())
    }

    /// Service for a kind; the null service when nothing is bound.
    pub fn resolve(&self, kind: AssetKind) -> ServiceHandle {
        self.bindings.get(&kind).cloned().unwrap_or_else(ServiceHandle::null)
    }

    /// Service for a kind given by name.
    pub fn resolve_service(&self, kind: &str) -> Result<ServiceHandle, AssetError> {
        let kind: AssetKind = kind.parse()?;
        Ok(self.resolve(kind))
    }

    /// Default transform parameters configured for a kind.
    pub fn default_params(&self, kind: AssetKind) -> TransformParams {
        self.defaults.get(&kind).copied().unwrap_or_default()
    }

    pub fn is_bound(&self, kind: AssetKind) -> bool {
        self.bindings.contains_key(&kind)
    }

    /// Bound kinds, sorted.
    pub fn bound_kinds(&self) -> Vec<AssetKind> {
        let mut kinds: Vec<AssetKind> = self.bindings.keys().copied().collect();
        kinds.sort();
        kinds
    }
}
