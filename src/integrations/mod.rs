//! Integrations: named units that extend a build through optional hooks.
//!
//! This module provides:
//! - The `Integration` trait, whose hooks all default to no-ops
//! - `IntegrationRegistry`, the ordered, duplicate-free table used by a build
//! - `IntegrationCatalog`, mapping names in the config to factories
//! - Built-in `sitemap`, `robots` and `chunk-manifest` integrations

mod chunk_manifest;
mod registry;
mod robots;
mod sitemap;
mod traits;

pub use chunk_manifest::{ChunkManifest, ChunkManifestDoc};
pub use registry::{
    IntegrationCatalog, IntegrationFactory, IntegrationHandle, IntegrationRegistry, Registry,
    RegistryError,
};
pub use robots::Robots;
pub use sitemap::{page_url, Sitemap};
pub use traits::{call_hook, Hook, HookError, Integration};
