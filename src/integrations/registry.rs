//! Integration registry and the catalog of known integration factories.

use super::traits::{call_hook, Hook, HookError, Integration};
use crate::build::BuildContext;
use crate::config::{IntegrationRef, Options};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Common trait for registries that store named items.
///
/// # Example
///
/// ```
/// use sitepack::config::IntegrationRef;
/// use sitepack::integrations::{IntegrationRegistry, Registry};
///
/// let mut registry = IntegrationRegistry::new();
/// registry.register(IntegrationRef::new("robots")).unwrap();
///
/// assert!(registry.contains("robots"));
/// assert_eq!(registry.len(), 1);
/// ```
pub trait Registry<V> {
    /// Check if an item with the given name exists in the registry.
    fn contains(&self, name: &str) -> bool;

    /// Get an item by name.
    fn get(&self, name: &str) -> Option<&V>;

    /// Get the number of items in the registry.
    fn len(&self) -> usize;

    /// Check if the registry is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get an iterator over all names in the registry.
    fn names(&self) -> Box<dyn Iterator<Item = &str> + '_>;
}

/// Error while registering an integration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The name is already registered
    #[error("integration '{name}' is declared more than once")]
    DuplicateIntegration { name: String },
    /// No factory is known for the name
    #[error("unknown integration '{name}'")]
    UnknownIntegration { name: String },
    /// The factory rejected the options
    #[error("invalid options for integration '{name}': {message}")]
    InvalidOptions { name: String, message: String },
}

/// Constructs an integration from its options.
pub type IntegrationFactory =
    Box<dyn Fn(&Options) -> Result<Box<dyn Integration>, String> + Send + Sync>;

/// Maps integration names to factories.
#[derive(Default)]
pub struct IntegrationCatalog {
    factories: BTreeMap<String, IntegrationFactory>,
}

impl IntegrationCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with the integrations shipped in this crate.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        catalog.add("sitemap", |options| {
            Ok(Box::new(super::Sitemap::from_options(options)?) as Box<dyn Integration>)
        });
        catalog.add("robots", |options| {
            Ok(Box::new(super::Robots::from_options(options)?) as Box<dyn Integration>)
        });
        catalog.add("chunk-manifest", |options| {
            Ok(Box::new(super::ChunkManifest::from_options(options)?) as Box<dyn Integration>)
        });
        catalog
    }

    /// Add or replace a factory.
    pub fn add<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&Options) -> Result<Box<dyn Integration>, String> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
    }

    fn instantiate(&self, reference: &IntegrationRef) -> Result<Box<dyn Integration>, RegistryError> {
        let factory = self
            .factories
            .get(&reference.name)
            .ok_or_else(|| RegistryError::UnknownIntegration { name: reference.name.clone() })?;
        factory(&reference.options).map_err(|message| RegistryError::InvalidOptions {
            name: reference.name.clone(),
            message,
        })
    }
}

impl Registry<IntegrationFactory> for IntegrationCatalog {
    fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    fn get(&self, name: &str) -> Option<&IntegrationFactory> {
        self.factories.get(name)
    }

    fn len(&self) -> usize {
        self.factories.len()
    }

    fn names(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(self.factories.keys().map(String::as_str))
    }
}

impl fmt::Debug for IntegrationCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntegrationCatalog").field("names", &self.factories.keys()).finish()
    }
}

/// A registered integration.
pub struct IntegrationHandle {
    name: String,
    options: Options,
    position: usize,
    integration: Box<dyn Integration>,
}

impl IntegrationHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Zero-based declaration position, which is also the execution position.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Run one hook of this integration.
    pub fn call(&mut self, hook: Hook, ctx: &mut BuildContext) -> Result<(), HookError> {
        call_hook(self.integration.as_mut(), hook, ctx)
    }
}

impl fmt::Debug for IntegrationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntegrationHandle")
            .field("name", &self.name)
            .field("position", &self.position)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Ordered table of integrations for one build.
///
/// Declaration order is execution order; there is no priority reordering.
#[derive(Debug)]
pub struct IntegrationRegistry {
    catalog: IntegrationCatalog,
    handles: Vec<IntegrationHandle>,
}

impl IntegrationRegistry {
    /// Registry backed by the built-in catalog.
    pub fn new() -> Self {
        Self::with_catalog(IntegrationCatalog::builtin())
    }

    /// Registry backed by a custom catalog.
    pub fn with_catalog(catalog: IntegrationCatalog) -> Self {
        Self { catalog, handles: Vec::new() }
    }

    /// Register every reference in order, stopping at the first error.
    pub fn from_refs(
        refs: &[IntegrationRef],
        catalog: IntegrationCatalog,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::with_catalog(catalog);
        for reference in refs {
            registry.register(reference.clone())?;
        }
        Ok(registry)
    }

    /// Instantiate the referenced integration from the catalog and append it.
    ///
    /// On error the registry is left unchanged.
    pub fn register(&mut self, reference: IntegrationRef) -> Result<&IntegrationHandle, RegistryError> {
        self.ensure_unique(&reference.name)?;
        let integration = self.catalog.instantiate(&reference)?;
        Ok(self.push(reference, integration))
    }

    /// Append an integration constructed by the caller.
    ///
    /// On error the registry is left unchanged.
    pub fn register_instance(
        &mut self,
        reference: IntegrationRef,
        integration: Box<dyn Integration>,
    ) -> Result<&IntegrationHandle, RegistryError> {
        self.ensure_unique(&reference.name)?;
        Ok(self.push(reference, integration))
    }

    /// Handles in declaration order.
    pub fn ordered_handles(&self) -> &[IntegrationHandle] {
        &self.handles
    }

    pub(crate) fn handles_mut(&mut self) -> &mut [IntegrationHandle] {
        &mut self.handles
    }

    /// The catalog new registrations are instantiated from.
    pub fn catalog(&self) -> &IntegrationCatalog {
        &self.catalog
    }

    fn ensure_unique(&self, name: &str) -> Result<(), RegistryError> {
        if self.contains(name) {
            return Err(RegistryError::DuplicateIntegration { name: name.to_string() });
        }
        Ok(())
    }

    fn push(&mut self, reference: IntegrationRef, integration: Box<dyn Integration>) -> &IntegrationHandle {
        let position = self.handles.len();
        debug!(integration = %reference.name, position, "registered integration");
        self.handles.push(IntegrationHandle {
            name: reference.name,
            options: reference.options,
            position,
            integration,
        });
        &self.handles[position]
    }
}

impl Default for IntegrationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry<IntegrationHandle> for IntegrationRegistry {
    fn contains(&self, name: &str) -> bool {
        self.handles.iter().any(|h| h.name == name)
    }

    fn get(&self, name: &str) -> Option<&IntegrationHandle> {
        self.handles.iter().find(|h| h.name == name)
    }

    fn len(&self) -> usize {
        self.handles.len()
    }

    fn names(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(self.handles.iter().map(|h| h.name.as_str()))
    }
}
