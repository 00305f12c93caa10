//! The uniform interface every asset transform backend implements.

use super::params::TransformParams;
use std::fmt;
use std::sync::Arc;

/// An asset service failed on a specific asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformError {
    /// Name of the service that failed
    pub service: String,
    /// Asset path, attached by the caller once known
    pub asset: Option<String>,
    pub message: String,
}

impl TransformError {
    pub fn new(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self { service: service.into(), asset: None, message: message.into() }
    }

    /// Attach the asset path.
    pub fn with_asset(mut self, asset: impl Into<String>) -> Self {
        self.asset = Some(asset.into());
        self
    }
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.asset {
            Some(asset) => {
                write!(f, "asset service '{}' failed on {}: {}", self.service, asset, self.message)
            }
            None => write!(f, "asset service '{}' failed: {}", self.service, self.message),
        }
    }
}

impl std::error::Error for TransformError {}

/// A transform backend.
///
/// Implementations must not share mutable state between calls; the build
/// may transform several assets at once.
pub trait AssetService: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &str;

    /// Transform one asset.
    fn transform(&self, asset: &[u8], params: &TransformParams) -> Result<Vec<u8>, TransformError>;
}

/// Cheap, cloneable handle to a bound service.
#[derive(Clone)]
pub struct ServiceHandle {
    inner: Arc<dyn AssetService>,
}

impl ServiceHandle {
    pub fn new<S: AssetService + 'static>(service: S) -> Self {
        Self { inner: Arc::new(service) }
    }

    pub fn from_arc(inner: Arc<dyn AssetService>) -> Self {
        Self { inner }
    }

    /// Handle to the passthrough service.
    pub fn null() -> Self {
        Self::new(super::NullService)
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn transform(&self, asset: &[u8], params: &TransformParams) -> Result<Vec<u8>, TransformError> {
        self.inner.transform(asset, params)
    }
}

impl fmt::Debug for ServiceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceHandle").field("name", &self.name()).finish()
    }
}
