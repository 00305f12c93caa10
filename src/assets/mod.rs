//! Asset kinds, transform backends and the per-kind service resolver.

mod kind;
mod local;
mod null;
mod params;
mod remote;
mod resolver;
mod service;

pub use kind::{AssetError, AssetKind};
pub use local::{output_format, LocalImageService, DEFAULT_JPEG_QUALITY};
pub use null::NullService;
pub use params::{ImageFormat, TransformParams};
pub use remote::RemoteOptimizationService;
pub use resolver::{ServiceBackend, ServiceResolver};
pub use service::{AssetService, ServiceHandle, TransformError};
