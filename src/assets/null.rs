//! Passthrough service used for any asset kind without a bound backend.

use super::params::TransformParams;
use super::service::{AssetService, TransformError};

/// Returns its input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullService;

impl AssetService for NullService {
    fn name(&self) -> &str {
        "noop"
    }

    fn transform(&self, asset: &[u8], _params: &TransformParams) -> Result<Vec<u8>, TransformError> {
        Ok(asset.to_vec())
    }
}
