//! Image optimisation delegated to an HTTP endpoint.

use super::params::TransformParams;
use super::service::{AssetService, TransformError};
use crate::config::Options;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const NAME: &str = "remote";

#[derive(Debug, Deserialize)]
struct RemoteOptions {
    endpoint: String,
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
    #[serde(default)]
    retries: u32,
}

fn default_timeout_secs() -> u64 {
    30
}

/// POSTs the asset bytes to `endpoint` with the transform parameters as
/// query string (`w`, `h`, `q`, `f`) and returns the response body.
///
/// Failed requests are retried `retries` times.
#[derive(Debug, Clone)]
pub struct RemoteOptimizationService {
    endpoint: String,
    retries: u32,
    client: Client,
}

impl RemoteOptimizationService {
    /// Build the service from `imaging.service.options`.
    ///
    /// Transform parameter keys are ignored here; only `endpoint`,
    /// `timeout_secs` and `retries` are read.
    pub fn from_options(options: &Options) -> Result<Self, String> {
        let subset: serde_json::Map<String, serde_json::Value> = options
            .iter()
            .filter(|(key, _)| matches!(key.as_str(), "endpoint" | "timeout_secs" | "retries"))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        let parsed: RemoteOptions = serde_json::from_value(serde_json::Value::Object(subset))
            .map_err(|e| format!("remote service options: {}", e))?;

        if !(parsed.endpoint.starts_with("http://") || parsed.endpoint.starts_with("https://")) {
            return Err(format!("endpoint must be an http(s) URL, got '{}'", parsed.endpoint));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(parsed.timeout_secs))
            .build()
            .map_err(|e| format!("failed to build HTTP client: {}", e))?;

        Ok(Self { endpoint: parsed.endpoint, retries: parsed.retries, client })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn attempt(&self, asset: &[u8], params: &TransformParams) -> Result<Vec<u8>, String> {
        let response = self
            .client
            .post(&self.endpoint)
            .query(&params.to_query())
            .body(asset.to_vec())
            .send()
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(format!("HTTP {}", response.status()));
        }

        response.bytes().map(|b| b.to_vec()).map_err(|e| e.to_string())
    }
}

impl AssetService for RemoteOptimizationService {
    fn name(&self) -> &str {
        NAME
    }

    fn transform(&self, asset: &[u8], params: &TransformParams) -> Result<Vec<u8>, TransformError> {
        let mut last_error = String::new();
        for attempt in 0..=self.retries {
            match self.attempt(asset, params) {
                Ok(bytes) => {
                    debug!(endpoint = %self.endpoint, attempt, bytes = bytes.len(), "remote transform done");
                    return Ok(bytes);
                }
                Err(e) => {
                    if attempt < self.retries {
                        warn!(endpoint = %self.endpoint, attempt, error = %e, "remote transform failed, retrying");
                    }
                    last_error = e;
                }
            }
        }
        Err(TransformError::new(
            NAME,
            format!("{} (after {} attempt(s))", last_error, self.retries + 1),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_options_requires_endpoint() {
        let options: Options = [("quality".to_string(), json!(70))].into_iter().collect();
        let err = RemoteOptimizationService::from_options(&options).unwrap_err();
        assert!(err.contains("endpoint"));
    }

    #[test]
    fn test_from_options_rejects_non_http_endpoint() {
        let options: Options = [("endpoint".to_string(), json!("ftp://img"))].into_iter().collect();
        assert!(RemoteOptimizationService::from_options(&options).is_err());
    }

    #[test]
    fn test_from_options_ignores_param_keys() {
        let options: Options = [
            ("endpoint".to_string(), json!("https://img.example/optimize")),
            ("retries".to_string(), json!(2)),
            ("width".to_string(), json!(640)),
        ]
        .into_iter()
        .collect();
        let service = RemoteOptimizationService::from_options(&options).unwrap();
        assert_eq!(service.endpoint(), "https://img.example/optimize");
        assert_eq!(service.retries, 2);
    }

    #[test]
    fn test_unreachable_endpoint_is_transform_error() {
        let options: Options = [
            ("endpoint".to_string(), json!("http://127.0.0.1:9/optimize")),
            ("timeout_secs".to_string(), json!(2)),
            ("retries".to_string(), json!(1)),
        ]
        .into_iter()
        .collect();
        let service = RemoteOptimizationService::from_options(&options).unwrap();
        let err = service.transform(b"bytes", &TransformParams::default()).unwrap_err();
        assert_eq!(err.service, "remote");
        assert!(err.message.contains("2 attempt(s)"));
    }
}
