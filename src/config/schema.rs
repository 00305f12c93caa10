//! Configuration schema types for `sitepack.toml`
//!
//! Defines the structure and validation rules for a site build configuration.

use regex::Regex;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Free-form options attached to an integration or service.
pub type Options = BTreeMap<String, serde_json::Value>;

/// How the site is emitted. The emission strategy itself is external;
/// the mode is recorded on the build artifact and visible to integrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Every page prerendered to a file
    #[default]
    Static,
    /// Pages rendered on request
    Server,
    /// Prerendered by default, opt-in server rendering
    Hybrid,
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputMode::Static => write!(f, "static"),
            OutputMode::Server => write!(f, "server"),
            OutputMode::Hybrid => write!(f, "hybrid"),
        }
    }
}

impl std::str::FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "static" => Ok(OutputMode::Static),
            "server" => Ok(OutputMode::Server),
            "hybrid" => Ok(OutputMode::Hybrid),
            other => Err(format!("unknown output mode '{}' (expected static, server or hybrid)", other)),
        }
    }
}

/// Project layout section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Directory holding pages and modules
    #[serde(default = "default_src")]
    pub src: PathBuf,
    /// Directory holding static files and assets
    #[serde(default = "default_public")]
    pub public: PathBuf,
    /// Build output directory
    #[serde(default = "default_out")]
    pub out: PathBuf,
}

fn default_src() -> PathBuf {
    PathBuf::from("src")
}

fn default_public() -> PathBuf {
    PathBuf::from("public")
}

fn default_out() -> PathBuf {
    PathBuf::from("dist")
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self { src: default_src(), public: default_public(), out: default_out() }
    }
}

/// Reference to an integration and the options it is constructed with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationRef {
    /// Integration name, unique within a config
    pub name: String,
    /// Options handed to the integration factory
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: Options,
}

impl IntegrationRef {
    /// Create a reference with no options.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), options: Options::new() }
    }

    /// Add an option.
    pub fn with_option(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }
}

/// One manually declared chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkGroup {
    /// Chunk name, used for the emitted file name
    pub name: String,
    /// Module specifiers explicitly placed in this chunk
    pub modules: Vec<String>,
}

/// Manual chunk declarations in the order they appear in the config file.
///
/// Serialized as a plain mapping (`chunk = ["spec", ...]`). Deserialization
/// keeps document order, which decides conflicts between chunks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManualChunks(Vec<ChunkGroup>);

impl ManualChunks {
    /// Create an empty declaration list.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Append a chunk declaration.
    pub fn with_chunk<I, S>(mut self, name: impl Into<String>, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0.push(ChunkGroup {
            name: name.into(),
            modules: modules.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Iterate chunks in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &ChunkGroup> {
        self.0.iter()
    }

    /// Look up a chunk by name.
    pub fn get(&self, name: &str) -> Option<&ChunkGroup> {
        self.0.iter().find(|c| c.name == name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for ManualChunks {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for chunk in &self.0 {
            map.serialize_entry(&chunk.name, &chunk.modules)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ManualChunks {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ChunksVisitor;

        impl<'de> Visitor<'de> for ChunksVisitor {
            type Value = ManualChunks;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping of chunk names to lists of module specifiers")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut chunks = Vec::new();
                while let Some((name, modules)) = access.next_entry::<String, Vec<String>>()? {
                    chunks.push(ChunkGroup { name, modules });
                }
                Ok(ManualChunks(chunks))
            }
        }

        deserializer.deserialize_map(ChunksVisitor)
    }
}

/// Bundler tuning
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BundlingConfig {
    /// Explicit chunk assignments
    #[serde(default, skip_serializing_if = "ManualChunks::is_empty")]
    pub manual_chunks: ManualChunks,
}

/// Names a transform backend and its options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRef {
    /// Backend identifier (`local`, `remote`, `noop` or a path ending in one of the aliases)
    pub entrypoint: String,
    /// Backend options and default transform parameters
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: Options,
}

impl ServiceRef {
    pub fn new(entrypoint: impl Into<String>) -> Self {
        Self { entrypoint: entrypoint.into(), options: Options::new() }
    }

    pub fn with_option(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }
}

/// Image processing section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImagingConfig {
    /// The single image service for this build
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<ServiceRef>,
}

/// What to do when an asset service fails on one asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransformErrorPolicy {
    /// Abort the build
    #[default]
    Fail,
    /// Keep the original bytes and record a warning
    Passthrough,
}

impl fmt::Display for TransformErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformErrorPolicy::Fail => write!(f, "fail"),
            TransformErrorPolicy::Passthrough => write!(f, "passthrough"),
        }
    }
}

impl std::str::FromStr for TransformErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fail" => Ok(TransformErrorPolicy::Fail),
            "passthrough" => Ok(TransformErrorPolicy::Passthrough),
            other => Err(format!("unknown transform error policy '{}' (expected fail or passthrough)", other)),
        }
    }
}

/// Build execution settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildSettings {
    /// Worker count for asset transforms (defaults to available parallelism)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,
    /// Policy applied to per-asset transform failures
    #[serde(default)]
    pub on_transform_error: TransformErrorPolicy,
}

/// Complete sitepack.toml configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Project layout
    #[serde(default)]
    pub project: ProjectConfig,
    /// Site origin used for absolute links
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    /// Output mode
    #[serde(default, alias = "output_mode")]
    pub output: OutputMode,
    /// Integrations, in execution order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub integrations: Vec<IntegrationRef>,
    /// Bundler tuning
    #[serde(default)]
    pub bundling: BundlingConfig,
    /// Image service selection
    #[serde(default)]
    pub imaging: ImagingConfig,
    /// Build execution settings
    #[serde(default)]
    pub build: BuildSettings,
}

/// Configuration validation error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "bundling.manual_chunks.vendor")
    pub field: String,
    /// Error message
    pub message: String,
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sitepack.toml: '{}' {}", self.field, self.message)
    }
}

fn site_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^https?://[A-Za-z0-9]([A-Za-z0-9.-]*[A-Za-z0-9])?(:[0-9]{1,5})?(/[^\s?#]*)?$")
            .expect("site pattern is a valid regex")
    })
}

fn chunk_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.-]*$").expect("chunk pattern is a valid regex"))
}

impl SiteConfig {
    /// Validate the configuration and return any errors.
    ///
    /// Duplicate integration names are left to the integration registry,
    /// which reports them as `DuplicateIntegration`.
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        if let Some(site) = &self.site {
            if !site_pattern().is_match(site) {
                errors.push(ConfigValidationError {
                    field: "site".to_string(),
                    message: format!("must be an absolute http(s) URL, got '{}'", site),
                });
            }
        }

        for (idx, integration) in self.integrations.iter().enumerate() {
            if integration.name.trim().is_empty() {
                errors.push(ConfigValidationError {
                    field: format!("integrations[{}].name", idx),
                    message: "must be a non-empty string".to_string(),
                });
            }
        }

        let mut seen = HashSet::new();
        for chunk in self.bundling.manual_chunks.iter() {
            let field = format!("bundling.manual_chunks.{}", chunk.name);
            if !chunk_name_pattern().is_match(&chunk.name) {
                errors.push(ConfigValidationError {
                    field: field.clone(),
                    message: "chunk names may only contain letters, digits, '_', '-' and '.'"
                        .to_string(),
                });
            }
            if !seen.insert(chunk.name.as_str()) {
                errors.push(ConfigValidationError {
                    field: field.clone(),
                    message: "is declared more than once".to_string(),
                });
            }
            if chunk.modules.is_empty() {
                errors.push(ConfigValidationError {
                    field,
                    message: "must contain at least one module specifier".to_string(),
                });
            }
        }

        if let Some(service) = &self.imaging.service {
            if service.entrypoint.trim().is_empty() {
                errors.push(ConfigValidationError {
                    field: "imaging.service.entrypoint".to_string(),
                    message: "must be a non-empty string".to_string(),
                });
            }
        }

        if self.build.jobs == Some(0) {
            errors.push(ConfigValidationError {
                field: "build.jobs".to_string(),
                message: "must be a positive integer".to_string(),
            });
        }

        errors
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// Effective worker count for asset transforms.
    pub fn effective_jobs(&self) -> usize {
        self.build
            .jobs
            .unwrap_or_else(crate::build::default_jobs)
            .max(1)
    }
}
