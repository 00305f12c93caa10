//! Configuration loading and discovery for `sitepack.toml`
//!
//! Provides functions to find, load, and merge configuration.

use super::schema::{OutputMode, SiteConfig, TransformErrorPolicy};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// File names searched for, in priority order.
pub const CONFIG_FILE_NAMES: [&str; 2] = ["sitepack.toml", "sitepack.json5"];

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse sitepack.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// JSON5 parsing error
    #[error("Failed to parse sitepack.json5: {0}")]
    Json5(#[from] json5::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
    /// Integration table could not be built
    #[error(transparent)]
    Registry(#[from] crate::integrations::RegistryError),
    /// Image service entrypoint not recognised
    #[error("Unknown asset service entrypoint '{entrypoint}' (expected local, remote or noop)")]
    UnknownService { entrypoint: String },
    /// Asset service options rejected by the backend
    #[error("Invalid options for asset service '{entrypoint}': {message}")]
    ServiceOptions { entrypoint: String, message: String },
    /// Two services bound to the same asset kind
    #[error(transparent)]
    Asset(#[from] crate::assets::AssetError),
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Override output directory
    pub out: Option<PathBuf>,
    /// Override site origin
    pub site: Option<String>,
    /// Override output mode
    pub output: Option<OutputMode>,
    /// Number of transform workers
    pub jobs: Option<usize>,
    /// Override transform error policy
    pub on_transform_error: Option<TransformErrorPolicy>,
}

/// Find a config file by walking up from the current working directory.
pub fn find_config() -> Option<PathBuf> {
    env::current_dir().ok().and_then(find_config_from)
}

/// Find a config file by walking up from a specific directory.
///
/// In each directory `sitepack.toml` wins over `sitepack.json5`.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        for name in CONFIG_FILE_NAMES {
            let config_path = current.join(name);
            if config_path.is_file() {
                return Some(config_path);
            }
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load configuration.
///
/// If a path is provided, loads from that file. Otherwise, uses `find_config()`
/// to locate the config file. If no config file is found, returns the default
/// configuration.
pub fn load_config(path: Option<&Path>) -> Result<SiteConfig, ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    match config_path {
        Some(p) => load_config_file(&p),
        None => Ok(default_config()),
    }
}

/// Load configuration from a specific file path.
///
/// `.json5` and `.json` files are read with JSON5, everything else as TOML.
pub fn load_config_file(path: &Path) -> Result<SiteConfig, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let contents = fs::read_to_string(path)?;
    let config = parse_config(&contents, path)?;
    ensure_valid(&config)?;
    Ok(config)
}

/// Fail with [`ConfigError::Validation`] when `config` has validation errors.
pub fn ensure_valid(config: &SiteConfig) -> Result<(), ConfigError> {
    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }
    Ok(())
}

fn parse_config(contents: &str, path: &Path) -> Result<SiteConfig, ConfigError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json5") | Some("json") => Ok(json5::from_str(contents)?),
        _ => Ok(toml::from_str(contents)?),
    }
}

/// Configuration used when no config file is found.
pub fn default_config() -> SiteConfig {
    SiteConfig::default()
}

/// Merge CLI overrides into a configuration.
///
/// CLI arguments take precedence over config file values.
pub fn merge_cli_overrides(config: &mut SiteConfig, overrides: &CliOverrides) {
    if let Some(ref out) = overrides.out {
        config.project.out = out.clone();
    }

    if let Some(ref site) = overrides.site {
        config.site = Some(site.clone());
    }

    if let Some(output) = overrides.output {
        config.output = output;
    }

    if let Some(jobs) = overrides.jobs {
        config.build.jobs = Some(jobs);
    }

    if let Some(policy) = overrides.on_transform_error {
        config.build.on_transform_error = policy;
    }
}

/// Get the project root directory from a config file path.
pub fn project_root(config_path: &Path) -> Option<&Path> {
    config_path.parent()
}

/// Resolve a path relative to the project root.
///
/// If the path is absolute, returns it unchanged.
/// If relative, joins it with the project root.
pub fn resolve_path(project_root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        project_root.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(path: &Path, content: &str) {
        File::create(path)
            .expect("should create config file")
            .write_all(content.as_bytes())
            .expect("should write config content");
    }

    #[test]
    fn test_find_config_in_current_dir() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = temp.path().join("sitepack.toml");
        write_file(&config_path, "output = \"static\"");

        let found = find_config_from(temp.path().to_path_buf());
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_find_config_in_parent_dir() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = temp.path().join("sitepack.toml");
        write_file(&config_path, "");

        let subdir = temp.path().join("src").join("pages");
        fs::create_dir_all(&subdir).expect("should create subdirectories");

        let found = find_config_from(subdir);
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_find_config_prefers_toml() {
        let temp = TempDir::new().expect("should create temp dir");
        write_file(&temp.path().join("sitepack.json5"), "{}");
        write_file(&temp.path().join("sitepack.toml"), "");

        let found = find_config_from(temp.path().to_path_buf()).unwrap();
        assert!(found.ends_with("sitepack.toml"));
    }

    #[test]
    fn test_find_config_not_found() {
        let temp = TempDir::new().expect("should create temp dir");
        assert_eq!(find_config_from(temp.path().to_path_buf()), None);
    }

    #[test]
    fn test_load_config_from_toml() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = temp.path().join("sitepack.toml");
        write_file(
            &config_path,
            r#"
site = "https://example.com"

[[integrations]]
name = "sitemap"

[bundling.manual_chunks]
vendor = ["@apollo/client", "graphql"]
"#,
        );

        let config = load_config(Some(&config_path)).expect("should load valid config");
        assert_eq!(config.site.as_deref(), Some("https://example.com"));
        assert_eq!(config.integrations[0].name, "sitemap");
        assert_eq!(config.bundling.manual_chunks.len(), 1);
    }

    #[test]
    fn test_load_config_from_json5() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = temp.path().join("sitepack.json5");
        write_file(
            &config_path,
            r#"{
  // trailing commas and comments are fine here
  integrations: [{ name: 'sitemap' }],
  output: 'static',
  site: 'https://relocation.quest',
  bundling: { manual_chunks: { vendor: ['@apollo/client', 'graphql'], } },
  imaging: { service: { entrypoint: 'astro/assets/services/sharp' } },
}"#,
        );

        let config = load_config(Some(&config_path)).expect("should load json5 config");
        assert_eq!(config.integrations.len(), 1);
        assert_eq!(config.bundling.manual_chunks.get("vendor").unwrap().modules.len(), 2);
        assert_eq!(
            config.imaging.service.unwrap().entrypoint,
            "astro/assets/services/sharp".to_string()
        );
    }

    #[test]
    fn test_load_config_missing_file_errors() {
        let temp = TempDir::new().expect("should create temp dir");
        let result = load_config(Some(&temp.path().join("nonexistent.toml")));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = temp.path().join("sitepack.toml");
        write_file(&config_path, "this is not valid toml {{{");

        let result = load_config(Some(&config_path));
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_validation_error() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = temp.path().join("sitepack.toml");
        write_file(&config_path, "site = \"not a url\"\n[build]\njobs = 0\n");

        match load_config(Some(&config_path)) {
            Err(ConfigError::Validation(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_merge_cli_overrides() {
        let mut config = default_config();
        let overrides = CliOverrides {
            out: Some(PathBuf::from("public_html")),
            site: Some("https://example.org".to_string()),
            output: Some(OutputMode::Server),
            jobs: Some(2),
            on_transform_error: Some(TransformErrorPolicy::Passthrough),
        };

        merge_cli_overrides(&mut config, &overrides);
        assert_eq!(config.project.out, PathBuf::from("public_html"));
        assert_eq!(config.site.as_deref(), Some("https://example.org"));
        assert_eq!(config.output, OutputMode::Server);
        assert_eq!(config.build.jobs, Some(2));
        assert_eq!(config.build.on_transform_error, TransformErrorPolicy::Passthrough);
    }

    #[test]
    fn test_merge_cli_overrides_empty_keeps_config() {
        let mut config = default_config();
        config.site = Some("https://keep.me".to_string());
        merge_cli_overrides(&mut config, &CliOverrides::default());
        assert_eq!(config.site.as_deref(), Some("https://keep.me"));
    }

    #[test]
    fn test_resolve_path() {
        let root = Path::new("/project");
        assert_eq!(resolve_path(root, Path::new("/other/path")), PathBuf::from("/other/path"));
        assert_eq!(resolve_path(root, Path::new("src")), PathBuf::from("/project/src"));
    }

    #[test]
    fn test_project_root() {
        let config_path = Path::new("/project/sitepack.toml");
        assert_eq!(project_root(config_path), Some(Path::new("/project")));
    }
}
