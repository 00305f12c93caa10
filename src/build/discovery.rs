//! Source discovery for the build system.
//!
//! The resolve phase asks a [`SourceResolver`] for pages, modules, assets and
//! static files. [`FsResolver`] reads them from the project layout:
//!
//! - `<src>/pages/**/*.html` are pages, emitted relative to `<src>/pages`
//! - `<src>/**/*.{js,mjs,ts,css}` outside `pages` are modules, with the path
//!   relative to `<src>` as specifier
//! - files under `<public>` are assets when their extension maps to an
//!   asset kind, static files otherwise

use crate::assets::AssetKind;
use crate::build::{Asset, BuildContext, Module, ResolvedSources, SourceFile};
use glob::glob;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// Error during source discovery.
#[derive(Debug)]
pub enum DiscoveryError {
    /// Invalid glob pattern
    InvalidPattern(String, glob::PatternError),
    /// A discovered file could not be read
    Read(PathBuf, std::io::Error),
    /// IO error during file enumeration
    Io(std::io::Error),
}

impl std::fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscoveryError::InvalidPattern(pattern, err) => {
                write!(f, "Invalid glob pattern '{}': {}", pattern, err)
            }
            DiscoveryError::Read(path, err) => {
                write!(f, "Failed to read {}: {}", path.display(), err)
            }
            DiscoveryError::Io(err) => write!(f, "IO error during discovery: {}", err),
        }
    }
}

impl std::error::Error for DiscoveryError {}

impl From<std::io::Error> for DiscoveryError {
    fn from(err: std::io::Error) -> Self {
        DiscoveryError::Io(err)
    }
}

/// Supplies the inputs of a build.
pub trait SourceResolver: Send + Sync {
    fn resolve(&self, ctx: &BuildContext) -> Result<ResolvedSources, DiscoveryError>;
}

/// A fixed set of sources, returned as-is.
impl SourceResolver for ResolvedSources {
    fn resolve(&self, _ctx: &BuildContext) -> Result<ResolvedSources, DiscoveryError> {
        Ok(self.clone())
    }
}

/// Module file extensions.
const MODULE_EXTENSIONS: [&str; 4] = ["js", "mjs", "ts", "css"];

/// Reads sources from `project.src` and `project.public`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsResolver;

impl SourceResolver for FsResolver {
    fn resolve(&self, ctx: &BuildContext) -> Result<ResolvedSources, DiscoveryError> {
        let src_dir = ctx.src_dir();
        let pages_dir = src_dir.join("pages");
        let public_dir = ctx.public_dir();
        let mut sources = ResolvedSources::new();

        for path in discover_files(&pages_dir, "**/*.html")? {
            let rel = relative_path(&pages_dir, &path);
            sources.pages.push(SourceFile::new(rel, read(&path)?));
        }

        for path in discover_files(&src_dir, "**/*")? {
            if path.starts_with(&pages_dir) || !has_extension(&path, &MODULE_EXTENSIONS) {
                continue;
            }
            let specifier = relative_path(&src_dir, &path);
            sources.modules.push(Module::new(specifier, read(&path)?));
        }

        for path in discover_files(&public_dir, "**/*")? {
            let rel = relative_path(&public_dir, &path);
            let contents = read(&path)?;
            let kind = path.extension().and_then(|e| e.to_str()).and_then(AssetKind::from_extension);
            match kind {
                Some(kind) => sources.assets.push(Asset::new(rel, kind, contents)),
                None => sources.statics.push(SourceFile::new(rel, contents)),
            }
        }

        debug!(
            pages = sources.pages.len(),
            modules = sources.modules.len(),
            assets = sources.assets.len(),
            statics = sources.statics.len(),
            "resolved sources"
        );
        Ok(sources)
    }
}

/// Discover files matching a glob pattern under `base_dir`.
///
/// A missing base directory yields no files. Results are sorted.
pub fn discover_files(base_dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, DiscoveryError> {
    if !base_dir.is_dir() {
        return Ok(Vec::new());
    }

    let escaped = glob::Pattern::escape(&base_dir.to_string_lossy());
    let full_pattern = format!("{}/{}", escaped.trim_end_matches('/'), pattern);

    let paths =
        glob(&full_pattern).map_err(|e| DiscoveryError::InvalidPattern(pattern.to_string(), e))?;

    let mut files = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) => {
                if path.is_file() {
                    files.push(path);
                }
            }
            Err(e) => {
                warn!(error = %e, "error reading path during discovery");
            }
        }
    }

    files.sort();
    Ok(files)
}

/// `path` relative to `base`, joined with `/`.
pub fn relative_path(base: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(base).unwrap_or(path);
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

fn read(path: &Path) -> Result<Vec<u8>, DiscoveryError> {
    fs::read(path).map_err(|e| DiscoveryError::Read(path.to_path_buf(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_config;
    use tempfile::TempDir;

    fn create_file(root: &Path, rel: &str, content: &[u8]) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_discover_files_missing_dir() {
        let temp = TempDir::new().unwrap();
        let files = discover_files(&temp.path().join("nope"), "**/*").unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_discover_files_sorted() {
        let temp = TempDir::new().unwrap();
        create_file(temp.path(), "b.html", b"");
        create_file(temp.path(), "a.html", b"");
        create_file(temp.path(), "c.txt", b"");
        let files = discover_files(temp.path(), "*.html").unwrap();
        let names: Vec<_> = files.iter().map(|p| relative_path(temp.path(), p)).collect();
        assert_eq!(names, vec!["a.html", "b.html"]);
    }

    #[test]
    fn test_fs_resolver_layout() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        create_file(root, "src/pages/index.html", b"<h1>home</h1>");
        create_file(root, "src/pages/blog/index.html", b"<h1>blog</h1>");
        create_file(root, "src/pages/widget.js", b"ignored()");
        create_file(root, "src/js/app.js", b"app()");
        create_file(root, "src/styles/site.css", b"body{}");
        create_file(root, "src/notes.md", b"# not a module");
        create_file(root, "public/img/logo.png", b"png");
        create_file(root, "public/fonts/Inter.WOFF2", b"font");
        create_file(root, "public/robots-extra.txt", b"txt");

        let ctx = BuildContext::new(default_config(), root.to_path_buf());
        let sources = FsResolver.resolve(&ctx).unwrap();

        let pages: Vec<_> = sources.pages.iter().map(|p| p.path.as_str()).collect();
        assert_eq!(pages, vec!["blog/index.html", "index.html"]);

        let modules: Vec<_> = sources.modules.iter().map(|m| m.specifier.as_str()).collect();
        assert_eq!(modules, vec!["js/app.js", "styles/site.css"]);

        let assets: Vec<_> = sources.assets.iter().map(|a| (a.path.as_str(), a.kind)).collect();
        assert_eq!(
            assets,
            vec![("fonts/Inter.WOFF2", AssetKind::Font), ("img/logo.png", AssetKind::Image)]
        );

        assert_eq!(sources.statics.len(), 1);
        assert_eq!(sources.statics[0].path, "robots-extra.txt");
    }

    #[test]
    fn test_fixed_sources_resolver() {
        let sources = ResolvedSources::new().with_page("index.html", "x");
        let ctx = BuildContext::new(default_config(), "/project".into());
        assert_eq!(sources.resolve(&ctx).unwrap(), sources);
    }
}
