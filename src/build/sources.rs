//! Inputs to a build, as handed over by a source resolver.

use crate::assets::AssetKind;
use crate::build::{OutputFile, OutputSet};

/// A file that is emitted unchanged (compiled page or static file).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Output path, `/`-separated
    pub path: String,
    pub contents: Vec<u8>,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, contents: Vec<u8>) -> Self {
        Self { path: path.into(), contents }
    }
}

/// A script or stylesheet module the bundler places.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    /// Specifier used for chunk assignment; also the default output path
    pub specifier: String,
    pub contents: Vec<u8>,
}

impl Module {
    pub fn new(specifier: impl Into<String>, contents: Vec<u8>) -> Self {
        Self { specifier: specifier.into(), contents }
    }
}

/// A file handed to an asset service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub path: String,
    pub kind: AssetKind,
    pub contents: Vec<u8>,
}

impl Asset {
    pub fn new(path: impl Into<String>, kind: AssetKind, contents: Vec<u8>) -> Self {
        Self { path: path.into(), kind, contents }
    }
}

/// Everything the resolve phase found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedSources {
    pub pages: Vec<SourceFile>,
    pub statics: Vec<SourceFile>,
    pub modules: Vec<Module>,
    pub assets: Vec<Asset>,
}

impl ResolvedSources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, path: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        self.pages.push(SourceFile::new(path, contents.into()));
        self
    }

    pub fn with_static(mut self, path: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        self.statics.push(SourceFile::new(path, contents.into()));
        self
    }

    pub fn with_module(mut self, specifier: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        self.modules.push(Module::new(specifier, contents.into()));
        self
    }

    pub fn with_asset(
        mut self,
        path: impl Into<String>,
        kind: AssetKind,
        contents: impl Into<Vec<u8>>,
    ) -> Self {
        self.assets.push(Asset::new(path, kind, contents.into()));
        self
    }

    pub fn len(&self) -> usize {
        self.pages.len() + self.statics.len() + self.modules.len() + self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pages and static files as outputs. Seeded into the output set when
    /// the resolve phase ends.
    pub fn passthrough_outputs(&self) -> impl Iterator<Item = OutputFile> + '_ {
        let pages = self.pages.iter().map(|p| OutputFile::page(p.path.clone(), p.contents.clone()));
        let statics =
            self.statics.iter().map(|s| OutputFile::static_file(s.path.clone(), s.contents.clone()));
        pages.chain(statics)
    }

    /// The output set an untouched build produces: every source at its own
    /// path with its original contents.
    pub fn output_set(&self) -> OutputSet {
        let modules =
            self.modules.iter().map(|m| OutputFile::module(m.specifier.clone(), m.contents.clone()));
        let assets = self
            .assets
            .iter()
            .map(|a| OutputFile::asset(a.path.clone(), a.kind, a.contents.clone()));
        self.passthrough_outputs().chain(modules).chain(assets).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::OutputKind;

    #[test]
    fn test_output_set_covers_every_source() {
        let sources = ResolvedSources::new()
            .with_page("index.html", "<h1>hi</h1>")
            .with_static("favicon.ico", vec![0u8, 1])
            .with_module("js/app.js", "app()")
            .with_asset("img/logo.png", AssetKind::Image, vec![137u8, 80]);

        let set = sources.output_set();
        assert_eq!(set.len(), sources.len());
        assert_eq!(set.get("js/app.js").unwrap().kind, OutputKind::Module);
        assert_eq!(set.get("img/logo.png").unwrap().kind, OutputKind::Asset(AssetKind::Image));
        assert_eq!(set.get("index.html").unwrap().contents, b"<h1>hi</h1>".to_vec());
    }

    #[test]
    fn test_passthrough_outputs_excludes_modules_and_assets() {
        let sources = ResolvedSources::new()
            .with_page("index.html", "x")
            .with_module("a.js", "y")
            .with_asset("a.png", AssetKind::Image, "z");
        let paths: Vec<String> = sources.passthrough_outputs().map(|f| f.path).collect();
        assert_eq!(paths, vec!["index.html".to_string()]);
    }
}
