//! Writes the chunk assignment of a build as JSON.

use super::traits::{HookError, Integration};
use crate::build::{BuildContext, OutputFile};
use crate::config::{OutputMode, Options};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestOptions {
    #[serde(default = "default_filename")]
    filename: String,
}

fn default_filename() -> String {
    "chunk-manifest.json".to_string()
}

/// Document written by [`ChunkManifest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkManifestDoc {
    pub output: OutputMode,
    pub chunks: BTreeMap<String, Vec<String>>,
}

/// Emits `chunk-manifest.json` mapping each manual chunk to its modules.
#[derive(Debug, Clone)]
pub struct ChunkManifest {
    filename: String,
}

impl ChunkManifest {
    pub fn from_options(options: &Options) -> Result<Self, String> {
        let value = serde_json::to_value(options).map_err(|e| e.to_string())?;
        let parsed: ManifestOptions = serde_json::from_value(value).map_err(|e| e.to_string())?;
        Ok(Self { filename: parsed.filename })
    }
}

impl Integration for ChunkManifest {
    fn on_build_done(&mut self, ctx: &mut BuildContext) -> Result<(), HookError> {
        let doc = ChunkManifestDoc { output: ctx.output_mode(), chunks: ctx.chunks().clone() };
        let json = serde_json::to_vec_pretty(&doc).map_err(|e| HookError::new(e.to_string()))?;
        ctx.add_output(OutputFile::generated(self.filename.clone(), json));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_config;

    #[test]
    fn test_manifest_written() {
        let mut ctx = BuildContext::new(default_config(), "/project".into());
        ctx.record_chunk("vendor", vec!["graphql".to_string()]);

        let mut manifest = ChunkManifest::from_options(&Options::new()).unwrap();
        manifest.on_build_done(&mut ctx).unwrap();

        let file = ctx.outputs().get("chunk-manifest.json").unwrap();
        let doc: ChunkManifestDoc = serde_json::from_slice(&file.contents).unwrap();
        assert_eq!(doc.output, OutputMode::Static);
        assert_eq!(doc.chunks.get("vendor"), Some(&vec!["graphql".to_string()]));
    }
}
