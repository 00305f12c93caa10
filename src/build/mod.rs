//! Build orchestration for sitepack
//!
//! Runs one build through `init → resolve → bundle → transformAssets → emit`,
//! calling integration hooks at each phase boundary.
//!
//! # Overview
//!
//! The build pipeline consists of:
//! - **Resolve**: a [`SourceResolver`] supplies pages, modules, assets and static files
//! - **Bundle**: the chunk planner assigns modules to manual chunks, an
//!   [`AutoChunker`](crate::bundle::AutoChunker) places the rest
//! - **Transform**: assets go through the service bound to their kind
//! - **Emit**: an [`ArtifactWriter`] persists the output set
//!
//! # Example
//!
//! ```ignore
//! use sitepack::build::{BuildContext, BuildPipeline, DirWriter};
//! use sitepack::config::load_config;
//!
//! let config = load_config(None)?;
//! let context = BuildContext::new(config, project_root);
//! let out_dir = context.out_dir();
//! let artifact = BuildPipeline::new(context)?.with_writer(DirWriter::new(out_dir)).run()?;
//! println!("{}", artifact.summary());
//! ```

pub mod context;
pub mod discovery;
pub mod emit;
pub mod error;
pub mod parallel;
pub mod phase;
pub mod pipeline;
pub mod progress;
pub mod result;
pub mod sources;

pub use context::*;
pub use discovery::*;
pub use emit::*;
pub use error::*;
pub use parallel::*;
pub use phase::*;
pub use pipeline::*;
pub use progress::*;
pub use result::*;
pub use sources::*;
