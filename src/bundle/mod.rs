//! Module bundling: manual chunk planning and automatic placement.

mod chunker;
mod planner;

pub use chunker::{chunk_path, render_chunk, AutoChunker, BundleError, EntryChunker, CHUNK_DIR};
pub use planner::{ChunkConflict, ChunkPlan, ChunkPlanner, PlannedChunk};
