//! sitepack - build orchestration for static sites
//!
//! This library provides:
//! - Configuration loading (`sitepack.toml` / `sitepack.json5`)
//! - An ordered integration registry with optional build hooks
//! - Deterministic manual chunk planning
//! - Pluggable asset services resolved per asset kind
//! - A five-phase build pipeline tying them together

pub mod assets;
pub mod build;
pub mod bundle;
pub mod cli;
pub mod config;
pub mod integrations;
