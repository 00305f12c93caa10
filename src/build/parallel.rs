//! Parallel asset transformation.
//!
//! Asset transforms share no state, so the `transformAssets` phase hands
//! them to a rayon pool sized by `build.jobs`. Each asset is transformed
//! exactly once; outcomes come back sorted by path regardless of which
//! worker finished first.
//!
//! # Example
//!
//! ```ignore
//! use sitepack::build::{AssetJob, TransformPool};
//!
//! let outcomes = TransformPool::new(4).run(jobs);
//! for outcome in &outcomes {
//!     println!("{} via {}: {:?}", outcome.path, outcome.service, outcome.duration);
//! }
//! ```

use crate::assets::{AssetKind, ServiceHandle, TransformError, TransformParams};
use crate::build::Asset;
use rayon::prelude::*;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Default number of parallel jobs (uses available parallelism).
pub fn default_jobs() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

/// One asset with the service and parameters it is transformed with.
#[derive(Debug, Clone)]
pub struct AssetJob<'a> {
    pub asset: &'a Asset,
    pub service: ServiceHandle,
    pub params: TransformParams,
}

/// Result of transforming one asset.
#[derive(Debug)]
pub struct AssetOutcome {
    pub path: String,
    pub kind: AssetKind,
    pub service: String,
    pub result: Result<Vec<u8>, TransformError>,
    pub duration: Duration,
}

/// Runs asset jobs on a bounded worker pool.
#[derive(Debug, Clone, Copy)]
pub struct TransformPool {
    jobs: usize,
}

impl Default for TransformPool {
    fn default() -> Self {
        Self::new(default_jobs())
    }
}

impl TransformPool {
    /// Create a pool with `jobs` workers (at least one).
    pub fn new(jobs: usize) -> Self {
        Self { jobs: jobs.max(1) }
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Transform every job once. Outcomes are sorted by asset path.
    pub fn run(&self, jobs: &[AssetJob<'_>]) -> Vec<AssetOutcome> {
        if jobs.is_empty() {
            return Vec::new();
        }

        let mut outcomes = if self.jobs == 1 || jobs.len() == 1 {
            jobs.iter().map(execute).collect()
        } else {
            match rayon::ThreadPoolBuilder::new().num_threads(self.jobs).build() {
                Ok(pool) => pool.install(|| jobs.par_iter().map(execute).collect::<Vec<_>>()),
                Err(e) => {
                    warn!(error = %e, "could not start transform workers, running sequentially");
                    jobs.iter().map(execute).collect()
                }
            }
        };

        outcomes.sort_by(|a: &AssetOutcome, b: &AssetOutcome| a.path.cmp(&b.path));
        outcomes
    }
}

fn execute(job: &AssetJob<'_>) -> AssetOutcome {
    let start = Instant::now();
    let result = job
        .service
        .transform(&job.asset.contents, &job.params)
        .map_err(|e| e.with_asset(job.asset.path.clone()));
    let duration = start.elapsed();
    debug!(
        asset = %job.asset.path,
        service = %job.service.name(),
        ok = result.is_ok(),
        elapsed_ms = duration.as_millis() as u64,
        "asset transformed"
    );
    AssetOutcome {
        path: job.asset.path.clone(),
        kind: job.asset.kind,
        service: job.service.name().to_string(),
        result,
        duration,
    }
}
