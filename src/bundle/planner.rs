//! Manual chunk assignment.
//!
//! The planner turns `bundling.manual_chunks` into a lookup table once, at
//! construction. The table is filled in declaration order and never
//! overwrites an entry, so a specifier listed in several chunks belongs to
//! the first one declared. Lookups do not depend on the order modules are
//! discovered in.

use crate::build::Module;
use crate::config::BundlingConfig;
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// A specifier declared in more than one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkConflict {
    pub specifier: String,
    /// Chunk the specifier is assigned to
    pub winner: String,
    /// Later chunks that also list it, in declaration order
    pub shadowed: Vec<String>,
}

/// One manual chunk with the modules that landed in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedChunk<'a> {
    pub name: String,
    /// Member modules sorted by specifier
    pub modules: Vec<&'a Module>,
}

impl PlannedChunk<'_> {
    pub fn specifiers(&self) -> Vec<String> {
        self.modules.iter().map(|m| m.specifier.clone()).collect()
    }
}

/// Result of planning a module list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkPlan<'a> {
    /// Non-empty manual chunks in declaration order
    pub chunks: Vec<PlannedChunk<'a>>,
    /// Modules left to automatic placement, in input order
    pub unassigned: Vec<&'a Module>,
}

impl ChunkPlan<'_> {
    /// Chunk name to member specifiers.
    pub fn assignments(&self) -> BTreeMap<String, Vec<String>> {
        self.chunks.iter().map(|c| (c.name.clone(), c.specifiers())).collect()
    }
}

/// Deterministic specifier to chunk lookup.
#[derive(Debug, Clone, Default)]
pub struct ChunkPlanner {
    /// Chunk names in declaration order
    order: Vec<String>,
    lookup: HashMap<String, usize>,
    conflicts: Vec<ChunkConflict>,
}

impl ChunkPlanner {
    pub fn new(config: &BundlingConfig) -> Self {
        let mut order = Vec::with_capacity(config.manual_chunks.len());
        let mut lookup: HashMap<String, usize> = HashMap::new();
        let mut shadowed: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for (idx, chunk) in config.manual_chunks.iter().enumerate() {
            order.push(chunk.name.clone());
            for specifier in &chunk.modules {
                match lookup.get(specifier) {
                    None => {
                        lookup.insert(specifier.clone(), idx);
                    }
                    Some(&winner) if winner != idx => {
                        shadowed.entry(specifier.clone()).or_default().push(chunk.name.clone());
                    }
                    Some(_) => {}
                }
            }
        }

        let conflicts = shadowed
            .into_iter()
            .map(|(specifier, shadowed)| {
                let winner = order[lookup[&specifier]].clone();
                ChunkConflict { specifier, winner, shadowed }
            })
            .collect();

        Self { order, lookup, conflicts }
    }

    /// Chunk explicitly assigned to `specifier`, if any.
    ///
    /// `None` means the module is left to automatic placement.
    pub fn plan_chunk(&self, specifier: &str) -> Option<&str> {
        self.lookup.get(specifier).map(|&idx| self.order[idx].as_str())
    }

    /// Specifiers declared in more than one chunk, sorted by specifier.
    pub fn conflicts(&self) -> &[ChunkConflict] {
        &self.conflicts
    }

    /// Log each conflict once.
    pub fn warn_conflicts(&self) {
        for conflict in &self.conflicts {
            warn!(
                specifier = %conflict.specifier,
                chunk = %conflict.winner,
                shadowed = ?conflict.shadowed,
                "module listed in several manual chunks, first declaration wins"
            );
        }
    }

    /// Declared chunk names in declaration order.
    pub fn chunk_names(&self) -> &[String] {
        &self.order
    }

    pub fn has_manual_chunks(&self) -> bool {
        !self.order.is_empty()
    }

    /// Group modules into manual chunks and an unassigned remainder.
    ///
    /// Chunks that receive no module are left out of the plan.
    pub fn plan<'a>(&self, modules: &'a [Module]) -> ChunkPlan<'a> {
        let mut buckets: Vec<Vec<&'a Module>> = vec![Vec::new(); self.order.len()];
        let mut unassigned = Vec::new();

        for module in modules {
            match self.lookup.get(module.specifier.as_str()) {
                Some(&idx) => buckets[idx].push(module),
                None => unassigned.push(module),
            }
        }

        let chunks = self
            .order
            .iter()
            .zip(buckets)
            .filter(|(_, members)| !members.is_empty())
            .map(|(name, mut members)| {
                members.sort_by(|a, b| a.specifier.cmp(&b.specifier));
                PlannedChunk { name: name.clone(), modules: members }
            })
            .collect();

        ChunkPlan { chunks, unassigned }
    }
}
