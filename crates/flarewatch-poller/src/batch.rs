//! Splitting zones into batches.

use crate::{config::BatchSize, resources::Zone};

/// Ordered, non-empty group of zones queried together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    zones: Vec<Zone>,
}

impl Batch {
    /// Returns zones in this batch.
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    /// Returns IDs of all zones in this batch.
    pub fn ids(&self) -> Vec<String> {
        self.zones.iter().map(|zone| zone.id.clone()).collect()
    }

    /// Returns IDs of zones not on the free plan.
    pub fn non_free_ids(&self) -> Vec<String> {
        self.zones
            .iter()
            .filter(|zone| !zone.is_free())
            .map(|zone| zone.id.clone())
            .collect()
    }
}

/// Splits zones into batches of at most `size` zones, left to right. The last batch may be smaller.
/// Returns no batches for an empty input.
pub fn batch(zones: &[Zone], size: BatchSize) -> Vec<Batch> {
    zones
        .chunks(size.get())
        .map(|chunk| Batch {
            zones: chunk.to_vec(),
        })
        .collect()
}
