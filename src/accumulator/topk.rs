// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Bounded top-k over scored chains.

use super::MergePolicy;
use crate::state::ScoredBatch;
use log::debug;

/// Keeps the `max_results` lowest-scoring chains seen so far.
///
/// Ties keep arrival order: the running set comes first, then buffered
/// batches in the order they were accumulated.
#[derive(Debug, Clone)]
pub struct TopK {
    max_results: usize,
    best: Option<ScoredBatch>,
}

impl TopK {
    pub fn new(max_results: usize) -> Self {
        Self {
            max_results,
            best: None,
        }
    }

    /// Current running set.
    pub fn best(&self) -> Option<&ScoredBatch> {
        self.best.as_ref()
    }
}

impl MergePolicy for TopK {
    type Output = ScoredBatch;

    fn merge(&mut self, batches: Vec<ScoredBatch>) {
        let merged = ScoredBatch::concat(self.best.take().into_iter().chain(batches));
        self.best = merged.map(|all| all.sorted_truncated(self.max_results));
        if let Some(best) = &self.best {
            debug!(
                "TopK checkpoint: keeping {} chains, best {:.4}",
                best.len(),
                best.scores().first().copied().unwrap_or(f64::NAN)
            );
        }
    }

    fn finish(self) -> ScoredBatch {
        self.best.unwrap_or_else(|| ScoredBatch::new(0))
    }
}
