// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Statistics
//!
//! Per-run counters shared by every job of one search. Jobs increment them
//! concurrently; the driver reads them for progress reports and the final
//! summary. Nothing here is process-wide.

use std::sync::atomic::{AtomicU64, Ordering};
use strum::EnumCount;
use strum_macros::{Display, EnumCount as EnumCountMacro, EnumIter};

#[derive(EnumCountMacro, EnumIter, Display, Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum Counters {
    /// Suffix samples handed to workers.
    SuffixSamples,
    /// Suffix samples rejected whole by the match-last check.
    MatchLastRejected,
    /// Full chains scored.
    ChainsScored,
    /// Chains scoring below the threshold.
    ChainsBelowThreshold,
    JobsCompleted,
    JobsFailed,
}

/// Atomic counters plus the best score seen so far.
#[derive(Debug)]
pub struct SearchStatistics {
    stats: [AtomicU64; Counters::COUNT],
    best_score: AtomicU64,
}

impl SearchStatistics {
    pub fn new() -> Self {
        Self {
            stats: std::array::from_fn(|_| AtomicU64::new(0)),
            best_score: AtomicU64::new(f64::INFINITY.to_bits()),
        }
    }

    /// Add `n` to the specified counter.
    pub fn add(&self, counter: Counters, n: u64) {
        self.stats[counter as usize].fetch_add(n, Ordering::Relaxed);
    }

    /// Increment the specified counter by 1.
    pub fn increment(&self, counter: Counters) {
        self.add(counter, 1);
    }

    /// Get the current value of the specified counter.
    pub fn get(&self, counter: Counters) -> u64 {
        self.stats[counter as usize].load(Ordering::Relaxed)
    }

    /// Record a score; returns true if it improved on the best so far.
    pub fn offer_score(&self, score: f64) -> bool {
        if !(score < self.best_score()) {
            return false;
        }
        let mut current = self.best_score.load(Ordering::Relaxed);
        loop {
            if score >= f64::from_bits(current) {
                return false;
            }
            match self.best_score.compare_exchange_weak(
                current,
                score.to_bits(),
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return true,
                Err(seen) => current = seen,
            }
        }
    }

    /// Lowest score offered so far (infinity before any).
    pub fn best_score(&self) -> f64 {
        f64::from_bits(self.best_score.load(Ordering::Relaxed))
    }
}

impl Default for SearchStatistics {
    fn default() -> Self {
        Self::new()
    }
}
