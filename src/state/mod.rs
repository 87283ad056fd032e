// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Per-run mutable state.
//!
//! - ScoredBatch / PositionBatch: results moving from workers to accumulators
//! - SearchStatistics: atomic counters shared by all jobs of one run

pub mod batch;
pub mod statistics;

pub use batch::{compare_scores, PositionBatch, ScoredBatch};
pub use statistics::{Counters, SearchStatistics};
