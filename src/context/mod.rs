// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Search context shared by every job of one run.
//!
//! The context combines:
//! - the read-only chain, split point and criteria (identical for every job)
//! - the prefix [`TransformTable`], built once and shared by reference
//! - per-run [`SearchStatistics`], updated atomically by the jobs
//!
//! Nothing in it is mutated except through atomics, so one context is
//! shared by all pool threads without locking.

use crate::criteria::Criteria;
use crate::memo::TransformTable;
use crate::segment::Segment;
use crate::state::SearchStatistics;

pub struct SearchContext<'a> {
    /// The chain being searched, payloads detached.
    pub segments: &'a [Segment],
    /// Number of prefix segments enumerated whole inside each sample.
    pub end: usize,
    pub criteria: &'a dyn Criteria,
    /// Chains scoring at or above this are discarded.
    pub thresh: f64,
    /// Segment whose body the last segment must reuse.
    pub matchlast: Option<usize>,
    pub max_results: usize,
    pub table: TransformTable,
    pub stats: SearchStatistics,
}

impl<'a> SearchContext<'a> {
    pub fn new(
        segments: &'a [Segment],
        end: usize,
        criteria: &'a dyn Criteria,
        thresh: f64,
        matchlast: Option<usize>,
        max_results: usize,
    ) -> Self {
        Self {
            segments,
            end,
            criteria,
            thresh,
            matchlast,
            max_results,
            table: TransformTable::build(&segments[..end]),
            stats: SearchStatistics::new(),
        }
    }

    pub fn nseg(&self) -> usize {
        self.segments.len()
    }

    /// Segments enumerated whole inside each sample.
    pub fn prefix(&self) -> &'a [Segment] {
        &self.segments[..self.end]
    }

    /// Segments fixed by each sample.
    pub fn suffix(&self) -> &'a [Segment] {
        &self.segments[self.end..]
    }
}

impl std::fmt::Debug for SearchContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchContext")
            .field("nseg", &self.segments.len())
            .field("end", &self.end)
            .field("criteria", &self.criteria)
            .field("thresh", &self.thresh)
            .field("matchlast", &self.matchlast)
            .field("max_results", &self.max_results)
            .field("table_cells", &self.table.cells())
            .finish()
    }
}
