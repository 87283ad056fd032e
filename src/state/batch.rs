// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Row-major batches passed from workers to accumulators.
//!
//! A row is one full chain: a score, one configuration index per segment and
//! one absolute position per segment. Rows are stored contiguously so a batch
//! of thousands of chains is three allocations.

use crate::geometry::Xform;
use std::cmp::Ordering;

/// Positions of every segment for a batch of chains.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionBatch {
    nseg: usize,
    xforms: Vec<Xform>,
}

impl PositionBatch {
    pub fn new(nseg: usize) -> Self {
        Self::with_capacity(nseg, 0)
    }

    pub fn with_capacity(nseg: usize, rows: usize) -> Self {
        Self {
            nseg,
            xforms: Vec::with_capacity(nseg * rows),
        }
    }

    /// Number of segments per row.
    pub fn nseg(&self) -> usize {
        self.nseg
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        if self.nseg == 0 {
            0
        } else {
            self.xforms.len() / self.nseg
        }
    }

    pub fn is_empty(&self) -> bool {
        self.xforms.is_empty()
    }

    /// Append one chain.
    ///
    /// # Panics
    ///
    /// Panics if `row.len() != nseg`.
    pub fn push_row(&mut self, row: &[Xform]) {
        assert_eq!(row.len(), self.nseg, "row length must equal segment count");
        self.xforms.extend_from_slice(row);
    }

    pub fn row(&self, i: usize) -> &[Xform] {
        &self.xforms[i * self.nseg..(i + 1) * self.nseg]
    }

    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[Xform]> + '_ {
        self.xforms.chunks_exact(self.nseg.max(1))
    }
}

/// Scored chains, as produced by a worker and merged by an accumulator.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredBatch {
    nseg: usize,
    scores: Vec<f64>,
    indices: Vec<usize>,
    positions: PositionBatch,
}

impl ScoredBatch {
    pub fn new(nseg: usize) -> Self {
        Self::with_capacity(nseg, 0)
    }

    pub fn with_capacity(nseg: usize, rows: usize) -> Self {
        Self {
            nseg,
            scores: Vec::with_capacity(rows),
            indices: Vec::with_capacity(nseg * rows),
            positions: PositionBatch::with_capacity(nseg, rows),
        }
    }

    pub fn nseg(&self) -> usize {
        self.nseg
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Append one chain.
    pub fn push(&mut self, score: f64, index: &[usize], positions: &[Xform]) {
        assert_eq!(index.len(), self.nseg, "index length must equal segment count");
        self.scores.push(score);
        self.indices.extend_from_slice(index);
        self.positions.push_row(positions);
    }

    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    pub fn score(&self, i: usize) -> f64 {
        self.scores[i]
    }

    /// Configuration index of every segment for row `i`.
    pub fn index(&self, i: usize) -> &[usize] {
        &self.indices[i * self.nseg..(i + 1) * self.nseg]
    }

    pub fn position(&self, i: usize) -> &[Xform] {
        self.positions.row(i)
    }

    pub fn positions(&self) -> &PositionBatch {
        &self.positions
    }

    /// Rows in the given order (rows may repeat or be omitted).
    pub fn select(&self, order: &[usize]) -> ScoredBatch {
        let mut out = ScoredBatch::with_capacity(self.nseg, order.len());
        for &i in order {
            out.push(self.scores[i], self.index(i), self.position(i));
        }
        out
    }

    /// Rows whose score satisfies `keep`, in their original order.
    pub fn filter_scores(&self, keep: impl Fn(f64) -> bool) -> ScoredBatch {
        let order: Vec<usize> = (0..self.len()).filter(|&i| keep(self.scores[i])).collect();
        self.select(&order)
    }

    /// Sort ascending by score (stable; NaN last) and keep the first `max_results` rows.
    pub fn sorted_truncated(&self, max_results: usize) -> ScoredBatch {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by(|&a, &b| compare_scores(self.scores[a], self.scores[b]));
        order.truncate(max_results);
        self.select(&order)
    }

    /// Concatenate batches in order. Returns `None` for no batches.
    pub fn concat<I>(batches: I) -> Option<ScoredBatch>
    where
        I: IntoIterator<Item = ScoredBatch>,
    {
        let mut iter = batches.into_iter();
        let mut out = iter.next()?;
        for batch in iter {
            debug_assert_eq!(batch.nseg, out.nseg);
            out.scores.extend_from_slice(&batch.scores);
            out.indices.extend_from_slice(&batch.indices);
            out.positions.xforms.extend_from_slice(&batch.positions.xforms);
        }
        Some(out)
    }
}

/// Total order on scores with NaN sorted after every number.
pub fn compare_scores(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or_else(|| b.is_nan().cmp(&a.is_nan()).reverse())
}
