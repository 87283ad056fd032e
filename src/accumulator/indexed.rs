// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Joining tail hits with the head half-chains stored in a spatial index.

use super::{MergePolicy, SpatialIndex};
use crate::criteria::indexed::cyclic_relative;
use crate::criteria::resolve_seg;
use crate::geometry::{hrot, Xform};
use crate::segment::Segment;
use crate::state::ScoredBatch;
use log::{debug, warn};
use nalgebra::Vector3;
use std::sync::Arc;

/// Index tuples of closed assemblies over the original, unsplit chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedAssemblies {
    nseg: usize,
    indices: Vec<usize>,
}

impl ClosedAssemblies {
    pub fn new(nseg: usize) -> Self {
        Self {
            nseg,
            indices: Vec::new(),
        }
    }

    pub fn nseg(&self) -> usize {
        self.nseg
    }

    pub fn len(&self) -> usize {
        if self.nseg == 0 {
            0
        } else {
            self.indices.len() / self.nseg
        }
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Configuration index of every segment of assembly `i`.
    pub fn index(&self, i: usize) -> &[usize] {
        &self.indices[i * self.nseg..(i + 1) * self.nseg]
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &[usize]> + '_ {
        self.indices.chunks_exact(self.nseg.max(1))
    }

    fn push(&mut self, row: &[usize]) {
        debug_assert_eq!(row.len(), self.nseg);
        self.indices.extend_from_slice(row);
    }
}

/// Merge policy rebuilding full-chain index tuples from tail hits.
///
/// Every buffered tail chain must have scored 0 against the index. Its probe
/// key gives the head tuple; the split segment's two halves are merged back
/// into one configuration. Tail chains whose key has vanished or whose
/// halves do not merge are dropped.
#[derive(Debug)]
pub struct IndexJoin {
    splitseg: Segment,
    tail_last: Segment,
    head_first: Segment,
    index: Arc<SpatialIndex>,
    cyclic_xform: Xform,
    from_seg: Option<usize>,
    max_results: usize,
    joined: ClosedAssemblies,
    dropped: usize,
}

impl IndexJoin {
    /// `tail_last` and `head_first` are the entry and exit halves of
    /// `splitseg`; `head_len` is the length of the head chain.
    ///
    /// # Panics
    ///
    /// Panics if `nfold == 0`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        splitseg: Segment,
        tail_last: Segment,
        head_first: Segment,
        tail_len: usize,
        head_len: usize,
        index: Arc<SpatialIndex>,
        nfold: usize,
        from_seg: Option<usize>,
        max_results: usize,
    ) -> Self {
        assert!(nfold > 0, "nfold must be positive");
        Self {
            splitseg,
            tail_last,
            head_first,
            index,
            cyclic_xform: hrot(&Vector3::z(), 360.0 / nfold as f64),
            from_seg,
            max_results,
            joined: ClosedAssemblies::new(tail_len + head_len - 1),
            dropped: 0,
        }
    }

    /// Tail chains that could not be joined.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    fn join_batch(&mut self, batch: &ScoredBatch) {
        let from_seg = resolve_seg(self.from_seg, batch.nseg());
        let mut tails = Vec::with_capacity(batch.len());
        let mut heads = Vec::with_capacity(batch.len());
        for i in 0..batch.len() {
            if batch.score(i) != 0.0 {
                warn!("IndexJoin: tail chain with score {} ignored", batch.score(i));
                self.dropped += 1;
                continue;
            }
            let from = &batch.position(i)[from_seg];
            match self.index.lookup(&cyclic_relative(&self.cyclic_xform, from)) {
                Some(head) => {
                    tails.push(batch.index(i));
                    heads.push(head);
                }
                None => self.dropped += 1,
            }
        }
        let tail_ends: Vec<usize> = tails.iter().map(|t| t[t.len() - 1]).collect();
        let head_starts: Vec<usize> = heads.iter().map(|h| h[0]).collect();
        let merged =
            self.splitseg
                .merge_indices(&self.tail_last, &tail_ends, &self.head_first, &head_starts);
        let mut row = Vec::with_capacity(self.joined.nseg());
        for ((tail, head), joint) in tails.iter().zip(&heads).zip(merged) {
            let Some(joint) = joint else {
                self.dropped += 1;
                continue;
            };
            if self.joined.len() >= self.max_results {
                return;
            }
            row.clear();
            row.extend_from_slice(&tail[..tail.len() - 1]);
            row.push(joint);
            row.extend_from_slice(&head[1..]);
            self.joined.push(&row);
        }
    }
}

impl MergePolicy for IndexJoin {
    type Output = ClosedAssemblies;

    fn merge(&mut self, batches: Vec<ScoredBatch>) {
        for batch in &batches {
            self.join_batch(batch);
        }
        debug!(
            "IndexJoin checkpoint: {} assemblies, {} dropped",
            self.joined.len(),
            self.dropped
        );
    }

    fn finish(self) -> ClosedAssemblies {
        self.joined
    }
}
