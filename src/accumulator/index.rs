// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Spatial-hash index over the relative transform of two segments.
//!
//! Phase one of a two-phase search streams its hits through [`IndexBuilder`].
//! Every kept chain is reduced to the [`BinKey`] of `pos[from]⁻¹ · pos[to]`
//! and remembered under that key. Phase two probes the finished
//! [`SpatialIndex`] instead of scoring geometry.
//!
//! Collision policy: the first chain to land in a cell owns it. Later chains
//! binning to the same key are ignored, within one checkpoint and across
//! checkpoints.

use super::MergePolicy;
use crate::criteria::resolve_seg;
use crate::geometry::{hinv, BinKey, Xform, XformBinner};
use crate::state::ScoredBatch;
use log::debug;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Map from relative-pose cell to the index tuple that produced it.
#[derive(Debug, Clone, Default)]
pub struct SpatialIndex {
    binner: XformBinner,
    map: HashMap<BinKey, Vec<usize>>,
}

impl SpatialIndex {
    pub fn new(binner: XformBinner) -> Self {
        Self {
            binner,
            map: HashMap::new(),
        }
    }

    pub fn binner(&self) -> &XformBinner {
        &self.binner
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn contains(&self, key: &BinKey) -> bool {
        self.map.contains_key(key)
    }

    pub fn get(&self, key: &BinKey) -> Option<&[usize]> {
        self.map.get(key).map(Vec::as_slice)
    }

    /// Index tuple stored for the cell containing `x`.
    pub fn lookup(&self, x: &Xform) -> Option<&[usize]> {
        self.get(&self.binner.get_bin_index(x))
    }

    /// Insert unless the key is taken. Returns true if `index` was stored.
    pub fn insert(&mut self, key: BinKey, index: &[usize]) -> bool {
        match self.map.entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(index.to_vec());
                true
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BinKey, &[usize])> + '_ {
        self.map.iter().map(|(k, v)| (k, v.as_slice()))
    }
}

/// Merge policy building a [`SpatialIndex`].
#[derive(Debug)]
pub struct IndexBuilder {
    thresh: f64,
    from_seg: usize,
    to_seg: Option<usize>,
    max_results: usize,
    index: SpatialIndex,
    collisions: usize,
}

impl IndexBuilder {
    /// Index chains scoring at most `thresh` by the pose of `to_seg` relative
    /// to `from_seg` (`None` for the last segment).
    pub fn new(
        binner: XformBinner,
        thresh: f64,
        from_seg: usize,
        to_seg: Option<usize>,
        max_results: usize,
    ) -> Self {
        Self {
            thresh,
            from_seg,
            to_seg,
            max_results,
            index: SpatialIndex::new(binner),
            collisions: 0,
        }
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    /// Chains that binned to an already occupied cell.
    pub fn collisions(&self) -> usize {
        self.collisions
    }

    fn add_batch(&mut self, batch: &ScoredBatch) {
        let to_seg = resolve_seg(self.to_seg, batch.nseg());
        for i in 0..batch.len() {
            if !(batch.score(i) <= self.thresh) {
                continue;
            }
            let pos = batch.position(i);
            let key = self
                .index
                .binner()
                .get_bin_index(&(hinv(&pos[self.from_seg]) * pos[to_seg]));
            if self.index.contains(&key) {
                self.collisions += 1;
            } else if self.index.len() < self.max_results {
                self.index.insert(key, batch.index(i));
            }
        }
    }
}

impl MergePolicy for IndexBuilder {
    type Output = SpatialIndex;

    fn merge(&mut self, batches: Vec<ScoredBatch>) {
        for batch in &batches {
            self.add_batch(batch);
        }
        debug!(
            "IndexBuilder checkpoint: {} batches, {} keys, {} collisions",
            batches.len(),
            self.index.len(),
            self.collisions
        );
    }

    fn finish(self) -> SpatialIndex {
        self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulator::IndexAccumulator;
    use crate::geometry::htrans;
    use nalgebra::Vector3;

    fn row(offset: f64) -> [Xform; 2] {
        let base = htrans(&Vector3::new(1.0, -2.0, 0.5));
        [base, htrans(&Vector3::new(1.0 + offset, -2.0, 0.5))]
    }

    fn batch(rows: &[(f64, f64, usize)]) -> ScoredBatch {
        let mut b = ScoredBatch::new(2);
        for &(score, offset, tag) in rows {
            b.push(score, &[tag, tag], &row(offset));
        }
        b
    }

    #[test]
    fn test_insert_first_wins() {
        let mut index = SpatialIndex::new(XformBinner::default());
        let key = index.binner().get_bin_index(&Xform::identity());
        assert!(index.insert(key, &[1, 2]));
        assert!(!index.insert(key, &[3, 4]));
        assert_eq!(index.get(&key), Some(&[1usize, 2][..]));
        assert_eq!(index.lookup(&Xform::identity()), Some(&[1usize, 2][..]));
    }

    #[test]
    fn test_keys_are_relative_poses() {
        let binner = XformBinner::new(1.0, 15.0);
        let mut builder = IndexBuilder::new(binner, 1.0, 0, None, 100);
        builder.merge(vec![batch(&[(0.0, 5.2, 7)])]);
        let [from, to] = row(5.2);
        let key = binner.get_bin_index(&(hinv(&from) * to));
        assert_eq!(key.cells()[0], 5);
        assert_eq!(builder.index().get(&key), Some(&[7usize, 7][..]));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let mut builder = IndexBuilder::new(XformBinner::new(1.0, 15.0), 0.5, 0, None, 100);
        builder.merge(vec![batch(&[(0.5, 1.5, 1), (0.6, 3.5, 2)])]);
        assert_eq!(builder.index().len(), 1);
        assert!(builder.index().iter().all(|(_, idx)| idx == [1, 1]));
    }

    #[test]
    fn test_first_insertion_wins_across_checkpoints() {
        let mut acc = IndexAccumulator::new(
            IndexBuilder::new(XformBinner::new(1.0, 15.0), 1.0, 0, None, 100),
            1,
        );
        acc.accumulate(Some(batch(&[(0.0, 2.1, 1)])));
        acc.accumulate(Some(batch(&[(0.0, 2.2, 2), (0.0, 2.3, 3)])));
        let index = acc.final_result().unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.iter().next().unwrap().1, &[1, 1]);
    }

    #[test]
    fn test_stops_admitting_at_max_results() {
        let mut builder = IndexBuilder::new(XformBinner::new(1.0, 15.0), 1.0, 0, None, 2);
        builder.merge(vec![batch(&[(0.0, 0.5, 1), (0.0, 1.5, 2), (0.0, 2.5, 3)])]);
        assert_eq!(builder.finish().len(), 2);
    }
}
