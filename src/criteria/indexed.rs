// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Index probing: the second phase of a split cyclic search.

use super::{resolve_seg, Criteria};
use crate::accumulator::SpatialIndex;
use crate::geometry::{hinv, hrot, Xform};
use crate::state::PositionBatch;
use nalgebra::Vector3;
use std::sync::Arc;

/// Score of a chain whose probe key is absent from the index.
pub const NOT_IN_INDEX: f64 = 9e9;

/// Pose of `cyclic · from` seen from `from`: what the head half must
/// supply for the tail ending at `from` to close.
pub fn cyclic_relative(cyclic: &Xform, from: &Xform) -> Xform {
    hinv(from) * (cyclic * from)
}

/// Scores 0 when the index holds a half-chain that closes this one under
/// the `nfold` rotation about z, [`NOT_IN_INDEX`] otherwise.
///
/// The probe relates the symmetry frame at the chain entry to `probe_seg`,
/// so the criterion reports segment 0 as its from-segment and `probe_seg`
/// as its to-segment.
#[derive(Debug, Clone)]
pub struct IndexedCriteria {
    index: Arc<SpatialIndex>,
    nfold: usize,
    probe_seg: Option<usize>,
    cyclic_xform: Xform,
}

impl IndexedCriteria {
    /// `probe_seg == None` probes from the last segment.
    ///
    /// # Panics
    ///
    /// Panics if `nfold == 0`.
    pub fn new(index: Arc<SpatialIndex>, nfold: usize, probe_seg: Option<usize>) -> Self {
        assert!(nfold > 0, "nfold must be positive");
        Self {
            index,
            nfold,
            probe_seg,
            cyclic_xform: hrot(&Vector3::z(), 360.0 / nfold as f64),
        }
    }

    pub fn cyclic_xform(&self) -> &Xform {
        &self.cyclic_xform
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    pub fn score_row(&self, row: &[Xform]) -> f64 {
        let from = &row[resolve_seg(self.probe_seg, row.len())];
        let key = self
            .index
            .binner()
            .get_bin_index(&cyclic_relative(&self.cyclic_xform, from));
        if self.index.contains(&key) {
            0.0
        } else {
            NOT_IN_INDEX
        }
    }
}

impl Criteria for IndexedCriteria {
    fn score(&self, positions: &PositionBatch) -> Vec<f64> {
        positions.rows().map(|row| self.score_row(row)).collect()
    }

    fn nfold(&self) -> usize {
        self.nfold
    }

    fn to_seg(&self) -> Option<usize> {
        self.probe_seg
    }
}
