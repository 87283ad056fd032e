// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Distance between two segment placements.

use super::{resolve_seg, Criteria};
use crate::geometry::{hinv, identity_distance, Xform};
use crate::state::PositionBatch;

/// Scores how far `to_seg` sits from `from_seg`: the relative transform's
/// translation length combined with its rotation angle times `lever`.
///
/// A score of 0 means the two segments are placed identically.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityDistance {
    from_seg: usize,
    to_seg: Option<usize>,
    lever: f64,
}

impl IdentityDistance {
    /// `to_seg == None` relates `from_seg` to the last segment.
    pub fn new(from_seg: usize, to_seg: Option<usize>) -> Self {
        Self {
            from_seg,
            to_seg,
            lever: 1.0,
        }
    }

    pub fn with_lever(mut self, lever: f64) -> Self {
        self.lever = lever;
        self
    }

    /// Score of a single chain.
    pub fn score_row(&self, row: &[Xform]) -> f64 {
        let from = &row[self.from_seg];
        let to = &row[resolve_seg(self.to_seg, row.len())];
        identity_distance(&(hinv(from) * to), self.lever)
    }
}

impl Criteria for IdentityDistance {
    fn score(&self, positions: &PositionBatch) -> Vec<f64> {
        positions.rows().map(|row| self.score_row(row)).collect()
    }

    fn from_seg(&self) -> usize {
        self.from_seg
    }

    fn to_seg(&self) -> Option<usize> {
        self.to_seg
    }

    fn lever(&self) -> f64 {
        self.lever
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{hrot, htrans};
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    #[test]
    fn test_relative_not_absolute() {
        // both segments moved by the same transform: distance stays 0
        let moved = htrans(&Vector3::new(5.0, 5.0, 5.0)) * hrot(&Vector3::x(), 30.0);
        let row = [moved, Xform::identity(), moved];
        assert_relative_eq!(IdentityDistance::new(0, None).score_row(&row), 0.0, epsilon = 1e-12);
        assert!(IdentityDistance::new(0, Some(1)).score_row(&row) > 1.0);
    }

    #[test]
    fn test_lever_scales_rotation() {
        let row = [Xform::identity(), hrot(&Vector3::z(), 90.0)];
        let short = IdentityDistance::new(0, None).score_row(&row);
        let long = IdentityDistance::new(0, None).with_lever(10.0).score_row(&row);
        assert_relative_eq!(long, 10.0 * short, epsilon = 1e-9);
    }

    #[test]
    fn test_batch_score() {
        let mut batch = PositionBatch::new(2);
        batch.push_row(&[Xform::identity(), htrans(&Vector3::new(0.0, 4.0, 3.0))]);
        batch.push_row(&[Xform::identity(), Xform::identity()]);
        let scores = IdentityDistance::new(0, None).score(&batch);
        assert_relative_eq!(scores[0], 5.0, epsilon = 1e-12);
        assert_eq!(scores[1], 0.0);
    }
}
