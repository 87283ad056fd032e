// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Scoring criteria.
//!
//! A criterion scores a batch of full chains: one non-negative number per
//! chain, 0 when the geometric goal is met exactly. It also describes itself
//! to the topology check and the driver (which segments it relates, whether
//! the chain must close on itself, which body the last segment must reuse).
//!
//! # Example
//!
//! ```
//! use worm_search::criteria::{Criteria, IdentityDistance};
//! use worm_search::geometry::Xform;
//! use worm_search::state::PositionBatch;
//!
//! let criteria = IdentityDistance::new(0, None);
//! let mut batch = PositionBatch::new(2);
//! batch.push_row(&[Xform::identity(), Xform::identity()]);
//! assert_eq!(criteria.score(&batch), vec![0.0]);
//! ```

pub mod cyclic;
pub mod distance;
pub mod indexed;

pub use cyclic::Cyclic;
pub use distance::IdentityDistance;
pub use indexed::{IndexedCriteria, NOT_IN_INDEX};

use crate::geometry::Xform;
use crate::state::PositionBatch;
use std::fmt::Debug;

/// Trait for scoring criteria.
///
/// Criteria are shared read-only by every worker of a run, hence
/// `Send + Sync`. Only [`score`](Criteria::score) is required; the metadata
/// methods default to a plain, non-cyclic criterion relating the first and
/// last segments.
pub trait Criteria: Send + Sync + Debug {
    /// One score per row of `positions`. Lower is better; 0 is a perfect match.
    fn score(&self, positions: &PositionBatch) -> Vec<f64>;

    /// Transform placing a chain in a canonical frame (for export).
    fn alignment(&self, _positions: &[Xform]) -> Xform {
        Xform::identity()
    }

    /// Order of cyclic symmetry (1 for none).
    fn nfold(&self) -> usize {
        1
    }

    fn from_seg(&self) -> usize {
        0
    }

    /// Segment the criterion relates to `from_seg`; `None` means the last.
    fn to_seg(&self) -> Option<usize> {
        None
    }

    fn tolerance(&self) -> f64 {
        1.0
    }

    /// Length converting rotation error (radians) into distance.
    fn lever(&self) -> f64 {
        1.0
    }

    /// Segment whose body the last segment must reuse.
    fn last_body_same_as(&self) -> Option<usize> {
        None
    }

    fn is_cyclic(&self) -> bool {
        false
    }

    /// Segment defining the symmetry frame. Its presence selects the
    /// two-phase (split chain) search.
    fn origin_seg(&self) -> Option<usize> {
        None
    }

    /// Number of criteria combined in this one.
    fn count(&self) -> usize {
        1
    }
}

/// Resolve an optional segment reference against a chain of `nseg` segments.
pub fn resolve_seg(seg: Option<usize>, nseg: usize) -> usize {
    seg.unwrap_or(nseg.saturating_sub(1))
}

/// Sum of several criteria.
///
/// Metadata (cyclic flags, segment references, tolerance) comes from the
/// first member; scores are summed row by row.
#[derive(Debug)]
pub struct CriteriaList {
    members: Vec<Box<dyn Criteria>>,
}

impl CriteriaList {
    /// # Panics
    ///
    /// Panics if `members` is empty.
    pub fn new(members: Vec<Box<dyn Criteria>>) -> Self {
        assert!(!members.is_empty(), "CriteriaList needs at least one criterion");
        Self { members }
    }

    pub fn members(&self) -> &[Box<dyn Criteria>] {
        &self.members
    }

    fn first(&self) -> &dyn Criteria {
        self.members[0].as_ref()
    }
}

impl Criteria for CriteriaList {
    fn score(&self, positions: &PositionBatch) -> Vec<f64> {
        let mut total = vec![0.0; positions.len()];
        for member in &self.members {
            for (t, s) in total.iter_mut().zip(member.score(positions)) {
                *t += s;
            }
        }
        total
    }

    fn alignment(&self, positions: &[Xform]) -> Xform {
        self.first().alignment(positions)
    }

    fn nfold(&self) -> usize {
        self.first().nfold()
    }

    fn from_seg(&self) -> usize {
        self.first().from_seg()
    }

    fn to_seg(&self) -> Option<usize> {
        self.first().to_seg()
    }

    fn tolerance(&self) -> f64 {
        self.first().tolerance()
    }

    fn lever(&self) -> f64 {
        self.first().lever()
    }

    fn last_body_same_as(&self) -> Option<usize> {
        self.first().last_body_same_as()
    }

    fn is_cyclic(&self) -> bool {
        self.first().is_cyclic()
    }

    fn origin_seg(&self) -> Option<usize> {
        self.first().origin_seg()
    }

    fn count(&self) -> usize {
        self.members.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::htrans;
    use nalgebra::Vector3;

    fn two_row_batch() -> PositionBatch {
        let mut batch = PositionBatch::new(2);
        batch.push_row(&[Xform::identity(), htrans(&Vector3::new(3.0, 0.0, 0.0))]);
        batch.push_row(&[Xform::identity(), Xform::identity()]);
        batch
    }

    #[test]
    fn test_resolve_seg() {
        assert_eq!(resolve_seg(None, 4), 3);
        assert_eq!(resolve_seg(Some(1), 4), 1);
    }

    #[test]
    fn test_list_sums_scores() {
        let list = CriteriaList::new(vec![
            Box::new(IdentityDistance::new(0, None)),
            Box::new(IdentityDistance::new(0, Some(1))),
        ]);
        assert_eq!(list.count(), 2);
        assert_eq!(list.score(&two_row_batch()), vec![6.0, 0.0]);
    }

    #[test]
    fn test_list_metadata_from_first() {
        let list = CriteriaList::new(vec![
            Box::new(Cyclic::new(3).with_from_seg(1)),
            Box::new(IdentityDistance::new(0, None)),
        ]);
        assert!(list.is_cyclic());
        assert_eq!(list.nfold(), 3);
        assert_eq!(list.from_seg(), 1);
        assert_eq!(list.last_body_same_as(), Some(1));
    }

    #[test]
    #[should_panic(expected = "at least one")]
    fn test_empty_list_panics() {
        let _ = CriteriaList::new(Vec::new());
    }
}
