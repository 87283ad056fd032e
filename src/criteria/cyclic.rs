// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Cyclic closure: the chain's last segment must sit where an n-fold
//! rotation would carry the first.

use super::{resolve_seg, Criteria};
use crate::geometry::{
    axis_angle, axis_angle_center, hinv, rotation_angle, translation, Xform,
};
use crate::state::PositionBatch;
use nalgebra::{Translation3, UnitQuaternion, Vector3};
use std::f64::consts::PI;

/// n-fold cyclic closure between `from_seg` and `to_seg`.
///
/// With `xhat = pos[to] * pos[from]⁻¹`, the chain closes when `xhat` is a
/// rotation by `2π/nfold` about some axis with no rise along it. For
/// `nfold == 1` the target is the identity. The score combines the
/// translational error and the rotational error times `lever`, divided by
/// `tolerance`.
///
/// When an `origin_seg` is given, the rotation axis must also coincide with
/// that segment's z axis through its origin, and the search runs in two
/// phases (see [`crate::engine::grow`]).
#[derive(Debug, Clone, PartialEq)]
pub struct Cyclic {
    nfold: usize,
    from_seg: usize,
    to_seg: Option<usize>,
    origin_seg: Option<usize>,
    tolerance: f64,
    lever: f64,
}

impl Cyclic {
    /// # Panics
    ///
    /// Panics if `nfold == 0`.
    pub fn new(nfold: usize) -> Self {
        assert!(nfold > 0, "nfold must be positive");
        Self {
            nfold,
            from_seg: 0,
            to_seg: None,
            origin_seg: None,
            tolerance: 1.0,
            lever: 50.0,
        }
    }

    pub fn with_from_seg(mut self, from_seg: usize) -> Self {
        self.from_seg = from_seg;
        self
    }

    pub fn with_to_seg(mut self, to_seg: usize) -> Self {
        self.to_seg = Some(to_seg);
        self
    }

    pub fn with_origin_seg(mut self, origin_seg: usize) -> Self {
        self.origin_seg = Some(origin_seg);
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_lever(mut self, lever: f64) -> Self {
        self.lever = lever;
        self
    }

    /// Rotation angle of the symmetry, in radians.
    pub fn symmetry_angle(&self) -> f64 {
        2.0 * PI / self.nfold as f64
    }

    fn xhat(&self, row: &[Xform]) -> Xform {
        let from = &row[self.from_seg];
        let to = &row[resolve_seg(self.to_seg, row.len())];
        to * hinv(from)
    }

    /// Score of a single chain.
    pub fn score_row(&self, row: &[Xform]) -> f64 {
        let xhat = self.xhat(row);
        let trans = translation(&xhat);
        let (cart_sq, rot_sq) = if self.nfold == 1 {
            let angle = rotation_angle(&xhat);
            (trans.norm_squared(), angle * angle)
        } else {
            let (mut cart_sq, mut rot_sq) = (0.0, 0.0);
            let axis = match self.origin_seg {
                Some(origin) => {
                    let frame = &row[origin];
                    let target_axis: Vector3<f64> = frame.fixed_view::<3, 1>(0, 2).into_owned();
                    let target_cen = translation(frame);
                    let (axis, _, cen) = axis_angle_center(&xhat);
                    cart_sq += (cen - target_cen).norm_squared();
                    rot_sq += (1.0 - axis.dot(&target_axis).abs()) * PI;
                    axis
                }
                None => axis_angle(&xhat).0,
            };
            let angle = axis_angle(&xhat).1;
            let rise = trans.dot(&axis);
            cart_sq += rise * rise;
            rot_sq += (angle - self.symmetry_angle()).powi(2);
            (cart_sq, rot_sq)
        };
        let rot_tol = self.tolerance / self.lever;
        (cart_sq / (self.tolerance * self.tolerance) + rot_sq / (rot_tol * rot_tol)).sqrt()
    }
}

impl Criteria for Cyclic {
    fn score(&self, positions: &PositionBatch) -> Vec<f64> {
        positions.rows().map(|row| self.score_row(row)).collect()
    }

    /// Aligns the symmetry axis with ±z through the origin. With an
    /// `origin_seg`, the inverse of that segment's placement.
    fn alignment(&self, positions: &[Xform]) -> Xform {
        if let Some(origin) = self.origin_seg {
            return hinv(&positions[origin]);
        }
        if self.nfold == 1 {
            return Xform::identity();
        }
        let (axis, _, cen) = axis_angle_center(&self.xhat(positions));
        let target = if axis.z > 0.0 { Vector3::z() } else { -Vector3::z() };
        let rot = UnitQuaternion::rotation_between(&axis, &target)
            .unwrap_or_else(UnitQuaternion::identity);
        rot.to_homogeneous() * Translation3::from(-cen).to_homogeneous()
    }

    fn nfold(&self) -> usize {
        self.nfold
    }

    fn from_seg(&self) -> usize {
        self.from_seg
    }

    fn to_seg(&self) -> Option<usize> {
        self.to_seg
    }

    fn tolerance(&self) -> f64 {
        self.tolerance
    }

    fn lever(&self) -> f64 {
        self.lever
    }

    fn last_body_same_as(&self) -> Option<usize> {
        Some(self.from_seg)
    }

    fn is_cyclic(&self) -> bool {
        true
    }

    fn origin_seg(&self) -> Option<usize> {
        self.origin_seg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{hrot, htrans};
    use approx::assert_relative_eq;

    /// Rotation by `degrees` about `axis` through `cen`, plus `rise` along it.
    fn screw(axis: Vector3<f64>, degrees: f64, cen: Vector3<f64>, rise: f64) -> Xform {
        let unit = axis.normalize();
        htrans(&(cen + unit * rise)) * hrot(&unit, degrees) * htrans(&(-cen))
    }

    fn closing_row(sym: &Xform) -> [Xform; 3] {
        let first = htrans(&Vector3::new(1.0, 2.0, 3.0)) * hrot(&Vector3::x(), 20.0);
        [first, Xform::identity(), sym * first]
    }

    #[test]
    fn test_perfect_c3_scores_zero() {
        let sym = screw(Vector3::new(1.0, 1.0, 0.0), 120.0, Vector3::new(3.0, -3.0, 1.0), 0.0);
        let score = Cyclic::new(3).score_row(&closing_row(&sym));
        assert_relative_eq!(score, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_rise_penalized() {
        let sym = screw(Vector3::z(), 120.0, Vector3::zeros(), 2.0);
        let score = Cyclic::new(3).with_tolerance(1.0).score_row(&closing_row(&sym));
        assert_relative_eq!(score, 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_wrong_angle_penalized() {
        let sym = screw(Vector3::z(), 90.0, Vector3::zeros(), 0.0);
        let c3 = Cyclic::new(3).with_lever(10.0);
        let expected = (120f64 - 90.0).to_radians() * 10.0;
        assert_relative_eq!(c3.score_row(&closing_row(&sym)), expected, epsilon = 1e-6);
        let c4 = Cyclic::new(4);
        assert_relative_eq!(c4.score_row(&closing_row(&sym)), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_nfold_one_is_identity_distance() {
        let row = [Xform::identity(), htrans(&Vector3::new(0.0, 0.0, 2.0))];
        assert_relative_eq!(Cyclic::new(1).score_row(&row), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_origin_seg_requires_axis_on_frame() {
        let sym = screw(Vector3::z(), 120.0, Vector3::new(4.0, 0.0, 0.0), 0.0);
        let [a, b, c] = closing_row(&sym);
        let on_axis = [a, htrans(&Vector3::new(4.0, 0.0, 0.0)), c];
        let off_axis = [a, b, c];
        let crit = Cyclic::new(3).with_origin_seg(1);
        assert_relative_eq!(crit.score_row(&on_axis), 0.0, epsilon = 1e-6);
        assert!(crit.score_row(&off_axis) > 3.9);
    }

    #[test]
    fn test_alignment_puts_axis_on_z() {
        let cen = Vector3::new(3.0, -3.0, 1.0);
        let sym = screw(Vector3::new(1.0, 1.0, 0.0), 120.0, cen, 0.0);
        let row = closing_row(&sym);
        let crit = Cyclic::new(3);
        let aln = crit.alignment(&row);
        let aligned = aln * sym * hinv(&aln);
        let (axis, angle, center) = axis_angle_center(&aligned);
        assert_relative_eq!(axis.z.abs(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(angle, 120f64.to_radians(), epsilon = 1e-9);
        assert_relative_eq!(center.norm(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_metadata() {
        let c = Cyclic::new(2).with_from_seg(1).with_to_seg(4);
        assert!(c.is_cyclic());
        assert_eq!(c.last_body_same_as(), Some(1));
        assert_eq!(c.to_seg(), Some(4));
        assert_eq!(c.origin_seg(), None);
    }
}
