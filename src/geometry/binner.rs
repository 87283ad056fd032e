// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Fixed-resolution spatial hash for rigid transforms.
//!
//! A transform is reduced to six integers: its translation divided by the
//! cartesian resolution, and its rotation vector (axis × angle, from the
//! canonical quaternion) divided by the orientation resolution. Two
//! transforms landing in the same cell compare equal as keys, which turns an
//! approximate-equality search into a hash lookup.

use super::xform::{quaternion, translation, Xform};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discretized relative pose. Ordering is lexicographic over the cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BinKey([i32; 6]);

impl BinKey {
    /// The raw cell coordinates: three translational, three rotational.
    pub fn cells(&self) -> [i32; 6] {
        self.0
    }
}

impl fmt::Display for BinKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [x, y, z, a, b, c] = self.0;
        write!(f, "<{} {} {} | {} {} {}>", x, y, z, a, b, c)
    }
}

/// Maps transforms to [`BinKey`]s.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct XformBinner {
    /// Translational cell edge, in the same length unit as the transforms.
    cart_resl: f64,
    /// Rotational cell edge in degrees (of rotation-vector length).
    ori_resl: f64,
}

impl XformBinner {
    /// Create a binner. Both resolutions must be positive.
    pub fn new(cart_resl: f64, ori_resl: f64) -> Self {
        debug_assert!(cart_resl > 0.0 && ori_resl > 0.0);
        Self {
            cart_resl,
            ori_resl,
        }
    }

    pub fn cart_resl(&self) -> f64 {
        self.cart_resl
    }

    pub fn ori_resl(&self) -> f64 {
        self.ori_resl
    }

    /// Key of the cell containing `x`.
    pub fn get_bin_index(&self, x: &Xform) -> BinKey {
        let t = translation(x);
        let r = quaternion(x).scaled_axis();
        let ori = self.ori_resl.to_radians();
        let cell = |v: f64, resl: f64| (v / resl).floor() as i32;
        BinKey([
            cell(t.x, self.cart_resl),
            cell(t.y, self.cart_resl),
            cell(t.z, self.cart_resl),
            cell(r.x, ori),
            cell(r.y, ori),
            cell(r.z, ori),
        ])
    }

    /// Keys for a batch of transforms, in order.
    pub fn get_bin_indices<'a>(&self, xs: impl IntoIterator<Item = &'a Xform>) -> Vec<BinKey> {
        xs.into_iter().map(|x| self.get_bin_index(x)).collect()
    }
}

impl Default for XformBinner {
    fn default() -> Self {
        Self::new(2.0, 15.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::xform::{hrot, htrans};
    use nalgebra::Vector3;

    #[test]
    fn test_identity_bins_to_origin() {
        let binner = XformBinner::default();
        assert_eq!(binner.get_bin_index(&Xform::identity()).cells(), [0; 6]);
    }

    #[test]
    fn test_small_perturbation_stays_in_cell() {
        let binner = XformBinner::new(2.0, 15.0);
        let a = htrans(&Vector3::new(0.5, 0.5, 0.5)) * hrot(&Vector3::z(), 2.0);
        let b = htrans(&Vector3::new(0.6, 0.4, 0.7)) * hrot(&Vector3::z(), 3.0);
        assert_eq!(binner.get_bin_index(&a), binner.get_bin_index(&b));
    }

    #[test]
    fn test_translation_crosses_cell() {
        let binner = XformBinner::new(1.0, 15.0);
        let a = htrans(&Vector3::new(0.9, 0.0, 0.0));
        let b = htrans(&Vector3::new(1.1, 0.0, 0.0));
        assert_ne!(binner.get_bin_index(&a), binner.get_bin_index(&b));
        assert_eq!(binner.get_bin_index(&b).cells()[0], 1);
    }

    #[test]
    fn test_negative_translation_floors() {
        let binner = XformBinner::new(1.0, 15.0);
        let a = htrans(&Vector3::new(-0.1, 0.0, 0.0));
        assert_eq!(binner.get_bin_index(&a).cells()[0], -1);
    }

    #[test]
    fn test_rotation_separates_keys() {
        let binner = XformBinner::new(1.0, 10.0);
        let a = hrot(&Vector3::x(), 5.0);
        let b = hrot(&Vector3::x(), 45.0);
        assert_ne!(binner.get_bin_index(&a), binner.get_bin_index(&b));
    }

    #[test]
    fn test_batch_matches_single() {
        let binner = XformBinner::default();
        let xs = vec![htrans(&Vector3::new(5.0, 1.0, -3.0)), hrot(&Vector3::y(), 80.0)];
        let keys = binner.get_bin_indices(&xs);
        assert_eq!(keys[0], binner.get_bin_index(&xs[0]));
        assert_eq!(keys[1], binner.get_bin_index(&xs[1]));
    }
}
