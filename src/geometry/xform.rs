// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Rigid homogeneous transforms.
//!
//! Every placement in the search is a 4×4 homogeneous matrix holding a pure
//! rotation and a translation. Composition is plain matrix multiplication
//! (`a * b` applies `b` first, in the frame reached by `a`).
//!
//! # Examples
//!
//! ```
//! use worm_search::geometry::{hinv, hrot, htrans, Xform};
//! use nalgebra::Vector3;
//!
//! let x: Xform = htrans(&Vector3::new(1.0, 2.0, 3.0)) * hrot(&Vector3::z(), 90.0);
//! let back = hinv(&x) * x;
//! assert!((back - Xform::identity()).norm() < 1e-12);
//! ```

use nalgebra::{Matrix3, Matrix4, Rotation3, Unit, UnitQuaternion, Vector3};

/// A rigid transform: rotation block in the upper left, translation in the last column.
pub type Xform = Matrix4<f64>;

/// Closed-form inverse of a rigid transform.
///
/// Transposes the rotation block and rotates the negated offset. The input
/// is assumed orthonormal; a general matrix inverse is never taken.
pub fn hinv(x: &Xform) -> Xform {
    let rot_t: Matrix3<f64> = x.fixed_view::<3, 3>(0, 0).transpose();
    let offset: Vector3<f64> = x.fixed_view::<3, 1>(0, 3).into_owned();
    let mut out = Xform::identity();
    out.fixed_view_mut::<3, 3>(0, 0).copy_from(&rot_t);
    out.fixed_view_mut::<3, 1>(0, 3).copy_from(&(-(rot_t * offset)));
    out
}

/// Rotation about `axis` (through the origin) by `degrees`.
pub fn hrot(axis: &Vector3<f64>, degrees: f64) -> Xform {
    let axis = Unit::new_normalize(*axis);
    Rotation3::from_axis_angle(&axis, degrees.to_radians()).to_homogeneous()
}

/// Pure translation.
pub fn htrans(offset: &Vector3<f64>) -> Xform {
    Xform::new_translation(offset)
}

/// Translation part of a transform.
pub fn translation(x: &Xform) -> Vector3<f64> {
    x.fixed_view::<3, 1>(0, 3).into_owned()
}

/// Rotation part of a transform as a rotation matrix.
pub fn rotation(x: &Xform) -> Rotation3<f64> {
    Rotation3::from_matrix_unchecked(x.fixed_view::<3, 3>(0, 0).into_owned())
}

/// Rotation part as a unit quaternion, canonicalized to non-negative `w`.
pub fn quaternion(x: &Xform) -> UnitQuaternion<f64> {
    let q = UnitQuaternion::from_rotation_matrix(&rotation(x));
    if q.w < 0.0 {
        UnitQuaternion::new_unchecked(-q.into_inner())
    } else {
        q
    }
}

/// Rotation angle in radians, in `[0, π]`.
///
/// Uses `atan2` of the skew and trace parts, which stays accurate near 0
/// where `acos` of the trace loses half its digits.
pub fn rotation_angle(x: &Xform) -> f64 {
    let cos = (x[(0, 0)] + x[(1, 1)] + x[(2, 2)] - 1.0) / 2.0;
    let skew = Vector3::new(
        x[(2, 1)] - x[(1, 2)],
        x[(0, 2)] - x[(2, 0)],
        x[(1, 0)] - x[(0, 1)],
    );
    (skew.norm() / 2.0).atan2(cos)
}

/// Rotation axis and angle. A (near) identity rotation reports the z axis
/// with angle 0.
pub fn axis_angle(x: &Xform) -> (Vector3<f64>, f64) {
    match rotation(x).axis_angle() {
        Some((axis, angle)) => (axis.into_inner(), angle),
        None => (Vector3::z(), 0.0),
    }
}

/// Rotation axis, angle and a point on the rotation axis.
///
/// The point is the foot of the axis nearest the origin. Translation along
/// the axis (a screw rise) does not move it. For a (near) zero angle there
/// is no axis and the origin is reported.
pub fn axis_angle_center(x: &Xform) -> (Vector3<f64>, f64, Vector3<f64>) {
    let (axis, angle) = axis_angle(x);
    if angle < 1e-9 {
        return (axis, angle, Vector3::zeros());
    }
    let t = translation(x);
    let t_perp = t - axis * t.dot(&axis);
    let center = (t_perp + axis.cross(&t_perp) / (angle / 2.0).tan()) * 0.5;
    (axis, angle, center)
}

/// Distance of a transform from the identity: translation length plus
/// rotation angle scaled by `lever` (a length, so both terms share units).
pub fn identity_distance(x: &Xform, lever: f64) -> f64 {
    let cart = translation(x).norm();
    let rot = rotation_angle(x) * lever;
    (cart * cart + rot * rot).sqrt()
}
