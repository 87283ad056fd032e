// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Geometric primitives for chain assembly.
//!
//! - Xform: rigid 4×4 homogeneous transform (rotation + translation)
//! - XformBinner / BinKey: fixed-resolution spatial hash of transforms

pub mod binner;
pub mod xform;

// Re-export for convenience
pub use binner::{BinKey, XformBinner};
pub use xform::{
    axis_angle, axis_angle_center, hinv, hrot, htrans, identity_distance, quaternion, rotation, rotation_angle,
    translation, Xform,
};
