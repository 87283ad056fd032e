// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Precomputed, read-only data shared by every job of a run.
//!
//! - TransformTable: cumulative placements for every prefix combination

pub mod transform_table;

pub use transform_table::TransformTable;
