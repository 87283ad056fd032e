// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use nalgebra::Vector3;
use worm_search::geometry::{hrot, htrans, Xform};
use worm_search::{Body, Connection, Polarity, Segment};

/// Translation along x.
pub fn step_x(x: f64) -> Xform {
    htrans(&Vector3::new(x, 0.0, 0.0))
}

/// Rotation about z, in degrees.
pub fn turn_z(degrees: f64) -> Xform {
    hrot(&Vector3::z(), degrees)
}

/// Polarities of segment `i` of an `n`-segment chain.
pub fn polarities(i: usize, n: usize) -> (Option<Polarity>, Option<Polarity>) {
    let entry = (i > 0).then_some(Polarity::N);
    let exit = (i + 1 < n).then_some(Polarity::C);
    (entry, exit)
}

/// A chain whose last segment's origin sits at `sum(c) - target` along x
/// relative to the first segment's origin, so `IdentityDistance` scores
/// `|sum(c) - target|`.
pub fn offset_chain(sizes: &[usize], target: f64) -> Vec<Segment> {
    let n = sizes.len();
    sizes
        .iter()
        .enumerate()
        .map(|(i, &size)| {
            let (entry, exit) = polarities(i, n);
            let configs = (0..size)
                .map(|c| {
                    let c = c as f64;
                    if i == 0 {
                        // origin at the entry, exit moved by c - target
                        Connection::new(step_x(c - target), Xform::identity(), 0)
                    } else {
                        Connection::new(step_x(c), step_x(c), 0)
                    }
                })
                .collect();
            Segment::new(entry, exit, vec![Body::new(i, "offset", [1, 1])], configs).unwrap()
        })
        .collect()
}

/// Three segments that close threefold about the first segment's z axis
/// when the middle segment turns by 60 degrees.
///
/// `last_entry_site` is the site the last segment enters through on the
/// shared body; the first segment leaves through site 0.
pub fn trimer_chain(last_entry_site: usize) -> Vec<Segment> {
    let shared = || vec![Body::new(0, "monomer", [1, 1])];
    let first = Segment::new(
        None,
        Some(Polarity::C),
        shared(),
        vec![Connection::new(turn_z(60.0), Xform::identity(), 0).with_sites(None, Some(0))],
    )
    .unwrap();
    let middle = Segment::new(
        Some(Polarity::N),
        Some(Polarity::C),
        vec![Body::new(1, "linker", [1, 1])],
        [30.0, 60.0, 90.0]
            .iter()
            .map(|&deg| Connection::new(turn_z(deg), Xform::identity(), 0).with_sites(Some(0), Some(1)))
            .collect(),
    )
    .unwrap();
    let last = Segment::new(
        Some(Polarity::N),
        None,
        shared(),
        vec![Connection::new(Xform::identity(), Xform::identity(), 0)
            .with_sites(Some(last_entry_site), None)],
    )
    .unwrap();
    vec![first, middle, last]
}
