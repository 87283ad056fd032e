// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Cumulative transforms for every combination of a chain prefix.
//!
//! Level `k` holds, for every combination of configurations of segments
//! `0..=k`, the placement of segment `k`'s body origin and of its exit frame
//! relative to the chain entry. Level `k` is built from level `k-1` times
//! every configuration of segment `k`, so the whole table costs one matrix
//! product per entry.
//!
//! Entries of a level are addressed by the row-major flat index of the
//! combination, first segment most significant.

use crate::geometry::Xform;
use crate::segment::Segment;

#[derive(Debug, Clone)]
pub struct TransformTable {
    sizes: Vec<usize>,
    /// `segpos[k][flat]`: entry-to-origin of segment `k`.
    segpos: Vec<Vec<Xform>>,
    /// `conpos[k][flat]`: entry-to-exit of segment `k`.
    conpos: Vec<Vec<Xform>>,
}

impl TransformTable {
    /// Build the table for `prefix`. An empty prefix gives a table with one
    /// (empty) combination whose exit frame is the identity.
    pub fn build(prefix: &[Segment]) -> Self {
        let sizes: Vec<usize> = prefix.iter().map(Segment::len).collect();
        let mut segpos: Vec<Vec<Xform>> = Vec::with_capacity(prefix.len());
        let mut conpos: Vec<Vec<Xform>> = Vec::with_capacity(prefix.len());
        for seg in prefix {
            let (level_seg, level_con) = match conpos.last() {
                None => (
                    seg.configs().iter().map(|c| c.x2orgn).collect(),
                    seg.configs().iter().map(|c| c.x2exit).collect(),
                ),
                Some(prev) => {
                    let mut level_seg = Vec::with_capacity(prev.len() * seg.len());
                    let mut level_con = Vec::with_capacity(prev.len() * seg.len());
                    for base in prev {
                        for c in seg.configs() {
                            level_seg.push(base * c.x2orgn);
                            level_con.push(base * c.x2exit);
                        }
                    }
                    (level_seg, level_con)
                }
            };
            segpos.push(level_seg);
            conpos.push(level_con);
        }
        Self {
            sizes,
            segpos,
            conpos,
        }
    }

    /// Number of prefix segments.
    pub fn depth(&self) -> usize {
        self.sizes.len()
    }

    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    /// Number of prefix combinations.
    pub fn len(&self) -> usize {
        self.sizes.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flat index of the combination `digits` restricted to segments `0..=level`.
    pub fn flat_index(&self, digits: &[usize], level: usize) -> usize {
        digits[..=level]
            .iter()
            .zip(&self.sizes)
            .fold(0, |acc, (&d, &n)| acc * n + d)
    }

    /// Body placement of segment `level` for the combination `digits`.
    pub fn segpos(&self, digits: &[usize], level: usize) -> &Xform {
        &self.segpos[level][self.flat_index(digits, level)]
    }

    /// Exit frame of the whole prefix for the combination `digits`.
    pub fn exit_frame(&self, digits: &[usize]) -> Xform {
        match self.conpos.last() {
            Some(last) => last[self.flat_index(digits, self.depth() - 1)],
            None => Xform::identity(),
        }
    }

    /// Total stored transforms, for memory reporting.
    pub fn cells(&self) -> usize {
        self.segpos.iter().map(Vec::len).sum::<usize>() * 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{hrot, htrans};
    use crate::segment::{Body, Connection};
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn segment(n: usize, step: f64) -> Segment {
        let configs = (0..n)
            .map(|i| {
                let x2exit = htrans(&Vector3::new(step, i as f64, 0.0)) * hrot(&Vector3::z(), 10.0 * i as f64);
                let x2orgn = htrans(&Vector3::new(step / 2.0, 0.0, i as f64));
                Connection::new(x2exit, x2orgn, 0)
            })
            .collect();
        Segment::new(None, None, vec![Body::new(0, "b", [1, 1])], configs).unwrap()
    }

    #[test]
    fn test_levels_compose_in_order() {
        let segs = vec![segment(2, 1.0), segment(3, 2.0), segment(2, 3.0)];
        let table = TransformTable::build(&segs);
        assert_eq!(table.len(), 12);
        assert_eq!(table.cells(), 2 * (2 + 6 + 12));
        let digits = [1, 2, 0];
        let direct = segs[0].x2exit(1) * segs[1].x2exit(2) * segs[2].x2orgn(0);
        assert_relative_eq!(*table.segpos(&digits, 2), direct, epsilon = 1e-12);
        let exit = segs[0].x2exit(1) * segs[1].x2exit(2) * segs[2].x2exit(0);
        assert_relative_eq!(table.exit_frame(&digits), exit, epsilon = 1e-12);
        assert_eq!(*table.segpos(&digits, 0), *segs[0].x2orgn(1));
    }

    #[test]
    fn test_flat_index_is_row_major() {
        let segs = vec![segment(2, 1.0), segment(3, 1.0), segment(4, 1.0)];
        let table = TransformTable::build(&segs);
        assert_eq!(table.flat_index(&[1, 2, 3], 2), 12 + 8 + 3);
        assert_eq!(table.flat_index(&[1, 2, 3], 1), 5);
        assert_eq!(table.flat_index(&[1, 2, 3], 0), 1);
    }

    #[test]
    fn test_empty_prefix() {
        let table = TransformTable::build(&[]);
        assert_eq!(table.depth(), 0);
        assert_eq!(table.len(), 1);
        assert_eq!(table.exit_frame(&[]), Xform::identity());
    }
}
