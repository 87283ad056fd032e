// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! One-time consistency check of a chain against its criteria.
//!
//! Runs before planning. Nothing is dispatched if it fails.

use crate::criteria::{resolve_seg, Criteria};
use crate::error::{GrowError, Result};
use crate::segment::{Polarity, Segment};
use log::warn;

/// Check `segments` and `criteria`; returns the match-last segment.
///
/// With `expert`, a match-last body mismatch, a cyclic criterion not ending
/// on the last segment and sites missing on only some bodies are accepted
/// (the last with a warning).
pub fn check_topology(
    segments: &[Segment],
    criteria: &dyn Criteria,
    expert: bool,
) -> Result<Option<usize>> {
    let Some((first, last)) = segments.first().zip(segments.last()) else {
        return Err(GrowError::Topology(String::from("no segments")));
    };
    if let Some(i) = segments.iter().position(Segment::is_empty) {
        return Err(GrowError::Topology(format!("segment {} has no configurations", i)));
    }
    if first.entry_pol().is_some() {
        return Err(GrowError::Topology(String::from(
            "beginning of chain can't have entry",
        )));
    }
    if last.exit_pol().is_some() {
        return Err(GrowError::Topology(String::from("end of chain can't have exit")));
    }
    for (i, pair) in segments.windows(2).enumerate() {
        let (exit, entry) = (pair[0].exit_pol(), pair[1].entry_pol());
        let compatible = matches!((exit, entry), (Some(a), Some(b)) if a != b);
        if !compatible {
            return Err(GrowError::Topology(format!(
                "incompatible exit->entry polarity: {}->{} on segment pair ({}, {})",
                show(exit),
                show(entry),
                i,
                i + 1
            )));
        }
    }

    let nseg = segments.len();
    let from_seg = criteria.from_seg();
    let to_seg = resolve_seg(criteria.to_seg(), nseg);
    for (name, seg) in [("from_seg", from_seg), ("to_seg", to_seg)] {
        if seg >= nseg {
            return Err(GrowError::Topology(format!(
                "criteria {} = {} but chain has {} segments",
                name, seg, nseg
            )));
        }
    }

    let matchlast = criteria.last_body_same_as();
    if let Some(ml) = matchlast {
        if ml >= nseg {
            return Err(GrowError::Topology(format!(
                "criteria last_body_same_as = {} but chain has {} segments",
                ml, nseg
            )));
        }
        if !expert && !segments[ml].same_bodies_as(last) {
            return Err(GrowError::Topology(format!(
                "segments[{}] not same as last segment, if you're sure, pass expert",
                ml
            )));
        }
    }

    if criteria.is_cyclic() {
        if !expert && to_seg != nseg - 1 {
            return Err(GrowError::Topology(format!(
                "cyclic criteria to_seg {} is not the last segment, if you're sure, pass expert",
                to_seg
            )));
        }
        check_sites(segments, from_seg, to_seg, expert)?;
    }
    Ok(matchlast)
}

/// The from-segment must offer a site for each polarity it connects through.
fn check_sites(segments: &[Segment], from_seg: usize, to_seg: usize, expert: bool) -> Result<()> {
    let (beg, end) = (&segments[from_seg], &segments[to_seg]);
    for pol in [Polarity::N, Polarity::C] {
        let required = [beg.entry_pol(), beg.exit_pol(), end.entry_pol()]
            .iter()
            .filter(|&&p| p == Some(pol))
            .count();
        if beg.max_sites(pol) < required {
            return Err(GrowError::Topology(format!(
                "not enough {} sites in any body of segment {}: {} required, at most {} available",
                pol,
                from_seg,
                required,
                beg.max_sites(pol)
            )));
        }
        if beg.min_sites(pol) < required {
            let msg = format!(
                "not enough {} sites in all bodies of segment {}: {} required, some have only {} available",
                pol,
                from_seg,
                required,
                beg.min_sites(pol)
            );
            if !expert {
                return Err(GrowError::Topology(format!("{} (pass expert to run anyway)", msg)));
            }
            warn!("{}", msg);
        }
    }
    Ok(())
}

fn show(pol: Option<Polarity>) -> String {
    pol.map_or_else(|| String::from("none"), |p| p.to_string())
}
