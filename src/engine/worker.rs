// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Scoring of one suffix sample and of one job's share of samples.
//!
//! A sample fixes a configuration for every suffix segment. The worker
//! combines it with every surviving prefix combination, places the suffix
//! segments after the prefix exit frame, scores the batch and keeps the
//! chains below threshold.

use crate::context::SearchContext;
use crate::engine::planner::{ChunkPlan, MultiRange};
use crate::geometry::Xform;
use crate::segment::sites_collide;
use crate::state::{compare_scores, Counters, PositionBatch, ScoredBatch};

/// Prefix configurations of the match-last segment compatible with a sample.
///
/// `idxmap[k]` is the original configuration index of the `k`th allowed one.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PrefixFilter {
    seg: usize,
    idxmap: Vec<usize>,
}

/// Outcome of the match-last check for one sample.
enum MatchLast {
    /// No constraint, or the constraint sits in the suffix and holds.
    Unrestricted,
    /// The constraint sits in the prefix: enumerate only these combinations.
    Restricted(PrefixFilter),
    /// The suffix choice breaks the constraint.
    Rejected,
}

fn match_last(ctx: &SearchContext, sample: &[usize]) -> MatchLast {
    let Some(ml) = ctx.matchlast else {
        return MatchLast::Unrestricted;
    };
    let segs = ctx.segments;
    let last = &segs[segs.len() - 1];
    let last_choice = sample[sample.len() - 1];
    let body = last.body_id(last_choice);
    let site3 = last.entry_site(last_choice);
    let seg = &segs[ml];
    let compatible = |i: usize| {
        seg.body_id(i) == body
            && !sites_collide(seg.entry_site(i), site3)
            && !sites_collide(seg.exit_site(i), site3)
    };
    if ml < ctx.end {
        let idxmap = (0..seg.len()).filter(|&i| compatible(i)).collect();
        MatchLast::Restricted(PrefixFilter { seg: ml, idxmap })
    } else if compatible(sample[ml - ctx.end]) {
        MatchLast::Unrestricted
    } else {
        MatchLast::Rejected
    }
}

/// Prefix combinations to score, as digit tuples over the original
/// configuration indices.
fn prefix_combinations(
    sizes: &[usize],
    filter: Option<&PrefixFilter>,
) -> impl Iterator<Item = Vec<usize>> {
    let mut shape = sizes.to_vec();
    if let Some(f) = filter {
        shape[f.seg] = f.idxmap.len();
    }
    let filter = filter.cloned();
    let len = MultiRange::new(&shape).len();
    (0..len).map(move |flat| {
        let mut digits = MultiRange::new(&shape).get(flat);
        if let Some(f) = &filter {
            digits[f.seg] = f.idxmap[digits[f.seg]];
        }
        digits
    })
}

/// Score every prefix combination of one suffix sample.
///
/// Returns the chains scoring below `thresh`, lowest first (ties in
/// enumeration order), at most `max_results` of them. `None` when nothing
/// qualifies or the sample fails the match-last check.
pub fn grow_chunk(sample: &[usize], ctx: &SearchContext) -> Option<ScoredBatch> {
    ctx.stats.increment(Counters::SuffixSamples);
    let filter = match match_last(ctx, sample) {
        MatchLast::Rejected => {
            ctx.stats.increment(Counters::MatchLastRejected);
            return None;
        }
        MatchLast::Restricted(f) => Some(f),
        MatchLast::Unrestricted => None,
    };

    let nseg = ctx.nseg();
    let table = &ctx.table;
    let suffix = ctx.suffix();
    let mut positions = PositionBatch::with_capacity(nseg, table.len());
    let mut indices: Vec<usize> = Vec::with_capacity(nseg * table.len());
    let mut row: Vec<Xform> = Vec::with_capacity(nseg);
    for digits in prefix_combinations(table.sizes(), filter.as_ref()) {
        row.clear();
        row.extend((0..table.depth()).map(|level| *table.segpos(&digits, level)));
        let mut conpos = table.exit_frame(&digits);
        for (k, (seg, &choice)) in suffix.iter().zip(sample).enumerate() {
            row.push(conpos * seg.x2orgn(choice));
            if k + 1 < suffix.len() {
                conpos *= seg.x2exit(choice);
            }
        }
        positions.push_row(&row);
        indices.extend_from_slice(&digits);
        indices.extend_from_slice(sample);
    }
    if positions.is_empty() {
        return None;
    }

    let scores = ctx.criteria.score(&positions);
    ctx.stats.add(Counters::ChainsScored, scores.len() as u64);
    if let Some(&min) = scores.iter().min_by(|a, b| compare_scores(**a, **b)) {
        ctx.stats.offer_score(min);
    }
    let mut keep: Vec<usize> = (0..scores.len()).filter(|&i| scores[i] < ctx.thresh).collect();
    ctx.stats.add(Counters::ChainsBelowThreshold, keep.len() as u64);
    if keep.is_empty() {
        return None;
    }
    keep.sort_by(|&a, &b| compare_scores(scores[a], scores[b]));
    keep.truncate(ctx.max_results);
    let mut out = ScoredBatch::with_capacity(nseg, keep.len());
    for i in keep {
        out.push(scores[i], &indices[i * nseg..(i + 1) * nseg], positions.row(i));
    }
    Some(out)
}

/// Run [`grow_chunk`] over every sample of job `ijob` and keep the best
/// `max_results` chains of the job.
pub fn grow_job(ijob: usize, plan: &ChunkPlan, ctx: &SearchContext) -> Option<ScoredBatch> {
    let chunks: Vec<ScoredBatch> = plan
        .job_samples(ijob)
        .filter_map(|sample| grow_chunk(&sample, ctx))
        .collect();
    ScoredBatch::concat(chunks).map(|all| all.sorted_truncated(ctx.max_results))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::IdentityDistance;
    use crate::geometry::htrans;
    use crate::segment::{Body, Connection, Polarity, Segment};
    use nalgebra::Vector3;

    /// Segment whose configuration `i` steps `i` along x.
    fn stepper(n: usize, entry: Option<Polarity>, exit: Option<Polarity>) -> Segment {
        let configs = (0..n)
            .map(|i| {
                let x = htrans(&Vector3::new(i as f64, 0.0, 0.0));
                Connection::new(x, x, 0).with_sites(Some(i % 2), Some(1 - i % 2))
            })
            .collect();
        Segment::new(entry, exit, vec![Body::new(1, "s", [2, 2])], configs).unwrap()
    }

    fn chain() -> Vec<Segment> {
        vec![
            stepper(3, None, Some(Polarity::C)),
            stepper(3, Some(Polarity::N), Some(Polarity::C)),
            stepper(4, Some(Polarity::N), None),
        ]
    }

    #[test]
    fn test_prefix_combinations_with_filter() {
        let filter = PrefixFilter {
            seg: 1,
            idxmap: vec![0, 2],
        };
        let all: Vec<Vec<usize>> = prefix_combinations(&[2, 3], Some(&filter)).collect();
        assert_eq!(all, vec![vec![0, 0], vec![0, 2], vec![1, 0], vec![1, 2]]);
    }

    #[test]
    fn test_grow_chunk_places_suffix_after_prefix() {
        let segs = chain();
        let criteria = IdentityDistance::new(0, None);
        let ctx = SearchContext::new(&segs, 2, &criteria, 1e9, None, 100);
        let batch = grow_chunk(&[3], &ctx).unwrap();
        assert_eq!(batch.len(), 9);
        for i in 0..batch.len() {
            let idx = batch.index(i);
            assert_eq!(idx[2], 3);
            // entry-to-origin of the last segment: first two exits plus its own x2orgn
            let x = batch.position(i)[2][(0, 3)];
            assert_eq!(x, (idx[0] + idx[1] + idx[2]) as f64);
        }
        assert_eq!(ctx.stats.get(Counters::ChainsScored), 9);
    }

    #[test]
    fn test_grow_chunk_threshold_and_cap() {
        let segs = chain();
        let criteria = IdentityDistance::new(0, None);
        let ctx = SearchContext::new(&segs, 2, &criteria, 3.5, None, 2);
        let batch = grow_chunk(&[0], &ctx).unwrap();
        assert_eq!(batch.len(), 2);
        assert!(batch.scores().windows(2).all(|w| w[0] <= w[1]));
        assert!(batch.scores().iter().all(|&s| s < 3.5));
    }

    #[test]
    fn test_match_last_in_prefix_restricts_configs() {
        let segs = chain();
        let criteria = IdentityDistance::new(0, None);
        let ctx = SearchContext::new(&segs, 2, &criteria, 1e9, Some(0), 100);
        // last config 1 enters through site 1: segment 0 configs with entry
        // or exit site 1 collide, which is all of them
        assert!(grow_chunk(&[1], &ctx).is_none());
        assert_eq!(ctx.stats.get(Counters::ChainsScored), 0);
    }

    #[test]
    fn test_match_last_in_suffix_rejects_sample() {
        let mut segs = chain();
        segs[2] = Segment::new(
            Some(Polarity::N),
            None,
            vec![Body::new(2, "other", [2, 2])],
            vec![Connection::new(Xform::identity(), Xform::identity(), 0)],
        )
        .unwrap();
        let criteria = IdentityDistance::new(0, None);
        let ctx = SearchContext::new(&segs, 1, &criteria, 1e9, Some(1), 100);
        // segment 1 uses body 1, the last segment body 2
        assert!(grow_chunk(&[0, 0], &ctx).is_none());
        assert_eq!(ctx.stats.get(Counters::MatchLastRejected), 1);
    }

    #[test]
    fn test_grow_job_merges_its_samples() {
        let segs = chain();
        let criteria = IdentityDistance::new(0, None);
        let ctx = SearchContext::new(&segs, 2, &criteria, 1e9, None, 5);
        let plan = ChunkPlan::new(&[3, 3, 4], 2, 1_000_000, 1_000_000).unwrap();
        assert_eq!(plan.end, 2);
        let batch = grow_job(0, &plan, &ctx).unwrap();
        assert_eq!(batch.len(), 5);
        // job 0 visits last-segment configs 0 and 2
        assert!((0..batch.len()).all(|i| batch.index(i)[2] % 2 == 0));
        assert_eq!(batch.score(0), 0.0);
    }
}
