// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Streaming reducers fed in many small pieces.

mod common;

use common::step_x;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use worm_search::accumulator::{IndexAccumulator, IndexBuilder, SimpleAccumulator, TopK};
use worm_search::geometry::{Xform, XformBinner};
use worm_search::state::ScoredBatch;

fn random_batches(rng: &mut StdRng, count: usize) -> Vec<ScoredBatch> {
    (0..count)
        .map(|job| {
            let rows = rng.random_range(0..8);
            let mut batch = ScoredBatch::new(2);
            for row in 0..rows {
                let score: f64 = rng.random_range(0.0..10.0);
                batch.push(score, &[job, row], &[Xform::identity(), step_x(score)]);
            }
            batch
        })
        .collect()
}

#[test]
fn test_top_k_matches_sorted_concatenation() {
    let mut rng = StdRng::seed_from_u64(17);
    for max_tmp_size in [1, 3, 1000] {
        let batches = random_batches(&mut rng, 40);
        let expected = ScoredBatch::concat(batches.clone())
            .unwrap()
            .sorted_truncated(25);

        let mut accum = SimpleAccumulator::new(TopK::new(25), max_tmp_size);
        accum.accumulate_all(batches.into_iter().map(Some));
        let best = accum.final_result().unwrap();
        assert_eq!(best.scores(), expected.scores(), "max_tmp_size={}", max_tmp_size);
        for i in 0..best.len() {
            assert_eq!(best.index(i), expected.index(i));
        }
    }
}

#[test]
fn test_top_k_without_results() {
    let mut accum = SimpleAccumulator::new(TopK::new(5), 2);
    accum.accumulate_all([None, Some(ScoredBatch::new(2)), None]);
    assert_eq!(accum.received(), 0);
    assert!(accum.final_result().is_none());
}

#[test]
fn test_index_keeps_first_arrival_per_cell() {
    let binner = XformBinner::new(1.0, 10.0);
    let mut accum = IndexAccumulator::new(IndexBuilder::new(binner, 2.0, 0, None, 100), 2);
    // 0.2 and 0.7 share a cell; 1.5 has its own; 3.0 scores above threshold
    for (job, (x, score)) in [(0.2, 1.0), (0.7, 0.0), (1.5, 2.0), (3.5, 3.0)].iter().enumerate() {
        let mut batch = ScoredBatch::new(2);
        batch.push(*score, &[job, job], &[Xform::identity(), step_x(*x)]);
        accum.accumulate(Some(batch));
    }
    let index = accum.final_result().unwrap();
    assert_eq!(index.len(), 2);
    assert_eq!(index.lookup(&step_x(0.5)), Some(&[0, 0][..]));
    assert_eq!(index.lookup(&step_x(1.1)), Some(&[2, 2][..]));
    assert_eq!(index.lookup(&step_x(3.5)), None);
}

#[test]
fn test_index_caps_keys_at_max_results() {
    let binner = XformBinner::new(1.0, 10.0);
    let mut accum = IndexAccumulator::new(IndexBuilder::new(binner, 1.0, 0, None, 3), 4);
    let mut batch = ScoredBatch::new(2);
    for i in 0..10 {
        batch.push(0.0, &[i, i], &[Xform::identity(), step_x(i as f64 + 0.5)]);
    }
    accum.accumulate(Some(batch));
    let index = accum.final_result().unwrap();
    assert_eq!(index.len(), 3);
    assert!(index.iter().all(|(_, idx)| idx[0] < 3));
}
