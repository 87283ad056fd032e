// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Split cyclic searches: head index, tail probe and join.

mod common;

use common::trimer_chain;
use worm_search::criteria::Cyclic;
use worm_search::engine::{NoProgress, RayonPool, SerialPool, WorkerPool};
use worm_search::{grow_with_pool, GrowConfig, GrowOutcome};

fn config() -> GrowConfig {
    // 120 degrees sits on a cell edge at 15 degree resolution
    GrowConfig {
        ori_resl: 7.0,
        cart_resl: 1.0,
        ..GrowConfig::default()
    }
}

fn run<W: WorkerPool>(pool: &W, last_entry_site: usize) -> GrowOutcome {
    let mut segments = trimer_chain(last_entry_site);
    let criteria = Cyclic::new(3).with_origin_seg(0);
    grow_with_pool(&mut segments, &criteria, &config(), pool, &NoProgress).unwrap()
}

#[test]
fn test_trimer_closes_through_sixty_degree_linker() {
    match run(&SerialPool, 1) {
        GrowOutcome::Closed(closed) => {
            assert_eq!(closed.nseg(), 3);
            let rows: Vec<Vec<usize>> = closed.iter().map(<[usize]>::to_vec).collect();
            assert_eq!(rows, vec![vec![0, 1, 0]]);
        }
        other => panic!("expected closed assemblies, got {:?}", other),
    }
}

#[test]
fn test_trimer_on_rayon_pool() {
    let pool = RayonPool::new(2).unwrap();
    match run(&pool, 1) {
        GrowOutcome::Closed(closed) => assert_eq!(closed.index(0), &[0, 1, 0]),
        other => panic!("expected closed assemblies, got {:?}", other),
    }
}

#[test]
fn test_colliding_sites_leave_nothing_to_close() {
    // the last segment would enter through the site the first one leaves by
    assert!(run(&SerialPool, 0).is_empty());
}

#[test]
fn test_split_search_rejects_mismatched_last_body() {
    let mut segments = trimer_chain(1);
    // closing on the linker would need the last segment to place a linker
    let criteria = Cyclic::new(3).with_origin_seg(0).with_from_seg(1);
    let outcome = grow_with_pool(&mut segments, &criteria, &config(), &SerialPool, &NoProgress);
    assert!(outcome.is_err());
}
