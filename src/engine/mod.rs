// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Parallel subsampled search over a segment chain.
//!
//! This module ties the pieces of a run together:
//!
//! 1. [`check_topology`] validates the chain against the criteria.
//! 2. [`ChunkPlan`] cuts the chain into an enumerated prefix and a sampled
//!    suffix and spreads the suffix samples over jobs.
//! 3. [`run_phase`] runs every job on a [`WorkerPool`]; each job scores its
//!    samples with [`grow_job`] and the results stream into an accumulator.
//!
//! A criterion without an origin segment runs one phase into a bounded
//! top-k. A criterion with one splits the chain at its from-segment: the
//! head half is searched first into a spatial index of closing poses, then
//! the tail half is searched against that index and the two halves are
//! joined.
//!
//! # Example
//!
//! ```no_run
//! use worm_search::criteria::IdentityDistance;
//! use worm_search::engine::{grow, GrowOutcome};
//! use worm_search::segment::Segment;
//! use worm_search::GrowConfig;
//!
//! # fn chain() -> Vec<Segment> { unimplemented!() }
//! let mut segments: Vec<Segment> = chain();
//! let criteria = IdentityDistance::new(0, None);
//! match grow(&mut segments, &criteria, &GrowConfig::default()).unwrap() {
//!     GrowOutcome::Scored(results) => println!("{} chains", results.len()),
//!     GrowOutcome::Closed(closed) => println!("{} assemblies", closed.len()),
//!     GrowOutcome::NoResults => println!("nothing below threshold"),
//! }
//! ```

pub mod driver;
pub mod planner;
pub mod pool;
pub mod progress;
pub mod worker;

pub use driver::run_phase;
pub use planner::{bigprod, chunk_end_seg, ChunkPlan, MultiRange};
pub use pool::{RayonPool, SerialPool, WorkerPool};
pub use progress::{LogProgress, NoProgress, ProgressObserver};
pub use worker::{grow_chunk, grow_job};

use crate::accumulator::{
    ClosedAssemblies, IndexAccumulator, IndexBuilder, IndexJoin, IndexedAccumulator,
    SimpleAccumulator, TopK,
};
use crate::config::GrowConfig;
use crate::context::SearchContext;
use crate::criteria::{Criteria, Cyclic, IndexedCriteria, NOT_IN_INDEX};
use crate::error::{GrowError, Result};
use crate::geometry::Xform;
use crate::segment::{PayloadGuard, Segment, Segments};
use crate::state::{ScoredBatch, SearchStatistics};
use crate::topology::check_topology;
use log::{debug, info, warn};
use std::sync::Arc;
use strum::IntoEnumIterator;

/// Relative tolerance of the final re-scoring check.
const SCORE_CHECK_TOLERANCE: f64 = 1e-6;

/// What a run produced.
#[derive(Debug, Clone)]
pub enum GrowOutcome {
    /// Lowest-scoring chains of a single-phase search.
    Scored(SearchResults),
    /// Closed assemblies of a two-phase search.
    Closed(ClosedAssemblies),
    /// Nothing scored below threshold.
    NoResults,
}

impl GrowOutcome {
    pub fn is_empty(&self) -> bool {
        matches!(self, GrowOutcome::NoResults)
    }
}

/// Retained chains of a single-phase search, lowest score first.
#[derive(Debug, Clone)]
pub struct SearchResults {
    plan: ChunkPlan,
    best: ScoredBatch,
}

impl SearchResults {
    pub fn len(&self) -> usize {
        self.best.len()
    }

    pub fn is_empty(&self) -> bool {
        self.best.is_empty()
    }

    /// The plan the run followed.
    pub fn plan(&self) -> &ChunkPlan {
        &self.plan
    }

    pub fn scores(&self) -> &[f64] {
        self.best.scores()
    }

    /// Configuration index of every segment of result `i`.
    pub fn index(&self, i: usize) -> &[usize] {
        self.best.index(i)
    }

    /// Placement of every segment of result `i`.
    pub fn positions(&self, i: usize) -> &[Xform] {
        self.best.position(i)
    }

    pub fn batch(&self) -> &ScoredBatch {
        &self.best
    }

    /// Transform putting result `i` in the criteria's canonical frame.
    pub fn alignment(&self, criteria: &dyn Criteria, i: usize) -> Xform {
        criteria.alignment(self.best.position(i))
    }
}

/// Search `segments` on a rayon pool sized by `config.max_workers`, logging
/// progress.
pub fn grow(
    segments: &mut [Segment],
    criteria: &dyn Criteria,
    config: &GrowConfig,
) -> Result<GrowOutcome> {
    let pool = RayonPool::new(config.workers())?;
    grow_with_pool(segments, criteria, config, &pool, &LogProgress::default())
}

/// Search `segments` on the given pool.
///
/// Body payloads are detached for the duration of the run and restored
/// before returning, whatever the outcome.
pub fn grow_with_pool<W: WorkerPool>(
    segments: &mut [Segment],
    criteria: &dyn Criteria,
    config: &GrowConfig,
    pool: &W,
    progress: &dyn ProgressObserver,
) -> Result<GrowOutcome> {
    config.validate()?;
    let matchlast = check_topology(segments, criteria, config.expert)?;
    info!(
        "grow, from {} to {:?}, {} segments",
        criteria.from_seg(),
        criteria.to_seg(),
        segments.len()
    );
    for (i, seg) in segments.iter().enumerate() {
        debug!(
            " segment {} enter: {:?} exit: {:?} configs: {} bodies: {:?}",
            i,
            seg.entry_pol(),
            seg.exit_pol(),
            seg.len(),
            seg.bodies().iter().map(|b| b.name.as_str()).collect::<Vec<_>>()
        );
    }

    let guard = PayloadGuard::detach(segments);
    debug!("detached {} body payloads", guard.detached());
    let segments = guard.segments();
    let workers = pool.max_workers();
    let sizes: Vec<usize> = segments.iter().map(Segment::len).collect();
    let plan = ChunkPlan::new(&sizes, workers, config.memsize, config.max_samples)?;
    plan.log_summary();

    match criteria.origin_seg() {
        None => grow_simple(segments, criteria, matchlast, plan, config, pool, progress),
        Some(_) => grow_split(segments, criteria, config, pool, progress),
    }
}

fn grow_simple<W: WorkerPool>(
    segments: &[Segment],
    criteria: &dyn Criteria,
    matchlast: Option<usize>,
    plan: ChunkPlan,
    config: &GrowConfig,
    pool: &W,
    progress: &dyn ProgressObserver,
) -> Result<GrowOutcome> {
    let ctx = SearchContext::new(
        segments,
        plan.end,
        criteria,
        config.thresh,
        matchlast,
        config.max_results,
    );
    let mut accum = SimpleAccumulator::new(TopK::new(config.max_results), config.max_tmp_size);
    run_phase("search", pool, &plan, &ctx, &mut accum, progress)?;
    log_statistics("search", &ctx.stats);

    let best = match accum.final_result() {
        Some(best) if !best.is_empty() => best,
        _ => return Ok(GrowOutcome::NoResults),
    };
    check_scores(criteria, &best);
    Ok(GrowOutcome::Scored(SearchResults { plan, best }))
}

/// Recompute the scores of the retained chains; they must not have moved.
fn check_scores(criteria: &dyn Criteria, best: &ScoredBatch) {
    let rescored = criteria.score(best.positions());
    let mismatches = rescored
        .iter()
        .zip(best.scores())
        .filter(|&(a, b)| (a - b).abs() > SCORE_CHECK_TOLERANCE * (1.0 + b.abs()))
        .count();
    if mismatches > 0 {
        warn!(
            "score check: {} of {} retained chains rescore differently",
            mismatches,
            best.len()
        );
    }
}

/// Two-phase search of a chain split at the criteria's from-segment.
fn grow_split<W: WorkerPool>(
    segments: &[Segment],
    criteria: &dyn Criteria,
    config: &GrowConfig,
    pool: &W,
    progress: &dyn ProgressObserver,
) -> Result<GrowOutcome> {
    if criteria.count() != 1 {
        return Err(GrowError::Config(format!(
            "split search needs exactly one criterion, got {}",
            criteria.count()
        )));
    }
    let workers = pool.max_workers();
    let from_seg = criteria.from_seg();
    let nfold = criteria.nfold();
    let splitseg = &segments[from_seg];
    let (tail, head) = Segments::from(segments.to_vec()).split_at(from_seg);

    // phase 1: every head half-chain that closes on itself, by relative pose
    let head_criteria = Cyclic::new(nfold)
        .with_from_seg(0)
        .with_to_seg(head.len() - 1)
        .with_tolerance(criteria.tolerance())
        .with_lever(criteria.lever());
    let head_plan = ChunkPlan::new(&head.sizes(), workers, config.memsize, config.max_samples)?;
    head_plan.log_summary();
    let head_ctx = SearchContext::new(
        &head,
        head_plan.end,
        &head_criteria,
        config.thresh,
        Some(0),
        config.max_results,
    );
    let mut index_accum = IndexAccumulator::new(
        IndexBuilder::new(config.binner(), config.thresh, 0, None, config.max_results),
        config.max_tmp_size,
    );
    run_phase("head", pool, &head_plan, &head_ctx, &mut index_accum, progress)?;
    log_statistics("head", &head_ctx.stats);
    let index = match index_accum.final_result() {
        Some(index) if !index.is_empty() => Arc::new(index),
        _ => return Ok(GrowOutcome::NoResults),
    };
    info!("head index holds {} poses", index.len());

    // phase 2: tail half-chains whose closing pose is in the index
    let tail_criteria = IndexedCriteria::new(Arc::clone(&index), nfold, None);
    let tail_plan = ChunkPlan::new(&tail.sizes(), workers, config.memsize, config.max_samples)?;
    tail_plan.log_summary();
    let tail_ctx = SearchContext::new(
        &tail,
        tail_plan.end,
        &tail_criteria,
        NOT_IN_INDEX,
        None,
        config.max_results,
    );
    let join = IndexJoin::new(
        splitseg.clone(),
        tail[tail.len() - 1].clone(),
        head[0].clone(),
        tail.len(),
        head.len(),
        index,
        nfold,
        None,
        config.max_results,
    );
    let mut join_accum = IndexedAccumulator::new(join, config.max_tmp_size);
    run_phase("tail", pool, &tail_plan, &tail_ctx, &mut join_accum, progress)?;
    log_statistics("tail", &tail_ctx.stats);
    match join_accum.final_result() {
        Some(closed) if !closed.is_empty() => {
            info!("{} closed assemblies", closed.len());
            Ok(GrowOutcome::Closed(closed))
        }
        _ => {
            info!("no closed assemblies");
            Ok(GrowOutcome::NoResults)
        }
    }
}

fn log_statistics(phase: &str, stats: &SearchStatistics) {
    for counter in crate::state::Counters::iter() {
        debug!("{} {}: {}", phase, counter, stats.get(counter));
    }
    info!("{}: best score {:.4}", phase, stats.best_score());
}
