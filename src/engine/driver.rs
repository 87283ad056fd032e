// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Dispatch of all jobs of one search phase and streaming of their results.

use crate::accumulator::{MergePolicy, StreamingReducer};
use crate::context::SearchContext;
use crate::engine::planner::ChunkPlan;
use crate::engine::pool::{panic_message, WorkerPool};
use crate::engine::progress::ProgressObserver;
use crate::engine::worker::grow_job;
use crate::error::{GrowError, JobFailure, Result};
use crate::state::Counters;
use log::warn;

/// Run every job of `plan` on `pool`, streaming results into `reducer` on
/// the calling thread.
///
/// Failed jobs do not stop the run. Once every job has finished, any
/// failure is reported as [`GrowError::JobsFailed`].
pub fn run_phase<W, P>(
    phase: &str,
    pool: &W,
    plan: &ChunkPlan,
    ctx: &SearchContext,
    reducer: &mut StreamingReducer<P>,
    progress: &dyn ProgressObserver,
) -> Result<()>
where
    W: WorkerPool,
    P: MergePolicy,
{
    progress.started(phase, plan);
    let mut failures: Vec<JobFailure> = Vec::new();
    let mut done = 0;
    pool.map_unordered(
        plan.njob,
        |ijob| grow_job(ijob, plan, ctx),
        |ijob, outcome| {
            done += 1;
            match outcome {
                Ok(result) => {
                    ctx.stats.increment(Counters::JobsCompleted);
                    reducer.accumulate(result);
                }
                Err(payload) => {
                    ctx.stats.increment(Counters::JobsFailed);
                    let failure = JobFailure {
                        job: ijob,
                        cause: panic_message(payload.as_ref()),
                    };
                    warn!("{}: {}", phase, failure);
                    failures.push(failure);
                }
            }
            progress.job_done(done, plan.njob, ctx.stats.best_score());
        },
    );
    progress.finished(phase, failures.len());
    let failed = failures.len();
    match failures.into_iter().min_by_key(|f| f.job) {
        None => Ok(()),
        Some(first) => Err(GrowError::JobsFailed {
            failed,
            total: plan.njob,
            first,
        }),
    }
}
