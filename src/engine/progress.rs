// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Progress reporting while jobs complete.

use crate::engine::planner::ChunkPlan;
use log::info;

/// Receives run progress on the driving thread.
pub trait ProgressObserver {
    fn started(&self, _phase: &str, _plan: &ChunkPlan) {}

    /// Called after each job, with the best score of the run so far.
    fn job_done(&self, done: usize, total: usize, best_score: f64);

    fn finished(&self, _phase: &str, _failed: usize) {}
}

/// Logs at `info` level roughly every tenth of the run.
#[derive(Debug, Clone, Copy)]
pub struct LogProgress {
    steps: usize,
}

impl LogProgress {
    pub fn new(steps: usize) -> Self {
        Self {
            steps: steps.max(1),
        }
    }
}

impl Default for LogProgress {
    fn default() -> Self {
        Self::new(10)
    }
}

impl ProgressObserver for LogProgress {
    fn started(&self, phase: &str, plan: &ChunkPlan) {
        info!("{}: {} jobs over {} segments", phase, plan.njob, plan.sizes.len());
    }

    fn job_done(&self, done: usize, total: usize, best_score: f64) {
        let every = (total / self.steps).max(1);
        if done % every == 0 || done == total {
            info!(
                "{}/{} jobs ({:.0}%), best score {:.4}",
                done,
                total,
                100.0 * done as f64 / total.max(1) as f64,
                best_score
            );
        }
    }

    fn finished(&self, phase: &str, failed: usize) {
        info!("{}: done, {} failed jobs", phase, failed);
    }
}

/// Discards all progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn job_done(&self, _done: usize, _total: usize, _best_score: f64) {}
}
