// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Partition of the search space into jobs.
//!
//! The chain is cut at `end`: the prefix `sizes[..end]` is enumerated whole
//! inside every sample (one [`TransformTable`](crate::memo::TransformTable)
//! lookup per combination), the suffix `sizes[end..]` is sampled. The cut
//! moves towards the front until the suffix offers at least one sample per
//! worker and the prefix table fits the memory budget.
//!
//! With `every_other` the stride between visited suffix samples, job `ijob`
//! visits the suffix flat indices `ijob, ijob + njob*every_other, ...`.

use crate::error::{GrowError, Result};
use log::info;

/// Largest number of jobs a plan may dispatch.
const MAX_JOBS: u128 = 1_000_000_000;

/// Bound on flat suffix indices and strides (they must fit in `i64`).
const MAX_INDEX: u128 = 1 << 63;

/// Product of `sizes`, saturating at `u128::MAX`.
pub fn bigprod(sizes: &[usize]) -> u128 {
    sizes
        .iter()
        .fold(1u128, |acc, &s| acc.saturating_mul(s as u128))
}

/// Choose the prefix/suffix cut for `sizes`.
///
/// Returns 0 for a single-segment chain.
pub fn chunk_end_seg(sizes: &[usize], workers: usize, memsize: u64) -> usize {
    if sizes.len() < 2 {
        return 0;
    }
    let mut end = sizes.len() - 1;
    while end > 1
        && (bigprod(&sizes[end..]) < workers as u128
            || memsize as u128 <= bigprod(&sizes[..end]).saturating_mul(64))
    {
        end -= 1;
    }
    end
}

/// The job layout of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPlan {
    pub sizes: Vec<usize>,
    pub workers: usize,
    pub end: usize,
    /// Size of the full product space.
    pub ntot: u128,
    /// Prefix combinations scored per sample.
    pub chunksize: u128,
    /// Number of suffix samples.
    pub nchunks: u128,
    pub max_samples: u128,
    pub every_other: u128,
    pub njob: usize,
}

impl ChunkPlan {
    /// Plan a run over a chain with the given segment sizes.
    ///
    /// # Errors
    ///
    /// [`GrowError::SpaceTooLarge`] when the layout needs more than 10^9
    /// jobs or suffix indices beyond 2^63, or the space exceeds `u128`.
    pub fn new(sizes: &[usize], workers: usize, memsize: u64, max_samples: u64) -> Result<Self> {
        let workers = workers.max(1);
        let end = chunk_end_seg(sizes, workers, memsize);
        let ntot = bigprod(sizes);
        let chunksize = bigprod(&sizes[..end]);
        let nchunks = bigprod(&sizes[end..]);
        let w = workers as u128;
        let max_samples = chunksize.saturating_mul(w).max(max_samples as u128).min(ntot);
        let every_other = if max_samples == 0 {
            1
        } else {
            (ntot / max_samples).max(1)
        };
        let per_worker = ((nchunks as f64 / every_other as f64).sqrt() / 128.0).floor() as u128;
        let njob = (per_worker * w).max(w).min(nchunks);
        if ntot == u128::MAX
            || njob > MAX_JOBS
            || nchunks >= MAX_INDEX
            || every_other >= MAX_INDEX
        {
            return Err(GrowError::SpaceTooLarge {
                njob,
                nchunks,
                every_other,
            });
        }
        Ok(Self {
            sizes: sizes.to_vec(),
            workers,
            end,
            ntot,
            chunksize,
            nchunks,
            max_samples,
            every_other,
            njob: njob as usize,
        })
    }

    /// Chains actually scored (full space divided by the stride).
    pub fn actual_total(&self) -> u128 {
        self.ntot / self.every_other
    }

    /// Suffix samples actually visited.
    pub fn actual_nchunks(&self) -> u128 {
        self.nchunks / self.every_other
    }

    pub fn actual_per_job(&self) -> u128 {
        self.actual_total() / self.njob.max(1) as u128
    }

    pub fn actual_chunks_per_job(&self) -> u128 {
        self.actual_nchunks() / self.njob.max(1) as u128
    }

    /// Suffix sizes, which [`MultiRange`] decodes sample indices against.
    pub fn suffix_sizes(&self) -> &[usize] {
        &self.sizes[self.end..]
    }

    /// Suffix samples of job `ijob`.
    pub fn job_samples(&self, ijob: usize) -> impl Iterator<Item = Vec<usize>> + '_ {
        let stride = self.njob as u128 * self.every_other;
        MultiRange::new(self.suffix_sizes()).strided(ijob as u128, stride)
    }

    pub fn log_summary(&self) {
        info!(
            "tot: {} chunksize: {} nchunks: {} nworker: {} njob: {}",
            self.ntot, self.chunksize, self.nchunks, self.workers, self.njob
        );
        info!(
            "worm/job: {} chunk/job: {} sizes={:?} end={} every_other={}",
            self.ntot / self.njob.max(1) as u128,
            self.nchunks / self.njob.max(1) as u128,
            self.sizes,
            self.end,
            self.every_other
        );
        info!(
            "max_samples: {} actual tot: {} actual nchunks: {} actual worms/job: {} actual chunks/job: {}",
            self.max_samples,
            self.actual_total(),
            self.actual_nchunks(),
            self.actual_per_job(),
            self.actual_chunks_per_job()
        );
    }
}

/// Row-major decoding of flat indices into index tuples.
#[derive(Debug, Clone)]
pub struct MultiRange<'a> {
    sizes: &'a [usize],
    len: u128,
}

impl<'a> MultiRange<'a> {
    pub fn new(sizes: &'a [usize]) -> Self {
        Self {
            sizes,
            len: bigprod(sizes),
        }
    }

    pub fn len(&self) -> u128 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Tuple at flat index `flat` (first position most significant).
    pub fn get(&self, mut flat: u128) -> Vec<usize> {
        let mut digits = vec![0; self.sizes.len()];
        for (digit, &size) in digits.iter_mut().zip(self.sizes).rev() {
            let size = size as u128;
            *digit = (flat % size) as usize;
            flat /= size;
        }
        digits
    }

    /// Tuples at `start, start + step, ...` below `len`.
    pub fn strided(self, start: u128, step: u128) -> impl Iterator<Item = Vec<usize>> + 'a {
        let step = step.max(1);
        let len = self.len;
        std::iter::successors(Some(start), move |&i| i.checked_add(step))
            .take_while(move |&i| i < len)
            .map(move |i| self.get(i))
    }
}
