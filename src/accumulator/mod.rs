// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Streaming reduction of job results.
//!
//! Completed jobs arrive one [`ScoredBatch`] at a time, in any order. A
//! [`StreamingReducer`] buffers them and hands the buffer to its
//! [`MergePolicy`] every `max_tmp_size` batches, so the driver never holds
//! more than one buffer of raw results.
//!
//! Three policies cover the search modes:
//!
//! - [`TopK`]: the lowest-scoring `max_results` chains ([`SimpleAccumulator`])
//! - [`IndexBuilder`]: a spatial hash of half-chains ([`IndexAccumulator`])
//! - [`IndexJoin`]: closed assemblies joined from two halves ([`IndexedAccumulator`])

pub mod index;
pub mod indexed;
pub mod topk;

pub use index::{IndexBuilder, SpatialIndex};
pub use indexed::{ClosedAssemblies, IndexJoin};
pub use topk::TopK;

use crate::state::ScoredBatch;
use log::debug;

/// How buffered batches are folded into the running state.
pub trait MergePolicy {
    type Output;

    /// Fold a buffer of non-empty batches into the running state.
    fn merge(&mut self, batches: Vec<ScoredBatch>);

    /// The final state.
    fn finish(self) -> Self::Output;
}

/// Buffer-then-checkpoint reducer shared by every search mode.
#[derive(Debug)]
pub struct StreamingReducer<P> {
    policy: P,
    buffer: Vec<ScoredBatch>,
    max_tmp_size: usize,
    received: usize,
    checkpoints: usize,
}

pub type SimpleAccumulator = StreamingReducer<TopK>;
pub type IndexAccumulator = StreamingReducer<IndexBuilder>;
pub type IndexedAccumulator = StreamingReducer<IndexJoin>;

impl<P: MergePolicy> StreamingReducer<P> {
    /// `max_tmp_size` is the number of buffered batches that triggers a
    /// checkpoint (at least 1).
    pub fn new(policy: P, max_tmp_size: usize) -> Self {
        Self {
            policy,
            buffer: Vec::new(),
            max_tmp_size: max_tmp_size.max(1),
            received: 0,
            checkpoints: 0,
        }
    }

    /// Take one job's result. `None` and empty batches are ignored.
    pub fn accumulate(&mut self, result: Option<ScoredBatch>) {
        let Some(batch) = result else {
            return;
        };
        if batch.is_empty() {
            return;
        }
        self.received += 1;
        self.buffer.push(batch);
        if self.buffer.len() >= self.max_tmp_size {
            self.checkpoint();
        }
    }

    pub fn accumulate_all<I>(&mut self, results: I)
    where
        I: IntoIterator<Item = Option<ScoredBatch>>,
    {
        for result in results {
            self.accumulate(result);
        }
    }

    /// Hand the buffer to the policy.
    pub fn checkpoint(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        self.checkpoints += 1;
        debug!(
            "checkpoint {}: merging {} batches",
            self.checkpoints,
            self.buffer.len()
        );
        let batches = std::mem::take(&mut self.buffer);
        self.policy.merge(batches);
    }

    /// Batches accepted so far.
    pub fn received(&self) -> usize {
        self.received
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Checkpoint once more and return the policy's result, or `None` if no
    /// non-empty batch ever arrived.
    pub fn final_result(mut self) -> Option<P::Output> {
        self.checkpoint();
        if self.received == 0 {
            None
        } else {
            Some(self.policy.finish())
        }
    }
}
