// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Scoped detachment of heavyweight body payloads.
//!
//! Bodies may carry caller-owned structure data that workers must never see.
//! [`PayloadGuard`] takes every payload out of a chain for the duration of a
//! run and puts each one back when dropped, including during unwinding.

use super::Segment;
use std::any::Any;
use std::sync::Arc;

/// Opaque caller data attached to a body.
pub type Payload = Arc<dyn Any + Send + Sync>;

/// Holds the payloads removed from a segment chain until it is dropped.
pub struct PayloadGuard<'a> {
    segments: &'a mut [Segment],
    stash: Vec<Vec<Option<Payload>>>,
}

impl<'a> PayloadGuard<'a> {
    /// Detach every body payload in `segments`.
    pub fn detach(segments: &'a mut [Segment]) -> Self {
        let stash = segments
            .iter_mut()
            .map(|seg| seg.bodies.iter_mut().map(|b| b.payload.take()).collect())
            .collect();
        Self { segments, stash }
    }

    /// The chain with payloads removed.
    pub fn segments(&self) -> &[Segment] {
        &*self.segments
    }

    /// Number of payloads held by the guard.
    pub fn detached(&self) -> usize {
        self.stash.iter().flatten().filter(|p| p.is_some()).count()
    }
}

impl Drop for PayloadGuard<'_> {
    fn drop(&mut self) {
        for (seg, payloads) in self.segments.iter_mut().zip(self.stash.drain(..)) {
            for (body, payload) in seg.bodies.iter_mut().zip(payloads) {
                body.payload = payload;
            }
        }
    }
}
