// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Worker pools running independent jobs.
//!
//! A pool runs `job(0) .. job(njob-1)` and hands each outcome to a sink on
//! the calling thread, in completion order. A panicking job is reported to
//! the sink as `Err` with the panic payload; the other jobs still run.

use crate::error::Result;
use crossbeam_channel::unbounded;
use log::debug;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread;

pub trait WorkerPool {
    /// Number of jobs that can run at once.
    fn max_workers(&self) -> usize;

    /// Run every job and feed `(job id, outcome)` to `sink` as jobs finish.
    fn map_unordered<T, F, S>(&self, njob: usize, job: F, sink: S)
    where
        T: Send,
        F: Fn(usize) -> T + Send + Sync,
        S: FnMut(usize, thread::Result<T>);
}

/// Jobs run on a dedicated rayon thread pool.
pub struct RayonPool {
    pool: ThreadPool,
}

impl RayonPool {
    /// Pool of `workers` threads; 0 means one per CPU.
    pub fn new(workers: usize) -> Result<Self> {
        let workers = if workers == 0 { num_cpus::get() } else { workers };
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("worm-search-{}", i))
            .build()?;
        debug!("RayonPool: {} threads", pool.current_num_threads());
        Ok(Self { pool })
    }
}

impl WorkerPool for RayonPool {
    fn max_workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    fn map_unordered<T, F, S>(&self, njob: usize, job: F, mut sink: S)
    where
        T: Send,
        F: Fn(usize) -> T + Send + Sync,
        S: FnMut(usize, thread::Result<T>),
    {
        let (tx, rx) = unbounded();
        let job = &job;
        self.pool.in_place_scope(|scope| {
            for ijob in 0..njob {
                let tx = tx.clone();
                scope.spawn(move |_| {
                    let outcome = catch_unwind(AssertUnwindSafe(|| job(ijob)));
                    // the receiver outlives the scope
                    let _ = tx.send((ijob, outcome));
                });
            }
            drop(tx);
            for (ijob, outcome) in rx.iter() {
                sink(ijob, outcome);
            }
        });
    }
}

/// Jobs run one after another on the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct SerialPool;

impl WorkerPool for SerialPool {
    fn max_workers(&self) -> usize {
        1
    }

    fn map_unordered<T, F, S>(&self, njob: usize, job: F, mut sink: S)
    where
        T: Send,
        F: Fn(usize) -> T + Send + Sync,
        S: FnMut(usize, thread::Result<T>),
    {
        for ijob in 0..njob {
            sink(ijob, catch_unwind(AssertUnwindSafe(|| job(ijob))));
        }
    }
}

/// Text of a panic payload, when it is a string.
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        String::from(*s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        String::from("unknown panic")
    }
}
