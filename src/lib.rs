// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Combinatorial assembly search over chains of rigid-body segments.
//!
//! Each segment of a chain offers a finite set of configurations (rigid
//! placements of a building block). The search looks for one configuration
//! per segment such that the accumulated transform satisfies a geometric
//! [`Criteria`](criteria::Criteria) below a threshold.
//!
//! # Architecture
//!
//! The product space is routinely beyond 10^12 chains, so it is sampled:
//!
//! - the chain is cut into a prefix, enumerated whole from a precomputed
//!   [`TransformTable`](memo::TransformTable), and a suffix, sampled with a
//!   fixed stride ([`ChunkPlan`](engine::ChunkPlan))
//! - independent jobs score their share of suffix samples in bulk on a
//!   [`WorkerPool`](engine::WorkerPool)
//! - completed jobs stream into a bounded accumulator on the driving thread
//!
//! # Search modes
//!
//! 1. **Single phase**: the best `max_results` chains by score
//!    ([`GrowOutcome::Scored`]).
//! 2. **Split cyclic**: for a cyclic criterion with an origin segment, the
//!    chain is split in two; the head half is indexed by its closing pose in
//!    a spatial hash, the tail half probes the index and matching halves are
//!    joined into closed assemblies ([`GrowOutcome::Closed`]).
//!
//! # Logging
//!
//! The crate logs through the [`log`] facade and installs no logger.

pub mod accumulator;
pub mod config;
pub mod context;
pub mod criteria;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod memo;
pub mod segment;
pub mod state;
pub mod topology;

// Re-export commonly used types
pub use config::GrowConfig;
pub use context::SearchContext;
pub use engine::{grow, grow_with_pool, GrowOutcome, SearchResults};
pub use error::{GrowError, Result};
pub use segment::{Body, Connection, Polarity, Segment, Segments};
