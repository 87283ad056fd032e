// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Error types for the search.
//!
//! Configuration problems (bad topology, bad options, a space too large to
//! index) are reported before any job is dispatched. Job failures are
//! collected while the run finishes and reported once at the end. An empty
//! result is not an error; see [`crate::GrowOutcome::NoResults`].

use thiserror::Error;

/// Why one job produced no result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFailure {
    /// Job id in `0..njob`.
    pub job: usize,
    /// Panic message, when one could be recovered.
    pub cause: String,
}

impl std::fmt::Display for JobFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "job {} failed: {}", self.job, self.cause)
    }
}

/// Errors that can end a search.
#[derive(Error, Debug)]
pub enum GrowError {
    /// The segment chain or criteria violate a topology rule.
    #[error("Topology error: {0}")]
    Topology(String),

    /// Invalid or incompatible options.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The planned job layout cannot be addressed with 63-bit sample indices.
    #[error("Search space too large: njob={njob} nchunks={nchunks} every_other={every_other}")]
    SpaceTooLarge {
        njob: u128,
        nchunks: u128,
        every_other: u128,
    },

    /// The worker pool could not be created.
    #[error("Worker pool error: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    /// One or more jobs panicked; the run completed without their results.
    #[error("{failed} of {total} jobs failed, first: {first}")]
    JobsFailed {
        failed: usize,
        total: usize,
        first: JobFailure,
    },
}

/// Errors while loading a configuration file.
#[derive(Error, Debug)]
pub enum ConfigLoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] GrowError),
}

pub type Result<T> = std::result::Result<T, GrowError>;
