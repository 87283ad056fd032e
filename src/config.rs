// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Search options.
//!
//! Every field has a default, so a TOML file only needs the options it
//! changes:
//!
//! ```
//! use worm_search::GrowConfig;
//!
//! let config = GrowConfig::from_toml_str("thresh = 0.5\nmax_workers = 2").unwrap();
//! assert_eq!(config.thresh, 0.5);
//! assert_eq!(config.max_results, 10_000);
//! ```

use crate::error::{ConfigLoadError, GrowError, Result};
use crate::geometry::XformBinner;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Options of [`grow`](crate::grow).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GrowConfig {
    /// Chains scoring at or above this are discarded.
    pub thresh: f64,

    /// Downgrade topology problems a knowledgeable caller may accept to warnings.
    pub expert: bool,

    /// Budget, in table cells, for the per-run prefix transform table.
    pub memsize: u64,

    /// Worker threads; 0 means one per CPU.
    pub max_workers: usize,

    /// Target number of chains to score. Smaller values sample more sparsely.
    pub max_samples: u64,

    /// Cap on retained results (and on spatial index keys).
    pub max_results: usize,

    /// Translational cell size of the spatial index.
    pub cart_resl: f64,

    /// Rotational cell size of the spatial index, in degrees.
    pub ori_resl: f64,

    /// Job results buffered before each accumulator checkpoint.
    pub max_tmp_size: usize,
}

impl Default for GrowConfig {
    fn default() -> Self {
        Self {
            thresh: 2.0,
            expert: false,
            memsize: 1_000_000,
            max_workers: 0,
            max_samples: 1_000_000_000_000,
            max_results: 10_000,
            cart_resl: 2.0,
            ori_resl: 15.0,
            max_tmp_size: 1024,
        }
    }
}

impl GrowConfig {
    /// Parse and validate TOML text.
    pub fn from_toml_str(text: &str) -> std::result::Result<Self, ConfigLoadError> {
        let config: GrowConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn load(path: &Path) -> std::result::Result<Self, ConfigLoadError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.thresh.is_nan() || self.thresh < 0.0 {
            return Err(GrowError::Config(format!(
                "thresh must be a non-negative number, got {}",
                self.thresh
            )));
        }
        if !(self.cart_resl > 0.0 && self.ori_resl > 0.0) {
            return Err(GrowError::Config(format!(
                "resolutions must be positive, got cart_resl={} ori_resl={}",
                self.cart_resl, self.ori_resl
            )));
        }
        for (name, value) in [
            ("max_results", self.max_results as u64),
            ("max_samples", self.max_samples),
            ("max_tmp_size", self.max_tmp_size as u64),
        ] {
            if value == 0 {
                return Err(GrowError::Config(format!("{} must be positive", name)));
            }
        }
        Ok(())
    }

    /// Worker count with 0 resolved to the number of CPUs.
    pub fn workers(&self) -> usize {
        if self.max_workers == 0 {
            num_cpus::get()
        } else {
            self.max_workers
        }
    }

    pub fn binner(&self) -> XformBinner {
        XformBinner::new(self.cart_resl, self.ori_resl)
    }
}
