// SPDX-License-Identifier: AGPL-3.0-only

//! Run configuration, read from JSON.
//!
//! ```json
//! {
//!   "colors": 3,
//!   "dims": [8, 8, 8],
//!   "boundaries": ["periodic", "periodic", "fixed"],
//!   "spacing": 1.0,
//!   "time_step": 0.05,
//!   "threads": 4,
//!   "solver": { "kind": "implicit", "iterations": 8, "damping": 0.5 }
//! }
//! ```
//!
//! Every field is optional. [`LatticeConfig::validate`] checks the whole
//! configuration before any grid is allocated.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::LatticeError;
use crate::lattice::constants::SUPPORTED_COLORS;
use crate::lattice::grid::{Boundary, Geometry};
use crate::solver::SolverConfig;

/// Default time step as a fraction of the spatial spacing.
pub const DEFAULT_TIME_STEP_RATIO: f64 = 0.01;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LatticeConfig {
    /// N of SU(N).
    pub colors: usize,
    /// Cells per dimension.
    pub dims: Vec<usize>,
    /// Per-dimension boundaries; all periodic when absent.
    pub boundaries: Option<Vec<Boundary>>,
    /// Spatial lattice spacing `a_s`.
    pub spacing: f64,
    /// Time step `a_t`; `0.01·spacing` when absent.
    pub time_step: Option<f64>,
    /// Coupling constant g.
    pub coupling: f64,
    /// Worker threads; 0 or 1 runs sequentially.
    pub threads: usize,
    pub solver: SolverConfig,
}

impl Default for LatticeConfig {
    fn default() -> Self {
        Self {
            colors: 2,
            dims: vec![4, 4, 4],
            boundaries: None,
            spacing: 1.0,
            time_step: None,
            coupling: 1.0,
            threads: 1,
            solver: SolverConfig::default(),
        }
    }
}

impl LatticeConfig {
    /// # Errors
    ///
    /// [`LatticeError::Config`] for malformed JSON, plus everything
    /// [`LatticeConfig::validate`] reports.
    pub fn from_json_str(json: &str) -> Result<Self, LatticeError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// [`LatticeError::Config`] if the file cannot be read or parsed,
    /// plus everything [`LatticeConfig::validate`] reports.
    pub fn from_json_file(path: &Path) -> Result<Self, LatticeError> {
        let reader = BufReader::new(File::open(path)?);
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// `time_step`, or its default relative to the spacing.
    #[must_use]
    pub fn dt(&self) -> f64 {
        self.time_step
            .unwrap_or(DEFAULT_TIME_STEP_RATIO * self.spacing)
    }

    /// Boundaries with the periodic default filled in.
    #[must_use]
    pub fn resolved_boundaries(&self) -> Vec<Boundary> {
        self.boundaries
            .clone()
            .unwrap_or_else(|| vec![Boundary::Periodic; self.dims.len()])
    }

    /// Geometry described by this configuration.
    ///
    /// # Errors
    ///
    /// See [`Geometry::new`].
    pub fn geometry(&self) -> Result<Geometry, LatticeError> {
        Geometry::new(
            &self.dims,
            &self.resolved_boundaries(),
            self.spacing,
            self.coupling,
        )
    }

    /// # Errors
    ///
    /// - [`LatticeError::UnsupportedColors`] unless `colors` is 2 or 3
    /// - [`LatticeError::InvalidDimensions`] for bad `dims`/`boundaries`
    /// - [`LatticeError::InvalidParameter`] for a non-positive spacing,
    ///   coupling or time step, or invalid solver parameters
    pub fn validate(&self) -> Result<(), LatticeError> {
        if !SUPPORTED_COLORS.contains(&self.colors) {
            return Err(LatticeError::UnsupportedColors(self.colors));
        }
        self.geometry()?;
        let dt = self.dt();
        if dt <= 0.0 || !dt.is_finite() {
            return Err(LatticeError::InvalidParameter(format!(
                "time step must be positive, got {dt}"
            )));
        }
        self.solver.validate()
    }
}
