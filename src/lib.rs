// SPDX-License-Identifier: AGPL-3.0-only

//! hotSpring Yang-Mills: classical SU(2)/SU(3) lattice gauge fields
//!
//! Real-time evolution of gauge links and electric fields on a
//! D-dimensional grid, as used by Color Glass Condensate
//! particle-in-cell codes. The gauge group is a type parameter
//! ([`lattice::group::Su2`], [`lattice::group::Su3`]); the choice is made
//! once from the configuration and everything below it is monomorphized.
//!
//! ## Modules
//!   - `lattice`: algebra/group arithmetic, grid, cell iteration, energy
//!   - `solver`: leapfrog, implicit and Lorenz-gauge time steps
//!   - `gauge`: gauge transformations, Coulomb gauge, Gauss restoration
//!   - `config`: JSON run configuration
//!   - `simulation`: time-stepping driver
//!   - `tolerances`: numerical cut-offs and validation tolerances
//!   - `validation`: pass/fail harness for validation binaries
//!
//! ## Validation binaries
//!   - `validate_yang_mills`: unitarity, exp/log round trips, energy and
//!     Gauss-law conservation, gauge invariance, Coulomb gauge

pub mod config;
pub mod error;
pub mod gauge;
pub mod lattice;
pub mod simulation;
pub mod solver;
pub mod tolerances;
pub mod validation;

pub use config::LatticeConfig;
pub use error::LatticeError;
pub use simulation::{AnySimulation, Simulation};
