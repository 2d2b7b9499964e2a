// SPDX-License-Identifier: AGPL-3.0-only

//! Centralized numerical cut-offs and validation tolerances.
//!
//! Every threshold that steers an algorithm (exact vs. Taylor dispatch,
//! iteration defaults) or that a test or validation binary checks against
//! is defined here with its basis. No ad-hoc magic numbers in the solvers.
//!
//! # Categories
//!
//! | Category | Basis | Example |
//! |----------|-------|---------|
//! | Exp/log dispatch | Conditioning of the eigen-decomposition | 1e-2 near-unity cut-off |
//! | Iterative defaults | Cost/accuracy tradeoff | 3 Coulomb iterations |
//! | Validation | IEEE 754 f64 + scheme order | 1e-8 round trip |

/// Exponential/logarithm dispatch thresholds and series lengths.
pub mod numerics;
/// Solver, gauge-fixing and validation tolerances.
pub mod lattice;

pub use numerics::{
    SU2_EXP_TAYLOR_NORM, SU3_EXP_DEGENERACY_CUTOFF, SU3_EXP_TAYLOR_TERMS_DEGENERATE,
    SU3_EXP_TAYLOR_TERMS_NEAR_UNITY, SU3_LOG_DEGENERACY_CUTOFF, SU3_LOG_NEWTON_STEPS,
    SU3_LOG_TAYLOR_TERMS, SU3_NEAR_UNITY_CUTOFF, SU3_SQUARING_NORM,
};

pub use lattice::{
    COULOMB_GAUGE_ITERATIONS, ENERGY_CONSERVATION_REL, GAUSS_ACCURACY, GAUSS_GAMMA,
    GAUSS_LAW_CONSERVATION_REL, GAUSS_MAX_ITERATIONS, GAUGE_INVARIANCE_ABS,
    IMPLICIT_DAMPING_FACTOR, IMPLICIT_ITERATIONS, ROUND_TRIP_REL, UNITARITY_ABS,
};
