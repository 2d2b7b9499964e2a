// SPDX-License-Identifier: AGPL-3.0-only

//! Solver defaults, gauge-fixing defaults and validation tolerances.

// ═══════════════════════════════════════════════════════════════════
// Iteration defaults
// ═══════════════════════════════════════════════════════════════════

/// Coulomb gauge: FFT iterations per call.
///
/// Not iterated to convergence. Three passes reduce the divergence of a
/// weakly non-abelian configuration by several orders of magnitude at a
/// fixed cost; exposed as a parameter on `CoulombGauge`.
pub const COULOMB_GAUGE_ITERATIONS: usize = 3;

/// Implicit solver: fixed-point iterations per step (no convergence check
/// by default, for reproducibility of reference runs).
pub const IMPLICIT_ITERATIONS: usize = 6;

/// Implicit solver: damping factor α of `U₂^α · U₁^(1−α)`.
pub const IMPLICIT_DAMPING_FACTOR: f64 = 0.5;

/// Gauss restoration: correction strength γ, in units of the inverse
/// spectral radius of the covariant lattice Laplacian (`γ/2D` per sweep).
pub const GAUSS_GAMMA: f64 = 0.5;

/// Gauss restoration: stop once the relative improvement of the total
/// violation falls below this value.
pub const GAUSS_ACCURACY: f64 = 1e-4;

/// Gauss restoration: hard iteration cap.
pub const GAUSS_MAX_ITERATIONS: usize = 100;

// ═══════════════════════════════════════════════════════════════════
// Validation tolerances
// ═══════════════════════════════════════════════════════════════════

/// Unitarity of exponentiated links and products: `‖U U† − 1‖`, `|det − 1|`.
///
/// Eigen-reconstruction accumulates ~10 roundings per entry.
pub const UNITARITY_ABS: f64 = 1e-10;

/// Exp/log round trip: relative error of `log(exp(A))` against `A`.
pub const ROUND_TRIP_REL: f64 = 1e-8;

/// Leapfrog energy conservation: relative deviation of the staggered
/// energy over 100 steps in the linear regime.
pub const ENERGY_CONSERVATION_REL: f64 = 1e-6;

/// Gauss-law conservation under the leapfrog/Lorenz update: relative
/// change of the summed violation. The lattice identity behind it is
/// exact, so only rounding remains.
pub const GAUSS_LAW_CONSERVATION_REL: f64 = 1e-9;

/// Gauge invariance of traces, energies and violations.
pub const GAUGE_INVARIANCE_ABS: f64 = 1e-10;
