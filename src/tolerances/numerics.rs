// SPDX-License-Identifier: AGPL-3.0-only

//! Thresholds of the dual exact/Taylor dispatch in the exponential and
//! logarithm maps.
//!
//! The closed-form eigen-methods are exact but singular at degeneracies
//! and near the identity; the Taylor series are robust but slower. The
//! cut-offs below decide which path runs. Changing any of them changes
//! results at the 1e-14 level and must be recorded in DESIGN.md.

/// SU(2) exponential/logarithm: below this algebra norm the closed form
/// divides by ~0, so the first-order expression is used instead.
pub const SU2_EXP_TAYLOR_NORM: f64 = 1e-20;

/// SU(3): a group element with `Re tr U ≥ 3 − SU3_NEAR_UNITY_CUTOFF` is
/// "near unity". For the exponential the same criterion reads
/// `½ tr H² ≤ SU3_NEAR_UNITY_CUTOFF`, since `Re tr exp(iH) ≈ 3 − ½ tr H²`.
pub const SU3_NEAR_UNITY_CUTOFF: f64 = 1e-2;

/// SU(3) exponential: eigenvalues with `|1 − λ_i/λ_j|` below this value
/// are treated as degenerate (eigenvectors ill-conditioned).
pub const SU3_EXP_DEGENERACY_CUTOFF: f64 = 1e-2;

/// SU(3) logarithm: eigenvalues of `U` closer than this on the unit circle
/// are treated as degenerate.
pub const SU3_LOG_DEGENERACY_CUTOFF: f64 = 1e-4;

/// Taylor terms for `exp(iH)` near unity (`‖H‖ ≲ 0.15`, truncation < 1e-25).
pub const SU3_EXP_TAYLOR_TERMS_NEAR_UNITY: usize = 15;

/// Taylor terms for `exp(iH)` at near-degenerate eigenvalues. Combined with
/// scaling and squaring so the series argument stays below
/// `SU3_SQUARING_NORM`.
pub const SU3_EXP_TAYLOR_TERMS_DEGENERATE: usize = 25;

/// Frobenius norm above which the degenerate-path Taylor series is applied
/// to `H / 2^s` and squared `s` times.
pub const SU3_SQUARING_NORM: f64 = 0.5;

/// Terms of `log(1 + Y) = Σ (−1)^{n+1} Yⁿ / n` near unity (`‖Y‖ ≲ 0.15`).
pub const SU3_LOG_TAYLOR_TERMS: usize = 25;

/// Newton polishing steps applied to each Cardano root of the SU(3)
/// characteristic polynomial.
pub const SU3_LOG_NEWTON_STEPS: usize = 2;
