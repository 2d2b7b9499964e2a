// SPDX-License-Identifier: AGPL-3.0-only

//! Centralized constants for the lattice core.
//!
//! Collects the LCG PRNG used for reproducible random algebra elements and
//! gauge transformations, the supported color counts, and the shared
//! division guard.

/// Supported numbers of colors: SU(2) and SU(3).
pub const SUPPORTED_COLORS: [usize; 2] = [2, 3];

/// Smallest extent per dimension for which the 4th-order central
/// difference of the Lorenz solver does not alias onto itself.
pub const LORENZ_MIN_EXTENT: usize = 4;

/// LCG multiplier (Knuth MMIX).
pub const LCG_MULTIPLIER: u64 = 6_364_136_223_846_793_005;

/// LCG increment (Knuth MMIX).
pub const LCG_INCREMENT: u64 = 1_442_695_040_888_963_407;

/// 53-bit mantissa divisor for LCG → uniform [0, 1) conversion.
pub const LCG_53_DIVISOR: f64 = (1u64 << 53) as f64;

/// Division guard for norms, Gram-Schmidt and eigenvector normalization.
///
/// Well below any physical link-angle scale.
pub const LATTICE_DIVISION_GUARD: f64 = 1e-30;

/// Advance the LCG state by one step.
#[inline]
pub fn lcg_step(seed: &mut u64) {
    *seed = seed
        .wrapping_mul(LCG_MULTIPLIER)
        .wrapping_add(LCG_INCREMENT);
}

/// Uniform f64 in [0, 1) from 53 bits of LCG state.
#[inline]
pub fn lcg_uniform_f64(seed: &mut u64) -> f64 {
    lcg_step(seed);
    (*seed >> 11) as f64 / LCG_53_DIVISOR
}

/// Box-Muller Gaussian deviate N(0, 1) from two LCG draws.
#[inline]
pub fn lcg_gaussian(seed: &mut u64) -> f64 {
    let u1 = lcg_uniform_f64(seed);
    let u2 = lcg_uniform_f64(seed);
    (-2.0 * u1.max(LATTICE_DIVISION_GUARD).ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Mix a base seed with a cell index so per-cell streams are independent
/// of the order in which cells are visited.
#[inline]
#[must_use]
pub fn cell_seed(seed: u64, cell: usize) -> u64 {
    let mut s = seed ^ (cell as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    lcg_step(&mut s);
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lcg_step_deterministic() {
        let mut a = 42u64;
        let mut b = 42u64;
        lcg_step(&mut a);
        lcg_step(&mut b);
        assert_eq!(a, b);
    }

    #[test]
    fn lcg_uniform_in_range() {
        let mut seed = 12345u64;
        for _ in 0..1000 {
            let v = lcg_uniform_f64(&mut seed);
            assert!((0.0..1.0).contains(&v), "out of range: {v}");
        }
    }

    #[test]
    fn lcg_gaussian_mean_near_zero() {
        let mut seed = 42u64;
        let n = 10_000;
        let sum: f64 = (0..n).map(|_| lcg_gaussian(&mut seed)).sum();
        let mean = sum / n as f64;
        assert!(mean.abs() < 0.1, "mean should be near 0, got {mean}");
    }

    #[test]
    fn cell_seeds_differ() {
        assert_ne!(cell_seed(7, 0), cell_seed(7, 1));
        assert_eq!(cell_seed(7, 3), cell_seed(7, 3));
    }

    #[test]
    fn supported_colors_are_two_and_three() {
        assert_eq!(SUPPORTED_COLORS, [2, 3]);
    }
}
