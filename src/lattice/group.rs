// SPDX-License-Identifier: AGPL-3.0-only

//! Lie algebra / Lie group element traits shared by SU(2) and SU(3).
//!
//! Generators are normalized as `Tr(T^a T^b) = δ^{ab}/2` (`σ^a/2` and
//! `λ^a/2`). An algebra element `X = X^a T^a` is a traceless Hermitian
//! matrix stored by its real coefficients; `square()` is `2 tr(X²)`,
//! i.e. `Σ_a (X^a)²`. The energy formulas depend on that factor of 2.
//!
//! Group elements double as the container for sums of group elements
//! (staple sums): both SU(2) quaternion form and the SU(3) 3×3 matrix are
//! closed under addition and real scaling, only `get_algebra_element`
//! and `reunitarize` assume an actual group element.
//!
//! The color count is chosen once through a [`GaugeGroup`] marker, so the
//! solvers and the grid are monomorphized per group and never branch on
//! the group inside a cell loop.

use std::fmt::Debug;
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use super::complex_f64::Complex64;
use super::constants::lcg_gaussian;

/// Element of su(N): traceless Hermitian generator-coefficient vector.
pub trait AlgebraElement:
    Copy
    + Debug
    + PartialEq
    + Send
    + Sync
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Neg<Output = Self>
    + Mul<f64, Output = Self>
    + AddAssign
    + SubAssign
    + MulAssign<f64>
{
    /// Matching group element type.
    type Group: GroupElement<Algebra = Self>;

    /// Number of generators (`N² − 1`).
    const GENERATORS: usize;

    /// The zero element.
    fn zero() -> Self;

    /// Coefficient `X^a`.
    fn component(&self, a: usize) -> f64;

    /// Overwrite coefficient `X^a`.
    fn set_component(&mut self, a: usize, value: f64);

    /// `2 tr(X²) = Σ_a (X^a)²`.
    fn square(&self) -> f64;

    /// `2 tr(X Y) = Σ_a X^a Y^a`.
    fn dot(&self, other: &Self) -> f64;

    /// Adjoint action `g X g†`.
    fn act(&self, g: &Self::Group) -> Self;

    /// In-place adjoint action.
    fn act_assign(&mut self, g: &Self::Group) {
        *self = self.act(g);
    }

    /// Exponential map `exp(i X)`.
    fn get_link(&self) -> Self::Group;

    /// First-order link `1 + i X`, projected back onto the group.
    fn get_linearized_link(&self) -> Self::Group;

    /// Build from a coefficient slice; missing trailing coefficients are 0.
    fn from_components(c: &[f64]) -> Self {
        let mut x = Self::zero();
        for (a, &v) in c.iter().take(Self::GENERATORS).enumerate() {
            x.set_component(a, v);
        }
        x
    }

    /// Gaussian random element with per-coefficient width `amplitude`.
    fn random(seed: &mut u64, amplitude: f64) -> Self {
        let mut x = Self::zero();
        for a in 0..Self::GENERATORS {
            x.set_component(a, amplitude * lcg_gaussian(seed));
        }
        x
    }

    /// Euclidean norm of the coefficient vector.
    fn norm(&self) -> f64 {
        self.square().sqrt()
    }
}

/// Element of SU(N), or a real-linear combination of such elements.
pub trait GroupElement:
    Copy
    + Debug
    + Send
    + Sync
    + 'static
    + Mul<Output = Self>
    + MulAssign
    + Add<Output = Self>
    + Sub<Output = Self>
    + AddAssign
{
    /// Matching algebra element type.
    type Algebra: AlgebraElement<Group = Self>;

    /// N of SU(N).
    const COLORS: usize;

    /// Unit element.
    fn identity() -> Self;

    /// Additive zero (for staple accumulation).
    fn zero() -> Self;

    /// Hermitian conjugate.
    fn adjoint(&self) -> Self;

    /// Multiply by a real number.
    fn scale(&self, s: f64) -> Self;

    /// Complex trace.
    fn trace(&self) -> Complex64;

    /// Real part of the trace.
    fn re_trace(&self) -> f64 {
        self.trace().re
    }

    /// Determinant.
    fn det(&self) -> Complex64;

    /// Traceless Hermitian part of `(U − U†)/2i` as an algebra element.
    fn proj(&self) -> Self::Algebra;

    /// Logarithm map: `X` with `exp(i X) = U`.
    fn get_algebra_element(&self) -> Self::Algebra;

    /// Project back onto SU(N). Never applied implicitly.
    fn reunitarize(&self) -> Self;

    /// Frobenius norm of `U U† − 1`.
    fn unitarity_deviation(&self) -> f64;

    /// `U^α = exp(α log U)`.
    fn pow(&self, alpha: f64) -> Self {
        (self.get_algebra_element() * alpha).get_link()
    }
}

/// Type-level choice of gauge group. Implemented by [`Su2`] and [`Su3`].
pub trait GaugeGroup: Debug + Send + Sync + 'static {
    /// su(N) element type.
    type Algebra: AlgebraElement<Group = Self::Element>;
    /// SU(N) element type.
    type Element: GroupElement<Algebra = Self::Algebra>;
    /// N.
    const COLORS: usize;
    /// Human-readable name.
    const NAME: &'static str;
}

/// SU(2) marker.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Su2;

/// SU(3) marker.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Su3;

impl GaugeGroup for Su2 {
    type Algebra = super::su2::Su2Algebra;
    type Element = super::su2::Su2Matrix;
    const COLORS: usize = 2;
    const NAME: &'static str = "SU(2)";
}

impl GaugeGroup for Su3 {
    type Algebra = super::su3::Su3Algebra;
    type Element = super::su3::Su3Matrix;
    const COLORS: usize = 3;
    const NAME: &'static str = "SU(3)";
}
