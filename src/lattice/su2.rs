// SPDX-License-Identifier: AGPL-3.0-only

//! SU(2) algebra and group elements in closed form.
//!
//! A group element is stored as four reals, `U = e0·1 + i e·σ`; unitarity
//! is `e0² + |e|² = 1`. The same form is closed under addition, so staple
//! sums stay in this type. An algebra element `X = X^a σ^a/2` stores the
//! three coefficients `X^a`.
//!
//! Every operation is a hand-expanded quaternion formula: product,
//! adjoint action (an SO(3) rotation of the coefficient vector),
//! exponential and logarithm.

use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use super::complex_f64::Complex64;
use super::constants::LATTICE_DIVISION_GUARD;
use super::group::{AlgebraElement, GroupElement};
use crate::tolerances::SU2_EXP_TAYLOR_NORM;

/// su(2) element `X^a σ^a / 2`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[must_use]
pub struct Su2Algebra {
    /// Coefficients `X^1, X^2, X^3`.
    pub v: [f64; 3],
}

/// SU(2) element `e0 + i e·σ` (or a real-linear combination of them).
#[derive(Clone, Copy, Debug, PartialEq)]
#[must_use]
pub struct Su2Matrix {
    /// `[e0, e1, e2, e3]`.
    pub e: [f64; 4],
}

impl Su2Algebra {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { v: [x, y, z] }
    }
}

impl Su2Matrix {
    pub const fn new(e0: f64, e1: f64, e2: f64, e3: f64) -> Self {
        Self {
            e: [e0, e1, e2, e3],
        }
    }

    /// `e0² + |e|²`, the determinant of a quaternion-form matrix.
    #[must_use]
    pub fn norm_sq(&self) -> f64 {
        self.e.iter().map(|x| x * x).sum()
    }

    fn vector_norm(&self) -> f64 {
        (self.e[1] * self.e[1] + self.e[2] * self.e[2] + self.e[3] * self.e[3]).sqrt()
    }
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

impl Add for Su2Algebra {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(
            self.v[0] + rhs.v[0],
            self.v[1] + rhs.v[1],
            self.v[2] + rhs.v[2],
        )
    }
}

impl Sub for Su2Algebra {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(
            self.v[0] - rhs.v[0],
            self.v[1] - rhs.v[1],
            self.v[2] - rhs.v[2],
        )
    }
}

impl Neg for Su2Algebra {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.v[0], -self.v[1], -self.v[2])
    }
}

impl Mul<f64> for Su2Algebra {
    type Output = Self;
    fn mul(self, s: f64) -> Self {
        Self::new(self.v[0] * s, self.v[1] * s, self.v[2] * s)
    }
}

impl AddAssign for Su2Algebra {
    fn add_assign(&mut self, rhs: Self) {
        for (a, b) in self.v.iter_mut().zip(rhs.v) {
            *a += b;
        }
    }
}

impl SubAssign for Su2Algebra {
    fn sub_assign(&mut self, rhs: Self) {
        for (a, b) in self.v.iter_mut().zip(rhs.v) {
            *a -= b;
        }
    }
}

impl MulAssign<f64> for Su2Algebra {
    fn mul_assign(&mut self, s: f64) {
        for a in &mut self.v {
            *a *= s;
        }
    }
}

impl AlgebraElement for Su2Algebra {
    type Group = Su2Matrix;
    const GENERATORS: usize = 3;

    fn zero() -> Self {
        Self::default()
    }

    fn component(&self, a: usize) -> f64 {
        self.v[a]
    }

    fn set_component(&mut self, a: usize, value: f64) {
        self.v[a] = value;
    }

    fn square(&self) -> f64 {
        self.v[0] * self.v[0] + self.v[1] * self.v[1] + self.v[2] * self.v[2]
    }

    fn dot(&self, other: &Self) -> f64 {
        self.v[0] * other.v[0] + self.v[1] * other.v[1] + self.v[2] * other.v[2]
    }

    /// `g (v·σ) g† = ((e0² − |e|²) v + 2 (e·v) e − 2 e0 (e × v))·σ`
    fn act(&self, g: &Su2Matrix) -> Self {
        let e0 = g.e[0];
        let e = [g.e[1], g.e[2], g.e[3]];
        let v = self.v;
        let ee = e[0] * e[0] + e[1] * e[1] + e[2] * e[2];
        let ev = e[0] * v[0] + e[1] * v[1] + e[2] * v[2];
        let exv = cross(e, v);
        let c = e0 * e0 - ee;
        let mut out = [0.0; 3];
        for k in 0..3 {
            out[k] = c * v[k] + 2.0 * ev * e[k] - 2.0 * e0 * exv[k];
        }
        Self { v: out }
    }

    fn get_link(&self) -> Su2Matrix {
        let norm = self.norm();
        if norm < SU2_EXP_TAYLOR_NORM {
            return Su2Matrix::new(1.0, 0.5 * self.v[0], 0.5 * self.v[1], 0.5 * self.v[2]);
        }
        let half = 0.5 * norm;
        let s = half.sin() / norm;
        Su2Matrix::new(half.cos(), s * self.v[0], s * self.v[1], s * self.v[2])
    }

    fn get_linearized_link(&self) -> Su2Matrix {
        let e = [0.5 * self.v[0], 0.5 * self.v[1], 0.5 * self.v[2]];
        let ee = e[0] * e[0] + e[1] * e[1] + e[2] * e[2];
        Su2Matrix::new((1.0 - ee).max(0.0).sqrt(), e[0], e[1], e[2])
    }
}

impl Mul for Su2Matrix {
    type Output = Self;
    /// `(a0, a)(b0, b) = (a0 b0 − a·b, a0 b + b0 a − a × b)`
    fn mul(self, rhs: Self) -> Self {
        let a = self.e;
        let b = rhs.e;
        Self::new(
            a[0] * b[0] - a[1] * b[1] - a[2] * b[2] - a[3] * b[3],
            a[0] * b[1] + b[0] * a[1] - (a[2] * b[3] - a[3] * b[2]),
            a[0] * b[2] + b[0] * a[2] - (a[3] * b[1] - a[1] * b[3]),
            a[0] * b[3] + b[0] * a[3] - (a[1] * b[2] - a[2] * b[1]),
        )
    }
}

impl MulAssign for Su2Matrix {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl Add for Su2Matrix {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(
            self.e[0] + rhs.e[0],
            self.e[1] + rhs.e[1],
            self.e[2] + rhs.e[2],
            self.e[3] + rhs.e[3],
        )
    }
}

impl AddAssign for Su2Matrix {
    fn add_assign(&mut self, rhs: Self) {
        for (a, b) in self.e.iter_mut().zip(rhs.e) {
            *a += b;
        }
    }
}

impl Sub for Su2Matrix {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(
            self.e[0] - rhs.e[0],
            self.e[1] - rhs.e[1],
            self.e[2] - rhs.e[2],
            self.e[3] - rhs.e[3],
        )
    }
}

impl GroupElement for Su2Matrix {
    type Algebra = Su2Algebra;
    const COLORS: usize = 2;

    fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }

    fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    fn adjoint(&self) -> Self {
        Self::new(self.e[0], -self.e[1], -self.e[2], -self.e[3])
    }

    fn scale(&self, s: f64) -> Self {
        Self::new(self.e[0] * s, self.e[1] * s, self.e[2] * s, self.e[3] * s)
    }

    fn trace(&self) -> Complex64 {
        Complex64::real(2.0 * self.e[0])
    }

    fn det(&self) -> Complex64 {
        Complex64::real(self.norm_sq())
    }

    /// `(U − U†)/2i = e·σ`, i.e. `X = 2e`.
    fn proj(&self) -> Su2Algebra {
        Su2Algebra::new(2.0 * self.e[1], 2.0 * self.e[2], 2.0 * self.e[3])
    }

    fn get_algebra_element(&self) -> Su2Algebra {
        let s = self.vector_norm();
        if s < SU2_EXP_TAYLOR_NORM {
            return self.proj();
        }
        let angle = 2.0 * s.atan2(self.e[0]);
        let f = angle / s;
        Su2Algebra::new(f * self.e[1], f * self.e[2], f * self.e[3])
    }

    fn reunitarize(&self) -> Self {
        let n = self.norm_sq().sqrt();
        if n > LATTICE_DIVISION_GUARD {
            self.scale(1.0 / n)
        } else {
            Self::identity()
        }
    }

    /// `U U† = (e0² + |e|²)·1`.
    fn unitarity_deviation(&self) -> f64 {
        (self.norm_sq() - 1.0).abs() * std::f64::consts::SQRT_2
    }
}
