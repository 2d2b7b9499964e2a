// SPDX-License-Identifier: AGPL-3.0-only

//! SU(3) matrices and su(3) algebra elements.
//!
//! A link is a 3×3 unitary matrix with determinant 1, stored row-major as
//! 9 `Complex64` values (18 f64). The same type holds staple sums, which
//! are not unitary. Algebra elements store the 8 Gell-Mann coefficients of
//! `X = X^a λ^a / 2`; conversion from a matrix always re-hermitizes
//! (symmetric/antisymmetric averaging of off-diagonal pairs) and drops the
//! trace, because products like `g X g†` lose exact Hermiticity to
//! rounding.
//!
//! The exponential and logarithm maps live in [`super::su3_exp`].
//!
//! # References
//!
//! - Gattringer & Lang, "QCD on the Lattice" (2010), Ch. 2
//! - Creutz, "Quarks, Gluons and Lattices" (1983), Ch. 8

use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use super::complex_f64::Complex64;
use super::constants::LATTICE_DIVISION_GUARD;
use super::group::{AlgebraElement, GroupElement};
use super::su3_exp;

const INV_SQRT3: f64 = 0.577_350_269_189_625_8;

/// 3×3 complex matrix: SU(3) link variable or a sum of links.
///
/// Row-major storage: `m[row][col]`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[must_use]
pub struct Su3Matrix {
    /// Matrix elements m[row][col].
    pub m: [[Complex64; 3]; 3],
}

/// su(3) element: coefficients of `X^a λ^a / 2`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[must_use]
pub struct Su3Algebra {
    /// Gell-Mann coefficients `X^1 … X^8`.
    pub c: [f64; 8],
}

impl Mul for Su3Matrix {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        let mut r = Self::ZERO;
        for i in 0..3 {
            for j in 0..3 {
                let mut s = Complex64::ZERO;
                for k in 0..3 {
                    s += self.m[i][k] * rhs.m[k][j];
                }
                r.m[i][j] = s;
            }
        }
        r
    }
}

impl MulAssign for Su3Matrix {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl Add for Su3Matrix {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        let mut r = self;
        r += rhs;
        r
    }
}

impl AddAssign for Su3Matrix {
    fn add_assign(&mut self, rhs: Self) {
        for i in 0..3 {
            for j in 0..3 {
                self.m[i][j] += rhs.m[i][j];
            }
        }
    }
}

impl Sub for Su3Matrix {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        let mut r = self;
        for i in 0..3 {
            for j in 0..3 {
                r.m[i][j] -= rhs.m[i][j];
            }
        }
        r
    }
}

impl Su3Matrix {
    /// 3×3 identity matrix.
    pub const IDENTITY: Self = Self {
        m: [
            [Complex64::ONE, Complex64::ZERO, Complex64::ZERO],
            [Complex64::ZERO, Complex64::ONE, Complex64::ZERO],
            [Complex64::ZERO, Complex64::ZERO, Complex64::ONE],
        ],
    };

    /// Zero matrix (all elements 0).
    pub const ZERO: Self = Self {
        m: [[Complex64::ZERO; 3]; 3],
    };

    /// Scale by a complex number.
    pub fn scale_complex(self, s: Complex64) -> Self {
        let mut r = self;
        for row in &mut r.m {
            for cell in row.iter_mut() {
                *cell *= s;
            }
        }
        r
    }

    /// Add `s` to every diagonal element.
    pub fn shift_diagonal(self, s: Complex64) -> Self {
        let mut r = self;
        for i in 0..3 {
            r.m[i][i] += s;
        }
        r
    }

    /// Frobenius norm squared: sum |`m_ij`|²
    #[must_use]
    pub fn norm_sq(self) -> f64 {
        self.m
            .iter()
            .flat_map(|row| row.iter())
            .map(|z| z.abs_sq())
            .sum()
    }

    /// Row `i` as a vector.
    #[must_use]
    pub const fn row(&self, i: usize) -> [Complex64; 3] {
        self.m[i]
    }
}

fn row_norm(u: &Su3Matrix, row: usize) -> f64 {
    u.m[row].iter().map(|z| z.abs_sq()).sum::<f64>().sqrt()
}

fn row_dot(u: &Su3Matrix, r1: usize, r2: usize) -> Complex64 {
    let mut s = Complex64::ZERO;
    for j in 0..3 {
        s += u.m[r1][j].conj() * u.m[r2][j];
    }
    s
}

impl GroupElement for Su3Matrix {
    type Algebra = Su3Algebra;
    const COLORS: usize = 3;

    fn identity() -> Self {
        Self::IDENTITY
    }

    fn zero() -> Self {
        Self::ZERO
    }

    fn adjoint(&self) -> Self {
        let mut r = Self::ZERO;
        for i in 0..3 {
            for j in 0..3 {
                r.m[i][j] = self.m[j][i].conj();
            }
        }
        r
    }

    fn scale(&self, s: f64) -> Self {
        let mut r = *self;
        for row in &mut r.m {
            for cell in row.iter_mut() {
                *cell = cell.scale(s);
            }
        }
        r
    }

    fn trace(&self) -> Complex64 {
        self.m[0][0] + self.m[1][1] + self.m[2][2]
    }

    fn re_trace(&self) -> f64 {
        self.m[0][0].re + self.m[1][1].re + self.m[2][2].re
    }

    fn det(&self) -> Complex64 {
        let m = &self.m;
        let a = m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1]);
        let b = m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0]);
        let c = m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0]);
        a - b + c
    }

    /// `(U − U†)/2i`, hermitized and traceless.
    fn proj(&self) -> Su3Algebra {
        let half_minus_i = Complex64::new(0.0, -0.5);
        Su3Algebra::from_matrix(&(*self - self.adjoint()).scale_complex(half_minus_i))
    }

    fn get_algebra_element(&self) -> Su3Algebra {
        Su3Algebra::from_matrix(&su3_exp::log_unitary(self))
    }

    /// Modified Gram-Schmidt on rows 0 and 1; row 2 = conj(row 0 × row 1)
    /// fixes det = 1.
    fn reunitarize(&self) -> Self {
        let mut u = *self;

        let n0 = row_norm(&u, 0);
        if n0 > LATTICE_DIVISION_GUARD {
            let inv = 1.0 / n0;
            for j in 0..3 {
                u.m[0][j] = u.m[0][j].scale(inv);
            }
        }

        let dot01 = row_dot(&u, 0, 1);
        for j in 0..3 {
            let r0 = u.m[0][j];
            u.m[1][j] -= r0 * dot01;
        }
        let n1 = row_norm(&u, 1);
        if n1 > LATTICE_DIVISION_GUARD {
            let inv = 1.0 / n1;
            for j in 0..3 {
                u.m[1][j] = u.m[1][j].scale(inv);
            }
        }

        u.m[2][0] = (u.m[0][1] * u.m[1][2] - u.m[0][2] * u.m[1][1]).conj();
        u.m[2][1] = (u.m[0][2] * u.m[1][0] - u.m[0][0] * u.m[1][2]).conj();
        u.m[2][2] = (u.m[0][0] * u.m[1][1] - u.m[0][1] * u.m[1][0]).conj();

        u
    }

    fn unitarity_deviation(&self) -> f64 {
        (*self * self.adjoint() - Self::IDENTITY).norm_sq().sqrt()
    }
}

impl Su3Algebra {
    pub const fn new(c: [f64; 8]) -> Self {
        Self { c }
    }

    /// Hermitian matrix `Σ_a X^a λ^a / 2`.
    pub fn to_matrix(&self) -> Su3Matrix {
        let c = &self.c;
        let d8 = c[7] * INV_SQRT3;
        let mut h = Su3Matrix::ZERO;
        h.m[0][0] = Complex64::real(0.5 * (c[2] + d8));
        h.m[1][1] = Complex64::real(0.5 * (-c[2] + d8));
        h.m[2][2] = Complex64::real(-d8);
        h.m[0][1] = Complex64::new(0.5 * c[0], -0.5 * c[1]);
        h.m[1][0] = h.m[0][1].conj();
        h.m[0][2] = Complex64::new(0.5 * c[3], -0.5 * c[4]);
        h.m[2][0] = h.m[0][2].conj();
        h.m[1][2] = Complex64::new(0.5 * c[5], -0.5 * c[6]);
        h.m[2][1] = h.m[1][2].conj();
        h
    }

    /// Coefficients `Tr(λ^a M_h)` of the traceless Hermitian part `M_h` of
    /// an arbitrary matrix.
    pub fn from_matrix(m: &Su3Matrix) -> Self {
        let m = &m.m;
        Self {
            c: [
                m[0][1].re + m[1][0].re,
                m[1][0].im - m[0][1].im,
                m[0][0].re - m[1][1].re,
                m[0][2].re + m[2][0].re,
                m[2][0].im - m[0][2].im,
                m[1][2].re + m[2][1].re,
                m[2][1].im - m[1][2].im,
                (m[0][0].re + m[1][1].re - 2.0 * m[2][2].re) * INV_SQRT3,
            ],
        }
    }
}

impl Add for Su3Algebra {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        let mut r = self;
        r += rhs;
        r
    }
}

impl Sub for Su3Algebra {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        let mut r = self;
        r -= rhs;
        r
    }
}

impl Neg for Su3Algebra {
    type Output = Self;
    fn neg(self) -> Self {
        self * -1.0
    }
}

impl Mul<f64> for Su3Algebra {
    type Output = Self;
    fn mul(self, s: f64) -> Self {
        let mut r = self;
        r *= s;
        r
    }
}

impl AddAssign for Su3Algebra {
    fn add_assign(&mut self, rhs: Self) {
        for (a, b) in self.c.iter_mut().zip(rhs.c) {
            *a += b;
        }
    }
}

impl SubAssign for Su3Algebra {
    fn sub_assign(&mut self, rhs: Self) {
        for (a, b) in self.c.iter_mut().zip(rhs.c) {
            *a -= b;
        }
    }
}

impl MulAssign<f64> for Su3Algebra {
    fn mul_assign(&mut self, s: f64) {
        for a in &mut self.c {
            *a *= s;
        }
    }
}

impl AlgebraElement for Su3Algebra {
    type Group = Su3Matrix;
    const GENERATORS: usize = 8;

    fn zero() -> Self {
        Self::default()
    }

    fn component(&self, a: usize) -> f64 {
        self.c[a]
    }

    fn set_component(&mut self, a: usize, value: f64) {
        self.c[a] = value;
    }

    fn square(&self) -> f64 {
        self.c.iter().map(|x| x * x).sum()
    }

    fn dot(&self, other: &Self) -> f64 {
        self.c.iter().zip(other.c).map(|(a, b)| a * b).sum()
    }

    /// `g H g†` through the matrix embedding, re-hermitized on the way back.
    fn act(&self, g: &Su3Matrix) -> Self {
        Self::from_matrix(&(*g * self.to_matrix() * g.adjoint()))
    }

    fn get_link(&self) -> Su3Matrix {
        su3_exp::exp_i_hermitian(&self.to_matrix())
    }

    fn get_linearized_link(&self) -> Su3Matrix {
        (Su3Matrix::IDENTITY + self.to_matrix().scale_complex(Complex64::I)).reunitarize()
    }
}
