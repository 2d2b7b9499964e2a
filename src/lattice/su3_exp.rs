// SPDX-License-Identifier: AGPL-3.0-only

//! Exponential and logarithm maps for SU(3).
//!
//! Both maps go through the eigen-decomposition when it is well
//! conditioned and fall back to power series otherwise:
//!
//! | Map | Regular path | Fallback |
//! |-----|--------------|----------|
//! | `exp(iH)` | trigonometric roots of the characteristic cubic | Taylor near 0, scaled Taylor + squaring when eigenvalues are degenerate |
//! | `log U` | complex Cardano roots, Newton-polished | Taylor of `log(1+Y)` near 1, Taylor on the degenerate block when eigenvalues coincide |
//!
//! Eigenvectors are null vectors of `M − z·1`, taken as the largest of the
//! three bilinear cross products of pairs of rows.

use std::f64::consts::PI;

use super::complex_f64::Complex64;
use super::constants::LATTICE_DIVISION_GUARD;
use super::group::GroupElement;
use super::su3::Su3Matrix;
use crate::tolerances::{
    SU3_EXP_DEGENERACY_CUTOFF, SU3_EXP_TAYLOR_TERMS_DEGENERATE, SU3_EXP_TAYLOR_TERMS_NEAR_UNITY,
    SU3_LOG_DEGENERACY_CUTOFF, SU3_LOG_NEWTON_STEPS, SU3_LOG_TAYLOR_TERMS, SU3_NEAR_UNITY_CUTOFF,
    SU3_SQUARING_NORM,
};

const TWO_PI: f64 = 2.0 * PI;

type Vec3 = [Complex64; 3];

/// `exp(iH)` for traceless Hermitian `H`.
pub(crate) fn exp_i_hermitian(h: &Su3Matrix) -> Su3Matrix {
    let p = 0.5 * h.norm_sq();
    if p <= SU3_NEAR_UNITY_CUTOFF {
        return taylor_exp_i(h, SU3_EXP_TAYLOR_TERMS_NEAR_UNITY);
    }

    let lambda = hermitian_eigenvalues(h);

    for i in 0..3 {
        for j in (i + 1)..3 {
            let scale = lambda[i].abs().max(lambda[j].abs());
            if (lambda[i] - lambda[j]).abs() < SU3_EXP_DEGENERACY_CUTOFF * scale {
                return scaled_taylor_exp_i(h);
            }
        }
    }

    let mut u = Su3Matrix::ZERO;
    for &l in &lambda {
        let v = null_vector(&h.shift_diagonal(Complex64::real(-l)));
        add_projector(&mut u, &v, Complex64::from_polar(l));
    }
    u
}

/// Traceless Hermitian `H` with `exp(iH) = U`, eigenvalues in `(−π, π]`
/// up to the shift that makes them sum to zero.
pub(crate) fn log_unitary(u: &Su3Matrix) -> Su3Matrix {
    if u.re_trace() >= 3.0 - SU3_NEAR_UNITY_CUTOFF {
        return taylor_log(u);
    }

    let z = eigenvalues_unitary(u);

    let close = |i: usize, j: usize| (z[i] - z[j]).abs() < SU3_LOG_DEGENERACY_CUTOFF;
    let pair = [(0, 1, 2), (0, 2, 1), (1, 2, 0)]
        .into_iter()
        .find(|&(i, j, _)| close(i, j));

    match pair {
        None => {
            let mut theta = [z[0].arg(), z[1].arg(), z[2].arg()];
            fix_phase_sum(&mut theta);
            let mut h = Su3Matrix::ZERO;
            for k in 0..3 {
                let v = null_vector(&u.shift_diagonal(-z[k]));
                add_projector(&mut h, &v, Complex64::real(theta[k]));
            }
            h
        }
        Some((i, j, k)) if close(i, k) || close(j, k) => log_near_center(u, &z),
        Some((i, j, k)) => log_degenerate_pair(u, z[k], (z[i] + z[j]).normalized()),
    }
}

/// Log of `U` with a nearly double eigenvalue around `zd` and a simple
/// eigenvalue `zk`. Only `zk` has to be accurate: the degenerate block is
/// divided by `zd` and logged by series.
fn log_degenerate_pair(u: &Su3Matrix, zk: Complex64, zd: Complex64) -> Su3Matrix {
    let vk = null_vector(&u.shift_diagonal(-zk));
    let mut pk = Su3Matrix::ZERO;
    add_projector(&mut pk, &vk, Complex64::ONE);
    let pd = Su3Matrix::IDENTITY - pk;

    let block = pd * u.scale_complex(zd.conj()) * pd + pk;
    let l = taylor_log(&block);
    let (theta_k, theta_d) = (zk.arg(), zd.arg());
    let mut h = l + pd.scale(theta_d) + pk.scale(theta_k);

    let winding = (h.trace().re / TWO_PI).round();
    if winding != 0.0 {
        // Same choice as fix_phase_sum: unwind the outermost phase.
        let outer_k = if winding > 0.0 {
            theta_k >= theta_d
        } else {
            theta_k <= theta_d
        };
        let v = if outer_k {
            vk
        } else {
            // Push P_k below (above) the block so the search stays inside it.
            let offset = pk.scale(2.0 * SU3_LOG_DEGENERACY_CUTOFF * winding);
            extremal_eigenvector(&(l - offset), winding > 0.0)
        };
        add_projector(&mut h, &v, Complex64::real(-TWO_PI * winding));
    }
    remove_trace(h)
}

/// Log of `U` close to a center element `ω·1`, `ω³ = 1`.
fn log_near_center(u: &Su3Matrix, z: &[Complex64; 3]) -> Su3Matrix {
    let sector = (3.0 * (z[0] + z[1] + z[2]).arg() / TWO_PI).round();
    let t = TWO_PI * sector / 3.0;
    let l = taylor_log(&u.scale_complex(Complex64::from_polar(-t)));
    let mut h = l.shift_diagonal(Complex64::real(t));

    let winding = (h.trace().re / TWO_PI).round();
    if winding != 0.0 {
        let v = extremal_eigenvector(&l, winding > 0.0);
        add_projector(&mut h, &v, Complex64::real(-TWO_PI * winding));
    }
    remove_trace(h)
}

fn remove_trace(h: Su3Matrix) -> Su3Matrix {
    let mean = h.trace().re / 3.0;
    h.shift_diagonal(Complex64::real(-mean))
}

/// Eigenvalues of a Hermitian matrix from the trigonometric roots of the
/// characteristic cubic of its traceless part.
fn hermitian_eigenvalues(m: &Su3Matrix) -> [f64; 3] {
    let mean = m.trace().re / 3.0;
    let h = m.shift_diagonal(Complex64::real(-mean));
    let p = 0.5 * h.norm_sq();
    if p <= LATTICE_DIVISION_GUARD {
        return [mean; 3];
    }
    let q = h.det().re;
    let r = (p / 3.0).sqrt();
    let cos3 = (q / (2.0 * r * r * r)).clamp(-1.0, 1.0);
    let theta = cos3.acos() / 3.0;
    [
        mean + 2.0 * r * theta.cos(),
        mean + 2.0 * r * (theta - TWO_PI / 3.0).cos(),
        mean + 2.0 * r * (theta + TWO_PI / 3.0).cos(),
    ]
}

/// Unit eigenvector of Hermitian `M` for its largest (or smallest)
/// eigenvalue. A degenerate eigenspace yields an arbitrary member.
fn extremal_eigenvector(m: &Su3Matrix, largest: bool) -> Vec3 {
    let lambda = hermitian_eigenvalues(m);
    let pick = if largest {
        lambda.into_iter().fold(f64::MIN, f64::max)
    } else {
        lambda.into_iter().fold(f64::MAX, f64::min)
    };
    let shifted = m.shift_diagonal(Complex64::real(-pick));
    let (v, n) = largest_cross(&shifted);
    if n > LATTICE_DIVISION_GUARD && n > f64::EPSILON * shifted.norm_sq() {
        return normalize(v);
    }

    // Rank one or zero: anything orthogonal to the dominant row.
    let row = (0..3)
        .map(|i| shifted.row(i))
        .fold([Complex64::ZERO; 3], |best, r| {
            if vec_norm(&r) > vec_norm(&best) {
                r
            } else {
                best
            }
        });
    if vec_norm(&row) <= LATTICE_DIVISION_GUARD {
        return [Complex64::ONE, Complex64::ZERO, Complex64::ZERO];
    }
    let basis = |k: usize| {
        let mut e = [Complex64::ZERO; 3];
        e[k] = Complex64::ONE;
        e
    };
    let (w, _) = (0..3)
        .map(|k| {
            let c = cross(&row, &basis(k));
            let n = vec_norm(&c);
            (c, n)
        })
        .fold(([Complex64::ZERO; 3], 0.0), |best, c| if c.1 > best.1 { c } else { best });
    normalize(w)
}

/// Roots of `z³ − a z² + b z − c` for `a = tr U`, `b = ½(a² − tr U²)`,
/// `c = det U`, projected onto the unit circle.
fn eigenvalues_unitary(u: &Su3Matrix) -> [Complex64; 3] {
    let a = u.trace();
    let b = (a * a - (*u * *u).trace()).scale(0.5);
    let c = u.det();

    let shift = a.scale(1.0 / 3.0);
    let p = b - a * a.scale(1.0 / 3.0);
    let q = (a * a * a).scale(-2.0 / 27.0) + (a * b).scale(1.0 / 3.0) - c;

    let disc = (q * q).scale(0.25) + (p * p * p).scale(1.0 / 27.0);
    let root = disc.sqrt();
    let half_q = q.scale(-0.5);
    let plus = half_q + root;
    let minus = half_q - root;
    let w3 = if plus.abs() >= minus.abs() { plus } else { minus };

    let mut z = [shift; 3];
    if w3.abs() > LATTICE_DIVISION_GUARD {
        let w = w3.cbrt();
        let omega = Complex64::from_polar(TWO_PI / 3.0);
        let mut wk = w;
        for zk in &mut z {
            *zk = shift + wk - p / (wk.scale(3.0));
            wk *= omega;
        }
    }

    for zk in &mut z {
        for _ in 0..SU3_LOG_NEWTON_STEPS {
            let f = ((*zk - a) * *zk + b) * *zk - c;
            let df = (zk.scale(3.0) - a.scale(2.0)) * *zk + b;
            if df.abs() > LATTICE_DIVISION_GUARD {
                *zk -= f / df;
            }
        }
        *zk = zk.normalized();
    }
    z
}

/// Shift single phases by ±2π until the sum is in `(−π, π]`, then remove
/// the remaining residual evenly.
fn fix_phase_sum(theta: &mut [f64; 3]) {
    let winding = (theta.iter().sum::<f64>() / TWO_PI).round() as i64;
    for _ in 0..winding.unsigned_abs() {
        if winding > 0 {
            let k = argmax(theta);
            theta[k] -= TWO_PI;
        } else {
            let k = argmin(theta);
            theta[k] += TWO_PI;
        }
    }
    let residual = theta.iter().sum::<f64>() / 3.0;
    for t in theta.iter_mut() {
        *t -= residual;
    }
}

fn argmax(t: &[f64; 3]) -> usize {
    (0..3).fold(0, |best, k| if t[k] > t[best] { k } else { best })
}

fn argmin(t: &[f64; 3]) -> usize {
    (0..3).fold(0, |best, k| if t[k] < t[best] { k } else { best })
}

/// Bilinear cross product `a × b` (no conjugation).
fn cross(a: &Vec3, b: &Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn vec_norm(v: &Vec3) -> f64 {
    v.iter().map(|z| z.abs_sq()).sum::<f64>().sqrt()
}

/// Largest of the three row cross products and its norm.
fn largest_cross(m: &Su3Matrix) -> (Vec3, f64) {
    let candidates = [
        cross(&m.row(0), &m.row(1)),
        cross(&m.row(0), &m.row(2)),
        cross(&m.row(1), &m.row(2)),
    ];
    let mut best = candidates[0];
    let mut best_norm = vec_norm(&best);
    for c in &candidates[1..] {
        let n = vec_norm(c);
        if n > best_norm {
            best = *c;
            best_norm = n;
        }
    }
    (best, best_norm)
}

fn normalize(mut v: Vec3) -> Vec3 {
    let n = vec_norm(&v);
    if n > LATTICE_DIVISION_GUARD {
        let inv = 1.0 / n;
        for z in &mut v {
            *z = z.scale(inv);
        }
    }
    v
}

/// Unit null vector of a rank-2 matrix.
fn null_vector(m: &Su3Matrix) -> Vec3 {
    normalize(largest_cross(m).0)
}

/// `acc += w · v v†`
fn add_projector(acc: &mut Su3Matrix, v: &Vec3, w: Complex64) {
    for i in 0..3 {
        for j in 0..3 {
            acc.m[i][j] += w * v[i] * v[j].conj();
        }
    }
}

fn taylor_exp_i(h: &Su3Matrix, terms: usize) -> Su3Matrix {
    let ih = h.scale_complex(Complex64::I);
    let mut term = Su3Matrix::IDENTITY;
    let mut sum = Su3Matrix::IDENTITY;
    for n in 1..terms {
        term = (term * ih).scale(1.0 / n as f64);
        sum += term;
    }
    sum
}

fn scaled_taylor_exp_i(h: &Su3Matrix) -> Su3Matrix {
    let norm = h.norm_sq().sqrt();
    let mut squarings = 0u32;
    while norm / f64::from(1u32 << squarings) > SU3_SQUARING_NORM && squarings < 30 {
        squarings += 1;
    }
    let reduced = h.scale(1.0 / f64::from(1u32 << squarings));
    let mut u = taylor_exp_i(&reduced, SU3_EXP_TAYLOR_TERMS_DEGENERATE);
    for _ in 0..squarings {
        u = u * u;
    }
    u
}

/// `−i log(1 + Y)` for `Y = U − 1`.
fn taylor_log(u: &Su3Matrix) -> Su3Matrix {
    let y = *u - Su3Matrix::IDENTITY;
    let mut power = y;
    let mut sum = y;
    for n in 2..=SU3_LOG_TAYLOR_TERMS {
        power = power * y;
        let sign = if n % 2 == 0 { -1.0 } else { 1.0 };
        sum += power.scale(sign / n as f64);
    }
    sum.scale_complex(Complex64::new(0.0, -1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::group::AlgebraElement;
    use crate::lattice::su3::Su3Algebra;

    fn assert_round_trip(x: Su3Algebra, tol: f64) {
        let u = x.get_link();
        assert!(u.unitarity_deviation() < 1e-12, "exp not unitary");
        assert!((u.det() - Complex64::ONE).abs() < 1e-12, "det ≠ 1");
        let back = u.get_algebra_element();
        assert!(
            (back - x).norm() < tol * x.norm().max(1.0),
            "round trip {:?} → {:?}",
            x.c,
            back.c
        );
    }

    #[test]
    fn exp_of_zero_is_identity() {
        let u = Su3Algebra::default().get_link();
        assert!((u - Su3Matrix::IDENTITY).norm_sq() < 1e-30);
    }

    #[test]
    fn exp_eigen_path_agrees_with_scaled_taylor() {
        let x = Su3Algebra::new([0.4, -0.2, 0.9, 0.1, 0.3, -0.5, 0.2, 0.6]);
        let h = x.to_matrix();
        let eigen = exp_i_hermitian(&h);
        let taylor = scaled_taylor_exp_i(&h);
        assert!((eigen - taylor).norm_sq().sqrt() < 1e-12);
    }

    #[test]
    fn degenerate_eigenvalues_use_series() {
        // λ8 alone: two equal eigenvalues 1/(2√3).
        let x = Su3Algebra::new([0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.3]);
        let u = x.get_link();
        let t = 1.3 / (2.0 * 3f64.sqrt());
        assert!((u.m[0][0] - Complex64::from_polar(t)).abs() < 1e-12);
        assert!((u.m[1][1] - Complex64::from_polar(t)).abs() < 1e-12);
        assert!((u.m[2][2] - Complex64::from_polar(-2.0 * t)).abs() < 1e-12);
    }

    #[test]
    fn round_trip_near_identity() {
        assert_round_trip(Su3Algebra::new([1e-3, 2e-3, -1e-3, 0.0, 5e-4, 0.0, 1e-3, -2e-3]), 1e-8);
    }

    #[test]
    fn round_trip_straddles_near_unity_cutoff() {
        // p = ½ tr H² = ¼ |X|² crosses 1e-2 at |X| = 0.2.
        for norm in [0.19, 0.2, 0.21] {
            let dir = [1.0, 0.5, -0.3, 0.2, 0.7, -0.1, 0.4, 0.6];
            let len = dir.iter().map(|x: &f64| x * x).sum::<f64>().sqrt();
            let c = dir.map(|x| x * norm / len);
            assert_round_trip(Su3Algebra::new(c), 1e-8);
        }
    }

    #[test]
    fn round_trip_generic() {
        let mut seed = 77;
        for _ in 0..20 {
            let x = Su3Algebra::random(&mut seed, 0.7);
            assert_round_trip(x, 1e-8);
        }
    }

    #[test]
    fn log_of_degenerate_element_far_from_identity() {
        let x = Su3Algebra::new([0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_round_trip(x, 1e-8);
        // two equal phases
        let y = Su3Algebra::new([0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 2.5]);
        assert_round_trip(y, 1e-8);
    }

    #[test]
    fn round_trip_straddles_log_degeneracy_cutoff() {
        // λ3 splits the double phase of λ8 by c[2].
        for split in [2e-4, 1e-4, 5e-5, 1e-5, 0.0] {
            assert_round_trip(Su3Algebra::new([0.0, 0.0, split, 0.0, 0.0, 0.0, 0.0, 2.5]), 1e-8);
        }
    }

    #[test]
    fn split_pair_log_is_conjugation_covariant() {
        let mut seed = 31;
        let g = Su3Algebra::random(&mut seed, 1.0).get_link();
        for split in [3e-4, 3e-5] {
            let x = Su3Algebra::new([0.0, 0.0, split, 0.0, 0.0, 0.0, 0.0, 2.0]);
            let u = g * x.get_link() * g.adjoint();
            let back = u.get_algebra_element();
            assert!(
                (back - x.act(&g)).norm() < 1e-8,
                "split {split}: {:?} vs {:?}",
                back.c,
                x.act(&g).c
            );
        }
    }

    #[test]
    fn aliased_pair_unwinds_like_a_split_one() {
        // Phases 2.5 ± ε/2 and −5 ≡ 2π − 5: the sum winds once and the
        // larger of the pair is shifted down.
        let c7 = 5.0 * 3f64.sqrt();
        for split in [3e-4, 3e-5] {
            let u = Su3Algebra::new([0.0, 0.0, split, 0.0, 0.0, 0.0, 0.0, c7]).get_link();
            let h = u.get_algebra_element().to_matrix();
            let mut expected = Su3Matrix::ZERO;
            expected.m[0][0] = Complex64::real(2.5 + 0.5 * split - TWO_PI);
            expected.m[1][1] = Complex64::real(2.5 - 0.5 * split);
            expected.m[2][2] = Complex64::real(TWO_PI - 5.0);
            assert!(
                (h - expected).norm_sq().sqrt() < 1e-8,
                "split {split}: {:?}",
                h.m
            );
        }
    }

    #[test]
    fn log_near_center_element_exponentiates_back() {
        // 4π/√3 along λ8 lands on e^{2πi/3}·1.
        let c7 = 4.0 * PI / 3f64.sqrt();
        let mut seed = 8;
        let g = Su3Algebra::random(&mut seed, 1.0).get_link();
        for split in [0.0, 3e-5] {
            let x = Su3Algebra::new([0.0, 0.0, split, 0.0, 0.0, 0.0, 0.0, c7]);
            for u in [x.get_link(), g * x.get_link() * g.adjoint()] {
                let back = u.get_algebra_element();
                assert!(back.norm() < 3.0 * PI, "log not minimal: {:?}", back.c);
                assert!(
                    (back.get_link() - u).norm_sq().sqrt() < 1e-10,
                    "split {split}: exp(log U) ≠ U"
                );
            }
        }
    }

    #[test]
    fn extremal_eigenvector_of_degenerate_matrix() {
        let mut m = Su3Matrix::ZERO;
        m.m[0][0] = Complex64::real(1e-5);
        m.m[1][1] = Complex64::real(1e-5);
        m.m[2][2] = Complex64::real(-2e-5);
        let v = extremal_eigenvector(&m, true);
        assert!((vec_norm(&v) - 1.0).abs() < 1e-12);
        assert!(v[2].abs() < 1e-9, "left the top eigenspace: {v:?}");
        let w = extremal_eigenvector(&m, false);
        assert!((w[2].abs() - 1.0).abs() < 1e-9);
        let zero = extremal_eigenvector(&Su3Matrix::ZERO, true);
        assert!((vec_norm(&zero) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn log_is_conjugation_covariant() {
        let mut seed = 5;
        let g = Su3Algebra::random(&mut seed, 1.0).get_link();
        let x = Su3Algebra::random(&mut seed, 0.5);
        let u = g * x.get_link() * g.adjoint();
        let back = u.get_algebra_element();
        assert!((back - x.act(&g)).norm() < 1e-9);
    }

    #[test]
    fn phase_sum_is_fixed() {
        let mut t = [3.0, 3.0, 1.0];
        fix_phase_sum(&mut t);
        assert!(t.iter().sum::<f64>().abs() < 1e-14);
        assert!((t[0] - t[2] - (2.0 - TWO_PI)).abs() < 1e-14);
        assert!((t[1] - t[2] - 2.0).abs() < 1e-14);
    }
}
