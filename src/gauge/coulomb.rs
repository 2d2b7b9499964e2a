// SPDX-License-Identifier: AGPL-3.0-only

//! Iterative Coulomb gauge fixing, `∇·A = 0`.
//!
//! Each iteration measures the backward lattice divergence
//!
//!   div(x) = Σ_i [A_i(x−i) − A_i(x)],   A_i = proj(U_i)
//!
//! solves `−Δ ω = div` per algebra component and applies
//! `g(x) = exp(i ω(x))`. To first order in `A` this removes the divergence
//! exactly; the remaining non-abelian error shrinks with every iteration.
//! A small fixed number of iterations is used rather than iterating to
//! convergence.

use log::debug;

use super::poisson::{FftPoisson, PoissonSolver};
use super::GaugeTransformation;
use crate::error::LatticeError;
use crate::lattice::grid::Grid;
use crate::lattice::group::{AlgebraElement, GaugeGroup, GroupElement};
use crate::lattice::iterator::CellIterator;
use crate::tolerances::COULOMB_GAUGE_ITERATIONS;

/// Coulomb gauge fixing parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoulombGauge {
    /// Gauge transformations applied.
    pub iterations: usize,
}

impl Default for CoulombGauge {
    fn default() -> Self {
        Self {
            iterations: COULOMB_GAUGE_ITERATIONS,
        }
    }
}

/// Divergence residual `Σ_x div(x)² / N_cells` before and after each
/// iteration (`iterations + 1` entries).
#[derive(Clone, Debug, PartialEq)]
pub struct CoulombReport {
    pub residuals: Vec<f64>,
}

impl CoulombReport {
    #[must_use]
    pub fn initial(&self) -> f64 {
        self.residuals.first().copied().unwrap_or(0.0)
    }

    #[must_use]
    pub fn last(&self) -> f64 {
        self.residuals.last().copied().unwrap_or(0.0)
    }
}

impl CoulombGauge {
    /// Gauge-fix `grid` in place.
    ///
    /// # Errors
    ///
    /// [`LatticeError::InvalidParameter`] for a grid with fixed boundaries.
    pub fn apply<G: GaugeGroup>(
        &self,
        grid: &mut Grid<G>,
        iter: &CellIterator,
    ) -> Result<CoulombReport, LatticeError> {
        let poisson = FftPoisson::new(grid.geometry())?;
        self.apply_with(grid, iter, &poisson)
    }

    /// Gauge-fix with an externally provided Poisson solver.
    ///
    /// # Errors
    ///
    /// Whatever the Poisson solver reports.
    pub fn apply_with<G: GaugeGroup, P: PoissonSolver + ?Sized>(
        &self,
        grid: &mut Grid<G>,
        iter: &CellIterator,
        poisson: &P,
    ) -> Result<CoulombReport, LatticeError> {
        let n = grid.num_cells();
        let mut div = divergence(grid);
        let mut residuals = vec![residual::<G>(&div)];
        debug!("coulomb gauge: initial residual {:.6e}", residuals[0]);

        for it in 0..self.iterations {
            let mut omega = vec![G::Algebra::zero(); n];
            let mut source = vec![0.0; n];
            for a in 0..G::Algebra::GENERATORS {
                for (s, d) in source.iter_mut().zip(&div) {
                    *s = d.component(a);
                }
                let solution = poisson.solve(&source)?;
                for (w, s) in omega.iter_mut().zip(solution) {
                    w.set_component(a, s);
                }
            }
            GaugeTransformation::<G>::from_algebra(&omega).apply(grid, iter)?;

            div = divergence(grid);
            let r = residual::<G>(&div);
            debug!("coulomb gauge: iteration {} residual {r:.6e}", it + 1);
            residuals.push(r);
        }
        Ok(CoulombReport { residuals })
    }
}

/// Backward divergence of `proj(U)` at every cell.
#[must_use]
pub fn divergence<G: GaugeGroup>(grid: &Grid<G>) -> Vec<G::Algebra> {
    let nd = grid.num_dims();
    let a: Vec<G::Algebra> = grid.links().as_slice().iter().map(GroupElement::proj).collect();
    (0..grid.num_cells())
        .map(|x| {
            let mut d = G::Algebra::zero();
            for i in 0..nd {
                d += a[grid.shift(x, i, -1) * nd + i];
                d -= a[x * nd + i];
            }
            d
        })
        .collect()
}

fn residual<G: GaugeGroup>(div: &[G::Algebra]) -> f64 {
    if div.is_empty() {
        return 0.0;
    }
    div.iter().map(AlgebraElement::square).sum::<f64>() / div.len() as f64
}
