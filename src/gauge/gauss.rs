// SPDX-License-Identifier: AGPL-3.0-only

//! Restoration of the Gauss constraint by damped gradient descent.
//!
//! The total violation `V = Σ_x G(x)²` is lowered by moving the electric
//! field against its gradient,
//!
//!   E_i(x) −= (γ/2D) · [G(x) − U_i(x) G(x+i) U_i(x)†]
//!
//! which is a Jacobi sweep of the covariant lattice Laplacian acting on
//! `G`. Its spectral radius is at most `4D`, so `γ ≤ 1` keeps every mode
//! contracting. After each sweep `Unext = exp(i dt E) U` is refreshed so
//! that the pending links stay consistent with the corrected field.

use log::{debug, info, warn};

use crate::error::LatticeError;
use crate::lattice::grid::{gauss_constraint, Geometry, Grid};
use crate::lattice::group::{AlgebraElement, GaugeGroup};
use crate::lattice::iterator::{CellAction, CellIterator};
use crate::solver::{update_links, LinkUpdate};
use crate::tolerances::{GAUSS_ACCURACY, GAUSS_GAMMA, GAUSS_MAX_ITERATIONS};

/// Why [`GaussRestoration::restore`] stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// Relative improvement fell below `accuracy`.
    Converged,
    /// A sweep increased the violation; it was reverted.
    Diverged,
    /// `max_iterations` sweeps were applied.
    MaxIterations,
}

/// Outcome of a restoration run.
#[derive(Clone, Debug, PartialEq)]
pub struct RestorationReport {
    /// Total violation before the first sweep and after every accepted
    /// sweep. The last entry is the state the grid is left in.
    pub history: Vec<f64>,
    /// Sweeps applied and kept.
    pub iterations: usize,
    pub stop: StopReason,
}

impl RestorationReport {
    #[must_use]
    pub fn initial(&self) -> f64 {
        self.history.first().copied().unwrap_or(0.0)
    }

    #[must_use]
    pub fn last(&self) -> f64 {
        self.history.last().copied().unwrap_or(0.0)
    }
}

/// Damped gradient restoration parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GaussRestoration {
    /// Correction strength γ.
    pub gamma: f64,
    /// Relative improvement below which the iteration stops.
    pub accuracy: f64,
    pub max_iterations: usize,
}

impl Default for GaussRestoration {
    fn default() -> Self {
        Self {
            gamma: GAUSS_GAMMA,
            accuracy: GAUSS_ACCURACY,
            max_iterations: GAUSS_MAX_ITERATIONS,
        }
    }
}

/// `G(x)` on active, evaluatable cells, zero elsewhere.
struct ConstraintField<'a, G: GaugeGroup> {
    geometry: &'a Geometry,
    links: &'a [G::Element],
    e: &'a [G::Algebra],
    rho: &'a [G::Algebra],
}

impl<G: GaugeGroup> CellAction<G::Algebra> for ConstraintField<'_, G> {
    fn apply(&self, cell: usize, out: &mut [G::Algebra]) {
        out[0] = if self.geometry.is_evaluatable(cell) {
            gauss_constraint::<G>(self.geometry, self.links, self.e, self.rho, cell)
        } else {
            G::Algebra::zero()
        };
    }
}

/// One gradient sweep on `E`.
struct Correction<'a, G: GaugeGroup> {
    geometry: &'a Geometry,
    links: &'a [G::Element],
    constraint: &'a [G::Algebra],
    step: f64,
}

impl<G: GaugeGroup> CellAction<G::Algebra> for Correction<'_, G> {
    fn apply(&self, cell: usize, out: &mut [G::Algebra]) {
        let nd = out.len();
        let here = self.constraint[cell];
        for (i, e) in out.iter_mut().enumerate() {
            let u = self.links[cell * nd + i];
            let forward = self.constraint[self.geometry.shift(cell, i, 1)];
            *e -= (here - forward.act(&u)) * self.step;
        }
    }
}

impl GaussRestoration {
    /// Check the parameters.
    ///
    /// # Errors
    ///
    /// [`LatticeError::InvalidParameter`] for a non-positive `gamma` or a
    /// negative `accuracy`.
    pub fn validate(&self) -> Result<(), LatticeError> {
        if self.gamma <= 0.0 || !self.gamma.is_finite() {
            return Err(LatticeError::InvalidParameter(format!(
                "gauss restoration gamma must be positive, got {}",
                self.gamma
            )));
        }
        if self.accuracy.is_nan() || self.accuracy < 0.0 {
            return Err(LatticeError::InvalidParameter(format!(
                "gauss restoration accuracy must be non-negative, got {}",
                self.accuracy
            )));
        }
        Ok(())
    }

    /// Lower the Gauss violation of `grid` in place.
    ///
    /// `dt` is the time step used to refresh the pending links.
    ///
    /// # Errors
    ///
    /// See [`GaussRestoration::validate`].
    pub fn restore<G: GaugeGroup>(
        &self,
        grid: &mut Grid<G>,
        iter: &CellIterator,
        dt: f64,
    ) -> Result<RestorationReport, LatticeError> {
        self.validate()?;
        let nd = grid.num_dims();
        let step = self.gamma / (2.0 * nd as f64);

        let mut violation = grid.total_gauss_violation(iter);
        let mut history = vec![violation];
        let mut iterations = 0;
        let mut stop = StopReason::MaxIterations;
        if violation <= f64::MIN_POSITIVE {
            stop = StopReason::Converged;
        }

        while stop == StopReason::MaxIterations && iterations < self.max_iterations {
            let backup = grid.e.clone();
            sweep(grid, iter, step);
            update_links(grid, iter, dt, LinkUpdate::Exponential);

            let next = grid.total_gauss_violation(iter);
            debug!(
                "gauss restoration: iteration {} violation {next:.6e}",
                iterations + 1
            );

            if next > violation {
                grid.e = backup;
                update_links(grid, iter, dt, LinkUpdate::Exponential);
                warn!(
                    "gauss restoration diverged at iteration {}: {violation:.6e} -> {next:.6e}, correction reverted",
                    iterations + 1
                );
                stop = StopReason::Diverged;
                break;
            }

            iterations += 1;
            history.push(next);
            let improvement = (violation - next) / violation;
            violation = next;
            if improvement < self.accuracy || violation <= f64::MIN_POSITIVE {
                stop = StopReason::Converged;
            }
        }

        info!(
            "gauss restoration: {:?} after {iterations} iterations, violation {:.6e} -> {violation:.6e}",
            stop, history[0]
        );
        Ok(RestorationReport {
            history,
            iterations,
            stop,
        })
    }
}

fn sweep<G: GaugeGroup>(grid: &mut Grid<G>, iter: &CellIterator, step: f64) {
    let nd = grid.num_dims();
    let Grid {
        geometry,
        links,
        e,
        rho,
        ..
    } = grid;
    let active = geometry.active_mask();

    let mut constraint = vec![G::Algebra::zero(); geometry.num_cells()];
    iter.update_cells(
        &mut constraint,
        1,
        active,
        &ConstraintField::<G> {
            geometry,
            links: links.as_slice(),
            e: e.as_slice(),
            rho: rho.as_slice(),
        },
    );
    iter.update_cells(
        e.as_mut_slice(),
        nd,
        active,
        &Correction::<G> {
            geometry,
            links: links.as_slice(),
            constraint: &constraint,
            step,
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::group::{Su2, Su3};

    fn violated<G: GaugeGroup>(seed: u64) -> Grid<G> {
        let mut grid = Grid::<G>::new(&[4, 4, 4], 1.0, 1.0).unwrap();
        let mut s = seed;
        for cell in 0..grid.num_cells() {
            for d in 0..3 {
                grid.set_u(cell, d, G::Algebra::random(&mut s, 0.3).get_link());
                grid.set_e(cell, d, G::Algebra::random(&mut s, 0.2));
            }
        }
        grid
    }

    fn decreases<G: GaugeGroup>() {
        let mut grid = violated::<G>(41);
        let iter = CellIterator::Sequential;
        let report = GaussRestoration::default()
            .restore(&mut grid, &iter, 0.01)
            .unwrap();
        assert_ne!(report.stop, StopReason::Diverged);
        for w in report.history.windows(2) {
            assert!(w[1] <= w[0]);
        }
        assert!(report.last() < 0.5 * report.initial(), "{:?}", report.history);
        assert!((grid.total_gauss_violation(&iter) - report.last()).abs() < 1e-12);
    }

    #[test]
    fn violation_decreases_su2() {
        decreases::<Su2>();
    }

    #[test]
    fn violation_decreases_su3() {
        decreases::<Su3>();
    }

    #[test]
    fn pending_links_follow_corrected_field() {
        let mut grid = violated::<Su2>(3);
        let iter = CellIterator::Sequential;
        GaussRestoration {
            max_iterations: 5,
            ..GaussRestoration::default()
        }
        .restore(&mut grid, &iter, 0.1)
        .unwrap();
        for cell in [0, 17, 63] {
            let expected = (grid.e(cell, 1) * 0.1).get_link() * grid.u(cell, 1);
            assert!((grid.u_next(cell, 1) - expected).norm_sq() < 1e-24);
        }
    }

    #[test]
    fn divergent_sweep_is_reverted() {
        let mut grid = violated::<Su2>(9);
        let iter = CellIterator::Sequential;
        let before = grid.clone();
        let report = GaussRestoration {
            gamma: 5.0,
            ..GaussRestoration::default()
        }
        .restore(&mut grid, &iter, 0.01)
        .unwrap();
        assert_eq!(report.stop, StopReason::Diverged);
        assert_eq!(report.iterations, 0);
        assert_eq!(report.history.len(), 1);
        assert_eq!(grid.e_field(), before.e_field());
    }

    #[test]
    fn satisfied_constraint_stops_immediately() {
        let mut grid = Grid::<Su3>::new(&[3, 3, 3], 1.0, 1.0).unwrap();
        let report = GaussRestoration::default()
            .restore(&mut grid, &CellIterator::Sequential, 0.01)
            .unwrap();
        assert_eq!(report.stop, StopReason::Converged);
        assert_eq!(report.iterations, 0);
    }

    #[test]
    fn rejects_bad_gamma() {
        let mut grid = Grid::<Su2>::new(&[3, 3], 1.0, 1.0).unwrap();
        let err = GaussRestoration {
            gamma: 0.0,
            ..GaussRestoration::default()
        }
        .restore(&mut grid, &CellIterator::Sequential, 0.01)
        .unwrap_err();
        assert!(matches!(err, LatticeError::InvalidParameter(_)));
    }
}
