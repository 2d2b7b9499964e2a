// SPDX-License-Identifier: AGPL-3.0-only

//! Implicit Yang-Mills solver: damped fixed-point iteration.
//!
//! Electric fields live at integer times. One step solves
//!
//!   E' = E − (dt/2a²)·[proj(U V) + proj(U' V')] − dt·J
//!   U' = exp(i dt (E + E')/2) U
//!
//! by iterating on the link increment `Δ = U' U†`, starting from the
//! forward estimate `proj(U' V') = proj(U V)`. Each iteration
//! computes a trial increment from the trapezoidal force, blends it with
//! the previous iterate,
//!
//!   Δ ← Δ_trial^α · Δ_prev^(1−α)
//!
//! and re-derives `E' = 2 log(Δ)/dt − E` from the damped link. The
//! iteration count is fixed; an optional tolerance on the change of `E'`
//! stops earlier.

use log::debug;

use super::{update_links, FieldSolver, LinkUpdate};
use crate::error::LatticeError;
use crate::lattice::grid::{Grid, LinkView};
use crate::lattice::group::{AlgebraElement, GaugeGroup, GroupElement};
use crate::lattice::iterator::{CellAction, CellIterator};

/// Implicit fixed-point solver.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImplicitSolver {
    /// Fixed-point iterations per step.
    pub iterations: usize,
    /// Damping factor α ∈ [0, 1]; 1 takes the trial link unchanged.
    pub damping: f64,
    /// Stop once `Σ |ΔE'|²` falls below this value.
    pub tolerance: Option<f64>,
}

impl Default for ImplicitSolver {
    fn default() -> Self {
        Self {
            iterations: crate::tolerances::IMPLICIT_ITERATIONS,
            damping: crate::tolerances::IMPLICIT_DAMPING_FACTOR,
            tolerance: None,
        }
    }
}

/// `proj(U V)` of every link, into a per-direction buffer.
struct StapleForce<'a, U> {
    view: LinkView<'a, U>,
}

impl<U: GroupElement> CellAction<U::Algebra> for StapleForce<'_, U> {
    fn apply(&self, cell: usize, out: &mut [U::Algebra]) {
        for (i, f) in out.iter_mut().enumerate() {
            *f = self.view.link_times_staples(cell, i).proj();
        }
    }
}

/// Damped trial link from the trapezoidal force.
struct TrialLinks<'a, G: GaugeGroup> {
    pending: LinkView<'a, G::Element>,
    links: &'a [G::Element],
    e_old: &'a [G::Algebra],
    force_old: &'a [G::Algebra],
    current: &'a [G::Algebra],
    coeff: f64,
    dt: f64,
    damping: f64,
}

impl<G: GaugeGroup> CellAction<G::Element> for TrialLinks<'_, G> {
    fn apply(&self, cell: usize, out: &mut [G::Element]) {
        let nd = out.len();
        for (i, u_next) in out.iter_mut().enumerate() {
            let k = cell * nd + i;
            let force_new = self.pending.link_times_staples(cell, i).proj();
            let e_new = self.e_old[k]
                - (self.force_old[k] + force_new) * self.coeff
                - self.current[k] * self.dt;
            let trial = ((self.e_old[k] + e_new) * (0.5 * self.dt)).get_link();
            let u = self.links[k];
            let previous = *u_next * u.adjoint();
            let increment = if self.damping >= 1.0 {
                trial
            } else {
                trial.pow(self.damping) * previous.pow(1.0 - self.damping)
            };
            *u_next = increment * u;
        }
    }
}

/// `E' = 2 log(Unext U†)/dt − E`.
struct FieldFromLinks<'a, G: GaugeGroup> {
    links: &'a [G::Element],
    pending: &'a [G::Element],
    e_old: &'a [G::Algebra],
    dt: f64,
}

impl<G: GaugeGroup> CellAction<G::Algebra> for FieldFromLinks<'_, G> {
    fn apply(&self, cell: usize, out: &mut [G::Algebra]) {
        let nd = out.len();
        for (i, e) in out.iter_mut().enumerate() {
            let k = cell * nd + i;
            let increment = self.pending[k] * self.links[k].adjoint();
            *e = increment.get_algebra_element() * (2.0 / self.dt) - self.e_old[k];
        }
    }
}

impl<G: GaugeGroup> FieldSolver<G> for ImplicitSolver {
    fn name(&self) -> &'static str {
        "implicit"
    }

    fn step(&self, grid: &mut Grid<G>, iter: &CellIterator, dt: f64) -> Result<(), LatticeError> {
        // E' is only re-derived inside the iteration loop.
        if self.iterations == 0 {
            return Err(LatticeError::InvalidParameter(
                "implicit solver needs at least one iteration".into(),
            ));
        }
        let nd = grid.num_dims();
        let a = grid.spacing();
        let coeff = 0.5 * dt / (a * a);

        let Grid {
            geometry,
            links,
            pending,
            e,
            j,
            ..
        } = grid;
        let active = geometry.active_mask();

        // Scratch buffers owned by this call.
        let e_old = e.clone();
        let mut force_old = vec![G::Algebra::zero(); e.len()];
        iter.update_cells(
            &mut force_old,
            nd,
            active,
            &StapleForce {
                view: LinkView::new(geometry, links.as_slice()),
            },
        );

        // Forward estimate: trial link from E' = E − dt/a²·proj(UV) − dt J.
        let forward = TrialLinks::<G> {
            pending: LinkView::new(geometry, links.as_slice()),
            links: links.as_slice(),
            e_old: &e_old,
            force_old: &force_old,
            current: j.as_slice(),
            coeff,
            dt,
            damping: 1.0,
        };
        iter.update_cells(pending.as_mut_slice(), nd, active, &forward);

        for it in 0..self.iterations {
            let snapshot = pending.as_slice().to_vec();
            let trial = TrialLinks::<G> {
                pending: LinkView::new(geometry, &snapshot),
                links: links.as_slice(),
                e_old: &e_old,
                force_old: &force_old,
                current: j.as_slice(),
                coeff,
                dt,
                damping: self.damping,
            };
            iter.update_cells(pending.as_mut_slice(), nd, active, &trial);

            let previous_e = self.tolerance.map(|_| e.clone());
            let derive = FieldFromLinks::<G> {
                links: links.as_slice(),
                pending: pending.as_slice(),
                e_old: &e_old,
                dt,
            };
            iter.update_cells(e.as_mut_slice(), nd, active, &derive);

            if let (Some(tol), Some(prev)) = (self.tolerance, previous_e) {
                let e_now = e.as_slice();
                let change = iter.sum_cells(active, |cell| {
                    (cell * nd..(cell + 1) * nd)
                        .map(|k| (e_now[k] - prev[k]).square())
                        .sum()
                });
                debug!("implicit iteration {it}: ΔE² = {change:.3e}");
                if it > 0 && change < tol {
                    break;
                }
            }
        }
        Ok(())
    }

    fn step_links(
        &self,
        grid: &mut Grid<G>,
        iter: &CellIterator,
        dt: f64,
    ) -> Result<(), LatticeError> {
        update_links(grid, iter, dt, LinkUpdate::Exponential);
        Ok(())
    }
}
