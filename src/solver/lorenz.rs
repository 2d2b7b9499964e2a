// SPDX-License-Identifier: AGPL-3.0-only

//! Lorenz-gauge solver.
//!
//! A temporal-gauge leapfrog step followed by a gauge rotation with the
//! temporal link `W(x) = exp(i dt A0(x))`:
//!
//!   Unext_i(x) = W(x)† exp(i dt E_i(x)) U_i(x) W(x + i)
//!   E_i(x)     ← W(x)† E_i(x) W(x)
//!
//! and the temporal potential follows the Lorenz condition `∂_t A0 = ∇·A`,
//! with the divergence of `A_i = log Unext_i` taken by the 4th-order
//! central difference
//!
//!   ∂f ≈ (−f(x+2) + 8 f(x+1) − 8 f(x−1) + f(x−2)) / 12
//!
//! The stencil reaches two cells in each direction; with fewer than 4
//! cells per dimension it wraps onto itself and the gauge condition is
//! wrong, which is reported as a warning only.

use log::warn;

use super::{apply_force, FieldSolver};
use crate::error::LatticeError;
use crate::lattice::constants::LORENZ_MIN_EXTENT;
use crate::lattice::grid::{Geometry, Grid};
use crate::lattice::group::{AlgebraElement, GaugeGroup, GroupElement};
use crate::lattice::iterator::{CellAction, CellIterator};

const LORENZ_DIMENSIONS: usize = 3;

/// Leapfrog in Lorenz gauge; 3 spatial dimensions only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LorenzSolver;

/// `Unext = W(x)† exp(i dt E) U W(x+i)`.
struct RotatedLinks<'a, G: GaugeGroup> {
    geometry: &'a Geometry,
    links: &'a [G::Element],
    e: &'a [G::Algebra],
    temporal: &'a [G::Element],
    dt: f64,
}

impl<G: GaugeGroup> CellAction<G::Element> for RotatedLinks<'_, G> {
    fn apply(&self, cell: usize, out: &mut [G::Element]) {
        let nd = out.len();
        let w_dag = self.temporal[cell].adjoint();
        for (i, u_next) in out.iter_mut().enumerate() {
            let k = cell * nd + i;
            let forward = self.geometry.shift(cell, i, 1);
            *u_next = w_dag * (self.e[k] * self.dt).get_link() * self.links[k] * self.temporal[forward];
        }
    }
}

/// `∂_t A0 = Σ_i ∂_i A_i`, 4th-order stencil.
struct LorenzCondition<'a, A> {
    geometry: &'a Geometry,
    potential: &'a [A],
    coeff: f64,
}

impl<A: AlgebraElement> CellAction<A> for LorenzCondition<'_, A> {
    fn apply(&self, cell: usize, out: &mut [A]) {
        let g = self.geometry;
        let nd = g.num_dims();
        let mut div = A::zero();
        for i in 0..nd {
            let at = |steps: isize| self.potential[g.shift(cell, i, steps) * nd + i];
            div += (at(1) - at(-1)) * (8.0 / 12.0);
            div -= (at(2) - at(-2)) * (1.0 / 12.0);
        }
        out[0] += div * self.coeff;
    }
}

impl<G: GaugeGroup> FieldSolver<G> for LorenzSolver {
    fn name(&self) -> &'static str {
        "lorenz"
    }

    fn validate(&self, grid: &Grid<G>) -> Result<(), LatticeError> {
        let nd = grid.num_dims();
        if nd != LORENZ_DIMENSIONS {
            return Err(LatticeError::DimensionMismatch {
                solver: "lorenz",
                expected: LORENZ_DIMENSIONS,
                found: nd,
            });
        }
        Ok(())
    }

    fn step(&self, grid: &mut Grid<G>, iter: &CellIterator, dt: f64) -> Result<(), LatticeError> {
        <Self as FieldSolver<G>>::validate(self, grid)?;
        if let Some(n) = grid.dims().iter().copied().find(|&n| n < LORENZ_MIN_EXTENT) {
            warn!(
                "lorenz solver: extent {n} below {LORENZ_MIN_EXTENT}, divergence stencil wraps onto itself"
            );
        }

        apply_force(grid, iter, dt);
        rotate_step(grid, iter, dt);

        let nd = grid.num_dims();
        let a = grid.spacing();
        let Grid {
            geometry,
            pending,
            a0,
            ..
        } = grid;
        let mut potential = vec![G::Algebra::zero(); pending.as_slice().len()];
        let links = pending.as_slice();
        iter.update_cells(
            &mut potential,
            nd,
            geometry.active_mask(),
            &|cell: usize, out: &mut [G::Algebra]| {
                for (i, p) in out.iter_mut().enumerate() {
                    *p = links[cell * nd + i].get_algebra_element();
                }
            },
        );
        let condition = LorenzCondition {
            geometry,
            potential: &potential,
            coeff: dt / (a * a),
        };
        iter.update_cells(a0.as_mut_slice(), 1, geometry.active_mask(), &condition);
        Ok(())
    }

    fn step_links(
        &self,
        grid: &mut Grid<G>,
        iter: &CellIterator,
        dt: f64,
    ) -> Result<(), LatticeError> {
        <Self as FieldSolver<G>>::validate(self, grid)?;
        rotate_step(grid, iter, dt);
        Ok(())
    }
}

/// Link update with the temporal-link rotation, then the matching
/// rotation of `E`, `J` and `ρ` at each cell.
fn rotate_step<G: GaugeGroup>(grid: &mut Grid<G>, iter: &CellIterator, dt: f64) {
    let nd = grid.num_dims();
    let temporal: Vec<G::Element> = grid.a0.iter().map(|&a| (a * dt).get_link()).collect();

    let Grid {
        geometry,
        links,
        pending,
        e,
        j,
        rho,
        ..
    } = grid;
    let active = geometry.active_mask();

    let rotated = RotatedLinks::<G> {
        geometry,
        links: links.as_slice(),
        e: e.as_slice(),
        temporal: &temporal,
        dt,
    };
    iter.update_cells(pending.as_mut_slice(), nd, active, &rotated);

    let rotate = |cell: usize, out: &mut [G::Algebra]| {
        let w_dag = temporal[cell].adjoint();
        for x in out.iter_mut() {
            x.act_assign(&w_dag);
        }
    };
    iter.update_cells(e.as_mut_slice(), nd, active, &rotate);
    iter.update_cells(j.as_mut_slice(), nd, active, &rotate);
    iter.update_cells(rho.as_mut_slice(), 1, active, &rotate);
}
