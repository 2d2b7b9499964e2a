// SPDX-License-Identifier: AGPL-3.0-only

//! Electric and magnetic field energy.
//!
//!   electric = ½ a_s Σ_{x,i} E_i(x)² / g²
//!   magnetic = ¼ Σ_{x, i≠j} proj(P_ij(x))² / (a_s g²)
//!
//! With `a_s = g = 1` this is `0.5·E² + 0.25·B²` per cell. Sums run over
//! evaluatable cells only.
//!
//! The leapfrog solver holds `E` at half-integer times, so the quantity it
//! conserves pairs the fields on either side of the link update:
//! `½ E(t − dt/2)·E(t + dt/2)` (see [`FieldEnergy::staggered`]).

use super::grid::Grid;
use super::group::{AlgebraElement, GaugeGroup, GroupElement};
use super::iterator::CellIterator;
use crate::error::LatticeError;

/// Field energy split into its electric and magnetic parts.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FieldEnergy {
    /// Electric energy.
    pub electric: f64,
    /// Magnetic energy.
    pub magnetic: f64,
}

impl FieldEnergy {
    /// Electric plus magnetic.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.electric + self.magnetic
    }

    /// Energy of the current links and electric field.
    #[must_use]
    pub fn measure<G: GaugeGroup>(grid: &Grid<G>, iter: &CellIterator) -> Self {
        let nd = grid.num_dims();
        let e = grid.e_field();
        let electric = iter.sum_cells(grid.geometry().evaluatable_mask(), |cell| {
            e[cell * nd..(cell + 1) * nd]
                .iter()
                .map(AlgebraElement::square)
                .sum()
        });
        Self {
            electric: electric_prefactor(grid) * electric,
            magnetic: magnetic_energy(grid, iter),
        }
    }

    /// Leapfrog energy at the time of the current links.
    ///
    /// `previous_e` is the electric field before the last solver step,
    /// the grid holds the field after it. Call before [`Grid::commit`].
    ///
    /// # Errors
    ///
    /// [`LatticeError::InvalidDimensions`] if `previous_e` does not match
    /// the grid's field buffer.
    pub fn staggered<G: GaugeGroup>(
        grid: &Grid<G>,
        previous_e: &[G::Algebra],
        iter: &CellIterator,
    ) -> Result<Self, LatticeError> {
        let e = grid.e_field();
        if previous_e.len() != e.len() {
            return Err(LatticeError::InvalidDimensions(format!(
                "previous field has {} entries, grid has {}",
                previous_e.len(),
                e.len()
            )));
        }
        let nd = grid.num_dims();
        let electric = iter.sum_cells(grid.geometry().evaluatable_mask(), |cell| {
            (cell * nd..(cell + 1) * nd)
                .map(|k| previous_e[k].dot(&e[k]))
                .sum()
        });
        Ok(Self {
            electric: electric_prefactor(grid) * electric,
            magnetic: magnetic_energy(grid, iter),
        })
    }
}

fn electric_prefactor<G: GaugeGroup>(grid: &Grid<G>) -> f64 {
    let g = grid.coupling();
    0.5 * grid.spacing() / (g * g)
}

fn magnetic_energy<G: GaugeGroup>(grid: &Grid<G>, iter: &CellIterator) -> f64 {
    let nd = grid.num_dims();
    let view = grid.current_view();
    let sum = iter.sum_cells(grid.geometry().evaluatable_mask(), |cell| {
        let mut s = 0.0;
        for i in 0..nd {
            for j in (i + 1)..nd {
                // proj(P_ji) = −proj(P_ij): both orderings give the same square.
                s += 2.0 * view.plaquette(cell, i, j, 1, 1).proj().square();
            }
        }
        s
    });
    let g = grid.coupling();
    0.25 * sum / (grid.spacing() * g * g)
}
