// SPDX-License-Identifier: AGPL-3.0-only

//! Leapfrog solver in temporal gauge.
//!
//! Electric fields live at half-integer times, links at integer times:
//!
//!   E(t + dt/2) = E(t − dt/2) − (dt/a²)·proj(U V) − dt·J
//!   U(t + dt)   = exp(i dt E(t + dt/2)) U(t)
//!
//! `U(t+dt)† E U(t+dt) = U(t)† E U(t)` for the field that generated the
//! update, so the Gauss constraint is conserved up to rounding when the
//! sources are conserved.

use super::{apply_force, update_links, FieldSolver, LinkUpdate};
use crate::error::LatticeError;
use crate::lattice::grid::Grid;
use crate::lattice::group::GaugeGroup;
use crate::lattice::iterator::CellIterator;

/// Explicit temporal-gauge leapfrog.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LeapfrogSolver {
    /// Exponential or linearized link update.
    pub link_update: LinkUpdate,
}

impl<G: GaugeGroup> FieldSolver<G> for LeapfrogSolver {
    fn name(&self) -> &'static str {
        "leapfrog"
    }

    fn step(&self, grid: &mut Grid<G>, iter: &CellIterator, dt: f64) -> Result<(), LatticeError> {
        apply_force(grid, iter, dt);
        update_links(grid, iter, dt, self.link_update);
        Ok(())
    }

    fn step_links(
        &self,
        grid: &mut Grid<G>,
        iter: &CellIterator,
        dt: f64,
    ) -> Result<(), LatticeError> {
        update_links(grid, iter, dt, self.link_update);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::energy::FieldEnergy;
    use crate::lattice::group::{AlgebraElement, GroupElement, Su2, Su3};

    #[test]
    fn vacuum_is_a_fixed_point() {
        let mut grid = Grid::<Su2>::new(&[4, 4, 4], 1.0, 1.0).unwrap();
        let solver = LeapfrogSolver::default();
        let iter = CellIterator::Sequential;
        for _ in 0..10 {
            solver.step(&mut grid, &iter, 0.01).unwrap();
            grid.commit();
        }
        for cell in 0..grid.num_cells() {
            for d in 0..3 {
                assert!(grid.e(cell, d).norm() < 1e-15);
                assert_eq!(grid.u(cell, d), <Su2 as GaugeGroup>::Element::identity());
            }
        }
    }

    #[test]
    fn uniform_field_rotates_links_only() {
        let mut grid = Grid::<Su3>::new(&[3, 3, 3], 1.0, 1.0).unwrap();
        let e = <Su3 as GaugeGroup>::Algebra::from_components(&[0.0, 0.0, 0.3]);
        for cell in 0..grid.num_cells() {
            grid.set_e(cell, 0, e);
        }
        let solver = LeapfrogSolver::default();
        solver.step(&mut grid, &CellIterator::Sequential, 0.1).unwrap();
        // uniform abelian links have unit plaquettes: no force yet
        assert!((grid.e(5, 0) - e).norm() < 1e-14);
        let expected = (e * 0.1).get_link();
        assert!((grid.u_next(5, 0) - expected).norm_sq() < 1e-28);
        assert_eq!(grid.u(5, 0), <Su3 as GaugeGroup>::Element::identity());
    }

    #[test]
    fn linearized_update_stays_unitary() {
        let mut grid = Grid::<Su2>::new(&[3, 3], 1.0, 1.0).unwrap();
        let mut seed = 8;
        for cell in 0..grid.num_cells() {
            grid.set_e(cell, 1, <Su2 as GaugeGroup>::Algebra::random(&mut seed, 0.5));
        }
        let solver = LeapfrogSolver {
            link_update: LinkUpdate::Linearized,
        };
        solver.step(&mut grid, &CellIterator::Sequential, 0.05).unwrap();
        grid.commit();
        assert!(grid.max_unitarity_deviation() < 1e-12);
    }

    #[test]
    fn current_drains_electric_field() {
        let mut grid = Grid::<Su2>::new(&[3, 3], 1.0, 1.0).unwrap();
        let j = <Su2 as GaugeGroup>::Algebra::from_components(&[1.0, 0.0, 0.0]);
        grid.set_j(4, 0, j);
        LeapfrogSolver::default()
            .step(&mut grid, &CellIterator::Sequential, 0.1)
            .unwrap();
        assert!((grid.e(4, 0) + j * 0.1).norm() < 1e-15);
        let energy = FieldEnergy::measure(&grid, &CellIterator::Sequential);
        assert!((energy.electric - 0.5 * 0.01).abs() < 1e-15);
    }
}
