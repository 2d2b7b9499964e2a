// SPDX-License-Identifier: AGPL-3.0-only

//! Integration tests: lattice grid, cell iteration and field energy.
//!
//! Index layout, boundary masks, plaquette/staple geometry, the Gauss
//! constraint, and agreement of sequential and rayon-parallel sweeps.

use hotspring_yangmills::lattice::energy::FieldEnergy;
use hotspring_yangmills::lattice::grid::{Boundary, Grid};
use hotspring_yangmills::lattice::group::{AlgebraElement, GaugeGroup, GroupElement, Su2, Su3};
use hotspring_yangmills::lattice::iterator::CellIterator;
use hotspring_yangmills::lattice::su2::Su2Algebra;
use hotspring_yangmills::solver::{FieldSolver, LeapfrogSolver};
use hotspring_yangmills::LatticeError;

fn excite<G: GaugeGroup>(grid: &mut Grid<G>, seed: u64, link_amp: f64, field_amp: f64) {
    let mut s = seed;
    for cell in 0..grid.num_cells() {
        for d in 0..grid.num_dims() {
            let u = G::Algebra::random(&mut s, link_amp).get_link();
            grid.set_u(cell, d, u);
            grid.set_u_next(cell, d, u);
            grid.set_e(cell, d, G::Algebra::random(&mut s, field_amp));
        }
    }
}

#[test]
fn cell_index_layout_and_wrap() {
    let grid = Grid::<Su2>::new(&[2, 3, 4], 1.0, 1.0).unwrap();
    assert_eq!(grid.num_cells(), 24);
    assert_eq!(grid.cell_index(&[1, 2, 3]).unwrap(), 23);
    assert_eq!(grid.cell_index(&[-1, 0, 0]).unwrap(), 12);
    assert_eq!(grid.cell_index(&[0, 3, 4]).unwrap(), 0);
    assert_eq!(grid.cell_pos(17), vec![1, 1, 1]);
    assert!(matches!(
        grid.cell_index(&[0, 0]),
        Err(LatticeError::InvalidDimensions(_))
    ));
    // shift by the extent is the identity, by ±1 wraps
    for idx in 0..grid.num_cells() {
        assert_eq!(grid.shift(idx, 2, 4), idx);
        assert_eq!(grid.shift(grid.shift(idx, 1, 1), 1, -1), idx);
    }
    assert_eq!(grid.shift(grid.cell_index(&[0, 0, 3]).unwrap(), 2, 1), 0);
}

#[test]
fn rejects_malformed_grids() {
    assert!(matches!(
        Grid::<Su2>::new(&[], 1.0, 1.0),
        Err(LatticeError::InvalidDimensions(_))
    ));
    assert!(matches!(
        Grid::<Su3>::new(&[4, 0], 1.0, 1.0),
        Err(LatticeError::InvalidDimensions(_))
    ));
    assert!(matches!(
        Grid::<Su2>::new(&[4, 4], -1.0, 1.0),
        Err(LatticeError::InvalidParameter(_))
    ));
}

#[test]
fn fixed_boundary_masks() {
    let grid =
        Grid::<Su2>::with_boundaries(&[5, 3], &[Boundary::Fixed, Boundary::Periodic], 1.0, 1.0)
            .unwrap();
    for idx in 0..grid.num_cells() {
        let p = grid.cell_pos(idx)[0];
        assert_eq!(grid.is_active(idx), p != 0 && p != 4);
        assert_eq!(grid.is_evaluatable(idx), p != 4);
    }
}

#[test]
fn vacuum_staples_and_plaquettes() {
    let grid = Grid::<Su3>::new(&[3, 3, 3, 3], 1.0, 1.0).unwrap();
    let iter = CellIterator::Sequential;
    // 2(D − 1) unit staples per link
    let v = grid.staple_sum(5, 2);
    assert!((v.re_trace() - 3.0 * 6.0).abs() < 1e-14);
    assert!((grid.average_plaquette(&iter) - 1.0).abs() < 1e-15);
    assert_eq!(FieldEnergy::measure(&grid, &iter), FieldEnergy::default());
}

fn plaquette_orientation<G: GaugeGroup>() {
    let mut grid = Grid::<G>::new(&[4, 4, 4], 1.0, 1.0).unwrap();
    excite(&mut grid, 17, 0.8, 0.0);
    for idx in [0, 9, 33, 63] {
        for (i, j) in [(0, 1), (1, 2), (2, 0)] {
            // reversed traversal is the adjoint
            let p = grid.plaquette(idx, i, j, 1, 1);
            let q = grid.plaquette(idx, j, i, 1, 1);
            assert!((p * q).unitarity_deviation() < 1e-12);
            assert!((p * q).re_trace() - G::COLORS as f64 > -1e-12);
            // (−1, −1) from the opposite corner has the same trace
            let corner = grid.shift(grid.shift(idx, i, 1), j, 1);
            let back = grid.plaquette(corner, i, j, -1, -1);
            assert!((back.trace() - p.trace()).abs() < 1e-12);
        }
    }
}

#[test]
fn plaquette_orientation_su2() {
    plaquette_orientation::<Su2>();
}

#[test]
fn plaquette_orientation_su3() {
    plaquette_orientation::<Su3>();
}

#[test]
fn uniform_field_energy() {
    let mut grid = Grid::<Su2>::new(&[3, 3, 3], 2.0, 0.5).unwrap();
    let e = Su2Algebra::new(0.3, -0.4, 0.0);
    for cell in 0..grid.num_cells() {
        for d in 0..3 {
            grid.set_e(cell, d, e);
        }
    }
    let energy = FieldEnergy::measure(&grid, &CellIterator::Sequential);
    // ½ a Σ E² / g² = ½ · 2 · (27 · 3 · 0.25) / 0.25
    assert!((energy.electric - 81.0).abs() < 1e-12);
    assert!(energy.magnetic.abs() < 1e-15);
}

#[test]
fn gauss_constraint_of_a_point_charge() {
    let mut grid = Grid::<Su3>::new(&[3, 3, 3], 1.0, 1.0).unwrap();
    let iter = CellIterator::Sequential;
    let mut s = 2;
    let q = <Su3 as GaugeGroup>::Algebra::random(&mut s, 1.0);
    grid.set_rho(13, q);
    assert!((grid.total_gauss_violation(&iter) - q.square()).abs() < 1e-14);
    assert!((grid.gauss_constraint(13) + q).norm() < 1e-15);
    grid.reset_charges();
    assert!(grid.total_gauss_violation(&iter) < 1e-30);
}

#[test]
fn gauss_constraint_of_an_electric_line() {
    // a single E-link creates equal and opposite violations at its ends
    let mut grid = Grid::<Su2>::new(&[4, 4], 1.0, 1.0).unwrap();
    let e = Su2Algebra::new(0.0, 0.5, 0.0);
    grid.set_e(5, 1, e);
    let end = grid.shift(5, 1, 1);
    assert!((grid.gauss_constraint(5) - e).norm() < 1e-15);
    assert!((grid.gauss_constraint(end) + e).norm() < 1e-15);
    let total = grid.total_gauss_violation(&CellIterator::Sequential);
    assert!((total - 2.0 * e.square()).abs() < 1e-15);
}

#[test]
fn commit_promotes_pending_links() {
    let mut grid = Grid::<Su2>::new(&[3, 3], 1.0, 1.0).unwrap();
    let u = Su2Algebra::new(0.1, 0.2, 0.3).get_link();
    grid.set_u_next(4, 0, u);
    assert_eq!(grid.u(4, 0), <Su2 as GaugeGroup>::Element::identity());
    grid.commit();
    assert_eq!(grid.u(4, 0), u);
    assert_eq!(grid.u_next(4, 0), u);
}

#[test]
fn set_vacuum_clears_everything() {
    let mut grid = Grid::<Su3>::new(&[3, 3, 3], 1.0, 1.0).unwrap();
    excite(&mut grid, 8, 0.5, 0.5);
    grid.set_j(2, 1, <Su3 as GaugeGroup>::Algebra::from_components(&[1.0]));
    grid.set_a0(2, <Su3 as GaugeGroup>::Algebra::from_components(&[0.0, 1.0]));
    grid.set_vacuum();
    let iter = CellIterator::Sequential;
    assert_eq!(FieldEnergy::measure(&grid, &iter).total(), 0.0);
    assert_eq!(grid.j(2, 1), <Su3 as GaugeGroup>::Algebra::zero());
    assert_eq!(grid.a0(2), <Su3 as GaugeGroup>::Algebra::zero());
    assert!((grid.average_plaquette(&iter) - 1.0).abs() < 1e-15);
}

#[test]
fn parallel_sweeps_match_sequential() {
    let mut seq = Grid::<Su3>::new(&[5, 4, 6], 1.0, 1.0).unwrap();
    excite(&mut seq, 29, 0.4, 0.2);
    let mut par = seq.clone();
    let sequential = CellIterator::Sequential;
    let parallel = CellIterator::with_threads(4).unwrap();
    assert_eq!(parallel.threads(), 4);

    let solver = LeapfrogSolver::default();
    for _ in 0..3 {
        solver.step(&mut seq, &sequential, 0.05).unwrap();
        seq.commit();
        solver.step(&mut par, &parallel, 0.05).unwrap();
        par.commit();
    }
    assert_eq!(seq.e_field(), par.e_field());
    assert_eq!(seq.links().as_slice(), par.links().as_slice());

    let a = FieldEnergy::measure(&seq, &sequential).total();
    let b = FieldEnergy::measure(&par, &parallel).total();
    assert!((a - b).abs() < 1e-12 * a);
}

#[test]
fn sum_cells_respects_the_mask() {
    let iter = CellIterator::with_threads(3).unwrap();
    let mask: Vec<bool> = (0..1000).map(|c| c % 3 == 0).collect();
    let total = iter.sum_cells(&mask, |c| c as f64);
    let expected: f64 = (0..1000).filter(|c| c % 3 == 0).map(|c| c as f64).sum();
    assert!((total - expected).abs() < 1e-9);
}

#[test]
fn cell_index_round_trip() {
    for dims in [vec![7], vec![3, 5], vec![2, 3, 4], vec![3, 2, 2, 4]] {
        let grid = Grid::<Su2>::new(&dims, 1.0, 1.0).unwrap();
        for idx in 0..grid.num_cells() {
            let pos: Vec<isize> = grid
                .cell_pos(idx)
                .into_iter()
                .map(|p| isize::try_from(p).unwrap())
                .collect();
            assert_eq!(grid.cell_index(&pos).unwrap(), idx);
        }
    }
}
