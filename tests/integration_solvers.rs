// SPDX-License-Identifier: AGPL-3.0-only

//! Integration tests: field solvers and the simulation driver.
//!
//! Energy conservation of the leapfrog scheme (staggered energy), Gauss
//! law conservation for leapfrog and Lorenz gauge, the implicit scheme in
//! the linear regime, and solver dispatch from configuration.

use hotspring_yangmills::lattice::energy::FieldEnergy;
use hotspring_yangmills::lattice::grid::Grid;
use hotspring_yangmills::lattice::group::{AlgebraElement, GaugeGroup, GroupElement, Su2, Su3};
use hotspring_yangmills::lattice::iterator::CellIterator;
use hotspring_yangmills::solver::{
    FieldSolver, ImplicitSolver, LeapfrogSolver, LinkUpdate, LorenzSolver, SolverConfig,
};
use hotspring_yangmills::tolerances;
use hotspring_yangmills::{AnySimulation, LatticeConfig, LatticeError, Simulation};

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

fn leapfrog_conserves_energy<G: GaugeGroup>() {
    let config = LatticeConfig {
        colors: G::COLORS,
        dims: vec![4, 4, 4],
        time_step: Some(0.05),
        ..LatticeConfig::default()
    };
    let mut sim = Simulation::<G>::from_config(&config).unwrap();
    excite(sim.grid_mut(), 77, 1e-5, 1e-5);

    let reference = sim.advance_measured().unwrap().total();
    assert!(reference > 0.0);
    for step in 1..100 {
        let energy = sim.advance_measured().unwrap().total();
        let drift = ((energy - reference) / reference).abs();
        assert!(
            drift < tolerances::ENERGY_CONSERVATION_REL,
            "{} step {step}: relative energy drift {drift:.3e}",
            G::NAME
        );
    }
    assert_eq!(sim.steps(), 100);
}

#[test]
fn leapfrog_conserves_staggered_energy_su2() {
    leapfrog_conserves_energy::<Su2>();
}

#[test]
fn leapfrog_conserves_staggered_energy_su3() {
    leapfrog_conserves_energy::<Su3>();
}

#[test]
fn vacuum_is_a_fixed_point() {
    let config = LatticeConfig {
        dims: vec![4, 4, 4],
        ..LatticeConfig::default()
    };
    assert!((config.dt() - 0.01).abs() < 1e-15);
    let mut sim = Simulation::<Su2>::from_config(&config).unwrap();
    let vacuum = sim.grid().clone();
    sim.run(10).unwrap();
    assert_eq!(sim.grid().e_field(), vacuum.e_field());
    assert_eq!(sim.grid().links().as_slice(), vacuum.links().as_slice());
    assert_eq!(sim.energy().total(), 0.0);
}

#[test]
fn single_perturbation_conserves_energy() {
    let config = LatticeConfig {
        dims: vec![4, 4, 4],
        ..LatticeConfig::default()
    };
    let mut sim = Simulation::<Su2>::from_config(&config).unwrap();
    let mut s = 99;
    let kick = <Su2 as GaugeGroup>::Algebra::random(&mut s, 1e-3);
    sim.grid_mut().set_e(21, 1, kick);

    let reference = sim.advance_measured().unwrap().total();
    assert!(reference > 0.0);
    for _ in 1..100 {
        let energy = sim.advance_measured().unwrap().total();
        assert!(((energy - reference) / reference).abs() < tolerances::ENERGY_CONSERVATION_REL);
    }
}

fn conserves_gauss_law<G: GaugeGroup>(solver: &dyn FieldSolver<G>, seed: u64) {
    let mut grid = Grid::<G>::new(&[4, 4, 4], 1.0, 1.0).unwrap();
    excite(&mut grid, seed, 0.5, 0.3);
    let iter = CellIterator::Sequential;
    let before = grid.total_gauss_violation(&iter);
    assert!(before > 1e-3);
    for _ in 0..20 {
        solver.step(&mut grid, &iter, 0.05).unwrap();
        grid.commit();
    }
    let after = grid.total_gauss_violation(&iter);
    assert!(
        ((after - before) / before).abs() < tolerances::GAUSS_LAW_CONSERVATION_REL,
        "{}: Gauss violation {before:.12e} -> {after:.12e}",
        solver.name()
    );
}

#[test]
fn leapfrog_conserves_gauss_law() {
    conserves_gauss_law::<Su2>(&LeapfrogSolver::default(), 1);
    conserves_gauss_law::<Su3>(&LeapfrogSolver::default(), 2);
}

#[test]
fn lorenz_conserves_gauss_law() {
    conserves_gauss_law::<Su2>(&LorenzSolver, 3);
    conserves_gauss_law::<Su3>(&LorenzSolver, 4);
}

#[test]
fn linearized_leapfrog_stays_unitary() {
    let mut grid = Grid::<Su3>::new(&[3, 3, 3], 1.0, 1.0).unwrap();
    excite(&mut grid, 5, 0.3, 0.3);
    let iter = CellIterator::Sequential;
    let solver = LeapfrogSolver {
        link_update: LinkUpdate::Linearized,
    };
    for _ in 0..10 {
        solver.step(&mut grid, &iter, 0.02).unwrap();
        grid.commit();
    }
    assert!(grid.max_unitarity_deviation() < tolerances::UNITARITY_ABS);
    assert!(grid.max_det_deviation() < tolerances::UNITARITY_ABS);
}

#[test]
fn implicit_conserves_energy_in_linear_regime() {
    let mut grid = Grid::<Su2>::new(&[4, 4, 4], 1.0, 1.0).unwrap();
    excite(&mut grid, 6, 1e-3, 1e-3);
    let iter = CellIterator::Sequential;
    let solver = ImplicitSolver {
        iterations: 20,
        damping: 1.0,
        tolerance: None,
    };
    let reference = FieldEnergy::measure(&grid, &iter).total();
    for _ in 0..30 {
        solver.step(&mut grid, &iter, 0.05).unwrap();
        grid.commit();
    }
    let energy = FieldEnergy::measure(&grid, &iter).total();
    assert!(((energy - reference) / reference).abs() < 1e-4);
}

#[test]
fn step_links_only_moves_pending_links() {
    let mut before = Grid::<Su2>::new(&[3, 3, 3], 1.0, 1.0).unwrap();
    excite(&mut before, 7, 0.2, 0.2);
    let iter = CellIterator::Sequential;
    let solvers: [Box<dyn FieldSolver<Su2>>; 2] =
        [Box::new(LeapfrogSolver::default()), Box::new(ImplicitSolver::default())];
    for solver in &solvers {
        let mut g = before.clone();
        solver.step_links(&mut g, &iter, 0.1).unwrap();
        assert_eq!(g.e_field(), before.e_field());
        assert_eq!(g.links().as_slice(), before.links().as_slice());
        let expected = (before.e(4, 2) * 0.1).get_link() * before.u(4, 2);
        let got = g.u_next(4, 2);
        assert!((got * expected.adjoint()).get_algebra_element().norm() < 1e-12);
    }
}

#[test]
fn parallel_solvers_match_sequential() {
    let mut seq = Grid::<Su2>::new(&[4, 5, 6], 1.0, 1.0).unwrap();
    excite(&mut seq, 8, 0.3, 0.2);
    let parallel = CellIterator::with_threads(3).unwrap();
    let sequential = CellIterator::Sequential;
    let solvers: [Box<dyn FieldSolver<Su2>>; 2] =
        [Box::new(ImplicitSolver::default()), Box::new(LorenzSolver)];
    for solver in &solvers {
        let mut a = seq.clone();
        let mut b = seq.clone();
        for _ in 0..3 {
            solver.step(&mut a, &sequential, 0.05).unwrap();
            a.commit();
            solver.step(&mut b, &parallel, 0.05).unwrap();
            b.commit();
        }
        assert_eq!(a.e_field(), b.e_field(), "{}", solver.name());
        assert_eq!(a.links().as_slice(), b.links().as_slice());
    }
}

#[test]
fn lorenz_rejects_two_dimensional_grids() {
    let solver = SolverConfig::Lorenz.build::<Su3>().unwrap();
    let mut grid = Grid::<Su3>::new(&[4, 4], 1.0, 1.0).unwrap();
    let err = solver
        .step(&mut grid, &CellIterator::Sequential, 0.01)
        .unwrap_err();
    assert_eq!(
        err,
        LatticeError::DimensionMismatch {
            solver: "lorenz",
            expected: 3,
            found: 2
        }
    );
}

#[test]
fn null_solver_is_static() {
    let config = LatticeConfig {
        solver: SolverConfig::None,
        ..LatticeConfig::default()
    };
    let mut sim = Simulation::<Su2>::from_config(&config).unwrap();
    excite(sim.grid_mut(), 9, 0.3, 0.3);
    let before = sim.grid().clone();
    sim.run(5).unwrap();
    assert_eq!(sim.solver_name(), "none");
    assert_eq!(sim.grid().e_field(), before.e_field());
    assert_eq!(sim.grid().links().as_slice(), before.links().as_slice());
}

#[test]
fn unsupported_colors_from_json() {
    let err = LatticeConfig::from_json_str(r#"{"colors": 4}"#).unwrap_err();
    assert_eq!(err, LatticeError::UnsupportedColors(4));
    let config = LatticeConfig {
        colors: 4,
        ..LatticeConfig::default()
    };
    assert_eq!(
        AnySimulation::from_config(&config).unwrap_err(),
        LatticeError::UnsupportedColors(4)
    );
}

#[test]
fn configured_su3_implicit_run() {
    let json = r#"{
        "colors": 3,
        "dims": [3, 3, 3],
        "time_step": 0.05,
        "threads": 2,
        "solver": { "kind": "implicit", "iterations": 4 }
    }"#;
    let config = LatticeConfig::from_json_str(json).unwrap();
    let mut sim = AnySimulation::from_config(&config).unwrap();
    assert_eq!(sim.colors(), 3);
    sim.run(3).unwrap();
    assert_eq!(sim.steps(), 3);
    assert!(sim.energy().total().abs() < 1e-20);
    assert!((sim.average_plaquette() - 1.0).abs() < 1e-14);
}
