// SPDX-License-Identifier: AGPL-3.0-only

//! Classical Yang-Mills Validation.
//!
//! Exercises the SU(2)/SU(3) real-time lattice evolution end to end and
//! checks the properties every correct implementation must have.
//!
//! # Validation targets
//!
//! | Observable | Expected | Tolerance | Basis |
//! |-----------|----------|-----------|-------|
//! | Vacuum plaquette | 1.0 | exact | Definition |
//! | log(exp(X)) | X | 1e-8 rel | Group/algebra maps |
//! | Link unitarity | 0 | 1e-10 | exp maps into SU(N) |
//! | Leapfrog energy | const | 1e-6 rel | Symplectic scheme |
//! | Gauss violation | const | 1e-9 rel | Force is a covariant divergence |
//! | Gauge invariance | exact | 1e-10 | Observables are traces |
//! | Coulomb residual | decreasing | monotone | Gauge fixing |
//! | Gauss restoration | decreasing | monotone | Gradient flow |
//!
//! Usage: `validate_yang_mills [config.json]`. A configuration file adds
//! a short production run with the configured solver.

use hotspring_yangmills::gauge::coulomb::CoulombGauge;
use hotspring_yangmills::gauge::gauss::{GaussRestoration, StopReason};
use hotspring_yangmills::gauge::GaugeTransformation;
use hotspring_yangmills::lattice::energy::FieldEnergy;
use hotspring_yangmills::lattice::grid::Grid;
use hotspring_yangmills::lattice::group::{AlgebraElement, GaugeGroup, GroupElement, Su2, Su3};
use hotspring_yangmills::lattice::iterator::CellIterator;
use hotspring_yangmills::solver::{FieldSolver, LeapfrogSolver, LorenzSolver};
use hotspring_yangmills::tolerances;
use hotspring_yangmills::validation::ValidationHarness;
use hotspring_yangmills::{AnySimulation, LatticeConfig, LatticeError, Simulation};
use std::path::Path;

fn or_exit<T>(result: Result<T, LatticeError>, context: &str) -> T {
    match result {
        Ok(v) => v,
        Err(e) => {
            eprintln!("  {context}: {e}");
            std::process::exit(1);
        }
    }
}

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

fn algebra_checks<G: GaugeGroup>(harness: &mut ValidationHarness) {
    let mut s = 2024;
    let mut worst_round_trip = 0.0_f64;
    let mut worst_unitarity = 0.0_f64;
    for _ in 0..200 {
        let x = G::Algebra::random(&mut s, 0.5);
        let u = x.get_link();
        worst_round_trip = worst_round_trip.max((u.get_algebra_element() - x).norm() / x.norm());
        worst_unitarity = worst_unitarity.max(u.unitarity_deviation());
    }
    println!("  {}: worst round trip {worst_round_trip:.3e}, worst unitarity {worst_unitarity:.3e}", G::NAME);
    harness.check_upper(
        &format!("{} exp/log round trip", G::NAME),
        worst_round_trip,
        tolerances::ROUND_TRIP_REL,
    );
    harness.check_upper(
        &format!("{} link unitarity", G::NAME),
        worst_unitarity,
        tolerances::UNITARITY_ABS,
    );
}

fn energy_conservation<G: GaugeGroup>(harness: &mut ValidationHarness) {
    let config = LatticeConfig {
        colors: G::COLORS,
        dims: vec![4, 4, 4],
        time_step: Some(0.05),
        ..LatticeConfig::default()
    };
    let mut sim = or_exit(Simulation::<G>::from_config(&config), "simulation");
    excite(sim.grid_mut(), 77, 1e-5, 1e-5);
    let reference = or_exit(sim.advance_measured(), "leapfrog step").total();
    let mut worst = 0.0_f64;
    for _ in 1..100 {
        let energy = or_exit(sim.advance_measured(), "leapfrog step").total();
        worst = worst.max(((energy - reference) / reference).abs());
    }
    println!("  {}: {} steps, max relative drift {worst:.3e}", G::NAME, sim.steps());
    harness.check_upper(
        &format!("{} leapfrog energy drift", G::NAME),
        worst,
        tolerances::ENERGY_CONSERVATION_REL,
    );
}

fn gauss_conservation<G: GaugeGroup>(
    harness: &mut ValidationHarness,
    solver: &dyn FieldSolver<G>,
    iter: &CellIterator,
) {
    let mut grid = or_exit(Grid::<G>::new(&[4, 4, 4], 1.0, 1.0), "grid");
    excite(&mut grid, 5, 0.5, 0.3);
    let before = grid.total_gauss_violation(iter);
    for _ in 0..20 {
        or_exit(solver.step(&mut grid, iter, 0.05), solver.name());
        grid.commit();
    }
    let after = grid.total_gauss_violation(iter);
    println!("  {} {}: {before:.10e} -> {after:.10e}", G::NAME, solver.name());
    harness.check_rel(
        &format!("{} {} Gauss violation", G::NAME, solver.name()),
        after,
        before,
        tolerances::GAUSS_LAW_CONSERVATION_REL,
    );
}

fn gauge_invariance<G: GaugeGroup>(harness: &mut ValidationHarness, iter: &CellIterator) {
    let mut grid = or_exit(Grid::<G>::new(&[4, 4, 4], 1.0, 1.0), "grid");
    excite(&mut grid, 9, 0.7, 0.4);
    let before = FieldEnergy::measure(&grid, iter);
    let plaq = grid.average_plaquette(iter);
    or_exit(
        GaugeTransformation::<G>::random(grid.geometry(), 2.0, 11).apply(&mut grid, iter),
        "gauge transformation",
    );
    let after = FieldEnergy::measure(&grid, iter);
    println!(
        "  {}: energy {:.12} -> {:.12}",
        G::NAME,
        before.total(),
        after.total()
    );
    harness.check_abs(
        &format!("{} energy gauge invariance", G::NAME),
        after.total(),
        before.total(),
        tolerances::GAUGE_INVARIANCE_ABS,
    );
    harness.check_abs(
        &format!("{} plaquette gauge invariance", G::NAME),
        grid.average_plaquette(iter),
        plaq,
        tolerances::GAUGE_INVARIANCE_ABS,
    );
}

fn configured_run(harness: &mut ValidationHarness, path: &Path) {
    let config = or_exit(LatticeConfig::from_json_file(path), "configuration");
    let mut sim = or_exit(AnySimulation::from_config(&config), "simulation");
    let before = sim.gauss_violation();
    or_exit(sim.run(10), "configured run");
    let after = sim.gauss_violation();
    println!(
        "  {}: {} steps, energy {:.6e}, plaquette {:.6}, Gauss {before:.3e} -> {after:.3e}",
        path.display(),
        sim.steps(),
        sim.energy().total(),
        sim.average_plaquette()
    );
    harness.check_bool("configured run finite", sim.energy().total().is_finite());
}

fn main() {
    env_logger::init();

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║  Classical Yang-Mills Validation                           ║");
    println!("║  SU(2)/SU(3) real-time lattice gauge fields                ║");
    println!("║  Leapfrog + implicit + Lorenz gauge, Coulomb gauge fixing  ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    let mut harness = ValidationHarness::new("yang_mills");
    let parallel = or_exit(CellIterator::with_threads(2), "thread pool");

    // ═══ Test 1: Vacuum ═══
    println!("═══ Vacuum ═══");
    {
        let grid = or_exit(Grid::<Su3>::new(&[4, 4, 4, 4], 1.0, 1.0), "grid");
        let plaq = grid.average_plaquette(&parallel);
        let energy = FieldEnergy::measure(&grid, &parallel).total();
        println!("  Plaquette: {plaq:.6} (expected 1.0)");
        println!("  Energy:    {energy:.6} (expected 0.0)");
        harness.check_abs("vacuum plaquette", plaq, 1.0, tolerances::UNITARITY_ABS);
        harness.check_abs("vacuum energy", energy, 0.0, tolerances::UNITARITY_ABS);
    }
    println!();

    // ═══ Test 2: Algebra ═══
    println!("═══ Exponential and logarithm ═══");
    algebra_checks::<Su2>(&mut harness);
    algebra_checks::<Su3>(&mut harness);
    println!();

    // ═══ Test 3: Energy conservation ═══
    println!("═══ Leapfrog energy conservation (4³, dt = 0.05) ═══");
    energy_conservation::<Su2>(&mut harness);
    energy_conservation::<Su3>(&mut harness);
    println!();

    // ═══ Test 4: Gauss law ═══
    println!("═══ Gauss law conservation ═══");
    gauss_conservation::<Su2>(&mut harness, &LeapfrogSolver::default(), &parallel);
    gauss_conservation::<Su3>(&mut harness, &LeapfrogSolver::default(), &parallel);
    gauss_conservation::<Su3>(&mut harness, &LorenzSolver, &parallel);
    println!();

    // ═══ Test 5: Gauge invariance ═══
    println!("═══ Gauge invariance ═══");
    gauge_invariance::<Su2>(&mut harness, &parallel);
    gauge_invariance::<Su3>(&mut harness, &parallel);
    println!();

    // ═══ Test 6: Coulomb gauge ═══
    println!("═══ Coulomb gauge fixing (SU(3), 6³) ═══");
    {
        let config = LatticeConfig {
            colors: 3,
            dims: vec![6, 6, 6],
            threads: 2,
            ..LatticeConfig::default()
        };
        let mut sim = or_exit(Simulation::<Su3>::from_config(&config), "simulation");
        let g = GaugeTransformation::<Su3>::random(sim.grid().geometry(), 0.05, 3);
        or_exit(g.apply(sim.grid_mut(), &parallel), "gauge transformation");
        let report = or_exit(sim.fix_coulomb_gauge(&CoulombGauge::default()), "Coulomb gauge");
        for (i, r) in report.residuals.iter().enumerate() {
            println!("  iteration {i}: residual {r:.6e}");
        }
        harness.check_non_increasing("Coulomb residual", &report.residuals);
        harness.check_upper(
            "Coulomb residual reduction",
            report.last() / report.initial(),
            1e-6,
        );
    }
    println!();

    // ═══ Test 7: Gauss restoration ═══
    println!("═══ Gauss constraint restoration (SU(2), 4³) ═══");
    {
        let mut grid = or_exit(Grid::<Su2>::new(&[4, 4, 4], 1.0, 1.0), "grid");
        excite(&mut grid, 13, 0.4, 0.0);
        let mut s = 17;
        for cell in 0..grid.num_cells() {
            for d in 0..3 {
                let kicked = grid.e(cell, d) + <Su2 as GaugeGroup>::Algebra::random(&mut s, 0.05);
                grid.set_e(cell, d, kicked);
            }
        }
        let report = or_exit(
            GaussRestoration::default().restore(&mut grid, &parallel, 0.05),
            "Gauss restoration",
        );
        println!(
            "  {} iterations ({:?}): {:.6e} -> {:.6e}",
            report.iterations,
            report.stop,
            report.initial(),
            report.last()
        );
        harness.check_non_increasing("Gauss restoration history", &report.history);
        harness.check_bool("Gauss restoration stable", report.stop != StopReason::Diverged);
    }
    println!();

    if let Some(path) = std::env::args().nth(1) {
        println!("═══ Configured run ═══");
        configured_run(&mut harness, Path::new(&path));
        println!();
    }

    harness.finish();
}
