// SPDX-License-Identifier: AGPL-3.0-only

//! Time-stepping driver.
//!
//! The gauge group is chosen once, when [`AnySimulation::from_config`]
//! reads the color count. From then on every step runs through the
//! monomorphized [`Simulation<G>`].

use log::info;

use crate::config::LatticeConfig;
use crate::error::LatticeError;
use crate::gauge::coulomb::{CoulombGauge, CoulombReport};
use crate::gauge::gauss::{GaussRestoration, RestorationReport};
use crate::lattice::energy::FieldEnergy;
use crate::lattice::grid::Grid;
use crate::lattice::group::{GaugeGroup, Su2, Su3};
use crate::lattice::iterator::CellIterator;
use crate::solver::FieldSolver;

/// A grid, its solver and iteration engine, and the clock.
#[derive(Debug)]
pub struct Simulation<G: GaugeGroup> {
    grid: Grid<G>,
    solver: Box<dyn FieldSolver<G>>,
    iter: CellIterator,
    dt: f64,
    steps: usize,
}

impl<G: GaugeGroup> Simulation<G> {
    /// # Errors
    ///
    /// [`LatticeError::InvalidParameter`] for a non-positive `dt`, and
    /// whatever the solver's `validate` reports for this grid.
    pub fn new(
        grid: Grid<G>,
        solver: Box<dyn FieldSolver<G>>,
        iter: CellIterator,
        dt: f64,
    ) -> Result<Self, LatticeError> {
        if dt <= 0.0 || !dt.is_finite() {
            return Err(LatticeError::InvalidParameter(format!(
                "time step must be positive, got {dt}"
            )));
        }
        solver.validate(&grid)?;
        Ok(Self {
            grid,
            solver,
            iter,
            dt,
            steps: 0,
        })
    }

    /// Vacuum grid, solver and worker pool as configured.
    ///
    /// # Errors
    ///
    /// Everything [`LatticeConfig::validate`] reports;
    /// [`LatticeError::InvalidParameter`] if the configured colors do not
    /// match `G`; solver/grid mismatches such as a Lorenz solver on a
    /// lattice that is not 3-dimensional.
    pub fn from_config(config: &LatticeConfig) -> Result<Self, LatticeError> {
        config.validate()?;
        if config.colors != G::COLORS {
            return Err(LatticeError::InvalidParameter(format!(
                "configuration asks for SU({}), simulation is {}",
                config.colors,
                G::NAME
            )));
        }
        let grid = Grid::from_geometry(config.geometry()?);
        let solver = config.solver.build::<G>()?;
        let iter = CellIterator::with_threads(config.threads)?;
        info!(
            "{} simulation: dims {:?}, solver {}, dt {}, {} thread(s)",
            G::NAME,
            config.dims,
            solver.name(),
            config.dt(),
            iter.threads()
        );
        Self::new(grid, solver, iter, config.dt())
    }

    /// One step: solver update, then promote the pending links.
    ///
    /// # Errors
    ///
    /// Whatever the solver reports; the grid is not committed then.
    pub fn advance(&mut self) -> Result<(), LatticeError> {
        self.solver.step(&mut self.grid, &self.iter, self.dt)?;
        self.grid.commit();
        self.steps += 1;
        Ok(())
    }

    /// One step, returning the staggered energy at the time of the links
    /// the step started from.
    ///
    /// # Errors
    ///
    /// As for [`Simulation::advance`].
    pub fn advance_measured(&mut self) -> Result<FieldEnergy, LatticeError> {
        let previous_e = self.grid.e_field().to_vec();
        self.solver.step(&mut self.grid, &self.iter, self.dt)?;
        let energy = FieldEnergy::staggered(&self.grid, &previous_e, &self.iter)?;
        self.grid.commit();
        self.steps += 1;
        Ok(energy)
    }

    /// `n` steps.
    ///
    /// # Errors
    ///
    /// Stops at the first failing step.
    pub fn run(&mut self, n: usize) -> Result<(), LatticeError> {
        for _ in 0..n {
            self.advance()?;
        }
        Ok(())
    }

    /// Energy of the current state.
    #[must_use]
    pub fn energy(&self) -> FieldEnergy {
        FieldEnergy::measure(&self.grid, &self.iter)
    }

    #[must_use]
    pub fn gauss_violation(&self) -> f64 {
        self.grid.total_gauss_violation(&self.iter)
    }

    #[must_use]
    pub fn average_plaquette(&self) -> f64 {
        self.grid.average_plaquette(&self.iter)
    }

    /// # Errors
    ///
    /// See [`CoulombGauge::apply`].
    pub fn fix_coulomb_gauge(&mut self, gauge: &CoulombGauge) -> Result<CoulombReport, LatticeError> {
        gauge.apply(&mut self.grid, &self.iter)
    }

    /// # Errors
    ///
    /// See [`GaussRestoration::restore`].
    pub fn restore_gauss(
        &mut self,
        restoration: &GaussRestoration,
    ) -> Result<RestorationReport, LatticeError> {
        restoration.restore(&mut self.grid, &self.iter, self.dt)
    }

    #[must_use]
    pub fn grid(&self) -> &Grid<G> {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut Grid<G> {
        &mut self.grid
    }

    #[must_use]
    pub fn iterator(&self) -> &CellIterator {
        &self.iter
    }

    #[must_use]
    pub fn solver_name(&self) -> &'static str {
        self.solver.name()
    }

    #[must_use]
    pub const fn dt(&self) -> f64 {
        self.dt
    }

    #[must_use]
    pub const fn steps(&self) -> usize {
        self.steps
    }

    /// Elapsed simulation time.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.steps as f64 * self.dt
    }
}

/// Simulation for whichever group the configuration names.
#[derive(Debug)]
pub enum AnySimulation {
    Su2(Simulation<Su2>),
    Su3(Simulation<Su3>),
}

impl AnySimulation {
    /// # Errors
    ///
    /// [`LatticeError::UnsupportedColors`] unless `colors` is 2 or 3, and
    /// everything [`Simulation::from_config`] reports.
    pub fn from_config(config: &LatticeConfig) -> Result<Self, LatticeError> {
        match config.colors {
            2 => Ok(Self::Su2(Simulation::from_config(config)?)),
            3 => Ok(Self::Su3(Simulation::from_config(config)?)),
            n => Err(LatticeError::UnsupportedColors(n)),
        }
    }

    #[must_use]
    pub const fn colors(&self) -> usize {
        match self {
            Self::Su2(_) => 2,
            Self::Su3(_) => 3,
        }
    }

    /// # Errors
    ///
    /// See [`Simulation::run`].
    pub fn run(&mut self, n: usize) -> Result<(), LatticeError> {
        match self {
            Self::Su2(sim) => sim.run(n),
            Self::Su3(sim) => sim.run(n),
        }
    }

    #[must_use]
    pub fn energy(&self) -> FieldEnergy {
        match self {
            Self::Su2(sim) => sim.energy(),
            Self::Su3(sim) => sim.energy(),
        }
    }

    #[must_use]
    pub fn gauss_violation(&self) -> f64 {
        match self {
            Self::Su2(sim) => sim.gauss_violation(),
            Self::Su3(sim) => sim.gauss_violation(),
        }
    }

    #[must_use]
    pub fn average_plaquette(&self) -> f64 {
        match self {
            Self::Su2(sim) => sim.average_plaquette(),
            Self::Su3(sim) => sim.average_plaquette(),
        }
    }

    #[must_use]
    pub fn steps(&self) -> usize {
        match self {
            Self::Su2(sim) => sim.steps(),
            Self::Su3(sim) => sim.steps(),
        }
    }
}
