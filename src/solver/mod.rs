// SPDX-License-Identifier: AGPL-3.0-only

//! Field solvers: one time step of the Yang-Mills equations of motion.
//!
//! Every solver writes `E` and the pending links `Unext` and never touches
//! the current links `U`; the caller promotes `Unext` with
//! [`Grid::commit`](crate::lattice::grid::Grid::commit) after the step.
//!
//! Units: `E` is stored as `g·a_s·E`, so the link update is
//! `Unext = exp(i dt E) U` and the magnetic force on `E_i(x)` is
//! `−(dt/a_s²)·proj(U_i(x) V_i(x))` with `V_i` the staple sum.
//!
//! | Solver | Scheme | Dimensions |
//! |--------|--------|------------|
//! | [`LeapfrogSolver`] | explicit, temporal gauge | any |
//! | [`ImplicitSolver`] | damped fixed-point, trapezoidal force | any |
//! | [`LorenzSolver`] | leapfrog + temporal-link rotation | 3 |
//! | [`NullSolver`] | no evolution | any |

mod implicit;
mod leapfrog;
mod lorenz;

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::error::LatticeError;
use crate::lattice::grid::{Grid, LinkView};
use crate::lattice::group::{AlgebraElement, GaugeGroup, GroupElement};
use crate::lattice::iterator::{CellAction, CellIterator};
use crate::tolerances::{IMPLICIT_DAMPING_FACTOR, IMPLICIT_ITERATIONS};

pub use implicit::ImplicitSolver;
pub use leapfrog::LeapfrogSolver;
pub use lorenz::LorenzSolver;

/// A time-stepping scheme for grids of gauge group `G`.
pub trait FieldSolver<G: GaugeGroup>: Debug + Send + Sync {
    /// Short identifier used in errors and logs.
    fn name(&self) -> &'static str;

    /// Check that the solver can run on this grid.
    ///
    /// # Errors
    ///
    /// [`LatticeError::DimensionMismatch`] if the grid has the wrong number
    /// of dimensions for this scheme.
    fn validate(&self, _grid: &Grid<G>) -> Result<(), LatticeError> {
        Ok(())
    }

    /// Advance `E` and `Unext` by `dt`.
    ///
    /// # Errors
    ///
    /// Whatever [`FieldSolver::validate`] reports; the grid is untouched
    /// in that case.
    fn step(&self, grid: &mut Grid<G>, iter: &CellIterator, dt: f64) -> Result<(), LatticeError>;

    /// Advance only `Unext` by `dt` from the current `E`.
    ///
    /// # Errors
    ///
    /// As for [`FieldSolver::step`].
    fn step_links(&self, grid: &mut Grid<G>, iter: &CellIterator, dt: f64)
        -> Result<(), LatticeError>;
}

/// Exponential map used for the link update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkUpdate {
    /// `exp(i dt E)`.
    #[default]
    Exponential,
    /// `1 + i dt E`, projected back onto the group.
    Linearized,
}

/// Solver selection as read from the configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SolverConfig {
    /// Explicit leapfrog in temporal gauge.
    Leapfrog {
        #[serde(default)]
        link_update: LinkUpdate,
    },
    /// Implicit fixed-point scheme.
    Implicit {
        #[serde(default = "default_implicit_iterations")]
        iterations: usize,
        #[serde(default = "default_implicit_damping")]
        damping: f64,
        #[serde(default)]
        tolerance: Option<f64>,
    },
    /// Lorenz-gauge leapfrog (3 dimensions).
    Lorenz,
    /// No evolution.
    None,
}

const fn default_implicit_iterations() -> usize {
    IMPLICIT_ITERATIONS
}

const fn default_implicit_damping() -> f64 {
    IMPLICIT_DAMPING_FACTOR
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self::Leapfrog {
            link_update: LinkUpdate::Exponential,
        }
    }
}

impl SolverConfig {
    /// # Errors
    ///
    /// [`LatticeError::InvalidParameter`] for zero implicit iterations, a
    /// damping factor outside `[0, 1]` or a non-positive tolerance.
    pub fn validate(&self) -> Result<(), LatticeError> {
        if let Self::Implicit {
            iterations,
            damping,
            tolerance,
        } = self
        {
            if *iterations == 0 {
                return Err(LatticeError::InvalidParameter(
                    "implicit solver needs at least one iteration".into(),
                ));
            }
            if !(0.0..=1.0).contains(damping) {
                return Err(LatticeError::InvalidParameter(format!(
                    "implicit damping factor {damping} outside [0, 1]"
                )));
            }
            if let Some(tol) = tolerance {
                if !(*tol > 0.0) {
                    return Err(LatticeError::InvalidParameter(format!(
                        "implicit tolerance {tol} must be positive"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Instantiate the configured solver.
    ///
    /// # Errors
    ///
    /// See [`SolverConfig::validate`].
    pub fn build<G: GaugeGroup>(&self) -> Result<Box<dyn FieldSolver<G>>, LatticeError> {
        self.validate()?;
        Ok(match *self {
            Self::Leapfrog { link_update } => Box::new(LeapfrogSolver { link_update }),
            Self::Implicit {
                iterations,
                damping,
                tolerance,
            } => Box::new(ImplicitSolver {
                iterations,
                damping,
                tolerance,
            }),
            Self::Lorenz => Box::new(LorenzSolver),
            Self::None => Box::new(NullSolver),
        })
    }
}

/// Leaves the grid untouched (static background fields).
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSolver;

impl<G: GaugeGroup> FieldSolver<G> for NullSolver {
    fn name(&self) -> &'static str {
        "none"
    }

    fn step(&self, _grid: &mut Grid<G>, _iter: &CellIterator, _dt: f64) -> Result<(), LatticeError> {
        Ok(())
    }

    fn step_links(
        &self,
        _grid: &mut Grid<G>,
        _iter: &CellIterator,
        _dt: f64,
    ) -> Result<(), LatticeError> {
        Ok(())
    }
}

/// `E_i(x) −= coeff·proj(U_i V_i) + dt·J_i(x)`.
///
/// The staple term is applied first, then the current.
struct ForceUpdate<'a, G: GaugeGroup> {
    view: LinkView<'a, G::Element>,
    current: &'a [G::Algebra],
    coeff: f64,
    dt: f64,
}

impl<G: GaugeGroup> CellAction<G::Algebra> for ForceUpdate<'_, G> {
    fn apply(&self, cell: usize, out: &mut [G::Algebra]) {
        let nd = out.len();
        for (i, e) in out.iter_mut().enumerate() {
            *e -= self.view.link_times_staples(cell, i).proj() * self.coeff;
            *e -= self.current[cell * nd + i] * self.dt;
        }
    }
}

/// `Unext_i(x) = exp(i dt E_i(x)) U_i(x)`.
struct LinkStep<'a, G: GaugeGroup> {
    links: &'a [G::Element],
    e: &'a [G::Algebra],
    dt: f64,
    mode: LinkUpdate,
}

impl<G: GaugeGroup> CellAction<G::Element> for LinkStep<'_, G> {
    fn apply(&self, cell: usize, out: &mut [G::Element]) {
        let nd = out.len();
        for (i, u) in out.iter_mut().enumerate() {
            let k = cell * nd + i;
            let x = self.e[k] * self.dt;
            let w = match self.mode {
                LinkUpdate::Exponential => x.get_link(),
                LinkUpdate::Linearized => x.get_linearized_link(),
            };
            *u = w * self.links[k];
        }
    }
}

/// Magnetic force pass on `E` from the current links.
pub(crate) fn apply_force<G: GaugeGroup>(grid: &mut Grid<G>, iter: &CellIterator, dt: f64) {
    let nd = grid.num_dims();
    let a = grid.spacing();
    let Grid {
        geometry,
        links,
        e,
        j,
        ..
    } = grid;
    let action = ForceUpdate::<G> {
        view: LinkView::new(geometry, links.as_slice()),
        current: j.as_slice(),
        coeff: dt / (a * a),
        dt,
    };
    iter.update_cells(e.as_mut_slice(), nd, geometry.active_mask(), &action);
}

/// Link pass `Unext = exp(i dt E) U`.
pub(crate) fn update_links<G: GaugeGroup>(
    grid: &mut Grid<G>,
    iter: &CellIterator,
    dt: f64,
    mode: LinkUpdate,
) {
    let nd = grid.num_dims();
    let Grid {
        geometry,
        links,
        pending,
        e,
        ..
    } = grid;
    let action = LinkStep::<G> {
        links: links.as_slice(),
        e: e.as_slice(),
        dt,
        mode,
    };
    iter.update_cells(pending.as_mut_slice(), nd, geometry.active_mask(), &action);
}
