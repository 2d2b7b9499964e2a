// SPDX-License-Identifier: AGPL-3.0-only

//! Gauge transformations, Coulomb gauge fixing and Gauss-law restoration.
//!
//! A gauge transformation `g(x)` acts on the lattice as
//!
//!   U_i(x) → g(x) U_i(x) g(x+i)†
//!   E_i(x) → g(x) E_i(x) g(x)†
//!
//! (and likewise on `Unext`, `J`, `ρ`, `A0`). Plaquette traces, the field
//! energy and the Gauss violation are invariant under it.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `poisson` | FFT inverse lattice Laplacian (rustfft) |
//! | `coulomb` | Iterative Coulomb gauge fixing |
//! | `gauss` | Damped gradient restoration of the Gauss constraint |

/// Iterative Coulomb gauge fixing.
pub mod coulomb;
/// Gauss-constraint restoration.
pub mod gauss;
/// Periodic Poisson solver service.
pub mod poisson;

use crate::error::LatticeError;
use crate::lattice::constants::cell_seed;
use crate::lattice::grid::{Geometry, Grid};
use crate::lattice::group::{AlgebraElement, GaugeGroup, GroupElement};
use crate::lattice::iterator::{CellAction, CellIterator};

/// One group element per cell.
#[derive(Debug)]
pub struct GaugeTransformation<G: GaugeGroup> {
    elements: Vec<G::Element>,
}

impl<G: GaugeGroup> Clone for GaugeTransformation<G> {
    fn clone(&self) -> Self {
        Self {
            elements: self.elements.clone(),
        }
    }
}

impl<G: GaugeGroup> GaugeTransformation<G> {
    /// `g(x) = 1`.
    #[must_use]
    pub fn identity(num_cells: usize) -> Self {
        Self {
            elements: vec![G::Element::identity(); num_cells],
        }
    }

    #[must_use]
    pub fn from_elements(elements: Vec<G::Element>) -> Self {
        Self { elements }
    }

    /// `g(x) = exp(i ω(x))` for an algebra element per cell.
    #[must_use]
    pub fn from_algebra(omega: &[G::Algebra]) -> Self {
        Self {
            elements: omega.iter().map(AlgebraElement::get_link).collect(),
        }
    }

    /// Random `g(x) = exp(i X(x))` with Gaussian coefficients of width
    /// `amplitude`. Each cell draws from its own seeded stream, so the
    /// result does not depend on the iteration order.
    #[must_use]
    pub fn random(geometry: &Geometry, amplitude: f64, seed: u64) -> Self {
        let elements = (0..geometry.num_cells())
            .map(|cell| {
                let mut s = cell_seed(seed, cell);
                G::Algebra::random(&mut s, amplitude).get_link()
            })
            .collect();
        Self { elements }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// `g(x)`.
    #[must_use]
    pub fn get(&self, cell: usize) -> G::Element {
        self.elements[cell]
    }

    /// Transform every cell of `grid`, including inactive ones.
    ///
    /// # Errors
    ///
    /// [`LatticeError::InvalidDimensions`] if the transformation was built
    /// for a different number of cells.
    pub fn apply(&self, grid: &mut Grid<G>, iter: &CellIterator) -> Result<(), LatticeError> {
        if self.elements.len() != grid.num_cells() {
            return Err(LatticeError::InvalidDimensions(format!(
                "gauge transformation has {} cells, grid has {}",
                self.elements.len(),
                grid.num_cells()
            )));
        }
        let nd = grid.num_dims();
        let all = vec![true; grid.num_cells()];
        let Grid {
            geometry,
            links,
            pending,
            e,
            j,
            rho,
            a0,
        } = grid;

        let transport = LinkTransform::<G> {
            geometry,
            g: &self.elements,
        };
        iter.update_cells(links.as_mut_slice(), nd, &all, &transport);
        iter.update_cells(pending.as_mut_slice(), nd, &all, &transport);

        let rotate = |cell: usize, out: &mut [G::Algebra]| {
            let g = self.elements[cell];
            for x in out.iter_mut() {
                x.act_assign(&g);
            }
        };
        iter.update_cells(e.as_mut_slice(), nd, &all, &rotate);
        iter.update_cells(j.as_mut_slice(), nd, &all, &rotate);
        iter.update_cells(rho.as_mut_slice(), 1, &all, &rotate);
        iter.update_cells(a0.as_mut_slice(), 1, &all, &rotate);
        Ok(())
    }
}

/// `U_i(x) → g(x) U_i(x) g(x+i)†`.
struct LinkTransform<'a, G: GaugeGroup> {
    geometry: &'a Geometry,
    g: &'a [G::Element],
}

impl<G: GaugeGroup> CellAction<G::Element> for LinkTransform<'_, G> {
    fn apply(&self, cell: usize, out: &mut [G::Element]) {
        let left = self.g[cell];
        for (i, u) in out.iter_mut().enumerate() {
            let right = self.g[self.geometry.shift(cell, i, 1)].adjoint();
            *u = left * *u * right;
        }
    }
}
