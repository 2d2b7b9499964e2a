// SPDX-License-Identifier: AGPL-3.0-only

//! D-dimensional lattice of gauge links and chromo-electric fields.
//!
//! Each cell `x` carries, per spatial direction `i`:
//!
//! | Field | Type | Meaning |
//! |-------|------|---------|
//! | `U_i(x)` | group | current link (`CurrentLinks`) |
//! | `Unext_i(x)` | group | link after the pending time step (`PendingLinks`) |
//! | `E_i(x)` | algebra | electric field, stored as `g·a_s·E` |
//! | `J_i(x)` | algebra | color current |
//!
//! and per cell the charge density `ρ(x)` and the temporal potential
//! `A0(x)` used by the Lorenz-gauge solver.
//!
//! Cells are laid out row-major (last dimension fastest); `cell·D + i`
//! indexes per-direction buffers. Neighbour lookups always wrap
//! periodically. A dimension with [`Boundary::Fixed`] instead marks its two
//! edge layers inactive (never evolved) and the layer whose forward
//! neighbour wraps as non-evaluatable (excluded from energy and Gauss
//! sums).
//!
//! Solvers write `Unext` only. [`Grid::commit`] then promotes the pending
//! links in one step, so no pass ever observes a mix of old and new links.

use serde::{Deserialize, Serialize};

use super::complex_f64::Complex64;
use super::group::{AlgebraElement, GaugeGroup, GroupElement};
use super::iterator::CellIterator;
use crate::error::LatticeError;

/// Boundary condition of one lattice dimension.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Boundary {
    /// Wrap around.
    #[default]
    Periodic,
    /// Edge cells are frozen padding.
    Fixed,
}

/// Shape, spacing and cell masks of a lattice.
#[derive(Clone, Debug)]
pub struct Geometry {
    dims: Vec<usize>,
    strides: Vec<usize>,
    boundaries: Vec<Boundary>,
    num_cells: usize,
    spacing: f64,
    coupling: f64,
    active: Vec<bool>,
    evaluatable: Vec<bool>,
}

impl Geometry {
    /// # Errors
    ///
    /// [`LatticeError::InvalidDimensions`] for empty or zero extents or a
    /// boundary list of the wrong length, [`LatticeError::InvalidParameter`]
    /// for a non-positive spacing or coupling.
    pub fn new(
        dims: &[usize],
        boundaries: &[Boundary],
        spacing: f64,
        coupling: f64,
    ) -> Result<Self, LatticeError> {
        if dims.is_empty() {
            return Err(LatticeError::InvalidDimensions(
                "at least one dimension required".into(),
            ));
        }
        if let Some(d) = dims.iter().position(|&n| n == 0) {
            return Err(LatticeError::InvalidDimensions(format!(
                "dimension {d} has zero extent"
            )));
        }
        if boundaries.len() != dims.len() {
            return Err(LatticeError::InvalidDimensions(format!(
                "{} boundaries given for {} dimensions",
                boundaries.len(),
                dims.len()
            )));
        }
        if !(spacing > 0.0) || !(coupling > 0.0) {
            return Err(LatticeError::InvalidParameter(format!(
                "spacing ({spacing}) and coupling ({coupling}) must be positive"
            )));
        }

        let mut strides = vec![1; dims.len()];
        for d in (0..dims.len() - 1).rev() {
            strides[d] = strides[d + 1] * dims[d + 1];
        }
        let num_cells = dims.iter().product();

        let mut geometry = Self {
            dims: dims.to_vec(),
            strides,
            boundaries: boundaries.to_vec(),
            num_cells,
            spacing,
            coupling,
            active: Vec::new(),
            evaluatable: Vec::new(),
        };
        let (active, evaluatable) = (0..num_cells)
            .map(|cell| geometry.classify(cell))
            .unzip();
        geometry.active = active;
        geometry.evaluatable = evaluatable;
        Ok(geometry)
    }

    fn classify(&self, cell: usize) -> (bool, bool) {
        let mut active = true;
        let mut evaluatable = true;
        for d in 0..self.dims.len() {
            if self.boundaries[d] == Boundary::Fixed {
                let p = self.coordinate(cell, d);
                let n = self.dims[d];
                if p == 0 || p + 1 >= n {
                    active = false;
                }
                if p + 1 >= n {
                    evaluatable = false;
                }
            }
        }
        (active, evaluatable)
    }

    /// Number of cells.
    #[must_use]
    pub const fn num_cells(&self) -> usize {
        self.num_cells
    }

    /// Number of dimensions D.
    #[must_use]
    pub fn num_dims(&self) -> usize {
        self.dims.len()
    }

    /// Extent per dimension.
    #[must_use]
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    #[must_use]
    pub fn boundaries(&self) -> &[Boundary] {
        &self.boundaries
    }

    /// Lattice spacing `a_s`.
    #[must_use]
    pub const fn spacing(&self) -> f64 {
        self.spacing
    }

    /// Gauge coupling g.
    #[must_use]
    pub const fn coupling(&self) -> f64 {
        self.coupling
    }

    /// Flat index of a coordinate; every component wraps periodically.
    ///
    /// # Errors
    ///
    /// [`LatticeError::InvalidDimensions`] if `pos.len() != D`.
    pub fn cell_index(&self, pos: &[isize]) -> Result<usize, LatticeError> {
        if pos.len() != self.dims.len() {
            return Err(LatticeError::InvalidDimensions(format!(
                "coordinate has {} components, lattice has {} dimensions",
                pos.len(),
                self.dims.len()
            )));
        }
        Ok(pos
            .iter()
            .zip(&self.dims)
            .zip(&self.strides)
            .map(|((&p, &n), &s)| p.rem_euclid(n as isize) as usize * s)
            .sum())
    }

    /// Coordinate of a flat index.
    #[must_use]
    pub fn cell_pos(&self, index: usize) -> Vec<usize> {
        (0..self.dims.len())
            .map(|d| self.coordinate(index, d))
            .collect()
    }

    /// Component `dir` of the coordinate of `index`.
    #[inline]
    #[must_use]
    pub fn coordinate(&self, index: usize, dir: usize) -> usize {
        (index / self.strides[dir]) % self.dims[dir]
    }

    /// Neighbour `steps` cells away along `dir`, wrapping periodically.
    #[inline]
    #[must_use]
    pub fn shift(&self, index: usize, dir: usize, steps: isize) -> usize {
        let n = self.dims[dir] as isize;
        let p = self.coordinate(index, dir) as isize;
        let q = (p + steps).rem_euclid(n);
        (index as isize + (q - p) * self.strides[dir] as isize) as usize
    }

    /// Whether the cell is evolved by the solvers.
    #[must_use]
    pub fn is_active(&self, index: usize) -> bool {
        self.active[index]
    }

    /// Whether the cell contributes to energy and Gauss sums.
    #[must_use]
    pub fn is_evaluatable(&self, index: usize) -> bool {
        self.evaluatable[index]
    }

    /// Mask of active cells.
    #[must_use]
    pub fn active_mask(&self) -> &[bool] {
        &self.active
    }

    /// Mask of evaluatable cells.
    #[must_use]
    pub fn evaluatable_mask(&self) -> &[bool] {
        &self.evaluatable
    }
}

/// Authoritative links `U` of the current time slice.
#[derive(Clone, Debug)]
pub struct CurrentLinks<U>(Vec<U>);

/// Links `Unext` written by a solver step, promoted by [`Grid::commit`].
#[derive(Clone, Debug)]
pub struct PendingLinks<U>(Vec<U>);

impl<U> CurrentLinks<U> {
    #[must_use]
    pub fn as_slice(&self) -> &[U] {
        &self.0
    }

    pub fn as_mut_slice(&mut self) -> &mut [U] {
        &mut self.0
    }
}

impl<U> PendingLinks<U> {
    #[must_use]
    pub fn as_slice(&self) -> &[U] {
        &self.0
    }

    pub fn as_mut_slice(&mut self) -> &mut [U] {
        &mut self.0
    }
}

/// Read-only view of one link buffer with the plaquette geometry.
#[derive(Clone, Copy)]
pub struct LinkView<'a, U> {
    geometry: &'a Geometry,
    links: &'a [U],
}

impl<'a, U: GroupElement> LinkView<'a, U> {
    pub fn new(geometry: &'a Geometry, links: &'a [U]) -> Self {
        Self { geometry, links }
    }

    /// `U_dir(x)`.
    #[inline]
    #[must_use]
    pub fn link(&self, index: usize, dir: usize) -> U {
        self.links[index * self.geometry.num_dims() + dir]
    }

    /// `U_dir(x)` for `orient = +1`, `U_dir(x − dir)†` for `orient = −1`.
    #[inline]
    #[must_use]
    pub fn oriented_link(&self, index: usize, dir: usize, orient: isize) -> U {
        if orient >= 0 {
            self.link(index, dir)
        } else {
            self.link(self.geometry.shift(index, dir, -1), dir).adjoint()
        }
    }

    /// Ordered product of the four links around the `(i, j)` square
    /// starting at `x`, walking `orient_i` along `i` first.
    #[must_use]
    pub fn plaquette(&self, index: usize, i: usize, j: usize, orient_i: isize, orient_j: isize) -> U {
        let g = self.geometry;
        let x_i = g.shift(index, i, orient_i);
        let x_ij = g.shift(x_i, j, orient_j);
        let x_j = g.shift(index, j, orient_j);

        self.oriented_link(index, i, orient_i)
            * self.oriented_link(x_i, j, orient_j)
            * self.oriented_link(x_ij, i, -orient_i)
            * self.oriented_link(x_j, j, -orient_j)
    }

    /// Sum of the `2(D−1)` staples completing `U_dir(x)` to a plaquette.
    ///
    /// For each `j ≠ dir`:
    ///   upper: `U_j(x+i) U_i(x+j)† U_j(x)†`
    ///   lower: `U_j(x+i−j)† U_i(x−j)† U_j(x−j)`
    #[must_use]
    pub fn staple_sum(&self, index: usize, dir: usize) -> U {
        let g = self.geometry;
        let x_i = g.shift(index, dir, 1);
        let mut s = U::zero();
        for j in 0..g.num_dims() {
            if j == dir {
                continue;
            }
            let x_j = g.shift(index, j, 1);
            let x_i_bj = g.shift(x_i, j, -1);
            let x_bj = g.shift(index, j, -1);

            s += self.link(x_i, j) * self.link(x_j, dir).adjoint() * self.link(index, j).adjoint();
            s += self.link(x_i_bj, j).adjoint() * self.link(x_bj, dir).adjoint() * self.link(x_bj, j);
        }
        s
    }

    /// `U_i(x) V_i(x)`: sum of all plaquettes through the link.
    #[must_use]
    pub fn link_times_staples(&self, index: usize, dir: usize) -> U {
        self.link(index, dir) * self.staple_sum(index, dir)
    }
}

/// Lattice state for gauge group `G`.
#[derive(Debug)]
pub struct Grid<G: GaugeGroup> {
    pub(crate) geometry: Geometry,
    pub(crate) links: CurrentLinks<G::Element>,
    pub(crate) pending: PendingLinks<G::Element>,
    pub(crate) e: Vec<G::Algebra>,
    pub(crate) j: Vec<G::Algebra>,
    pub(crate) rho: Vec<G::Algebra>,
    pub(crate) a0: Vec<G::Algebra>,
}

impl<G: GaugeGroup> Clone for Grid<G> {
    fn clone(&self) -> Self {
        Self {
            geometry: self.geometry.clone(),
            links: self.links.clone(),
            pending: self.pending.clone(),
            e: self.e.clone(),
            j: self.j.clone(),
            rho: self.rho.clone(),
            a0: self.a0.clone(),
        }
    }
}

impl<G: GaugeGroup> Grid<G> {
    /// Periodic lattice in the vacuum state.
    ///
    /// # Errors
    ///
    /// See [`Geometry::new`].
    pub fn new(dims: &[usize], spacing: f64, coupling: f64) -> Result<Self, LatticeError> {
        let boundaries = vec![Boundary::Periodic; dims.len()];
        Self::with_boundaries(dims, &boundaries, spacing, coupling)
    }

    /// Lattice with explicit per-dimension boundaries, in the vacuum state.
    ///
    /// # Errors
    ///
    /// See [`Geometry::new`].
    pub fn with_boundaries(
        dims: &[usize],
        boundaries: &[Boundary],
        spacing: f64,
        coupling: f64,
    ) -> Result<Self, LatticeError> {
        Ok(Self::from_geometry(Geometry::new(
            dims, boundaries, spacing, coupling,
        )?))
    }

    /// Vacuum lattice on an existing geometry.
    #[must_use]
    pub fn from_geometry(geometry: Geometry) -> Self {
        let n = geometry.num_cells();
        let nd = n * geometry.num_dims();
        Self {
            geometry,
            links: CurrentLinks(vec![G::Element::identity(); nd]),
            pending: PendingLinks(vec![G::Element::identity(); nd]),
            e: vec![G::Algebra::zero(); nd],
            j: vec![G::Algebra::zero(); nd],
            rho: vec![G::Algebra::zero(); n],
            a0: vec![G::Algebra::zero(); n],
        }
    }

    /// Unit links everywhere, all fields and sources zero.
    pub fn set_vacuum(&mut self) {
        self.links.0.fill(G::Element::identity());
        self.pending.0.fill(G::Element::identity());
        self.e.fill(G::Algebra::zero());
        self.j.fill(G::Algebra::zero());
        self.rho.fill(G::Algebra::zero());
        self.a0.fill(G::Algebra::zero());
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    #[must_use]
    pub const fn num_cells(&self) -> usize {
        self.geometry.num_cells()
    }

    #[must_use]
    pub fn num_dims(&self) -> usize {
        self.geometry.num_dims()
    }

    #[must_use]
    pub fn dims(&self) -> &[usize] {
        self.geometry.dims()
    }

    #[must_use]
    pub const fn spacing(&self) -> f64 {
        self.geometry.spacing()
    }

    #[must_use]
    pub const fn coupling(&self) -> f64 {
        self.geometry.coupling()
    }

    /// See [`Geometry::cell_index`].
    ///
    /// # Errors
    ///
    /// [`LatticeError::InvalidDimensions`] on a coordinate of wrong length.
    pub fn cell_index(&self, pos: &[isize]) -> Result<usize, LatticeError> {
        self.geometry.cell_index(pos)
    }

    #[must_use]
    pub fn cell_pos(&self, index: usize) -> Vec<usize> {
        self.geometry.cell_pos(index)
    }

    #[must_use]
    pub fn shift(&self, index: usize, dir: usize, steps: isize) -> usize {
        self.geometry.shift(index, dir, steps)
    }

    #[must_use]
    pub fn is_active(&self, index: usize) -> bool {
        self.geometry.is_active(index)
    }

    #[must_use]
    pub fn is_evaluatable(&self, index: usize) -> bool {
        self.geometry.is_evaluatable(index)
    }

    #[inline]
    fn slot(&self, index: usize, dir: usize) -> usize {
        index * self.num_dims() + dir
    }

    #[must_use]
    pub fn e(&self, index: usize, dir: usize) -> G::Algebra {
        self.e[self.slot(index, dir)]
    }

    pub fn set_e(&mut self, index: usize, dir: usize, value: G::Algebra) {
        let s = self.slot(index, dir);
        self.e[s] = value;
    }

    #[must_use]
    pub fn u(&self, index: usize, dir: usize) -> G::Element {
        self.links.0[self.slot(index, dir)]
    }

    pub fn set_u(&mut self, index: usize, dir: usize, value: G::Element) {
        let s = self.slot(index, dir);
        self.links.0[s] = value;
    }

    #[must_use]
    pub fn u_next(&self, index: usize, dir: usize) -> G::Element {
        self.pending.0[self.slot(index, dir)]
    }

    pub fn set_u_next(&mut self, index: usize, dir: usize, value: G::Element) {
        let s = self.slot(index, dir);
        self.pending.0[s] = value;
    }

    #[must_use]
    pub fn j(&self, index: usize, dir: usize) -> G::Algebra {
        self.j[self.slot(index, dir)]
    }

    pub fn set_j(&mut self, index: usize, dir: usize, value: G::Algebra) {
        let s = self.slot(index, dir);
        self.j[s] = value;
    }

    #[must_use]
    pub fn rho(&self, index: usize) -> G::Algebra {
        self.rho[index]
    }

    pub fn set_rho(&mut self, index: usize, value: G::Algebra) {
        self.rho[index] = value;
    }

    #[must_use]
    pub fn a0(&self, index: usize) -> G::Algebra {
        self.a0[index]
    }

    pub fn set_a0(&mut self, index: usize, value: G::Algebra) {
        self.a0[index] = value;
    }

    /// Electric field buffer, `cell·D + dir`.
    #[must_use]
    pub fn e_field(&self) -> &[G::Algebra] {
        &self.e
    }

    #[must_use]
    pub fn links(&self) -> &CurrentLinks<G::Element> {
        &self.links
    }

    #[must_use]
    pub fn pending_links(&self) -> &PendingLinks<G::Element> {
        &self.pending
    }

    /// Zero the charge density.
    pub fn reset_charges(&mut self) {
        self.rho.fill(G::Algebra::zero());
    }

    /// Zero the color current.
    pub fn reset_currents(&mut self) {
        self.j.fill(G::Algebra::zero());
    }

    /// Promote `Unext` to `U` and start the next step from the committed
    /// links.
    pub fn commit(&mut self) {
        std::mem::swap(&mut self.links.0, &mut self.pending.0);
        self.pending.0.copy_from_slice(&self.links.0);
    }

    /// Plaquette view of the current links.
    #[must_use]
    pub fn current_view(&self) -> LinkView<'_, G::Element> {
        LinkView::new(&self.geometry, &self.links.0)
    }

    /// Plaquette view of the pending links.
    #[must_use]
    pub fn pending_view(&self) -> LinkView<'_, G::Element> {
        LinkView::new(&self.geometry, &self.pending.0)
    }

    /// See [`LinkView::plaquette`] (current links).
    #[must_use]
    pub fn plaquette(
        &self,
        index: usize,
        i: usize,
        j: usize,
        orient_i: isize,
        orient_j: isize,
    ) -> G::Element {
        self.current_view().plaquette(index, i, j, orient_i, orient_j)
    }

    /// See [`LinkView::staple_sum`] (current links).
    #[must_use]
    pub fn staple_sum(&self, index: usize, dir: usize) -> G::Element {
        self.current_view().staple_sum(index, dir)
    }

    /// `G(x) = Σ_i [E_i(x) − U_i(x−i)† E_i(x−i) U_i(x−i)] − ρ(x)`.
    #[must_use]
    pub fn gauss_constraint(&self, index: usize) -> G::Algebra {
        gauss_constraint::<G>(&self.geometry, &self.links.0, &self.e, &self.rho, index)
    }

    /// `G(x)²`.
    #[must_use]
    pub fn gauss_violation(&self, index: usize) -> f64 {
        self.gauss_constraint(index).square()
    }

    /// `Σ_x G(x)²` over active, evaluatable cells.
    #[must_use]
    pub fn total_gauss_violation(&self, iter: &CellIterator) -> f64 {
        iter.sum_cells(self.geometry.evaluatable_mask(), |cell| {
            if self.geometry.is_active(cell) {
                self.gauss_violation(cell)
            } else {
                0.0
            }
        })
    }

    /// Average `Re tr P / N` over all evaluatable plaquettes.
    #[must_use]
    pub fn average_plaquette(&self, iter: &CellIterator) -> f64 {
        let nd = self.num_dims();
        if nd < 2 {
            return 1.0;
        }
        let view = self.current_view();
        let colors = G::COLORS as f64;
        let sum = iter.sum_cells(self.geometry.evaluatable_mask(), |cell| {
            let mut s = 0.0;
            for i in 0..nd {
                for j in (i + 1)..nd {
                    s += view.plaquette(cell, i, j, 1, 1).re_trace() / colors;
                }
            }
            s
        });
        let count = self
            .geometry
            .evaluatable_mask()
            .iter()
            .filter(|&&b| b)
            .count()
            * nd
            * (nd - 1)
            / 2;
        sum / count.max(1) as f64
    }

    /// Largest `‖U U† − 1‖` over all current links.
    #[must_use]
    pub fn max_unitarity_deviation(&self) -> f64 {
        self.links
            .0
            .iter()
            .map(GroupElement::unitarity_deviation)
            .fold(0.0, f64::max)
    }

    /// Largest `|det U − 1|` over all current links.
    #[must_use]
    pub fn max_det_deviation(&self) -> f64 {
        self.links
            .0
            .iter()
            .map(|u| (u.det() - Complex64::ONE).abs())
            .fold(0.0, f64::max)
    }

    /// Project every current and pending link back onto the group.
    pub fn reunitarize(&mut self) {
        for u in self.links.0.iter_mut().chain(self.pending.0.iter_mut()) {
            *u = u.reunitarize();
        }
    }
}

pub(crate) fn gauss_constraint<G: GaugeGroup>(
    geometry: &Geometry,
    links: &[G::Element],
    e: &[G::Algebra],
    rho: &[G::Algebra],
    index: usize,
) -> G::Algebra {
    let nd = geometry.num_dims();
    let mut g = -rho[index];
    for i in 0..nd {
        let back = geometry.shift(index, i, -1);
        let u = links[back * nd + i];
        g += e[index * nd + i];
        g -= e[back * nd + i].act(&u.adjoint());
    }
    g
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::group::{Su2, Su3};

    fn random_links<G: GaugeGroup>(grid: &mut Grid<G>, seed: u64, amplitude: f64) {
        let mut s = seed;
        for cell in 0..grid.num_cells() {
            for d in 0..grid.num_dims() {
                let u = G::Algebra::random(&mut s, amplitude).get_link();
                grid.set_u(cell, d, u);
            }
        }
    }

    #[test]
    fn cell_index_round_trip() {
        let grid = Grid::<Su2>::new(&[3, 4, 5], 1.0, 1.0).unwrap();
        for idx in 0..grid.num_cells() {
            let pos: Vec<isize> = grid.cell_pos(idx).iter().map(|&p| p as isize).collect();
            assert_eq!(grid.cell_index(&pos).unwrap(), idx);
        }
    }

    #[test]
    fn row_major_last_dimension_fastest() {
        let grid = Grid::<Su2>::new(&[3, 4, 5], 1.0, 1.0).unwrap();
        assert_eq!(grid.cell_index(&[0, 0, 1]).unwrap(), 1);
        assert_eq!(grid.cell_index(&[0, 1, 0]).unwrap(), 5);
        assert_eq!(grid.cell_index(&[1, 0, 0]).unwrap(), 20);
    }

    #[test]
    fn coordinates_wrap() {
        let grid = Grid::<Su2>::new(&[3, 4, 5], 1.0, 1.0).unwrap();
        assert_eq!(
            grid.cell_index(&[-1, 4, 7]).unwrap(),
            grid.cell_index(&[2, 0, 2]).unwrap()
        );
        assert!(grid.cell_index(&[0, 0]).is_err());
    }

    #[test]
    fn shift_wraps_and_inverts() {
        let grid = Grid::<Su2>::new(&[3, 4, 5], 1.0, 1.0).unwrap();
        for idx in 0..grid.num_cells() {
            for d in 0..3 {
                assert_eq!(grid.shift(grid.shift(idx, d, 1), d, -1), idx);
                assert_eq!(grid.shift(idx, d, grid.dims()[d] as isize), idx);
                assert_eq!(grid.shift(grid.shift(idx, d, 2), d, -2), idx);
            }
        }
        let corner = grid.cell_index(&[2, 3, 4]).unwrap();
        assert_eq!(grid.shift(corner, 2, 1), grid.cell_index(&[2, 3, 0]).unwrap());
    }

    #[test]
    fn rejects_bad_dimensions() {
        assert!(matches!(
            Grid::<Su2>::new(&[], 1.0, 1.0),
            Err(LatticeError::InvalidDimensions(_))
        ));
        assert!(matches!(
            Grid::<Su2>::new(&[4, 0], 1.0, 1.0),
            Err(LatticeError::InvalidDimensions(_))
        ));
        assert!(matches!(
            Grid::<Su2>::new(&[4, 4], 0.0, 1.0),
            Err(LatticeError::InvalidParameter(_))
        ));
    }

    #[test]
    fn fixed_boundary_masks() {
        let grid =
            Grid::<Su2>::with_boundaries(&[5, 4], &[Boundary::Fixed, Boundary::Periodic], 1.0, 1.0)
                .unwrap();
        for idx in 0..grid.num_cells() {
            let p = grid.cell_pos(idx)[0];
            assert_eq!(grid.is_active(idx), p != 0 && p != 4);
            assert_eq!(grid.is_evaluatable(idx), p != 4);
        }
    }

    #[test]
    fn plaquette_reversed_plane_is_adjoint() {
        let mut grid = Grid::<Su3>::new(&[3, 3, 3], 1.0, 1.0).unwrap();
        random_links(&mut grid, 17, 0.8);
        for idx in [0, 5, 13, 26] {
            for (i, j) in [(0, 1), (1, 2), (0, 2)] {
                for o in [1, -1] {
                    let p = grid.plaquette(idx, i, j, o, o);
                    let q = grid.plaquette(idx, j, i, o, o);
                    assert!((p.adjoint() - q).norm_sq() < 1e-24);
                }
            }
        }
    }

    #[test]
    fn backward_plaquette_shares_trace_with_forward_one() {
        let mut grid = Grid::<Su2>::new(&[4, 4, 4], 1.0, 1.0).unwrap();
        random_links(&mut grid, 3, 1.0);
        for idx in [0, 7, 21, 63] {
            let back = grid.shift(grid.shift(idx, 0, -1), 1, -1);
            let minus = grid.plaquette(idx, 0, 1, -1, -1);
            let plus = grid.plaquette(back, 0, 1, 1, 1);
            assert!((minus.trace() - plus.trace()).abs() < 1e-12);
        }
    }

    #[test]
    fn link_times_staples_sums_plaquettes() {
        let mut grid = Grid::<Su3>::new(&[3, 3, 3], 1.0, 1.0).unwrap();
        random_links(&mut grid, 21, 0.6);
        let view = grid.current_view();
        let idx = 11;
        let i = 1;
        let mut expected = crate::lattice::su3::Su3Matrix::ZERO;
        for j in [0, 2] {
            expected += view.plaquette(idx, i, j, 1, 1);
            expected += view.plaquette(idx, i, j, 1, -1);
        }
        let got = view.link_times_staples(idx, i);
        assert!((got - expected).norm_sq() < 1e-24);
    }

    #[test]
    fn vacuum_has_unit_plaquettes_and_no_violation() {
        let grid = Grid::<Su3>::new(&[3, 3, 3], 1.0, 1.0).unwrap();
        let iter = CellIterator::Sequential;
        assert!((grid.average_plaquette(&iter) - 1.0).abs() < 1e-15);
        assert!(grid.total_gauss_violation(&iter) < 1e-30);
        assert_eq!(grid.staple_sum(0, 0).re_trace(), 12.0);
    }

    #[test]
    fn commit_promotes_pending_links() {
        let mut grid = Grid::<Su2>::new(&[2, 2], 1.0, 1.0).unwrap();
        let mut s = 5;
        let u = <Su2 as GaugeGroup>::Algebra::random(&mut s, 0.5).get_link();
        grid.set_u_next(1, 0, u);
        grid.commit();
        assert_eq!(grid.u(1, 0), u);
        assert_eq!(grid.u_next(1, 0), u);
        assert_eq!(grid.u(0, 0), <Su2 as GaugeGroup>::Element::identity());
    }

    #[test]
    fn single_charge_violates_gauss_law() {
        let mut grid = Grid::<Su2>::new(&[3, 3], 1.0, 1.0).unwrap();
        let q = <Su2 as GaugeGroup>::Algebra::from_components(&[0.0, 0.0, 1.0]);
        grid.set_rho(4, q);
        let iter = CellIterator::Sequential;
        assert!((grid.total_gauss_violation(&iter) - 1.0).abs() < 1e-14);
        grid.reset_charges();
        assert!(grid.total_gauss_violation(&iter) < 1e-30);
    }
}
