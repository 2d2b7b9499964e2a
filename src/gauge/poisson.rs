// SPDX-License-Identifier: AGPL-3.0-only

//! Inverse lattice Laplacian on a periodic grid via N-dimensional FFT.
//!
//! Solves `−Δ ω = s` with the nearest-neighbour Laplacian. In momentum
//! space this is a multiplication by
//!
//!   −0.5 / (Σ_i cos(2π k_i / N_i) − D)
//!
//! with the zero mode dropped (the source is assumed to have zero mean,
//! which holds for any lattice divergence).

use std::f64::consts::PI;
use std::fmt;
use std::sync::Arc;

use num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::error::LatticeError;
use crate::lattice::grid::{Boundary, Geometry};

/// Narrow Poisson-solver interface used by gauge fixing.
pub trait PoissonSolver: Send + Sync {
    /// `ω` with `−Δ ω = source`, zero mode removed.
    ///
    /// # Errors
    ///
    /// [`LatticeError::InvalidDimensions`] if `source` does not have one
    /// entry per cell.
    fn solve(&self, source: &[f64]) -> Result<Vec<f64>, LatticeError>;
}

struct AxisPlan {
    len: usize,
    stride: usize,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
}

/// FFT-based periodic Poisson solver.
pub struct FftPoisson {
    num_cells: usize,
    axes: Vec<AxisPlan>,
    multiplier: Vec<f64>,
}

impl fmt::Debug for FftPoisson {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FftPoisson")
            .field("num_cells", &self.num_cells)
            .field("dims", &self.axes.iter().map(|a| a.len).collect::<Vec<_>>())
            .finish()
    }
}

impl FftPoisson {
    /// Plan the transforms for `geometry`.
    ///
    /// # Errors
    ///
    /// [`LatticeError::InvalidParameter`] if any dimension has a fixed
    /// boundary: the FFT solution is periodic by construction.
    pub fn new(geometry: &Geometry) -> Result<Self, LatticeError> {
        if geometry.boundaries().iter().any(|b| *b != Boundary::Periodic) {
            return Err(LatticeError::InvalidParameter(
                "FFT Poisson solver needs periodic boundaries in every dimension".into(),
            ));
        }
        let dims = geometry.dims();
        let nd = dims.len();
        let mut planner = FftPlanner::<f64>::new();

        let mut axes = Vec::with_capacity(nd);
        let mut stride = 1;
        for d in (0..nd).rev() {
            axes.push(AxisPlan {
                len: dims[d],
                stride,
                forward: planner.plan_fft_forward(dims[d]),
                inverse: planner.plan_fft_inverse(dims[d]),
            });
            stride *= dims[d];
        }
        axes.reverse();

        let num_cells = geometry.num_cells();
        let multiplier = (0..num_cells)
            .map(|cell| {
                let cos_sum: f64 = (0..nd)
                    .map(|d| {
                        let k = geometry.coordinate(cell, d) as f64;
                        (2.0 * PI * k / dims[d] as f64).cos()
                    })
                    .sum();
                if cell == 0 {
                    0.0
                } else {
                    -0.5 / (cos_sum - nd as f64)
                }
            })
            .collect();

        Ok(Self {
            num_cells,
            axes,
            multiplier,
        })
    }

    fn transform(&self, data: &mut [Complex<f64>], inverse: bool) {
        let mut line = Vec::new();
        for axis in &self.axes {
            let fft = if inverse { &axis.inverse } else { &axis.forward };
            line.resize(axis.len, Complex::new(0.0, 0.0));
            let block = axis.len * axis.stride;
            for start in (0..self.num_cells).step_by(block) {
                for offset in 0..axis.stride {
                    let base = start + offset;
                    for (t, z) in line.iter_mut().enumerate() {
                        *z = data[base + t * axis.stride];
                    }
                    fft.process(&mut line);
                    for (t, z) in line.iter().enumerate() {
                        data[base + t * axis.stride] = *z;
                    }
                }
            }
        }
    }
}

impl PoissonSolver for FftPoisson {
    fn solve(&self, source: &[f64]) -> Result<Vec<f64>, LatticeError> {
        if source.len() != self.num_cells {
            return Err(LatticeError::InvalidDimensions(format!(
                "Poisson source has {} entries, lattice has {} cells",
                source.len(),
                self.num_cells
            )));
        }
        let mut data: Vec<Complex<f64>> = source.iter().map(|&s| Complex::new(s, 0.0)).collect();
        self.transform(&mut data, false);
        for (z, m) in data.iter_mut().zip(&self.multiplier) {
            *z *= *m;
        }
        self.transform(&mut data, true);
        let norm = 1.0 / self.num_cells as f64;
        Ok(data.iter().map(|z| z.re * norm).collect())
    }
}
