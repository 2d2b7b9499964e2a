// SPDX-License-Identifier: AGPL-3.0-only

//! Cell iteration engine: sequential or rayon-parallel sweeps over cells.
//!
//! A sweep hands every active cell its own chunk of an output buffer
//! (`stride` elements per cell, e.g. one entry per direction). Chunks come
//! from `par_chunks_mut`, so each cell is written by exactly one worker
//! and no two workers ever alias. Inputs are captured by shared reference
//! in the action, so a pass can only read the *current* state of
//! neighbouring cells.
//!
//! Reductions fold a local partial sum per worker and add it once to a
//! mutex-guarded accumulator. Results agree with the sequential sum up to
//! floating-point summation order.
//!
//! Every call is fork-join: it returns only after all workers have
//! finished, so consecutive passes never overlap.

use std::sync::{Mutex, PoisonError};

use rayon::prelude::*;

use crate::error::LatticeError;

/// Per-cell update applied during a sweep.
///
/// Implemented by small per-call context structs in the solvers, and by
/// any `Fn(usize, &mut [T]) + Sync` closure.
pub trait CellAction<T>: Sync {
    /// Update the output chunk of `cell`.
    fn apply(&self, cell: usize, out: &mut [T]);
}

impl<T, F> CellAction<T> for F
where
    F: Fn(usize, &mut [T]) + Sync,
{
    fn apply(&self, cell: usize, out: &mut [T]) {
        self(cell, out);
    }
}

/// Sequential or thread-pool backed cell iteration.
#[derive(Debug, Default)]
pub enum CellIterator {
    /// Single-threaded, in cell order.
    #[default]
    Sequential,
    /// Parallel over a dedicated rayon pool.
    Parallel(rayon::ThreadPool),
}

impl CellIterator {
    /// `threads ≤ 1` gives the sequential iterator, otherwise a pool with
    /// `threads` workers.
    ///
    /// # Errors
    ///
    /// Returns [`LatticeError::ThreadPool`] if rayon cannot spawn the pool.
    pub fn with_threads(threads: usize) -> Result<Self, LatticeError> {
        if threads <= 1 {
            return Ok(Self::Sequential);
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("lattice-worker-{i}"))
            .build()?;
        Ok(Self::Parallel(pool))
    }

    /// Number of workers (1 for sequential).
    #[must_use]
    pub fn threads(&self) -> usize {
        match self {
            Self::Sequential => 1,
            Self::Parallel(pool) => pool.current_num_threads(),
        }
    }

    /// Apply `action` to every cell with `active[cell] == true`.
    ///
    /// `data` is split into consecutive chunks of `stride` elements, chunk
    /// `c` belonging to cell `c`. Inactive chunks are left untouched.
    pub fn update_cells<T, A>(&self, data: &mut [T], stride: usize, active: &[bool], action: &A)
    where
        T: Send,
        A: CellAction<T> + ?Sized,
    {
        debug_assert_eq!(data.len(), stride * active.len());
        match self {
            Self::Sequential => {
                for (cell, chunk) in data.chunks_mut(stride).enumerate() {
                    if active[cell] {
                        action.apply(cell, chunk);
                    }
                }
            }
            Self::Parallel(pool) => pool.install(|| {
                data.par_chunks_mut(stride)
                    .enumerate()
                    .filter(|(cell, _)| active[*cell])
                    .for_each(|(cell, chunk)| action.apply(cell, chunk));
            }),
        }
    }

    /// `Σ f(cell)` over cells with `mask[cell] == true`.
    pub fn sum_cells<F>(&self, mask: &[bool], f: F) -> f64
    where
        F: Fn(usize) -> f64 + Sync,
    {
        match self {
            Self::Sequential => (0..mask.len()).filter(|&c| mask[c]).map(&f).sum(),
            Self::Parallel(pool) => {
                let total = Mutex::new(0.0_f64);
                pool.install(|| {
                    (0..mask.len())
                        .into_par_iter()
                        .filter(|&c| mask[c])
                        .fold(|| 0.0_f64, |acc, c| acc + f(c))
                        .for_each(|partial| {
                            let mut guard = total.lock().unwrap_or_else(PoisonError::into_inner);
                            *guard += partial;
                        });
                });
                total.into_inner().unwrap_or_else(PoisonError::into_inner)
            }
        }
    }
}
