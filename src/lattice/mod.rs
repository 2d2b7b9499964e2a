// SPDX-License-Identifier: AGPL-3.0-only

//! Lattice core: SU(2)/SU(3) gauge links and electric fields on a grid.
//!
//! Real-time classical Yang-Mills evolution as used by Color Glass
//! Condensate particle-in-cell codes:
//!
//! | Component | Lattice object |
//! |-----------|----------------|
//! | Gauge potential | links `U_i(x) = exp(i a g A_i(x))` |
//! | Conjugate momentum | electric field `E_i(x)` (algebra element) |
//! | Field strength | plaquettes `P_ij(x)` |
//! | Force | link × staple sum, projected to the algebra |
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `complex_f64` | Complex f64 arithmetic |
//! | `constants` | LCG PRNG, supported colors, division guard |
//! | `group` | Algebra/group traits and the `Su2`/`Su3` markers |
//! | `su2` | SU(2) quaternion links, su(2) algebra |
//! | `su3` | SU(3) 3×3 links, su(3) Gell-Mann algebra |
//! | `su3_exp` | SU(3) exponential and logarithm maps |
//! | `grid` | Geometry, link buffers, plaquettes, staples, Gauss law |
//! | `iterator` | Sequential / rayon cell sweeps and reductions |
//! | `energy` | Electric and magnetic field energy |
//!
//! # References
//!
//! - Kogut & Susskind, PRD 11, 395 (1975): Hamiltonian lattice gauge theory
//! - Krasnitz & Venugopalan, Nucl. Phys. B 557, 237 (1999): classical
//!   Yang-Mills on the lattice for heavy-ion collisions
//! - Gattringer & Lang, "Quantum Chromodynamics on the Lattice" (2010)

/// Complex f64 arithmetic (re, im).
pub mod complex_f64;
/// LCG PRNG, lattice constants, and shared numerical guards.
pub mod constants;
/// Electric and magnetic field energy.
pub mod energy;
/// D-dimensional grid: link buffers, fields, plaquettes, Gauss constraint.
pub mod grid;
/// Algebra/group element traits and gauge-group markers.
pub mod group;
/// Sequential and rayon-parallel cell iteration.
pub mod iterator;
/// SU(2) links and su(2) algebra elements.
pub mod su2;
/// SU(3) 3x3 complex matrix operations and su(3) algebra elements.
pub mod su3;
mod su3_exp;
