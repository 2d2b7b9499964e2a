// SPDX-License-Identifier: AGPL-3.0-only

//! Typed errors for lattice construction, configuration and solvers.
//!
//! Configuration problems (unsupported color count, malformed dimensions)
//! and dimensionality mismatches surface here before any lattice state is
//! touched. Numerical fallbacks (Taylor paths, early exits of iterative
//! schemes) are expected code paths and never produce an error.

use std::fmt;

/// Errors arising from lattice setup, configuration or solver dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum LatticeError {
    /// SU(n) requested for an n other than 2 or 3.
    UnsupportedColors(usize),

    /// Grid dimensions, coordinates or directions are malformed.
    InvalidDimensions(String),

    /// A solver was invoked on a lattice dimensionality it cannot handle.
    DimensionMismatch {
        /// Solver name.
        solver: &'static str,
        /// Number of dimensions the solver needs.
        expected: usize,
        /// Number of dimensions of the grid it got.
        found: usize,
    },

    /// A numerical parameter is outside its admissible range.
    InvalidParameter(String),

    /// The rayon worker pool could not be built.
    ThreadPool(String),

    /// Reading or parsing a configuration failed.
    Config(String),
}

impl fmt::Display for LatticeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedColors(n) => {
                write!(f, "SU({n}) is not implemented; only SU(2) and SU(3) are supported")
            }
            Self::InvalidDimensions(msg) => write!(f, "Invalid lattice dimensions: {msg}"),
            Self::DimensionMismatch {
                solver,
                expected,
                found,
            } => write!(
                f,
                "{solver} requires a {expected}-dimensional lattice, got {found} dimensions"
            ),
            Self::InvalidParameter(msg) => write!(f, "Invalid parameter: {msg}"),
            Self::ThreadPool(msg) => write!(f, "Failed to build worker pool: {msg}"),
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl std::error::Error for LatticeError {}

impl From<serde_json::Error> for LatticeError {
    fn from(e: serde_json::Error) -> Self {
        Self::Config(e.to_string())
    }
}

impl From<std::io::Error> for LatticeError {
    fn from(e: std::io::Error) -> Self {
        Self::Config(e.to_string())
    }
}

impl From<rayon::ThreadPoolBuildError> for LatticeError {
    fn from(e: rayon::ThreadPoolBuildError) -> Self {
        Self::ThreadPool(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_unsupported_colors() {
        let err = LatticeError::UnsupportedColors(4);
        assert_eq!(
            err.to_string(),
            "SU(4) is not implemented; only SU(2) and SU(3) are supported"
        );
    }

    #[test]
    fn display_dimension_mismatch() {
        let err = LatticeError::DimensionMismatch {
            solver: "lorenz",
            expected: 3,
            found: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("lorenz"));
        assert!(msg.contains("3-dimensional"));
        assert!(msg.contains("got 2"));
    }

    #[test]
    fn json_error_converts_to_config() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{not json");
        let err: LatticeError = parse.unwrap_err().into();
        assert!(matches!(err, LatticeError::Config(_)));
    }

    #[test]
    fn error_trait_works() {
        let err = LatticeError::InvalidParameter("damping".into());
        let dyn_err: &dyn std::error::Error = &err;
        assert_eq!(dyn_err.to_string(), "Invalid parameter: damping");
    }
}
