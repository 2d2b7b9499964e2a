// SPDX-License-Identifier: AGPL-3.0-only

//! Validation harness for the lattice binaries.
//!
//! A validation binary runs a fixed set of physics checks (unitarity,
//! conservation laws, gauge invariance) against the tolerances in
//! [`crate::tolerances`], prints one line per check and exits with 0 when
//! everything passed and 1 otherwise.

use std::fmt::{self, Write};
use std::process;

/// One recorded check.
#[derive(Debug, Clone)]
pub struct Check {
    pub label: String,
    pub passed: bool,
    pub observed: f64,
    pub expected: f64,
    pub tolerance: f64,
    pub mode: ToleranceMode,
}

/// How a check compares `observed` against `expected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToleranceMode {
    /// |observed − expected| < tolerance
    Absolute,
    /// |observed − expected| / |expected| < tolerance
    Relative,
    /// observed < threshold
    UpperBound,
    /// Every entry of a sequence is ≤ its predecessor.
    Monotone,
}

impl fmt::Display for ToleranceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absolute => write!(f, "abs"),
            Self::Relative => write!(f, "rel"),
            Self::UpperBound => write!(f, "<"),
            Self::Monotone => write!(f, "mono"),
        }
    }
}

/// Collects checks and produces the summary and exit code.
#[derive(Debug, Default)]
#[must_use]
pub struct ValidationHarness {
    pub name: String,
    pub checks: Vec<Check>,
}

impl ValidationHarness {
    #[must_use = "validation harness must be used to run checks"]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            checks: Vec::new(),
        }
    }

    fn push(&mut self, label: &str, passed: bool, observed: f64, expected: f64, tolerance: f64, mode: ToleranceMode) {
        self.checks.push(Check {
            label: label.to_string(),
            passed,
            observed,
            expected,
            tolerance,
            mode,
        });
    }

    pub fn check_abs(&mut self, label: &str, observed: f64, expected: f64, tolerance: f64) {
        let passed = (observed - expected).abs() < tolerance;
        self.push(label, passed, observed, expected, tolerance, ToleranceMode::Absolute);
    }

    /// Relative check; falls back to absolute when `expected` is zero.
    pub fn check_rel(&mut self, label: &str, observed: f64, expected: f64, tolerance: f64) {
        let passed = if expected.abs() > f64::EPSILON {
            ((observed - expected) / expected).abs() < tolerance
        } else {
            observed.abs() < tolerance
        };
        self.push(label, passed, observed, expected, tolerance, ToleranceMode::Relative);
    }

    pub fn check_upper(&mut self, label: &str, observed: f64, threshold: f64) {
        self.push(label, observed < threshold, observed, threshold, threshold, ToleranceMode::UpperBound);
    }

    /// Non-increasing sequence (e.g. a residual or violation history).
    /// Reports the first and last value.
    pub fn check_non_increasing(&mut self, label: &str, values: &[f64]) {
        let passed = values.windows(2).all(|w| w[1] <= w[0]);
        let first = values.first().copied().unwrap_or(0.0);
        let last = values.last().copied().unwrap_or(0.0);
        self.push(label, passed, last, first, 0.0, ToleranceMode::Monotone);
    }

    pub fn check_bool(&mut self, label: &str, passed: bool) {
        self.push(label, passed, f64::from(u8::from(passed)), 1.0, 0.0, ToleranceMode::Absolute);
    }

    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    #[must_use]
    pub const fn total_count(&self) -> usize {
        self.checks.len()
    }

    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    /// Summary block as printed by [`ValidationHarness::finish`].
    #[must_use]
    pub fn summary(&self) -> String {
        let mut s = String::new();
        let _ = writeln!(
            s,
            "═══ {} validation: {}/{} checks passed ═══",
            self.name,
            self.passed_count(),
            self.total_count()
        );
        for check in &self.checks {
            let icon = if check.passed { "✓" } else { "✗" };
            let _ = writeln!(
                s,
                "  {icon} {}: observed={:.6e}, expected={:.6e}, tol={:.2e} ({})",
                check.label, check.observed, check.expected, check.tolerance, check.mode
            );
        }
        s
    }

    /// Print the summary and exit: 0 if every check passed, 1 otherwise.
    pub fn finish(&self) -> ! {
        println!();
        print!("{}", self.summary());
        if self.all_passed() {
            println!("ALL CHECKS PASSED");
            process::exit(0);
        }
        let failed: Vec<&str> = self
            .checks
            .iter()
            .filter(|c| !c.passed)
            .map(|c| c.label.as_str())
            .collect();
        println!("FAILED CHECKS: {}", failed.join(", "));
        process::exit(1);
    }
}
