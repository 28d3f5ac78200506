//! Soft assertion accumulator.
//!
//! Collects mismatches for one test without stopping it; the runner turns a
//! non-empty accumulator into a failed test once the body returns.

use super::Mismatch;
use crate::result::{VitrineError, VitrineResult};
use serde::{Deserialize, Serialize};

/// Per-test collector of soft mismatches
#[derive(Debug, Default, Clone)]
pub struct SoftAssertions {
    failures: Vec<Mismatch>,
    checked: usize,
    hard_failed: usize,
}

impl SoftAssertions {
    /// Create an empty collector
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a passing check
    pub fn pass(&mut self) {
        self.checked += 1;
    }

    /// Count a failing check and keep its mismatch
    pub fn record(&mut self, mismatch: Mismatch) {
        self.checked += 1;
        tracing::warn!(%mismatch, "soft assertion failed");
        self.failures.push(mismatch);
    }

    /// Count a failing check that stops the test instead of being kept
    pub fn fail(&mut self) {
        self.checked += 1;
        self.hard_failed += 1;
    }

    /// Recorded mismatches, in recording order
    #[must_use]
    pub fn failures(&self) -> &[Mismatch] {
        &self.failures
    }

    /// Number of checks evaluated, passing or not
    #[must_use]
    pub const fn checked(&self) -> usize {
        self.checked
    }

    /// No mismatch recorded
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failures.is_empty()
    }

    /// Fail with every recorded mismatch, or succeed when none were recorded
    pub fn verify(&self) -> VitrineResult<()> {
        if self.failures.is_empty() {
            Ok(())
        } else {
            Err(VitrineError::SoftAssertions {
                failures: self.failures.clone(),
            })
        }
    }

    /// Totals for reporting
    #[must_use]
    pub fn summary(&self) -> AssertionSummary {
        let failed = self.failures.len() + self.hard_failed;
        AssertionSummary {
            total: self.checked,
            passed: self.checked - failed,
            failed,
        }
    }
}

/// Totals of one accumulator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AssertionSummary {
    /// Checks evaluated
    pub total: usize,
    /// Checks that passed
    pub passed: usize,
    /// Checks that failed
    pub failed: usize,
}
