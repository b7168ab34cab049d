// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Aggregate counters for test-case executions.

use crate::errors::ReconcileError;
use std::time::Duration;

/// Aggregate counters for one or more test-case executions.
///
/// Produced by a [`TestHost`](crate::adapter::TestHost) once per execution.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct RunSummary {
    /// The number of tests that were run, including failed and skipped ones.
    pub total: usize,

    /// The number of tests that failed.
    pub failed: usize,

    /// The number of tests that were skipped.
    pub skipped: usize,

    /// The number of tests that never started, e.g. because the run was canceled first.
    ///
    /// Not included in `total`.
    pub not_run: usize,

    /// Time spent running tests.
    pub time: Duration,
}

impl RunSummary {
    /// Returns the number of tests that passed.
    pub fn passed(&self) -> usize {
        self.total
            .saturating_sub(self.failed.saturating_add(self.skipped))
    }

    /// Returns true if no tests failed.
    #[inline]
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Adds the counters of `other` to this summary.
    pub fn aggregate(&mut self, other: &RunSummary) {
        self.total += other.total;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self.not_run += other.not_run;
        self.time += other.time;
    }

    /// Moves `count` tests from `failed` to `skipped`, leaving `total` alone.
    ///
    /// Returns an error, and leaves the summary untouched, if `count` is larger than `failed`.
    pub fn reclassify_failures(&mut self, count: usize) -> Result<(), ReconcileError> {
        if count == 0 {
            return Ok(());
        }
        let failed = self
            .failed
            .checked_sub(count)
            .ok_or_else(|| ReconcileError::new(count, self.failed))?;
        self.failed = failed;
        self.skipped += count;
        Ok(())
    }
}

/// Corrects `summary` for `reclassified` failures that were reported as skips.
///
/// A reclassified test was counted once in `total` as a failure and stays counted once, as a
/// skip.
pub fn reconcile(mut summary: RunSummary, reclassified: usize) -> Result<RunSummary, ReconcileError> {
    summary.reclassify_failures(reclassified)?;
    Ok(summary)
}
