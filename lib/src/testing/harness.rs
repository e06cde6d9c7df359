//! Test harness infrastructure for backend conformance runs.
//!
//! This module provides the low-level types used by the `define_test_suite!`
//! macro. The harness is generic over the backend a suite exercises, so the
//! same suites run against any implementation of a trait object.
//!
//! # Architecture
//!
//! The test harness consists of:
//! - `TestSuiteResult`: Per-suite execution results
//! - `TestSuiteDesc`: Static descriptor for a test suite (name, mask, runner)
//! - `TestRunSummary`: Aggregated results across all suites
//!
//! # Usage
//!
//! ```ignore
//! define_test_suite!(allocator, SUITE_ALLOCATOR, dyn Conformance, [
//!     test_alloc_release_realloc,
//!     test_live_allocations_disjoint,
//! ]);
//! ```

use core::fmt;

use super::TestResult;

/// Maximum number of test suites a single run can record.
pub const HARNESS_MAX_SUITES: usize = 16;

/// Result of executing a single test suite.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TestSuiteResult {
    pub name: &'static str,
    pub total: u32,
    pub passed: u32,
    pub failed: u32,
    pub skipped: u32,
}

impl TestSuiteResult {
    /// Create a new result with just the suite name set.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            total: 0,
            passed: 0,
            failed: 0,
            skipped: 0,
        }
    }

    /// Count one test outcome. Skipped tests count neither as passed nor failed.
    pub fn record(&mut self, result: TestResult) {
        self.total += 1;
        match result {
            TestResult::Pass => self.passed += 1,
            TestResult::Fail => self.failed += 1,
            TestResult::Skipped => self.skipped += 1,
        }
    }

    /// Check if all tests in this suite passed or were skipped.
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

impl fmt::Display for TestSuiteResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}/{} passed, {} skipped",
            self.name, self.passed, self.total, self.skipped
        )
    }
}

/// Suite runner signature: run every test against `backend`, tally into `out`,
/// report whether nothing failed.
pub type SuiteRunnerFn<B> = fn(&B, &mut TestSuiteResult) -> bool;

/// Static descriptor for a test suite.
///
/// This is created by `define_test_suite!`.
pub struct TestSuiteDesc<B: ?Sized + 'static> {
    pub name: &'static str,
    pub mask_bit: u32,
    pub run: Option<SuiteRunnerFn<B>>,
}

impl<B: ?Sized + 'static> TestSuiteDesc<B> {
    #[inline]
    pub fn selected_by(&self, mask: u32) -> bool {
        self.mask_bit & mask != 0
    }
}

/// Aggregated results from running all test suites.
#[derive(Clone, Copy, Debug)]
pub struct TestRunSummary {
    pub suites: [TestSuiteResult; HARNESS_MAX_SUITES],
    pub suite_count: usize,
    pub total_tests: u32,
    pub passed: u32,
    pub failed: u32,
    pub skipped: u32,
}

impl Default for TestRunSummary {
    fn default() -> Self {
        Self {
            suites: [TestSuiteResult::default(); HARNESS_MAX_SUITES],
            suite_count: 0,
            total_tests: 0,
            passed: 0,
            failed: 0,
            skipped: 0,
        }
    }
}

impl TestRunSummary {
    /// Add results from a single suite to the summary. Suites beyond
    /// `HARNESS_MAX_SUITES` still count toward the totals.
    pub fn add_suite_result(&mut self, result: &TestSuiteResult) {
        if self.suite_count < HARNESS_MAX_SUITES {
            self.suites[self.suite_count] = *result;
            self.suite_count += 1;
        }
        self.total_tests = self.total_tests.saturating_add(result.total);
        self.passed = self.passed.saturating_add(result.passed);
        self.failed = self.failed.saturating_add(result.failed);
        self.skipped = self.skipped.saturating_add(result.skipped);
    }

    pub fn suite_results(&self) -> &[TestSuiteResult] {
        &self.suites[..self.suite_count]
    }

    pub fn suite(&self, name: &str) -> Option<&TestSuiteResult> {
        self.suite_results().iter().find(|s| s.name == name)
    }

    /// Check if all tests across all suites passed.
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}
