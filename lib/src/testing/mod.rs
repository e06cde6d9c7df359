pub mod harness;
mod runner;
pub mod suite_masks;

pub use harness::{HARNESS_MAX_SUITES, SuiteRunnerFn, TestRunSummary, TestSuiteDesc, TestSuiteResult};
pub use runner::{run_single_test, run_suites};
pub use suite_masks::*;

/// Outcome of one conformance test.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TestResult {
    Pass,
    Fail,
    /// The backend lacks what the test needs (a fixture, a revision feature).
    Skipped,
}

impl TestResult {
    #[inline]
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }

    #[inline]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Fail)
    }

    #[inline]
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }
}

impl From<bool> for TestResult {
    fn from(ok: bool) -> Self {
        if ok { Self::Pass } else { Self::Fail }
    }
}

#[macro_export]
macro_rules! pass {
    () => {
        $crate::testing::TestResult::Pass
    };
}

/// Fail the current test, logging why at info level.
///
/// ```ignore
/// if got != expected {
///     return fail!("read {} bytes, wanted {}", got, expected);
/// }
/// ```
#[macro_export]
macro_rules! fail {
    () => {
        $crate::testing::TestResult::Fail
    };
    ($msg:expr) => {{
        $crate::klog_info!("conformance fail: {}", $msg);
        $crate::testing::TestResult::Fail
    }};
    ($fmt:expr, $($arg:tt)*) => {{
        $crate::klog_info!(concat!("conformance fail: ", $fmt), $($arg)*);
        $crate::testing::TestResult::Fail
    }};
}

#[macro_export]
macro_rules! skip {
    ($msg:expr) => {{
        $crate::klog_debug!("conformance skip: {}", $msg);
        $crate::testing::TestResult::Skipped
    }};
}

/// Define a test suite with automatic registration.
///
/// Generates:
/// - A runner function compatible with `TestSuiteDesc`
/// - A static `TestSuiteDesc` named `<NAME>_SUITE_DESC`
///
/// Every test is a `fn(&Backend) -> TestResult`. Tests run in the listed
/// order and a failure does not stop the ones after it.
///
/// ```ignore
/// define_test_suite!(allocator, SUITE_ALLOCATOR, dyn Conformance, [
///     test_alloc_release_realloc,
///     test_live_allocations_disjoint,
/// ]);
/// ```
#[macro_export]
macro_rules! define_test_suite {
    ($suite_name:ident, $mask:expr, $backend:ty, [$($test_fn:path),* $(,)?]) => {
        $crate::paste::paste! {
            fn [<run_ $suite_name _suite>](
                backend: &$backend,
                out: &mut $crate::testing::TestSuiteResult,
            ) -> bool {
                out.name = stringify!($suite_name);
                $(
                    out.record($crate::testing::run_single_test(stringify!($test_fn), backend, $test_fn));
                )*
                out.all_passed()
            }

            pub static [<$suite_name:upper _SUITE_DESC>]: $crate::testing::TestSuiteDesc<$backend> =
                $crate::testing::TestSuiteDesc {
                    name: stringify!($suite_name),
                    mask_bit: $mask,
                    run: Some([<run_ $suite_name _suite>]),
                };
        }
    };
}
