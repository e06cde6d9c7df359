use super::{TestResult, TestRunSummary, TestSuiteDesc, TestSuiteResult};

pub fn run_single_test<B: ?Sized>(
    name: &str,
    backend: &B,
    test_fn: fn(&B) -> TestResult,
) -> TestResult {
    let result = test_fn(backend);
    match result {
        TestResult::Pass => crate::klog_debug!("  pass  {}", name),
        TestResult::Skipped => crate::klog_debug!("  skip  {}", name),
        TestResult::Fail => crate::klog_warn!("  FAIL  {}", name),
    }
    result
}

/// Run every suite whose mask bit is in `mask` against `backend`.
pub fn run_suites<B: ?Sized + 'static>(
    backend: &B,
    suites: &[&TestSuiteDesc<B>],
    mask: u32,
) -> TestRunSummary {
    let mut summary = TestRunSummary::default();
    for desc in suites.iter().filter(|d| d.selected_by(mask)) {
        let Some(run) = desc.run else {
            continue;
        };
        let mut result = TestSuiteResult::new(desc.name);
        let _ = run(backend, &mut result);
        crate::klog_info!("suite {}", result);
        summary.add_suite_result(&result);
    }
    crate::klog_info!(
        "tests: {} total, {} passed, {} failed, {} skipped",
        summary.total_tests,
        summary.passed,
        summary.failed,
        summary.skipped
    );
    summary
}
