use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tinyrt_abi::{AbiConfig, Handle, Timeout};
use tinyrt_core::{Runtime, Shim};
use tinyrt_host::{HostConfig, HostedShim};
use tinyrt_sched::TaskPoll;
use tinyrt_tests::{
    Conformance, SUITE_ALL, SUITE_ALLOCATOR, run_conformance, run_conformance_with, suite_mask_from_list,
};

struct Hosted {
    shim: HostedShim,
    steps: Arc<AtomicU64>,
    stop: Arc<AtomicBool>,
}

impl Hosted {
    fn new(config: HostConfig) -> Self {
        Self {
            shim: HostedShim::new(config),
            steps: Arc::new(AtomicU64::new(0)),
            stop: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl Conformance for Hosted {
    fn shim(&self) -> &dyn Shim {
        &self.shim
    }

    fn open_loopback(&self) -> Option<Handle> {
        self.shim.open_loopback()
    }

    fn open_ended(&self) -> Option<Handle> {
        let (reader, writer) = self.shim.open_pipe()?;
        self.shim.retire(writer).ok()?;
        Some(reader)
    }

    fn retire(&self, handle: Handle) {
        let _ = self.shim.retire(handle);
    }

    fn start_background_task(&self) -> bool {
        self.stop.store(false, Ordering::Relaxed);
        let (steps, stop) = (self.steps.clone(), self.stop.clone());
        self.shim.spawn("background", move |_: &dyn Shim| {
            if stop.load(Ordering::Relaxed) {
                return TaskPoll::Complete;
            }
            steps.fetch_add(1, Ordering::Relaxed);
            TaskPoll::Pending
        });
        true
    }

    fn background_steps(&self) -> u64 {
        self.steps.load(Ordering::Relaxed)
    }

    fn stop_background_task(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

#[test]
fn hosted_rev2_conforms() {
    let hosted = Hosted::new(HostConfig::for_tests());
    let summary = run_conformance_with(&hosted, SUITE_ALL);
    assert_eq!(summary.suite_count, 4);
    assert!(summary.all_passed(), "{:?}", summary.suite_results());
    // Only the timeout gate for revisions without timeouts does not apply.
    assert_eq!(summary.skipped, 1);
    // Fixtures are returned.
    assert_eq!(hosted.shim.open_handles(), 3);
}

#[test]
fn hosted_rev1_conforms() {
    let hosted = Hosted::new(HostConfig::for_tests().with_abi(AbiConfig::REV1));
    let summary = run_conformance_with(&hosted, SUITE_ALL);
    assert!(summary.all_passed(), "{:?}", summary.suite_results());
    // The poll test needs a read timeout.
    assert_eq!(summary.skipped, 1);
}

#[test]
fn bare_shim_skips_fixture_tests() {
    let shim: &'static HostedShim = Box::leak(Box::new(HostedShim::new(HostConfig::for_tests())));
    let summary = run_conformance(shim, SUITE_ALL);
    assert!(summary.all_passed(), "{:?}", summary.suite_results());
    assert_eq!(summary.skipped, 5);
}

#[test]
fn starved_heap_fails_allocator_suite_without_aborting() {
    let hosted = Hosted::new(HostConfig::for_tests().with_heap_size(1024));
    let summary = run_conformance_with(&hosted, SUITE_ALLOCATOR);
    assert_eq!(summary.suite_count, 1);
    assert!(summary.failed > 0);
    let stats = hosted.shim.heap_stats().unwrap();
    assert_eq!(stats.allocated_blocks, 0);
}

#[test]
fn suite_list_selects_subset() {
    let hosted = Hosted::new(HostConfig::for_tests());
    let summary = run_conformance_with(&hosted, suite_mask_from_list("handle_io, diagnostics"));
    assert_eq!(summary.suite_count, 2);
    assert!(summary.suite("handle_io").is_some());
    assert!(summary.suite("allocator").is_none());
}

#[test]
fn poll_read_leaves_background_task_unstepped() {
    let hosted = Hosted::new(HostConfig::for_tests());
    let h = hosted.open_loopback().unwrap();
    assert!(hosted.start_background_task());

    let rt = Runtime::new(hosted.shim());
    let mut buf = [0u8; 8];
    assert_eq!(rt.read_timeout(h, &mut buf, Timeout::POLL), Ok(0));
    assert_eq!(hosted.background_steps(), 0);

    // The same task does run once the caller really suspends.
    rt.yield_now();
    assert_eq!(hosted.background_steps(), 1);
    hosted.stop_background_task();
    rt.yield_now();
    assert_eq!(hosted.shim.sched_stats().tasks_completed, 1);
}
