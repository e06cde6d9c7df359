//! Conformance suites for runtime shims.
//!
//! Every suite runs against a [`Conformance`] target: a shim plus whatever
//! stream fixtures the backend can set up. Tests that need a fixture the
//! target lacks are skipped, so any bare shim can be checked with
//! [`run_conformance`].

#![no_std]

use tinyrt_abi::Handle;
use tinyrt_core::Shim;
use tinyrt_lib::testing::{TestRunSummary, TestSuiteDesc, run_suites};

pub mod allocator;
pub mod diagnostics;
pub mod handle_io;
pub mod lifecycle;

pub use tinyrt_lib::testing::{
    SUITE_ALL, SUITE_ALLOCATOR, SUITE_DIAGNOSTICS, SUITE_HANDLE_IO, SUITE_LIFECYCLE, suite_mask_from_list,
};

/// A shim under test, plus the host-side fixtures the contract itself
/// cannot create.
pub trait Conformance {
    fn shim(&self) -> &dyn Shim;

    /// A fresh handle whose writes come back out of its reads.
    fn open_loopback(&self) -> Option<Handle> {
        None
    }

    /// A fresh readable handle already at end of stream.
    fn open_ended(&self) -> Option<Handle> {
        None
    }

    /// Dispose of a fixture handle.
    fn retire(&self, handle: Handle) {
        let _ = handle;
    }

    /// Start another context that stays runnable and counts its steps until
    /// [`stop_background_task`](Self::stop_background_task). Returns `false`
    /// if the backend has no way to run one.
    fn start_background_task(&self) -> bool {
        false
    }

    fn background_steps(&self) -> u64 {
        0
    }

    fn stop_background_task(&self) {}
}

/// A shim with no fixtures.
pub struct ShimOnly(pub &'static dyn Shim);

impl Conformance for ShimOnly {
    fn shim(&self) -> &dyn Shim {
        self.0
    }
}

pub static CONFORMANCE_SUITES: [&TestSuiteDesc<dyn Conformance>; 4] = [
    &allocator::ALLOCATOR_SUITE_DESC,
    &handle_io::HANDLE_IO_SUITE_DESC,
    &lifecycle::LIFECYCLE_SUITE_DESC,
    &diagnostics::DIAGNOSTICS_SUITE_DESC,
];

/// Run the suites selected by `mask` against a bare shim, typically the
/// registered one.
pub fn run_conformance(shim: &'static dyn Shim, mask: u32) -> TestRunSummary {
    run_conformance_with(&ShimOnly(shim), mask)
}

pub fn run_conformance_with(target: &(dyn Conformance + 'static), mask: u32) -> TestRunSummary {
    run_suites(target, &CONFORMANCE_SUITES, mask)
}
