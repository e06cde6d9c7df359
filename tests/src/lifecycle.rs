//! Lifecycle and cooperative yield contract.
//!
//! `exit` never returns, so it cannot be checked from inside a suite; the
//! hosted integration tests cover it with an unwinding terminator.

use tinyrt_abi::{AbiConfig, Handle, RtError, Timeout};
use tinyrt_core::Runtime;
use tinyrt_lib::testing::{SUITE_LIFECYCLE, TestResult};
use tinyrt_lib::{define_test_suite, fail, pass, skip};

use crate::Conformance;

const TIGHT_LOOP_YIELDS: usize = 10_000;

pub fn test_yield_loop_terminates(target: &dyn Conformance) -> TestResult {
    let rt = Runtime::new(target.shim());
    for _ in 0..TIGHT_LOOP_YIELDS {
        rt.yield_now();
    }
    pass!()
}

pub fn test_abi_is_a_known_revision(target: &dyn Conformance) -> TestResult {
    let abi = target.shim().abi();
    if AbiConfig::from_revision(abi.revision) == Some(abi) {
        pass!()
    } else {
        fail!("shim reports unknown configuration {:?}", abi)
    }
}

/// A revision without read timeouts refuses a finite one instead of
/// silently blocking.
pub fn test_finite_timeout_gated_by_revision(target: &dyn Conformance) -> TestResult {
    let rt = Runtime::new(target.shim());
    if rt.abi().timeout_supported() {
        return skip!("revision supports read timeouts");
    }
    let mut buf = [0u8; 4];
    match rt.read_timeout(Handle::STDIN, &mut buf, Timeout::POLL) {
        Err(RtError::Unsupported) => pass!(),
        other => fail!("finite timeout on a revision without timeouts gave {:?}", other),
    }
}

define_test_suite!(
    lifecycle,
    SUITE_LIFECYCLE,
    dyn Conformance,
    [
        test_yield_loop_terminates,
        test_abi_is_a_known_revision,
        test_finite_timeout_gated_by_revision,
    ]
);
