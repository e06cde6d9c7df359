//! Diagnostic print and the formatting helpers built on the primitives.

use core::fmt::Write;

use tinyrt_core::{HandleWriter, PrintBuffer, Runtime};
use tinyrt_lib::testing::{SUITE_DIAGNOSTICS, TestResult};
use tinyrt_lib::{define_test_suite, fail, pass, skip};

use crate::Conformance;

pub fn test_print_is_best_effort(target: &dyn Conformance) -> TestResult {
    let shim = target.shim();
    shim.print(c"conformance: diagnostic line\n");
    shim.print(c"");
    pass!()
}

pub fn test_truncated_line_still_prints(target: &dyn Conformance) -> TestResult {
    let mut line = PrintBuffer::<32>::new();
    let _ = write!(line, "conformance: {} is a long diagnostic line", 0xdead_beef_u32);
    if !line.truncated() || line.as_cstr().to_bytes().len() != 31 {
        return fail!("line of {} bytes not truncated to 31", line.as_cstr().to_bytes().len());
    }
    target.shim().print(line.as_cstr());
    pass!()
}

pub fn test_handle_writer_formats(target: &dyn Conformance) -> TestResult {
    let Some(h) = target.open_loopback() else {
        return skip!("no loopback fixture");
    };
    let rt = Runtime::new(target.shim());
    let mut writer = HandleWriter::new(rt, h);
    let result = if write!(writer, "{}-{}", 12, "ab").is_err() {
        fail!("formatted write failed: {:?}", writer.take_error())
    } else {
        let mut buf = [0u8; 5];
        match rt.read_full(h, &mut buf) {
            Ok(5) if &buf == b"12-ab" => pass!(),
            other => fail!("read back {:?}", other),
        }
    };
    target.retire(h);
    result
}

define_test_suite!(
    diagnostics,
    SUITE_DIAGNOSTICS,
    dyn Conformance,
    [
        test_print_is_best_effort,
        test_truncated_line_still_prints,
        test_handle_writer_formats,
    ]
);
