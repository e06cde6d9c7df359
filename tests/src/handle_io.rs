//! Handle I/O contract.

use tinyrt_abi::{AbiCaps, Handle, RawHandle, Timeout};
use tinyrt_core::Runtime;
use tinyrt_lib::testing::{SUITE_HANDLE_IO, TestResult};
use tinyrt_lib::{define_test_suite, fail, pass, skip};

use crate::Conformance;

/// A raw value no backend issues in a conformance run.
const UNISSUED: RawHandle = 0x7ff0;

pub fn test_invalid_handle_read_untouched(target: &dyn Conformance) -> TestResult {
    let rt = Runtime::new(target.shim());
    let mut buf = [0x5Au8; 16];
    match rt.read(Handle::from_raw(UNISSUED), &mut buf) {
        Ok(n) => fail!("read on an unissued handle returned {}", n),
        Err(_) if buf.iter().any(|&b| b != 0x5A) => fail!("failed read modified the buffer"),
        Err(_) => pass!(),
    }
}

pub fn test_invalid_handle_write(target: &dyn Conformance) -> TestResult {
    let rt = Runtime::new(target.shim());
    match rt.write(Handle::from_raw(UNISSUED), b"nobody") {
        Ok(n) => fail!("write on an unissued handle returned {}", n),
        Err(_) => pass!(),
    }
}

pub fn test_zero_length_transfers(target: &dyn Conformance) -> TestResult {
    let rt = Runtime::new(target.shim());
    if !rt.abi().caps.contains(AbiCaps::STD_HANDLES) {
        return skip!("no standard handles");
    }
    if rt.write(Handle::STDOUT, &[]) != Ok(0) {
        return fail!("zero-length write did not return 0");
    }
    if rt.read(Handle::STDIN, &mut []) != Ok(0) {
        return fail!("zero-length read did not return 0");
    }
    pass!()
}

/// A poll returns at once with what is available, never more than asked,
/// and never lets another context run.
pub fn test_poll_read_is_bounded(target: &dyn Conformance) -> TestResult {
    let rt = Runtime::new(target.shim());
    if !rt.abi().timeout_supported() {
        return skip!("revision has no read timeout");
    }
    let fixture = target.open_loopback();
    let h = match fixture {
        Some(h) => h,
        None if rt.abi().caps.contains(AbiCaps::STD_HANDLES) => Handle::STDIN,
        None => return skip!("no readable handle"),
    };

    let watching = target.start_background_task();
    let before = target.background_steps();
    let mut buf = [0u8; 16];
    let res = rt.read_timeout(h, &mut buf, Timeout::POLL);
    let stepped = target.background_steps() - before;
    if watching {
        target.stop_background_task();
    }
    if fixture.is_some() {
        target.retire(h);
    }

    match res {
        Ok(n) if n > buf.len() => fail!("poll read reported {} bytes for {}", n, buf.len()),
        Ok(n) if fixture.is_some() && n != 0 => fail!("poll on an empty loopback returned {} bytes", n),
        Ok(_) if stepped != 0 => fail!("poll read suspended: background task stepped {} times", stepped),
        _ => pass!(),
    }
}

pub fn test_loopback_round_trip(target: &dyn Conformance) -> TestResult {
    let Some(h) = target.open_loopback() else {
        return skip!("no loopback fixture");
    };
    let rt = Runtime::new(target.shim());
    let result = (|| {
        if rt.write_all(h, b"hello, ").is_err() || rt.write_all(h, b"loopback").is_err() {
            return fail!("loopback write failed");
        }
        let mut buf = [0u8; 15];
        match rt.read_full(h, &mut buf) {
            Ok(15) if &buf == b"hello, loopback" => pass!(),
            Ok(15) => fail!("loopback reordered bytes"),
            Ok(n) => fail!("loopback returned {} of 15 bytes", n),
            Err(err) => fail!("loopback read failed: {:?}", err),
        }
    })();
    target.retire(h);
    result
}

/// Every successful read stays within the requested length.
pub fn test_counts_within_request(target: &dyn Conformance) -> TestResult {
    let Some(h) = target.open_loopback() else {
        return skip!("no loopback fixture");
    };
    let rt = Runtime::new(target.shim());
    let result = (|| {
        if rt.write_all(h, b"0123456789").is_err() {
            return fail!("loopback write failed");
        }
        let mut seen = 0;
        while seen < 10 {
            let mut small = [0u8; 3];
            match rt.read(h, &mut small) {
                Ok(0) => return fail!("early end of stream after {} bytes", seen),
                Ok(n) if n > small.len() => return fail!("read {} bytes into {}", n, small.len()),
                Ok(n) => seen += n,
                Err(err) => return fail!("read failed: {:?}", err),
            }
        }
        pass!()
    })();
    target.retire(h);
    result
}

pub fn test_eof_is_sticky(target: &dyn Conformance) -> TestResult {
    let Some(h) = target.open_ended() else {
        return skip!("no ended-stream fixture");
    };
    let rt = Runtime::new(target.shim());
    let mut buf = [0u8; 8];
    let mut result = pass!();
    for attempt in 0..4 {
        match rt.read(h, &mut buf) {
            Ok(0) => {}
            other => {
                result = fail!("read {} after end of stream gave {:?}", attempt, other);
                break;
            }
        }
    }
    target.retire(h);
    result
}

define_test_suite!(
    handle_io,
    SUITE_HANDLE_IO,
    dyn Conformance,
    [
        test_invalid_handle_read_untouched,
        test_invalid_handle_write,
        test_zero_length_transfers,
        test_poll_read_is_bounded,
        test_loopback_round_trip,
        test_counts_within_request,
        test_eof_is_sticky,
    ]
);
