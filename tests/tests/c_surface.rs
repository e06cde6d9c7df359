//! The C surface over a registered hosted shim.
//!
//! The registration is process-wide, so every test in this binary shares one
//! shim and works on its own handles.

use std::sync::OnceLock;

use tinyrt_abi::{RtError, TIMEOUT_INFINITE, decode_io};
use tinyrt_core::ffi::{__c_read, __c_write, __c_yield, __print, free, malloc};
use tinyrt_core::{dbg_print, register_shim, registered_runtime, registered_shim, rt_println};
use tinyrt_host::{HostConfig, HostedShim};
use tinyrt_tests::{SUITE_ALL, run_conformance};

fn hosted() -> &'static HostedShim {
    static SHIM: OnceLock<&'static HostedShim> = OnceLock::new();
    SHIM.get_or_init(|| {
        let shim: &'static HostedShim = Box::leak(Box::new(HostedShim::new(HostConfig::for_tests())));
        register_shim(shim);
        shim
    })
}

#[test]
fn malloc_and_free_go_through_the_arena() {
    let shim = hosted();
    let p = malloc(48);
    assert!(!p.is_null());
    assert_eq!(p as usize % tinyrt_abi::MAX_ALIGN, 0);
    unsafe {
        p.write_bytes(0xAB, 48);
        free(p);
        free(std::ptr::null_mut());
    }
    assert!(shim.heap_stats().unwrap().allocation_count >= 1);
}

#[test]
fn read_and_write_encode_counts_and_errors() {
    let shim = hosted();
    let h = shim.open_loopback().unwrap();
    let raw = h.raw();

    let sent = unsafe { __c_write(raw, b"abcdef".as_ptr(), 6) };
    assert_eq!(sent, 6);

    let mut buf = [0u8; 4];
    let got = unsafe { __c_read(raw, buf.as_mut_ptr(), buf.len(), 0) };
    assert_eq!(got, 4);
    assert_eq!(&buf, b"abcd");
    let got = unsafe { __c_read(raw, buf.as_mut_ptr(), buf.len(), TIMEOUT_INFINITE) };
    assert_eq!(decode_io(got), Ok(2));

    // Empty and poll reads never block.
    let got = unsafe { __c_read(raw, buf.as_mut_ptr(), 0, TIMEOUT_INFINITE) };
    assert_eq!(got, 0);
    let got = unsafe { __c_read(raw, buf.as_mut_ptr(), buf.len(), 0) };
    assert_eq!(got, 0);

    shim.retire(h).unwrap();
    let got = unsafe { __c_read(raw, buf.as_mut_ptr(), buf.len(), 0) };
    assert_eq!(got, RtError::InvalidHandle.as_status());
}

#[test]
fn null_buffers_are_refused() {
    let shim = hosted();
    let h = shim.open_loopback().unwrap();
    let got = unsafe { __c_read(h.raw(), std::ptr::null_mut(), 8, 0) };
    assert_eq!(got, RtError::Unsupported.as_status());
    let got = unsafe { __c_write(h.raw(), std::ptr::null(), 8) };
    assert_eq!(got, RtError::Unsupported.as_status());
    let got = unsafe { __c_write(h.raw(), std::ptr::null(), 0) };
    assert_eq!(got, 0);
    shim.retire(h).unwrap();
}

#[test]
fn print_and_yield() {
    let shim = hosted();
    unsafe {
        __print(std::ptr::null());
        __print(c"from the c surface\n".as_ptr());
    }
    dbg_print!("dbg {} {}", 1, "two");
    __c_yield();
    let diag = String::from_utf8(shim.take_diag()).unwrap();
    assert!(diag.contains("from the c surface\n"));
    assert!(diag.contains("dbg 1 two"));
}

#[test]
fn print_macros_reach_stdout() {
    let shim = hosted();
    rt_println!("answer={}", 42);
    let out = String::from_utf8(shim.take_stdout()).unwrap();
    assert!(out.contains("answer=42\n"));
}

#[test]
fn registration_is_first_wins() {
    let shim = hosted();
    let other: &'static HostedShim = Box::leak(Box::new(HostedShim::new(HostConfig::for_tests())));
    assert!(!register_shim(other));
    let registered = registered_shim().unwrap() as *const dyn tinyrt_core::Shim as *const ();
    assert_eq!(registered, shim as *const HostedShim as *const ());
    assert!(registered_runtime().is_some());
}

#[test]
fn registered_shim_conforms() {
    hosted();
    let summary = run_conformance(registered_shim().unwrap(), SUITE_ALL);
    assert!(summary.all_passed(), "{:?}", summary.suite_results());
}
