//! Heap allocation contract.

use core::ptr;

use tinyrt_abi::MAX_ALIGN;
use tinyrt_core::Runtime;
use tinyrt_lib::testing::{SUITE_ALLOCATOR, TestResult};
use tinyrt_lib::{define_test_suite, fail, pass};

use crate::Conformance;

const ROUND_TRIP_SIZES: [usize; 6] = [1, 7, 16, 100, 1000, 4096];

fn aligned(p: *const u8) -> bool {
    p as usize % MAX_ALIGN == 0
}

/// allocate, release, allocate again at the same size.
pub fn test_alloc_release_realloc(target: &dyn Conformance) -> TestResult {
    let rt = Runtime::new(target.shim());
    for size in ROUND_TRIP_SIZES {
        let Some(first) = rt.allocate(size) else {
            return fail!("allocate({}) failed on a fresh heap", size);
        };
        // SAFETY: the allocation holds at least `size` bytes.
        unsafe {
            ptr::write_bytes(first.as_ptr(), 0x5A, size);
            rt.release(first.as_ptr());
        }
        let Some(again) = rt.allocate(size) else {
            return fail!("allocate({}) failed after release", size);
        };
        unsafe { rt.release(again.as_ptr()) };
    }
    pass!()
}

pub fn test_live_allocations_disjoint(target: &dyn Conformance) -> TestResult {
    let rt = Runtime::new(target.shim());
    let sizes = [24usize, 200, 3000, 8];
    let mut live = [(ptr::null_mut::<u8>(), 0usize); 4];

    for (slot, &size) in live.iter_mut().zip(sizes.iter()) {
        match rt.allocate(size) {
            Some(p) => *slot = (p.as_ptr(), size),
            None => {
                release_all(&rt, &live);
                return fail!("allocate({}) failed", size);
            }
        }
    }

    let mut result = pass!();
    for (i, &(a, a_len)) in live.iter().enumerate() {
        if !aligned(a) {
            result = fail!("allocation {:p} not aligned to {}", a, MAX_ALIGN);
        }
        for &(b, b_len) in &live[i + 1..] {
            let (a0, b0) = (a as usize, b as usize);
            if a0 < b0 + b_len && b0 < a0 + a_len {
                result = fail!("allocations {:p}+{} and {:p}+{} overlap", a, a_len, b, b_len);
            }
        }
    }

    release_all(&rt, &live);
    result
}

fn release_all(rt: &Runtime<'_>, live: &[(*mut u8, usize)]) {
    for &(p, _) in live {
        // SAFETY: each non-null entry is a live allocation from `rt`.
        unsafe { rt.release(p) };
    }
}

/// allocate(16), fill, release, allocate(16). Only non-null and size are
/// guaranteed; the region may or may not be reused.
pub fn test_refill_after_release(target: &dyn Conformance) -> TestResult {
    let rt = Runtime::new(target.shim());
    let Some(p) = rt.allocate(16) else {
        return fail!("allocate(16) failed");
    };
    unsafe {
        ptr::write_bytes(p.as_ptr(), 0xAA, 16);
        rt.release(p.as_ptr());
    }
    let Some(q) = rt.allocate(16) else {
        return fail!("allocate(16) failed after release");
    };
    unsafe {
        ptr::write_bytes(q.as_ptr(), 0x00, 16);
        rt.release(q.as_ptr());
    }
    pass!()
}

pub fn test_zero_size_allocation(target: &dyn Conformance) -> TestResult {
    let rt = Runtime::new(target.shim());
    let Some(p) = rt.allocate(0) else {
        return fail!("allocate(0) returned null");
    };
    if !aligned(p.as_ptr()) {
        return fail!("allocate(0) sentinel {:p} not aligned", p);
    }
    unsafe { rt.release(p.as_ptr()) };
    pass!()
}

pub fn test_exhaustion_is_null(target: &dyn Conformance) -> TestResult {
    let rt = Runtime::new(target.shim());
    match rt.allocate(usize::MAX / 2) {
        None => pass!(),
        Some(p) => {
            unsafe { rt.release(p.as_ptr()) };
            fail!("allocate(usize::MAX / 2) succeeded")
        }
    }
}

define_test_suite!(
    allocator,
    SUITE_ALLOCATOR,
    dyn Conformance,
    [
        test_alloc_release_realloc,
        test_live_allocations_disjoint,
        test_refill_after_release,
        test_zero_size_allocation,
        test_exhaustion_is_null,
    ]
);
