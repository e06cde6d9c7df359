//! C surface of the runtime boundary.
//!
//! Each function forwards to the process-wide shim registered once through
//! [`register_shim`]. Without a registered shim, reads and writes report
//! `Unsupported`, allocation returns null, print and yield do nothing, and
//! exit panics.
//!
//! The unmangled symbol names are only exported with the `export-c-abi`
//! feature, so host test binaries keep libc's `malloc` and `free`.

use core::ffi::{CStr, c_char};
use core::ptr;
use core::slice;

use tinyrt_abi::{ExitStatus, Handle, IoResult, RawExitStatus, RawHandle, RtError, Timeout, encode_io};
use tinyrt_lib::{ServiceCell, klog_debug, klog_warn};

use crate::runtime::Runtime;
use crate::shim::Shim;

static SHIM: ServiceCell<dyn Shim> = ServiceCell::new("runtime shim");

/// Publish `shim` to the C surface. Returns `false` if a shim was already
/// registered; the first registration stays in place.
pub fn register_shim(shim: &'static dyn Shim) -> bool {
    let fresh = SHIM.register(shim);
    if fresh {
        klog_debug!("ffi: shim registered (abi rev {})", shim.abi().revision);
    } else {
        klog_warn!("ffi: shim already registered, keeping the first one");
    }
    fresh
}

#[inline]
pub fn registered_shim() -> Option<&'static dyn Shim> {
    SHIM.try_get()
}

#[inline]
pub fn registered_runtime() -> Option<Runtime<'static>> {
    registered_shim().map(Runtime::new)
}

/// Shared body of the two `__c_read` revisions.
///
/// # Safety
/// `buf` must be valid for `len` writable bytes, or null with `len == 0`.
unsafe fn read_raw(handle: RawHandle, buf: *mut u8, len: usize, timeout: Timeout) -> isize {
    let Some(rt) = registered_runtime() else {
        return RtError::Unsupported.as_status();
    };
    let res: IoResult<usize> = if buf.is_null() {
        if len == 0 {
            rt.read_timeout(Handle::from_raw(handle), &mut [], timeout)
        } else {
            Err(RtError::Unsupported)
        }
    } else {
        // SAFETY: guaranteed by the caller.
        let buf = unsafe { slice::from_raw_parts_mut(buf, len) };
        rt.read_timeout(Handle::from_raw(handle), buf, timeout)
    };
    encode_io(res)
}

#[cfg_attr(feature = "export-c-abi", unsafe(no_mangle))]
pub extern "C" fn __c_exit(status: RawExitStatus) -> ! {
    SHIM.get().exit(ExitStatus::from_raw(status))
}

/// # Safety
/// `buf` must be valid for `len` writable bytes and not aliased for the
/// duration of the call.
#[cfg(not(all(feature = "rev1", not(feature = "rev2"))))]
#[cfg_attr(feature = "export-c-abi", unsafe(no_mangle))]
pub unsafe extern "C" fn __c_read(handle: RawHandle, buf: *mut u8, len: usize, timeout: usize) -> isize {
    unsafe { read_raw(handle, buf, len, Timeout::from_raw(timeout)) }
}

/// # Safety
/// `buf` must be valid for `len` writable bytes and not aliased for the
/// duration of the call.
#[cfg(all(feature = "rev1", not(feature = "rev2")))]
#[cfg_attr(feature = "export-c-abi", unsafe(no_mangle))]
pub unsafe extern "C" fn __c_read(handle: RawHandle, buf: *mut u8, len: usize) -> isize {
    unsafe { read_raw(handle, buf, len, Timeout::Infinite) }
}

/// # Safety
/// `buf` must be valid for `len` readable bytes for the duration of the call.
#[cfg_attr(feature = "export-c-abi", unsafe(no_mangle))]
pub unsafe extern "C" fn __c_write(handle: RawHandle, buf: *const u8, len: usize) -> isize {
    let Some(rt) = registered_runtime() else {
        return RtError::Unsupported.as_status();
    };
    let res = if buf.is_null() {
        if len == 0 {
            rt.write(Handle::from_raw(handle), &[])
        } else {
            Err(RtError::Unsupported)
        }
    } else {
        // SAFETY: guaranteed by the caller.
        let buf = unsafe { slice::from_raw_parts(buf, len) };
        rt.write(Handle::from_raw(handle), buf)
    };
    encode_io(res)
}

#[cfg_attr(feature = "export-c-abi", unsafe(no_mangle))]
pub extern "C" fn __c_yield() {
    if let Some(shim) = registered_shim() {
        shim.yield_now();
    }
}

/// # Safety
/// `text` must be null or point to a NUL-terminated string.
#[cfg_attr(feature = "export-c-abi", unsafe(no_mangle))]
pub unsafe extern "C" fn __print(text: *const c_char) {
    if text.is_null() {
        return;
    }
    if let Some(shim) = registered_shim() {
        // SAFETY: guaranteed by the caller.
        shim.print(unsafe { CStr::from_ptr(text) });
    }
}

fn allocate_raw(size: usize) -> *mut u8 {
    registered_shim()
        .and_then(|shim| shim.allocate(size))
        .map_or(ptr::null_mut(), |p| p.as_ptr())
}

#[cfg(not(all(feature = "rev1", not(feature = "rev2"))))]
#[cfg_attr(feature = "export-c-abi", unsafe(no_mangle))]
pub extern "C" fn malloc(size: usize) -> *mut u8 {
    allocate_raw(size)
}

/// # Safety
/// `ptr` must be null or a live allocation from `malloc`.
#[cfg(not(all(feature = "rev1", not(feature = "rev2"))))]
#[cfg_attr(feature = "export-c-abi", unsafe(no_mangle))]
pub unsafe extern "C" fn free(ptr: *mut u8) {
    if let Some(shim) = registered_shim() {
        unsafe { shim.release(ptr) };
    }
}

/// Revision 1 heap request. There is no matching release.
#[cfg(all(feature = "rev1", not(feature = "rev2")))]
#[cfg_attr(feature = "export-c-abi", unsafe(no_mangle))]
pub extern "C" fn __c_heap(size: usize) -> *mut u8 {
    allocate_raw(size)
}
