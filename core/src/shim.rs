use core::ffi::CStr;
use core::ptr::NonNull;

use tinyrt_abi::{AbiConfig, ExitStatus, Handle, IoResult, Timeout};

/// The host-provided primitives.
///
/// A shim owns every real resource: the heap, the streams behind handles,
/// and the scheduler that `yield_now` and blocking I/O hand control to.
/// Callers normally go through [`Runtime`](crate::Runtime), which enforces the
/// caller-visible guarantees on top of any shim.
///
/// Suspension points are `read`, `write` and `yield_now`. The other
/// primitives never suspend.
pub trait Shim: Send + Sync {
    /// The ABI revision this shim implements.
    fn abi(&self) -> AbiConfig;

    /// Terminate the calling program. All 64 bits of `status` are delivered
    /// to the host's mapping. Pending I/O is flushed or abandoned according
    /// to the shim's policy.
    fn exit(&self, status: ExitStatus) -> !;

    /// At least `size` bytes aligned to [`MAX_ALIGN`](tinyrt_abi::MAX_ALIGN),
    /// or `None` on exhaustion. Size 0 returns a non-null sentinel.
    fn allocate(&self, size: usize) -> Option<NonNull<u8>>;

    /// Return a region obtained from `allocate`.
    ///
    /// # Safety
    /// `ptr` must be null, or a live allocation from this shim that is not
    /// used afterwards.
    unsafe fn release(&self, ptr: *mut u8);

    /// Transfer up to `buf.len()` bytes from `handle`, suspending until data,
    /// end of stream, the timeout, or a fault. `Ok(0)` is end of stream, an
    /// expired timeout, or an empty `buf`.
    fn read(&self, handle: Handle, buf: &mut [u8], timeout: Timeout) -> IoResult<usize>;

    /// Transfer up to `buf.len()` bytes to `handle`, suspending while the
    /// stream applies backpressure.
    fn write(&self, handle: Handle, buf: &[u8]) -> IoResult<usize>;

    /// Let other ready contexts run. Always returns.
    fn yield_now(&self);

    /// Best-effort diagnostic output. Never fails.
    fn print(&self, text: &CStr);
}
