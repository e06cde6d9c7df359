//! Freestanding shim that forwards every primitive to the kernel through
//! `int 0x80`.
//!
//! Register convention: dispatch number in `rax`, arguments in `rdi`, `rsi`,
//! `rdx` and `r10`; the kernel answers with a value in `rax` and a status in
//! `rdx`. The heap is one arena carved from an initial kernel mapping on first
//! use, shared by `allocate` and the `GlobalAlloc` impl.

use core::alloc::{GlobalAlloc, Layout};
use core::arch::asm;
use core::ffi::CStr;
use core::ptr::NonNull;

use tinyrt_abi::syscall::{SysCallDispatch, decode_trap_result};
use tinyrt_abi::{AbiConfig, ExitStatus, Handle, IoResult, RtError, Timeout, decode_io};
use tinyrt_lib::klog::{KlogLevel, klog_attach_serial, klog_set_level};
use tinyrt_lib::{klog_error, klog_info};
use tinyrt_mm::{HeapArena, LazyArena};

use crate::shim::Shim;

/// Size of the initial heap mapping requested from the kernel.
pub const START_HEAP_SIZE: usize = 500 * 1024;

#[inline(always)]
unsafe fn trap(num: SysCallDispatch, arg0: u64, arg1: u64, arg2: u64, arg3: u64) -> (u64, i64) {
    let value: u64;
    let status: i64;
    unsafe {
        asm!(
            "int 0x80",
            inlateout("rax") num.number() => value,
            in("rdi") arg0,
            in("rsi") arg1,
            inlateout("rdx") arg2 => status,
            in("r10") arg3,
            options(nostack),
        );
    }
    (value, status)
}

/// Run a transfer trap. The kernel reports a byte count in `rax`, or a
/// negative runtime error code there with a failing status.
fn transfer(num: SysCallDispatch, handle: Handle, ptr: u64, len: usize, timeout: Timeout) -> IoResult<usize> {
    let (value, status) = unsafe { trap(num, handle.raw() as u64, ptr, len as u64, timeout.to_raw() as u64) };
    match decode_trap_result(value, status) {
        Ok(n) => Ok(n as usize),
        Err(_) => match decode_io(value as i64 as isize) {
            Ok(_) => Err(RtError::StreamFault),
            err => err,
        },
    }
}

/// Request the initial heap mapping and build the arena over it.
fn map_start_heap() -> Option<HeapArena> {
    let (value, status) = unsafe { trap(SysCallDispatch::Mmap, START_HEAP_SIZE as u64, 0, 0, 0) };
    match decode_trap_result(value, status) {
        Ok(base) if base != 0 => {
            klog_info!("trap: heap mapped at {:#x} ({} bytes)", base, START_HEAP_SIZE);
            // SAFETY: the kernel hands over an exclusive mapping of
            // START_HEAP_SIZE bytes that lives as long as the program.
            Some(unsafe { HeapArena::from_raw_parts(base as *mut u8, START_HEAP_SIZE) })
        }
        _ => {
            klog_error!("trap: initial heap request failed (status {})", status);
            None
        }
    }
}

/// Shim over kernel traps. One static instance can serve both as the
/// registered shim and as the global allocator:
///
/// ```ignore
/// #[global_allocator]
/// static RUNTIME: TrapShim = TrapShim::new();
///
/// register_shim(&RUNTIME);
/// ```
pub struct TrapShim {
    heap: LazyArena,
}

impl TrapShim {
    pub const fn new() -> Self {
        Self {
            heap: LazyArena::new(map_start_heap),
        }
    }

    /// Route the runtime log to COM1 at `level`.
    pub fn attach_serial_log(&self, level: KlogLevel) {
        klog_attach_serial();
        klog_set_level(level);
        klog_info!("trap: serial log attached");
    }
}

// SAFETY: forwards to the arena adapter, which upholds the contract.
unsafe impl GlobalAlloc for TrapShim {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        unsafe { self.heap.alloc(layout) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { self.heap.dealloc(ptr, layout) }
    }
}

impl Default for TrapShim {
    fn default() -> Self {
        Self::new()
    }
}

impl Shim for TrapShim {
    fn abi(&self) -> AbiConfig {
        AbiConfig::CURRENT
    }

    fn exit(&self, status: ExitStatus) -> ! {
        unsafe { trap(SysCallDispatch::Exit, status.bits(), 0, 0, 0) };
        // The kernel does not return from exit; park if it ever does.
        // `hlt` would fault in user mode.
        loop {
            core::hint::spin_loop();
        }
    }

    fn allocate(&self, size: usize) -> Option<NonNull<u8>> {
        self.heap.arena()?.allocate(size)
    }

    unsafe fn release(&self, ptr: *mut u8) {
        if let Some(heap) = self.heap.arena() {
            unsafe { heap.release(ptr) };
        }
    }

    fn read(&self, handle: Handle, buf: &mut [u8], timeout: Timeout) -> IoResult<usize> {
        let len = buf.len();
        transfer(SysCallDispatch::Read, handle, buf.as_mut_ptr() as u64, len, timeout)
    }

    fn write(&self, handle: Handle, buf: &[u8]) -> IoResult<usize> {
        transfer(SysCallDispatch::Write, handle, buf.as_ptr() as u64, buf.len(), Timeout::Infinite)
    }

    fn yield_now(&self) {
        unsafe { trap(SysCallDispatch::Yield, 0, 0, 0, 0) };
    }

    fn print(&self, text: &CStr) {
        let _ = self.write(Handle::STDOUT, text.to_bytes());
    }
}
