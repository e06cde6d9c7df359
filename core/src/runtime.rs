use core::ffi::CStr;
use core::ptr::NonNull;

use tinyrt_abi::{AbiConfig, ExitStatus, Handle, IoResult, MAX_ALIGN, RtError, Timeout};
use tinyrt_lib::klog_warn;

use crate::shim::Shim;

/// Checked view of a shim.
///
/// Every call goes straight to the shim; the wrapper only enforces what the
/// caller is promised regardless of backend: transfer counts never exceed the
/// buffer, a finite timeout is refused when the revision has no timeout, and
/// allocations are aligned.
#[derive(Clone, Copy)]
pub struct Runtime<'s> {
    shim: &'s dyn Shim,
    abi: AbiConfig,
}

impl<'s> Runtime<'s> {
    pub fn new(shim: &'s dyn Shim) -> Self {
        Self {
            abi: shim.abi(),
            shim,
        }
    }

    #[inline]
    pub fn abi(&self) -> AbiConfig {
        self.abi
    }

    #[inline]
    pub fn shim(&self) -> &'s dyn Shim {
        self.shim
    }

    pub fn exit(&self, status: impl Into<ExitStatus>) -> ! {
        self.shim.exit(status.into())
    }

    pub fn allocate(&self, size: usize) -> Option<NonNull<u8>> {
        let ptr = self.shim.allocate(size)?;
        if ptr.as_ptr() as usize % MAX_ALIGN != 0 {
            klog_warn!("runtime: shim returned misaligned allocation {:p}", ptr);
        }
        Some(ptr)
    }

    /// # Safety
    /// See [`Shim::release`].
    pub unsafe fn release(&self, ptr: *mut u8) {
        unsafe { self.shim.release(ptr) }
    }

    /// Read with no timeout.
    pub fn read(&self, handle: Handle, buf: &mut [u8]) -> IoResult<usize> {
        self.read_timeout(handle, buf, Timeout::Infinite)
    }

    pub fn read_timeout(
        &self,
        handle: Handle,
        buf: &mut [u8],
        timeout: Timeout,
    ) -> IoResult<usize> {
        if !timeout.is_infinite() && !self.abi.timeout_supported() {
            return Err(RtError::Unsupported);
        }
        let len = buf.len();
        let n = self.shim.read(handle, buf, timeout)?;
        Ok(clamp_count("read", n, len))
    }

    pub fn write(&self, handle: Handle, buf: &[u8]) -> IoResult<usize> {
        let n = self.shim.write(handle, buf)?;
        Ok(clamp_count("write", n, buf.len()))
    }

    /// Write all of `buf`, looping over partial transfers.
    ///
    /// A write that accepts nothing for a non-empty buffer is reported as a
    /// fault rather than retried forever.
    pub fn write_all(&self, handle: Handle, mut buf: &[u8]) -> IoResult<()> {
        while !buf.is_empty() {
            match self.write(handle, buf)? {
                0 => return Err(RtError::StreamFault),
                n => buf = &buf[n..],
            }
        }
        Ok(())
    }

    /// Fill `buf`, looping over partial transfers. Returns the bytes read,
    /// which is less than `buf.len()` only at end of stream.
    pub fn read_full(&self, handle: Handle, buf: &mut [u8]) -> IoResult<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.read(handle, &mut buf[filled..])? {
                0 => break,
                n => filled += n,
            }
        }
        Ok(filled)
    }

    #[inline]
    pub fn yield_now(&self) {
        self.shim.yield_now()
    }

    #[inline]
    pub fn print(&self, text: &CStr) {
        self.shim.print(text)
    }
}

fn clamp_count(op: &str, n: usize, len: usize) -> usize {
    if n > len {
        klog_warn!("runtime: shim {} reported {} bytes for a {} byte buffer", op, n, len);
        len
    } else {
        n
    }
}
