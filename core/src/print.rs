//! Formatted output over handles and over the diagnostic print.

use core::ffi::CStr;
use core::fmt;

use tinyrt_abi::{Handle, RtError};

use crate::ffi;
use crate::runtime::Runtime;

/// `fmt::Write` over a handle. Each fragment is written in full.
pub struct HandleWriter<'s> {
    rt: Runtime<'s>,
    handle: Handle,
    error: Option<RtError>,
}

impl<'s> HandleWriter<'s> {
    pub fn new(rt: Runtime<'s>, handle: Handle) -> Self {
        Self {
            rt,
            handle,
            error: None,
        }
    }

    /// The error that stopped the last failed write, if any.
    pub fn take_error(&mut self) -> Option<RtError> {
        self.error.take()
    }
}

impl fmt::Write for HandleWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.rt.write_all(self.handle, s.as_bytes()).map_err(|err| {
            self.error = Some(err);
            fmt::Error
        })
    }
}

/// Fixed-size, always NUL-terminated formatting buffer. Output that does not
/// fit is truncated.
pub struct PrintBuffer<const N: usize> {
    buf: [u8; N],
    len: usize,
}

impl<const N: usize> PrintBuffer<N> {
    pub const fn new() -> Self {
        Self { buf: [0; N], len: 0 }
    }

    pub fn truncated(&self) -> bool {
        self.len + 1 >= N
    }

    /// The contents up to the first NUL.
    pub fn as_cstr(&self) -> &CStr {
        match CStr::from_bytes_until_nul(&self.buf) {
            Ok(text) => text,
            Err(_) => c"",
        }
    }
}

impl<const N: usize> Default for PrintBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> fmt::Write for PrintBuffer<N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if N == 0 {
            return Ok(());
        }
        let room = N - 1 - self.len.min(N - 1);
        let take = s.len().min(room);
        self.buf[self.len..self.len + take].copy_from_slice(&s.as_bytes()[..take]);
        self.len += take;
        self.buf[self.len] = 0;
        Ok(())
    }
}

/// Diagnostic lines longer than this are truncated.
pub const DIAG_LINE_MAX: usize = 256;

#[doc(hidden)]
pub fn _print(handle: Handle, args: fmt::Arguments<'_>) {
    let Some(rt) = ffi::registered_runtime() else {
        return;
    };
    let mut writer = HandleWriter::new(rt, handle);
    let _ = fmt::write(&mut writer, args);
}

#[doc(hidden)]
pub fn _dbg_print(args: fmt::Arguments<'_>) {
    let Some(shim) = ffi::registered_shim() else {
        return;
    };
    let mut line = PrintBuffer::<DIAG_LINE_MAX>::new();
    let _ = fmt::write(&mut line, args);
    shim.print(line.as_cstr());
}

/// Print to the standard output handle of the registered shim.
#[macro_export]
macro_rules! rt_print {
    ($($arg:tt)*) => {
        $crate::print::_print($crate::abi::Handle::STDOUT, ::core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! rt_println {
    () => {
        $crate::rt_print!("\n")
    };
    ($($arg:tt)*) => {
        $crate::rt_print!("{}\n", ::core::format_args!($($arg)*))
    };
}

/// Print to the standard error handle of the registered shim.
#[macro_export]
macro_rules! rt_eprint {
    ($($arg:tt)*) => {
        $crate::print::_print($crate::abi::Handle::STDERR, ::core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! rt_eprintln {
    () => {
        $crate::rt_eprint!("\n")
    };
    ($($arg:tt)*) => {
        $crate::rt_eprint!("{}\n", ::core::format_args!($($arg)*))
    };
}

/// Format into a bounded buffer and send it through the diagnostic print.
#[macro_export]
macro_rules! dbg_print {
    ($($arg:tt)*) => {
        $crate::print::_dbg_print(::core::format_args!($($arg)*))
    };
}
