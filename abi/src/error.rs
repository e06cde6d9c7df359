//! Status codes for read and write calls.
//!
//! A read or write returns a signed count: non-negative is the number of bytes
//! transferred, negative is one of the [`RtError`] codes below. Timeouts are
//! never errors; they surface as a (possibly zero) byte count.

/// Implement the status conversions for runtime error enums.
///
/// Generates `as_status()`, `from_status()` and `as_code()` for `#[repr(i32)]`
/// enums whose variants are all negative. Unknown negative codes fold to the
/// fallback variant.
macro_rules! impl_runtime_error {
    ($ty:ty, fallback: $fallback:ident, variants: { $($val:literal => $variant:ident),* $(,)? }) => {
        impl $ty {
            /// Raw code as carried in an `i32`.
            #[inline]
            pub const fn as_code(self) -> i32 {
                self as i32
            }

            /// Convert to a boundary status (`ptrdiff_t`).
            #[inline]
            pub const fn as_status(self) -> isize {
                self as i32 as isize
            }

            /// Convert from a negative boundary status.
            #[inline]
            pub const fn from_status(val: isize) -> Self {
                match val {
                    $($val => Self::$variant,)*
                    _ => Self::$fallback,
                }
            }
        }
    };
}

/// Recoverable failure of a handle operation.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RtError {
    /// The handle is not currently open.
    InvalidHandle = -1,
    /// The stream hit a hard error (device failure, broken pipe, stalled wait).
    StreamFault = -2,
    /// The stream or the active ABI revision does not support the request.
    Unsupported = -3,
}

impl_runtime_error!(RtError, fallback: StreamFault, variants: {
    -1 => InvalidHandle,
    -2 => StreamFault,
    -3 => Unsupported,
});

impl RtError {
    pub const fn name(self) -> &'static str {
        match self {
            Self::InvalidHandle => "invalid handle",
            Self::StreamFault => "stream fault",
            Self::Unsupported => "unsupported",
        }
    }
}

impl core::fmt::Display for RtError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of a typed handle operation.
pub type IoResult<T> = Result<T, RtError>;

/// Encode a typed transfer result as a boundary status.
#[inline]
pub fn encode_io(res: IoResult<usize>) -> isize {
    match res {
        Ok(n) => n.min(isize::MAX as usize) as isize,
        Err(err) => err.as_status(),
    }
}

/// Decode a boundary status into a typed transfer result.
#[inline]
pub fn decode_io(status: isize) -> IoResult<usize> {
    if status < 0 {
        Err(RtError::from_status(status))
    } else {
        Ok(status as usize)
    }
}
