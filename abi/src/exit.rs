//! Exit status carried by the terminate primitive.

use crate::config::ExitSignedness;

/// Raw exit status type of the active ABI revision (revision 2: `int64_t`).
#[cfg(not(all(feature = "rev1", not(feature = "rev2"))))]
pub type RawExitStatus = i64;

/// Raw exit status type of the active ABI revision (revision 1: `uint64_t`).
#[cfg(all(feature = "rev1", not(feature = "rev2")))]
pub type RawExitStatus = u64;

/// A full-width 64-bit exit status.
///
/// The bit pattern is kept as-is; signedness only matters when a backend maps
/// it onto a narrower host exit code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct ExitStatus(u64);

impl ExitStatus {
    pub const SUCCESS: Self = Self(0);
    /// Status used when the runtime aborts on a panic.
    pub const PANIC: Self = Self(2);

    #[inline]
    pub const fn from_signed(value: i64) -> Self {
        Self(value as u64)
    }

    #[inline]
    pub const fn from_unsigned(value: u64) -> Self {
        Self(value)
    }

    #[inline]
    pub const fn bits(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn as_signed(self) -> i64 {
        self.0 as i64
    }

    #[inline]
    pub const fn as_unsigned(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn is_success(self) -> bool {
        self.0 == 0
    }

    /// Interpret a raw value of the active revision.
    #[inline]
    pub const fn from_raw(raw: RawExitStatus) -> Self {
        Self(raw as u64)
    }

    /// Map onto a 32-bit host exit code.
    ///
    /// Signed statuses saturate into `i32`; unsigned statuses saturate at
    /// `i32::MAX`, so a failure never maps onto success.
    pub const fn to_host_code(self, signedness: ExitSignedness) -> i32 {
        match signedness {
            ExitSignedness::Signed => {
                let v = self.as_signed();
                if v > i32::MAX as i64 {
                    i32::MAX
                } else if v < i32::MIN as i64 {
                    i32::MIN
                } else {
                    v as i32
                }
            }
            ExitSignedness::Unsigned => {
                if self.0 > i32::MAX as u64 {
                    i32::MAX
                } else {
                    self.0 as i32
                }
            }
        }
    }
}

impl From<i64> for ExitStatus {
    fn from(value: i64) -> Self {
        Self::from_signed(value)
    }
}

impl From<u64> for ExitStatus {
    fn from(value: u64) -> Self {
        Self::from_unsigned(value)
    }
}
