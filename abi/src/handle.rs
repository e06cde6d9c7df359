//! Opaque stream handles.
//!
//! A handle names an open stream inside a shim-owned table. The caller side
//! never does arithmetic on it; the only operations are construction from the
//! raw boundary value and passing it back through the contract.

use core::fmt;

/// Raw handle type of the active ABI revision (revision 2: `uint32_t`).
#[cfg(not(all(feature = "rev1", not(feature = "rev2"))))]
pub type RawHandle = u32;

/// Raw handle type of the active ABI revision (revision 1: `size_t`).
#[cfg(all(feature = "rev1", not(feature = "rev2")))]
pub type RawHandle = usize;

/// An opaque, shim-issued stream identifier.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Handle(RawHandle);

impl Handle {
    /// Pre-issued standard input stream.
    pub const STDIN: Self = Self(0);
    /// Pre-issued standard output stream.
    pub const STDOUT: Self = Self(1);
    /// Pre-issued standard error stream.
    pub const STDERR: Self = Self(2);

    /// Wrap a raw boundary value.
    #[inline]
    pub const fn from_raw(raw: RawHandle) -> Self {
        Self(raw)
    }

    /// Returns the raw boundary value.
    #[inline]
    pub const fn raw(self) -> RawHandle {
        self.0
    }

    /// Table slot for shim-side lookups. Only backends should call this.
    #[inline]
    pub const fn slot(self) -> usize {
        self.0 as usize
    }

    /// Build a handle from a table slot, failing if it does not fit the raw width.
    #[inline]
    pub fn try_from_slot(slot: usize) -> Option<Self> {
        RawHandle::try_from(slot).ok().map(Self)
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.0)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
