//! ABI revision configuration.
//!
//! Two header revisions of the runtime boundary exist. They do not describe
//! different contracts, only width and capability choices, so they are folded
//! into one configuration value that every backend publishes.

use bitflags::bitflags;

/// Width of the raw handle on the boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HandleWidth {
    /// `uint32_t`
    Narrow32,
    /// `size_t`
    SizeNative,
}

/// How the 64-bit exit status is interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExitSignedness {
    Signed,
    Unsigned,
}

bitflags! {
    /// Optional capabilities advertised by a backend.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AbiCaps: u32 {
        /// `read` accepts a timeout.
        const READ_TIMEOUT = 1 << 0;
        /// The C surface exports `free`; revision 1 only exports `__c_heap`.
        const HEAP_RELEASE = 1 << 1;
        /// Standard handles 0-2 are pre-issued.
        const STD_HANDLES = 1 << 2;
    }
}

/// The configuration option `{handle width, exit signedness, timeout support}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AbiConfig {
    pub revision: u32,
    pub handle_width: HandleWidth,
    pub exit_signedness: ExitSignedness,
    pub caps: AbiCaps,
}

impl AbiConfig {
    /// `size_t` handles, `uint64_t` exit status, no timeout, `__c_heap`.
    pub const REV1: Self = Self {
        revision: 1,
        handle_width: HandleWidth::SizeNative,
        exit_signedness: ExitSignedness::Unsigned,
        caps: AbiCaps::STD_HANDLES,
    };

    /// `uint32_t` handles, `int64_t` exit status, timeout, `malloc`/`free`.
    pub const REV2: Self = Self {
        revision: 2,
        handle_width: HandleWidth::Narrow32,
        exit_signedness: ExitSignedness::Signed,
        caps: AbiCaps::READ_TIMEOUT
            .union(AbiCaps::HEAP_RELEASE)
            .union(AbiCaps::STD_HANDLES),
    };

    /// Revision selected by the crate features.
    #[cfg(not(all(feature = "rev1", not(feature = "rev2"))))]
    pub const CURRENT: Self = Self::REV2;

    /// Revision selected by the crate features.
    #[cfg(all(feature = "rev1", not(feature = "rev2")))]
    pub const CURRENT: Self = Self::REV1;

    pub const fn from_revision(revision: u32) -> Option<Self> {
        match revision {
            1 => Some(Self::REV1),
            2 => Some(Self::REV2),
            _ => None,
        }
    }

    #[inline]
    pub const fn timeout_supported(&self) -> bool {
        self.caps.contains(AbiCaps::READ_TIMEOUT)
    }

    #[inline]
    pub const fn release_supported(&self) -> bool {
        self.caps.contains(AbiCaps::HEAP_RELEASE)
    }
}

impl Default for AbiConfig {
    fn default() -> Self {
        Self::CURRENT
    }
}
