//! Atomic one-shot flag for runtime subsystems.
//!
//! `InitFlag` answers "has X happened?" and only ever moves from unset to set
//! (outside of tests).
//!
//! # Memory Ordering
//!
//! - `init_once()` uses a `SeqCst` swap
//! - `mark_set()` uses `Release` to publish side-effects
//! - `is_set()` uses `Acquire` to observe them

use core::sync::atomic::{AtomicBool, Ordering};

/// Atomic flag for tracking one-shot initialization.
///
/// ```ignore
/// if !exited.init_once() {
///     return; // already terminated
/// }
/// ```
#[repr(transparent)]
pub struct InitFlag {
    flag: AtomicBool,
}

impl InitFlag {
    #[inline]
    pub const fn new() -> Self {
        Self {
            flag: AtomicBool::new(false),
        }
    }

    /// Returns `true` for exactly one caller: the one that flipped the flag.
    #[inline]
    pub fn init_once(&self) -> bool {
        !self.flag.swap(true, Ordering::SeqCst)
    }

    #[inline]
    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Mark completion of a staged initialization.
    #[inline]
    pub fn mark_set(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Reset to unset. Only for tests and re-initializable subsystems.
    #[inline]
    pub fn reset(&self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl Default for InitFlag {
    fn default() -> Self {
        Self::new()
    }
}
