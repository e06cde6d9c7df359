//! tinyrt caller/shim ABI types
//!
//! This crate provides the canonical definitions for every value that crosses
//! the runtime boundary. Having a single source of truth eliminates:
//! - Duplicate handle and status definitions between caller and backend
//! - Width mismatches between the two header revisions
//! - Magic numbers for error codes
//!
//! Raw boundary types are `#[repr(transparent)]` or `#[repr(i32)]` for ABI stability.

#![no_std]
#![forbid(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod config;
pub mod error;
pub mod exit;
pub mod handle;
pub mod syscall;
pub mod timeout;

pub use config::*;
pub use error::*;
pub use exit::*;
pub use handle::*;
pub use timeout::*;

/// Alignment guaranteed for every non-empty allocation.
///
/// Covers every primitive type on the supported targets (`u128`, `f64`, SIMD-free).
pub const MAX_ALIGN: usize = 16;
