//! The runtime contract: the `Shim` a backend implements, the checked
//! `Runtime` callers use, and the C surface over the registered shim.

#![no_std]

#[cfg(test)]
extern crate std;

pub mod ffi;
pub mod print;
pub mod runtime;
pub mod shim;
#[cfg(all(target_arch = "x86_64", target_os = "none"))]
pub mod trap;

pub use ffi::{register_shim, registered_runtime, registered_shim};
pub use print::{HandleWriter, PrintBuffer};
pub use runtime::Runtime;
pub use shim::Shim;
#[cfg(all(target_arch = "x86_64", target_os = "none"))]
pub use trap::TrapShim;

pub use tinyrt_abi as abi;
