#![no_std]

#[cfg(test)]
extern crate std;

pub mod alignment;
pub mod init_flag;
pub mod klog;
#[cfg(all(target_arch = "x86_64", target_os = "none"))]
pub mod serial;
pub mod service_cell;
pub mod testing;

pub use init_flag::InitFlag;
pub use service_cell::ServiceCell;

pub use paste;
