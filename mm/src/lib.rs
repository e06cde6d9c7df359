//! Reference allocator backend: a free-list arena over one region.

#![no_std]

#[cfg(feature = "alloc")]
extern crate alloc;
#[cfg(test)]
extern crate std;

mod arena;
pub mod block;
mod global;

pub use arena::{HeapArena, HeapStats, ZERO_SIZE_SENTINEL};
pub use global::LazyArena;
