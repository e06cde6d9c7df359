//! Byte streams and the handle table of the reference backends.

#![no_std]
#![forbid(unsafe_code)]

extern crate alloc;
#[cfg(test)]
extern crate std;

pub mod capture;
pub mod loopback;
pub mod pipe;
pub mod ring;
pub mod stream;
pub mod table;

pub use capture::CaptureStream;
pub use loopback::LoopbackStream;
pub use pipe::{PipeReader, PipeWriter, pipe};
pub use ring::ByteRing;
pub use stream::{SharedStream, Stream, StreamKind, StreamPoll, share};
pub use table::{HANDLE_TABLE_MAX, HandleTable};
