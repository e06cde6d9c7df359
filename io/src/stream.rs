//! The backend-side stream interface.
//!
//! Streams never block. A poll that cannot make progress returns `Pending`
//! and the caller decides whether to yield, time out, or give up.

use alloc::sync::Arc;
use core::fmt;

use spin::Mutex;
use tinyrt_abi::RtError;

/// Outcome of one non-blocking transfer attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamPoll {
    /// Bytes moved. For reads, `Ready(0)` with a non-empty buffer is end of
    /// stream.
    Ready(usize),
    /// No progress possible right now.
    Pending,
    /// Hard error; the stream is unusable.
    Faulted,
    /// The stream does not support this direction.
    Unsupported,
}

impl StreamPoll {
    /// Map a terminal poll to the contract result. `Pending` has no mapping.
    pub fn into_result(self) -> Option<Result<usize, RtError>> {
        match self {
            Self::Ready(n) => Some(Ok(n)),
            Self::Pending => None,
            Self::Faulted => Some(Err(RtError::StreamFault)),
            Self::Unsupported => Some(Err(RtError::Unsupported)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamKind {
    PipeReader,
    PipeWriter,
    Loopback,
    Capture,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PipeReader => "pipe-reader",
            Self::PipeWriter => "pipe-writer",
            Self::Loopback => "loopback",
            Self::Capture => "capture",
        })
    }
}

pub trait Stream: Send {
    fn kind(&self) -> StreamKind;

    fn poll_read(&mut self, buf: &mut [u8]) -> StreamPoll {
        let _ = buf;
        StreamPoll::Unsupported
    }

    fn poll_write(&mut self, buf: &[u8]) -> StreamPoll {
        let _ = buf;
        StreamPoll::Unsupported
    }

    /// Push any buffered output to its destination.
    fn flush(&mut self) {}

    /// Drop any buffered output without delivering it.
    fn abandon(&mut self) {}
}

/// A stream shared between the handle table and in-flight calls.
pub type SharedStream = Arc<Mutex<dyn Stream>>;

pub fn share<S: Stream + 'static>(stream: S) -> SharedStream {
    Arc::new(Mutex::new(stream))
}
