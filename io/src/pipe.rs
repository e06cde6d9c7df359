//! Unidirectional in-memory pipe.
//!
//! Reads see end of stream once the writer is gone and the buffer drained.
//! Writes fault once the reader is gone.

use alloc::sync::Arc;

use spin::Mutex;

use crate::ring::ByteRing;
use crate::stream::{Stream, StreamKind, StreamPoll};

struct PipeState {
    ring: ByteRing,
    writer_open: bool,
    reader_open: bool,
}

pub struct PipeReader {
    shared: Arc<Mutex<PipeState>>,
}

pub struct PipeWriter {
    shared: Arc<Mutex<PipeState>>,
}

/// Create a pipe buffering at most `capacity` bytes.
pub fn pipe(capacity: usize) -> (PipeReader, PipeWriter) {
    let shared = Arc::new(Mutex::new(PipeState {
        ring: ByteRing::with_capacity(capacity),
        writer_open: true,
        reader_open: true,
    }));
    (
        PipeReader {
            shared: shared.clone(),
        },
        PipeWriter { shared },
    )
}

impl PipeReader {
    /// Bytes buffered and not yet read.
    pub fn available(&self) -> usize {
        self.shared.lock().ring.len()
    }

    pub fn writer_closed(&self) -> bool {
        !self.shared.lock().writer_open
    }
}

impl PipeWriter {
    /// Free buffer space.
    pub fn space(&self) -> usize {
        self.shared.lock().ring.free()
    }

    pub fn reader_closed(&self) -> bool {
        !self.shared.lock().reader_open
    }
}

impl Stream for PipeReader {
    fn kind(&self) -> StreamKind {
        StreamKind::PipeReader
    }

    fn poll_read(&mut self, buf: &mut [u8]) -> StreamPoll {
        let mut state = self.shared.lock();
        if !state.ring.is_empty() {
            return StreamPoll::Ready(state.ring.pop_into(buf));
        }
        if state.writer_open {
            StreamPoll::Pending
        } else {
            StreamPoll::Ready(0)
        }
    }
}

impl Stream for PipeWriter {
    fn kind(&self) -> StreamKind {
        StreamKind::PipeWriter
    }

    fn poll_write(&mut self, buf: &[u8]) -> StreamPoll {
        let mut state = self.shared.lock();
        if !state.reader_open {
            return StreamPoll::Faulted;
        }
        if state.ring.is_full() {
            return StreamPoll::Pending;
        }
        StreamPoll::Ready(state.ring.push_slice(buf))
    }

    fn abandon(&mut self) {
        self.shared.lock().ring.clear();
    }
}

impl Drop for PipeReader {
    fn drop(&mut self) {
        self.shared.lock().reader_open = false;
    }
}

impl Drop for PipeWriter {
    fn drop(&mut self) {
        self.shared.lock().writer_open = false;
    }
}
