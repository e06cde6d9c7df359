use crate::ring::ByteRing;
use crate::stream::{Stream, StreamKind, StreamPoll};

/// A single handle whose writes come back out of its reads, in order.
pub struct LoopbackStream {
    ring: ByteRing,
}

impl LoopbackStream {
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: ByteRing::with_capacity(capacity),
        }
    }

    pub fn buffered(&self) -> usize {
        self.ring.len()
    }
}

impl Stream for LoopbackStream {
    fn kind(&self) -> StreamKind {
        StreamKind::Loopback
    }

    fn poll_read(&mut self, buf: &mut [u8]) -> StreamPoll {
        // The writer is this same handle, so an empty ring never means EOF.
        if self.ring.is_empty() {
            StreamPoll::Pending
        } else {
            StreamPoll::Ready(self.ring.pop_into(buf))
        }
    }

    fn poll_write(&mut self, buf: &[u8]) -> StreamPoll {
        if self.ring.is_full() {
            return StreamPoll::Pending;
        }
        StreamPoll::Ready(self.ring.push_slice(buf))
    }

    fn abandon(&mut self) {
        self.ring.clear();
    }
}
