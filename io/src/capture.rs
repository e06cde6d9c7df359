use alloc::sync::Arc;
use alloc::vec::Vec;

use spin::Mutex;

use crate::stream::{Stream, StreamKind, StreamPoll};

#[derive(Default)]
struct CaptureState {
    /// Delivered output, visible to the host.
    committed: Vec<u8>,
    /// Current unterminated line.
    pending: Vec<u8>,
}

impl CaptureState {
    fn commit(&mut self) {
        let pending = core::mem::take(&mut self.pending);
        self.committed.extend_from_slice(&pending);
    }
}

/// Line-buffered write-only sink whose output the host drains.
///
/// Complete lines are delivered immediately. A partial line is delivered by
/// `flush`, or when it grows past `line_limit`. Clones share the same buffer,
/// so the host keeps one clone while the handle table owns another.
#[derive(Clone)]
pub struct CaptureStream {
    state: Arc<Mutex<CaptureState>>,
    line_limit: usize,
}

impl CaptureStream {
    pub fn new(line_limit: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(CaptureState::default())),
            line_limit: line_limit.max(1),
        }
    }

    /// Flush, then take everything delivered so far.
    pub fn take(&self) -> Vec<u8> {
        let mut state = self.state.lock();
        state.commit();
        core::mem::take(&mut state.committed)
    }

    /// Take only what has been delivered, leaving a partial line buffered.
    pub fn take_committed(&self) -> Vec<u8> {
        core::mem::take(&mut self.state.lock().committed)
    }

    pub fn pending_len(&self) -> usize {
        self.state.lock().pending.len()
    }
}

impl Stream for CaptureStream {
    fn kind(&self) -> StreamKind {
        StreamKind::Capture
    }

    fn poll_write(&mut self, buf: &[u8]) -> StreamPoll {
        let mut state = self.state.lock();
        let mut rest = buf;
        while let Some(pos) = rest.iter().position(|&b| b == b'\n') {
            let (line, tail) = rest.split_at(pos + 1);
            state.pending.extend_from_slice(line);
            state.commit();
            rest = tail;
        }
        state.pending.extend_from_slice(rest);
        if state.pending.len() >= self.line_limit {
            state.commit();
        }
        StreamPoll::Ready(buf.len())
    }

    fn flush(&mut self) {
        self.state.lock().commit();
    }

    fn abandon(&mut self) {
        self.state.lock().pending.clear();
    }
}
