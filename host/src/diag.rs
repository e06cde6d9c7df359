//! Diagnostic print sinks and the stderr klog sink.

use std::io::Write;
use std::sync::Arc;
use std::vec::Vec;

use spin::Mutex;
use tinyrt_lib::klog::{KlogLevel, LogSink, klog_attach_sink, klog_set_level};

/// Destination of the diagnostic print. Must never panic.
pub trait DiagSink: Send + Sync {
    fn emit(&self, text: &[u8]);
}

/// Collects printed text in memory. Clones share the buffer.
#[derive(Clone, Default)]
pub struct CaptureSink {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<u8> {
        core::mem::take(&mut *self.buf.lock())
    }

    pub fn len(&self) -> usize {
        self.buf.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DiagSink for CaptureSink {
    fn emit(&self, text: &[u8]) {
        self.buf.lock().extend_from_slice(text);
    }
}

/// Writes to the process stderr; write errors are dropped.
pub struct StderrSink;

impl DiagSink for StderrSink {
    fn emit(&self, text: &[u8]) {
        let _ = std::io::stderr().lock().write_all(text);
    }
}

pub struct DiscardSink;

impl DiagSink for DiscardSink {
    fn emit(&self, _text: &[u8]) {}
}

/// klog sink over the process stderr.
pub struct StderrLog;

impl LogSink for StderrLog {
    fn write_str(&self, s: &str) {
        let _ = std::io::stderr().lock().write_all(s.as_bytes());
    }
}

static STDERR_LOG: StderrLog = StderrLog;

/// Route klog to stderr at `level`.
pub fn attach_stderr_log(level: KlogLevel) {
    klog_attach_sink(&STDERR_LOG);
    klog_set_level(level);
}
