//! COM1 log sink for freestanding x86_64 targets.

use spin::{Mutex, Once};
use uart_16550::SerialPort;

use crate::klog::LogSink;

pub const COM1_BASE: u16 = 0x3f8;

pub struct SerialSink {
    port: Mutex<SerialPort>,
}

impl LogSink for SerialSink {
    fn write_str(&self, s: &str) {
        let mut port = self.port.lock();
        for byte in s.bytes() {
            if byte == b'\n' {
                port.send(b'\r');
            }
            port.send(byte);
        }
    }
}

static COM1: Once<SerialSink> = Once::new();

/// The COM1 sink, initializing the UART on first use.
pub fn com1() -> &'static SerialSink {
    COM1.call_once(|| {
        // SAFETY: COM1_BASE is the standard COM1 port range; nothing else in
        // the runtime touches these ports.
        let mut port = unsafe { SerialPort::new(COM1_BASE) };
        port.init();
        SerialSink {
            port: Mutex::new(port),
        }
    })
}
