//! Leveled runtime log.
//!
//! Lines go to one attached [`LogSink`] and are dropped while none is
//! attached. Each line is prefixed with its level tag.

use core::fmt;
use core::sync::atomic::{AtomicU8, Ordering};

use spin::RwLock;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum KlogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl KlogLevel {
    fn from_raw(raw: u8) -> Self {
        match raw {
            0 => KlogLevel::Error,
            1 => KlogLevel::Warn,
            2 => KlogLevel::Info,
            3 => KlogLevel::Debug,
            _ => KlogLevel::Trace,
        }
    }

    pub const fn tag(self) -> &'static str {
        match self {
            KlogLevel::Error => "error",
            KlogLevel::Warn => "warn",
            KlogLevel::Info => "info",
            KlogLevel::Debug => "debug",
            KlogLevel::Trace => "trace",
        }
    }

    /// Parse a level name as used in configuration strings.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "error" => Some(KlogLevel::Error),
            "warn" => Some(KlogLevel::Warn),
            "info" => Some(KlogLevel::Info),
            "debug" => Some(KlogLevel::Debug),
            "trace" => Some(KlogLevel::Trace),
            _ => None,
        }
    }
}

/// Destination for log lines. Implementations must not call back into klog.
pub trait LogSink: Sync {
    fn write_str(&self, s: &str);
}

static CURRENT_LEVEL: AtomicU8 = AtomicU8::new(KlogLevel::Info as u8);
static SINK: RwLock<Option<&'static dyn LogSink>> = RwLock::new(None);

#[inline(always)]
fn is_enabled(level: KlogLevel) -> bool {
    level as u8 <= CURRENT_LEVEL.load(Ordering::Relaxed)
}

pub fn log_args(level: KlogLevel, args: fmt::Arguments<'_>) {
    if !is_enabled(level) {
        return;
    }
    let sink = SINK.read();
    let Some(sink) = *sink else {
        return;
    };
    struct KlogWriter<'a>(&'a dyn LogSink);
    impl fmt::Write for KlogWriter<'_> {
        fn write_str(&mut self, s: &str) -> fmt::Result {
            self.0.write_str(s);
            Ok(())
        }
    }
    let mut out = KlogWriter(sink);
    let _ = fmt::write(&mut out, format_args!("[{}] {}\n", level.tag(), args));
}

pub fn klog_init() {
    CURRENT_LEVEL.store(KlogLevel::Info as u8, Ordering::Relaxed);
    *SINK.write() = None;
}

/// Route log output to `sink`, replacing any previous sink.
pub fn klog_attach_sink(sink: &'static dyn LogSink) {
    *SINK.write() = Some(sink);
}

/// Route log output to COM1.
#[cfg(all(target_arch = "x86_64", target_os = "none"))]
pub fn klog_attach_serial() {
    klog_attach_sink(crate::serial::com1());
}

pub fn klog_set_level(level: KlogLevel) {
    CURRENT_LEVEL.store(level as u8, Ordering::Relaxed);
}

pub fn klog_get_level() -> KlogLevel {
    KlogLevel::from_raw(CURRENT_LEVEL.load(Ordering::Relaxed))
}

pub fn klog_is_enabled(level: KlogLevel) -> bool {
    is_enabled(level)
}

#[macro_export]
macro_rules! klog {
    ($level:expr, $($arg:tt)*) => {{
        $crate::klog::log_args($level, ::core::format_args!($($arg)*));
    }};
}

#[macro_export]
macro_rules! klog_error {
    ($($arg:tt)*) => {
        $crate::klog::log_args($crate::klog::KlogLevel::Error, ::core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! klog_warn {
    ($($arg:tt)*) => {
        $crate::klog::log_args($crate::klog::KlogLevel::Warn, ::core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! klog_info {
    ($($arg:tt)*) => {
        $crate::klog::log_args($crate::klog::KlogLevel::Info, ::core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! klog_debug {
    ($($arg:tt)*) => {
        $crate::klog::log_args($crate::klog::KlogLevel::Debug, ::core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! klog_trace {
    ($($arg:tt)*) => {
        $crate::klog::log_args($crate::klog::KlogLevel::Trace, ::core::format_args!($($arg)*))
    };
}
