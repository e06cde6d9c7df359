//! Hosted backend configuration.
//!
//! Built in code through the `with_*` builder methods, or parsed from a
//! kernel-cmdline style string of whitespace-separated `key=value` tokens:
//!
//! ```text
//! heap=65536 pipe=512 handles=16 log=debug io=flush rev=1 diag=capture exit=unwind
//! ```

use std::fmt;

use tinyrt_abi::AbiConfig;
use tinyrt_lib::klog::KlogLevel;

pub const HOST_DEFAULT_HEAP_SIZE: usize = 1024 * 1024;
pub const HOST_DEFAULT_PIPE_CAPACITY: usize = 4096;
pub const HOST_DEFAULT_LINE_LIMIT: usize = 1024;
pub const HOST_DEFAULT_MAX_HANDLES: usize = 32;

/// What `exit` does with output still buffered in streams.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PendingIoPolicy {
    /// Deliver buffered output before terminating.
    #[default]
    Flush,
    /// Drop buffered output.
    Abandon,
}

/// Where the diagnostic print goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DiagTarget {
    #[default]
    Stderr,
    Capture,
    Discard,
}

/// How `exit` leaves the program.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ExitMode {
    /// `std::process::exit` with the mapped host code.
    #[default]
    Process,
    /// Unwind with an `ExitRequest` that `catch_exit` picks up.
    Unwind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Token without `=`.
    MalformedToken(String),
    UnknownKey(String),
    BadValue { key: String, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedToken(token) => write!(f, "malformed token '{}'", token),
            Self::UnknownKey(key) => write!(f, "unknown key '{}'", key),
            Self::BadValue { key, value } => write!(f, "bad value '{}' for '{}'", value, key),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostConfig {
    pub abi: AbiConfig,
    pub heap_size: usize,
    pub pipe_capacity: usize,
    pub line_limit: usize,
    pub max_handles: usize,
    /// Rounds an infinite wait may spin through ready tasks before the
    /// stream is reported stalled. `None` waits as long as any task is
    /// runnable.
    pub stall_rounds: Option<u64>,
    pub io_policy: PendingIoPolicy,
    pub diag: DiagTarget,
    pub exit_mode: ExitMode,
    /// Applied to klog when the shim is built; `None` leaves it alone.
    pub log_level: Option<KlogLevel>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            abi: AbiConfig::CURRENT,
            heap_size: HOST_DEFAULT_HEAP_SIZE,
            pipe_capacity: HOST_DEFAULT_PIPE_CAPACITY,
            line_limit: HOST_DEFAULT_LINE_LIMIT,
            max_handles: HOST_DEFAULT_MAX_HANDLES,
            stall_rounds: None,
            io_policy: PendingIoPolicy::Flush,
            diag: DiagTarget::Stderr,
            exit_mode: ExitMode::Process,
            log_level: None,
        }
    }
}

impl HostConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration for in-process tests: captured diagnostics and an
    /// unwinding exit.
    pub fn for_tests() -> Self {
        Self::default()
            .with_diag(DiagTarget::Capture)
            .with_exit_mode(ExitMode::Unwind)
    }

    pub fn with_abi(mut self, abi: AbiConfig) -> Self {
        self.abi = abi;
        self
    }

    pub fn with_heap_size(mut self, bytes: usize) -> Self {
        self.heap_size = bytes;
        self
    }

    pub fn with_pipe_capacity(mut self, bytes: usize) -> Self {
        self.pipe_capacity = bytes.max(1);
        self
    }

    pub fn with_line_limit(mut self, bytes: usize) -> Self {
        self.line_limit = bytes.max(1);
        self
    }

    pub fn with_max_handles(mut self, count: usize) -> Self {
        self.max_handles = count;
        self
    }

    pub fn with_stall_rounds(mut self, rounds: u64) -> Self {
        self.stall_rounds = Some(rounds);
        self
    }

    pub fn with_io_policy(mut self, policy: PendingIoPolicy) -> Self {
        self.io_policy = policy;
        self
    }

    pub fn with_diag(mut self, diag: DiagTarget) -> Self {
        self.diag = diag;
        self
    }

    pub fn with_exit_mode(mut self, mode: ExitMode) -> Self {
        self.exit_mode = mode;
        self
    }

    pub fn with_log_level(mut self, level: KlogLevel) -> Self {
        self.log_level = Some(level);
        self
    }

    /// Parse a command line over the defaults. Later tokens override
    /// earlier ones.
    pub fn from_cmdline(cmdline: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        for token in cmdline.split_whitespace() {
            config.apply_token(token)?;
        }
        Ok(config)
    }

    fn apply_token(&mut self, token: &str) -> Result<(), ConfigError> {
        let Some((key, value)) = token.split_once('=') else {
            return Err(ConfigError::MalformedToken(token.to_string()));
        };
        let bad = || ConfigError::BadValue {
            key: key.to_string(),
            value: value.to_string(),
        };

        match key {
            "heap" => self.heap_size = parse_size(value).ok_or_else(bad)?,
            "pipe" => self.pipe_capacity = parse_size(value).filter(|&n| n > 0).ok_or_else(bad)?,
            "line" => self.line_limit = parse_size(value).filter(|&n| n > 0).ok_or_else(bad)?,
            "handles" => self.max_handles = parse_size(value).ok_or_else(bad)?,
            "stall" => {
                self.stall_rounds = if value == "off" {
                    None
                } else {
                    Some(value.parse().map_err(|_| bad())?)
                }
            }
            "rev" => {
                let rev = value.parse().map_err(|_| bad())?;
                self.abi = AbiConfig::from_revision(rev).ok_or_else(bad)?;
            }
            "log" => self.log_level = Some(KlogLevel::parse(value).ok_or_else(bad)?),
            "io" => {
                self.io_policy = if value.eq_ignore_ascii_case("flush") {
                    PendingIoPolicy::Flush
                } else if value.eq_ignore_ascii_case("abandon") {
                    PendingIoPolicy::Abandon
                } else {
                    return Err(bad());
                }
            }
            "diag" => {
                self.diag = if value.eq_ignore_ascii_case("stderr") {
                    DiagTarget::Stderr
                } else if value.eq_ignore_ascii_case("capture") {
                    DiagTarget::Capture
                } else if value.eq_ignore_ascii_case("off") || value.eq_ignore_ascii_case("discard") {
                    DiagTarget::Discard
                } else {
                    return Err(bad());
                }
            }
            "exit" => {
                self.exit_mode = if value.eq_ignore_ascii_case("process") {
                    ExitMode::Process
                } else if value.eq_ignore_ascii_case("unwind") {
                    ExitMode::Unwind
                } else {
                    return Err(bad());
                }
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }
}

/// Decimal byte count with an optional `k` or `m` suffix.
fn parse_size(value: &str) -> Option<usize> {
    let (digits, scale) = match value.as_bytes().last()? {
        b'k' | b'K' => (&value[..value.len() - 1], 1024),
        b'm' | b'M' => (&value[..value.len() - 1], 1024 * 1024),
        _ => (value, 1),
    };
    digits.parse::<usize>().ok()?.checked_mul(scale)
}
