//! Hosted reference backend: a [`Shim`](tinyrt_core::Shim) running inside an
//! ordinary process, built from the free-list arena, the reference streams
//! and the cooperative scheduler.

pub mod config;
pub mod diag;
pub mod shim;
pub mod terminate;

pub use config::{ConfigError, DiagTarget, ExitMode, HostConfig, PendingIoPolicy};
pub use diag::{CaptureSink, DiagSink, DiscardSink, StderrLog, StderrSink, attach_stderr_log};
pub use shim::HostedShim;
pub use terminate::{ExitRequest, ProcessExit, Terminator, UnwindExit, catch_exit};
