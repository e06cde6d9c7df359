//! How the hosted backend leaves the program on `exit`.

use std::any::Any;
use std::boxed::Box;
use std::panic::{self, AssertUnwindSafe};

use tinyrt_abi::ExitStatus;

pub trait Terminator: Send + Sync {
    /// Leave the program. `code` is `status` already mapped onto the host's
    /// 32-bit exit code.
    fn terminate(&self, status: ExitStatus, code: i32) -> !;
}

/// Ends the host process.
pub struct ProcessExit;

impl Terminator for ProcessExit {
    fn terminate(&self, _status: ExitStatus, code: i32) -> ! {
        std::process::exit(code)
    }
}

/// Payload carried by an unwinding exit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExitRequest {
    pub status: ExitStatus,
    pub code: i32,
}

/// Unwinds to the nearest [`catch_exit`]. The panic hook is not invoked.
pub struct UnwindExit;

impl Terminator for UnwindExit {
    fn terminate(&self, status: ExitStatus, code: i32) -> ! {
        panic::resume_unwind(Box::new(ExitRequest { status, code }))
    }
}

/// Run `body`, turning an unwinding exit into `Err(ExitRequest)`. Other
/// panics keep unwinding.
pub fn catch_exit<R>(body: impl FnOnce() -> R) -> Result<R, ExitRequest> {
    match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(value) => Ok(value),
        Err(payload) => Err(into_exit_request(payload)),
    }
}

fn into_exit_request(payload: Box<dyn Any + Send>) -> ExitRequest {
    match payload.downcast::<ExitRequest>() {
        Ok(request) => *request,
        Err(other) => panic::resume_unwind(other),
    }
}
