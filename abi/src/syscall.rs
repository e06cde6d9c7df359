//! Trap interface of the freestanding kernel backend.
//!
//! The trap shim passes the dispatch number in `rax` and up to three arguments
//! in `rdi`, `rsi`, `rdx`. The kernel answers with a value in `rax` and a
//! status in `rdx`; a zero status means success.

/// Trap dispatch numbers (rax on entry).
#[repr(u64)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SysCallDispatch {
    Open = 0,
    Close = 1,
    Read = 2,
    Write = 3,
    Yield = 4,
    Exit = 5,
    Kill = 6,
    Mmap = 7,
    Munmap = 8,
    Clone = 9,
    Wait = 10,
    Machine = 11,
    GetPid = 12,
}

impl SysCallDispatch {
    #[inline]
    pub const fn number(self) -> u64 {
        self as u64
    }
}

/// Status word returned in `rdx`.
#[repr(i64)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrapStatus {
    Fail = -1,
    Success = 0,
}

impl TryFrom<i64> for TrapStatus {
    type Error = i64;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Success),
            -1 => Ok(Self::Fail),
            _ => Err(value),
        }
    }
}

pub type TrapResult<T> = Result<T, TrapStatus>;

/// Fold the two result registers into a typed result.
///
/// Unknown non-zero statuses are reported as [`TrapStatus::Fail`].
#[inline]
pub fn decode_trap_result(value: u64, status: i64) -> TrapResult<u64> {
    if status != TrapStatus::Success as i64 {
        return Err(TrapStatus::try_from(status).unwrap_or(TrapStatus::Fail));
    }
    Ok(value)
}
