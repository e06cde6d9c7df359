//! Read timeouts, measured in scheduler ticks.

/// Boundary encoding of an infinite timeout (`size_t` all-ones).
pub const TIMEOUT_INFINITE: usize = usize::MAX;

/// Upper bound on how long a read may wait for data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Timeout {
    /// Block until data, end of stream, or a fault.
    #[default]
    Infinite,
    /// Wait at most this many ticks. Zero polls once.
    Ticks(u64),
}

impl Timeout {
    pub const POLL: Self = Self::Ticks(0);

    #[inline]
    pub const fn is_poll(self) -> bool {
        matches!(self, Self::Ticks(0))
    }

    #[inline]
    pub const fn is_infinite(self) -> bool {
        matches!(self, Self::Infinite)
    }

    /// Decode the boundary `size_t` parameter.
    #[inline]
    pub const fn from_raw(raw: usize) -> Self {
        if raw == TIMEOUT_INFINITE {
            Self::Infinite
        } else {
            Self::Ticks(raw as u64)
        }
    }

    /// Encode for the boundary. Finite values too wide for `size_t` saturate to
    /// the largest finite value.
    #[inline]
    pub const fn to_raw(self) -> usize {
        match self {
            Self::Infinite => TIMEOUT_INFINITE,
            Self::Ticks(t) => {
                if t >= TIMEOUT_INFINITE as u64 {
                    TIMEOUT_INFINITE - 1
                } else {
                    t as usize
                }
            }
        }
    }

    /// Absolute tick at which a wait started at `now` expires, `None` if never.
    #[inline]
    pub const fn deadline(self, now: u64) -> Option<u64> {
        match self {
            Self::Infinite => None,
            Self::Ticks(t) => Some(now.saturating_add(t)),
        }
    }
}
