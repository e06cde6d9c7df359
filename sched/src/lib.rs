//! Single-threaded cooperative task runner with a tick clock.

#![no_std]
#![forbid(unsafe_code)]

extern crate alloc;
#[cfg(test)]
extern crate std;

mod scheduler;
mod task;

pub use scheduler::{MAX_YIELD_DEPTH, SchedStats, Scheduler};
pub use task::{CoopTask, TaskId, TaskPoll};
