use alloc::boxed::Box;
use alloc::collections::VecDeque;
use core::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use spin::Mutex;
use tinyrt_lib::{klog_debug, klog_trace};

use crate::task::{CoopTask, INVALID_TASK_ID, TaskId, TaskPoll, TaskSlot};

/// Nesting bound for yields issued from inside a running task. Past it a
/// yield only advances the clock.
pub const MAX_YIELD_DEPTH: u32 = 8;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchedStats {
    pub total_yields: u64,
    pub total_steps: u64,
    pub tasks_spawned: u32,
    pub tasks_completed: u32,
    pub depth_limited_yields: u64,
    pub clock_jumps: u64,
}

struct ReadyQueue<Cx: ?Sized> {
    tasks: VecDeque<TaskSlot<Cx>>,
    next_id: TaskId,
    stats: SchedStats,
}

/// Cooperative runner. One tick is one yield round.
///
/// The ready queue lock is never held while a task runs, so tasks may spawn,
/// yield, or block on I/O that yields.
pub struct Scheduler<Cx: ?Sized + 'static> {
    queue: Mutex<ReadyQueue<Cx>>,
    clock: AtomicU64,
    depth: AtomicU32,
}

impl<Cx: ?Sized + 'static> Default for Scheduler<Cx> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Cx: ?Sized + 'static> Scheduler<Cx> {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(ReadyQueue {
                tasks: VecDeque::new(),
                next_id: INVALID_TASK_ID + 1,
                stats: SchedStats::default(),
            }),
            clock: AtomicU64::new(0),
            depth: AtomicU32::new(0),
        }
    }

    /// Queue a task at the back of the ready queue.
    pub fn spawn<T>(&self, name: &'static str, task: T) -> TaskId
    where
        T: CoopTask<Cx> + 'static,
    {
        let mut queue = self.queue.lock();
        let id = queue.next_id;
        queue.next_id = queue.next_id.wrapping_add(1).max(INVALID_TASK_ID + 1);
        queue.stats.tasks_spawned += 1;
        queue.tasks.push_back(TaskSlot {
            id,
            name,
            steps: 0,
            body: Box::new(task),
        });
        klog_debug!("sched: spawned task {} '{}' ready_count={}", id, name, queue.tasks.len());
        id
    }

    /// Current tick.
    #[inline]
    pub fn now(&self) -> u64 {
        self.clock.load(Ordering::Acquire)
    }

    /// Move the clock forward to `tick`. Never moves it backwards.
    pub fn advance_to(&self, tick: u64) {
        let prev = self.clock.fetch_max(tick, Ordering::AcqRel);
        if tick > prev {
            self.queue.lock().stats.clock_jumps += 1;
            klog_trace!("sched: clock {} -> {}", prev, tick);
        }
    }

    /// Tasks waiting in the ready queue. A task that is currently being
    /// stepped is not counted.
    pub fn ready_count(&self) -> usize {
        self.queue.lock().tasks.len()
    }

    pub fn has_ready(&self) -> bool {
        self.ready_count() != 0
    }

    /// Nesting depth of yields currently in progress.
    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> SchedStats {
        self.queue.lock().stats
    }

    /// Drop every queued task.
    pub fn clear(&self) -> usize {
        let mut queue = self.queue.lock();
        let dropped = queue.tasks.len();
        queue.tasks.clear();
        dropped
    }

    /// One cooperative round: advance the clock by one tick and step every
    /// task that was ready when the round started, once.
    ///
    /// Returns the number of tasks stepped. Never blocks and never
    /// allocates.
    pub fn yield_now(&self, cx: &Cx) -> usize {
        self.clock.fetch_add(1, Ordering::AcqRel);

        let round = {
            let mut queue = self.queue.lock();
            queue.stats.total_yields += 1;
            if self.depth.load(Ordering::Acquire) >= MAX_YIELD_DEPTH {
                queue.stats.depth_limited_yields += 1;
                return 0;
            }
            queue.tasks.len()
        };

        self.depth.fetch_add(1, Ordering::AcqRel);
        let mut stepped = 0;
        for _ in 0..round {
            let Some(mut slot) = self.queue.lock().tasks.pop_front() else {
                break;
            };

            let poll = slot.body.step(cx);
            slot.steps += 1;
            stepped += 1;

            let mut queue = self.queue.lock();
            queue.stats.total_steps += 1;
            match poll {
                TaskPoll::Pending => queue.tasks.push_back(slot),
                TaskPoll::Complete => {
                    queue.stats.tasks_completed += 1;
                    klog_debug!(
                        "sched: task {} '{}' complete after {} steps",
                        slot.id,
                        slot.name,
                        slot.steps
                    );
                }
            }
        }
        self.depth.fetch_sub(1, Ordering::AcqRel);
        stepped
    }

    /// Run rounds until no task is ready or `max_rounds` have run.
    /// Returns the number of rounds run.
    pub fn run_until_idle(&self, cx: &Cx, max_rounds: usize) -> usize {
        let mut rounds = 0;
        while rounds < max_rounds && self.has_ready() {
            self.yield_now(cx);
            rounds += 1;
        }
        rounds
    }
}
