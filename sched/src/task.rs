use core::fmt;

pub type TaskId = u32;

pub const INVALID_TASK_ID: TaskId = 0;

/// Outcome of one step of a cooperative task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskPoll {
    /// More work remains; requeue the task.
    Pending,
    /// The task finished and is dropped.
    Complete,
}

impl TaskPoll {
    #[inline]
    pub fn is_complete(self) -> bool {
        matches!(self, Self::Complete)
    }
}

/// A task state machine stepped by the scheduler.
///
/// `cx` is the context the scheduler was asked to run tasks against; for the
/// hosted runtime that is the shim itself, so a task can perform I/O. A step
/// that blocks inside `cx` may re-enter the scheduler, which never steps a
/// task that is already running.
pub trait CoopTask<Cx: ?Sized>: Send {
    fn step(&mut self, cx: &Cx) -> TaskPoll;
}

impl<Cx: ?Sized, F> CoopTask<Cx> for F
where
    F: FnMut(&Cx) -> TaskPoll + Send,
{
    fn step(&mut self, cx: &Cx) -> TaskPoll {
        self(cx)
    }
}

pub(crate) struct TaskSlot<Cx: ?Sized> {
    pub id: TaskId,
    pub name: &'static str,
    pub steps: u64,
    pub body: alloc::boxed::Box<dyn CoopTask<Cx> + Send>,
}

impl<Cx: ?Sized> fmt::Debug for TaskSlot<Cx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskSlot")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("steps", &self.steps)
            .finish()
    }
}
