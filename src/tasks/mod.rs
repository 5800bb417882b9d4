//! Task execution
//!
//! A [`Task`] wraps one async handler with its execution policy: whether it
//! is enabled, whether its errors are ignored, whether it runs as a finalizer
//! after an earlier failure and how long it may take. A [`TaskList`] runs
//! tasks in order, logging an `[i/N] name` header for each one, and can be
//! nested inside another list through [`Task::list`].
//!
//! Handlers that want to log or run shell commands take a [`TaskContext`];
//! lines logged through it are indented under the list that runs the task.

pub mod context;
pub mod list;
pub mod task;

pub use context::TaskContext;
pub use list::TaskList;
pub use task::{ExecuteOverrides, Handler, HandlerFuture, Task};

use std::fmt;

use uuid::Uuid;

/// Unique identity of a task, stable across clones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Constructed, no handler bound
    Idle,
    /// Handler or list bound, ready to execute
    Armed,
    Executing,
    Completed,
    Failed,
    /// Disabled, handler not invoked
    Skipped,
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskState::Idle => "idle",
            TaskState::Armed => "armed",
            TaskState::Executing => "executing",
            TaskState::Completed => "completed",
            TaskState::Failed => "failed",
            TaskState::Skipped => "skipped",
        };
        f.write_str(name)
    }
}
