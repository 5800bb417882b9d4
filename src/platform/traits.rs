//! Platform-specific operation traits
//!
//! These traits define the interface for platform-specific operations,
//! allowing for clean abstraction and easier testing.

use crate::error::Result;

/// Platform-specific process tree operations
pub trait ProcessTreeOps: Send + Sync {
    /// Configure a command so its whole tree can be killed later
    fn prepare(&self, _command: &mut tokio::process::Command) {}

    /// Forcefully kill a process prepared with [`prepare`](Self::prepare)
    /// and all of its descendants. A process that is already gone is not an
    /// error.
    fn kill_process_tree(&self, root_pid: u32) -> Result<()>;
}
