//! Unix process tree operations
//!
//! A child that must be killable as a tree is started as the leader of a new
//! process group; killing the group reaches every descendant that did not
//! move itself into another group or session.

use crate::error::{Error, Result};
use crate::platform::traits::ProcessTreeOps;
use nix::errno::Errno;
use nix::sys::signal::{killpg, Signal as NixSignal};
use nix::unistd::Pid;

#[derive(Debug, Default)]
pub struct UnixProcessTree;

impl UnixProcessTree {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessTreeOps for UnixProcessTree {
    fn prepare(&self, command: &mut tokio::process::Command) {
        command.process_group(0);
    }

    fn kill_process_tree(&self, root_pid: u32) -> Result<()> {
        let pgid = i32::try_from(root_pid).map_err(|_| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Invalid process id: {root_pid}"),
            ))
        })?;

        match killpg(Pid::from_raw(pgid), NixSignal::SIGKILL) {
            Ok(()) | Err(Errno::ESRCH) => Ok(()),
            Err(errno) => Err(Error::Io(std::io::Error::from(errno))),
        }
    }
}
