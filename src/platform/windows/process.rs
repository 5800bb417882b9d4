//! Windows process tree operations

use crate::error::{Error, Result};
use crate::platform::traits::ProcessTreeOps;
use std::process::{Command, Stdio};

#[derive(Debug, Default)]
pub struct WindowsProcessTree;

impl WindowsProcessTree {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessTreeOps for WindowsProcessTree {
    fn kill_process_tree(&self, root_pid: u32) -> Result<()> {
        // taskkill walks the parent links itself with /T
        let status = Command::new("taskkill")
            .args(["/PID", &root_pid.to_string(), "/T", "/F"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(Error::Io)?;

        // Exit code 128: no such process
        match status.code() {
            Some(0) | Some(128) => Ok(()),
            code => Err(Error::Io(std::io::Error::other(format!(
                "taskkill failed for process {root_pid}: {code:?}"
            )))),
        }
    }
}
