//! Failed shell command

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use super::printer::CommandDescription;
use super::{Output, ShellCommand, ShellEnvironment};
use crate::ansi;
use crate::decorators::Describe;

/// Why a command failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellErrorKind {
    /// Non-zero exit status
    Command { exit_code: i32 },
    /// Deadline elapsed; the process tree was killed
    Timeout { timeout: Duration },
}

impl fmt::Display for ShellErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShellErrorKind::Command { exit_code } => {
                write!(f, "Command returned non-zero status code: {exit_code}")
            }
            ShellErrorKind::Timeout { timeout } => {
                write!(f, "Command did not finish in time: {} seconds", seconds(*timeout))
            }
        }
    }
}

/// A command that exited with a non-zero status or did not finish in time.
///
/// Carries the full invocation context so the top-level runner can print a
/// reproducible diagnostic.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}")]
pub struct ShellError {
    pub kind: ShellErrorKind,
    pub command: ShellCommand,
    pub cwd: PathBuf,
    pub env: ShellEnvironment,
    pub stdout: Option<Output>,
    pub stderr: Option<Output>,
}

impl ShellError {
    pub fn exit_code(&self) -> Option<i32> {
        match self.kind {
            ShellErrorKind::Command { exit_code } => Some(exit_code),
            ShellErrorKind::Timeout { .. } => None,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        match self.kind {
            ShellErrorKind::Timeout { timeout } => Some(timeout),
            ShellErrorKind::Command { .. } => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self.kind, ShellErrorKind::Timeout { .. })
    }

    /// Bold headline followed by the working directory, environment and
    /// command lines.
    pub fn pretty_message(&self, colors: bool) -> Vec<String> {
        let headline = match self.kind {
            ShellErrorKind::Command { exit_code } => {
                format!("The following command exited with: {exit_code}")
            }
            ShellErrorKind::Timeout { timeout } => {
                format!("The following command timed out ({} seconds)", seconds(timeout))
            }
        };

        let mut lines = vec![ansi::bold(colors, &headline)];
        lines.extend(CommandDescription::new(&self.command, &self.env, &self.cwd).describe(colors));
        lines
    }
}

/// Seconds without a trailing `.0` for whole values
fn seconds(timeout: Duration) -> String {
    let secs = timeout.as_secs_f64();
    if secs.fract() == 0.0 {
        format!("{}", timeout.as_secs())
    } else {
        format!("{secs}")
    }
}
