//! Subprocess execution
//!
//! Spawns one command, feeds its output to capture buffers or line sinks and
//! translates the way it ended into a [`ShellResult`] or a [`ShellError`].

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio::task::AbortHandle;

use super::pipe::{OutputSink, Reader};
use super::{Output, ShellCommand, ShellEnvironment, ShellError, ShellErrorKind, ShellResult};
use crate::decorators::under_deadline;
use crate::error::{Error, Result};
use crate::platform::Platform;

/// Options forwarded to the process layer, fully resolved
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ResolvedOptions {
    pub text: bool,
    pub capture_output: bool,
    pub check: bool,
    pub cwd: PathBuf,
    pub timeout: Option<Duration>,
}

/// Everything needed to run one command
#[derive(Clone, Copy)]
pub(crate) struct Invocation<'a> {
    pub interpreter: &'a [String],
    pub command: &'a ShellCommand,
    pub env: &'a ShellEnvironment,
    pub options: &'a ResolvedOptions,
    pub stdout: &'a OutputSink,
    pub stderr: &'a OutputSink,
}

/// Stops a running command when its call is dropped before completion.
///
/// `kill_on_drop` only reaches the direct child; the guard also kills the
/// process group (when one was created) and aborts the output readers so
/// nothing keeps writing to the sinks.
struct RunningGuard {
    pid: Option<u32>,
    tree: bool,
    readers: Vec<AbortHandle>,
    armed: bool,
}

impl RunningGuard {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        if let (true, Some(pid)) = (self.tree, self.pid) {
            debug!("Call dropped while running, killing process tree {}", pid);
            if let Err(e) = Platform::process_tree().kill_process_tree(pid) {
                warn!("Failed to kill process tree {}: {}", pid, e);
            }
        }

        for reader in &self.readers {
            reader.abort();
        }
    }
}

enum Outcome {
    Exited(ExitStatus),
    TimedOut(Duration),
}

/// Run the command to completion or until its deadline.
pub(crate) async fn execute(inv: Invocation<'_>) -> Result<ShellResult> {
    let argv = inv.command.to_argv(inv.interpreter)?;
    let options = inv.options;
    let env = inv.env.effective_os();

    let tree = options.timeout.is_some() || under_deadline();
    let mut child = spawn(&argv, &env, &options.cwd, tree, inv)?;

    let stdout = child
        .stdout
        .take()
        .and_then(|pipe| Reader::start(pipe, options.capture_output, inv.stdout));
    let stderr = child
        .stderr
        .take()
        .and_then(|pipe| Reader::start(pipe, options.capture_output, inv.stderr));

    let mut guard = RunningGuard {
        pid: child.id(),
        tree,
        readers: stdout.iter().chain(stderr.iter()).map(Reader::abort_handle).collect(),
        armed: true,
    };

    let outcome = wait(&mut child, options.timeout).await;

    // Readers are joined on every path so no pipe outlives the call
    let (stdout, stderr) = match outcome {
        Ok(Outcome::Exited(_)) => (join(stdout).await, join(stderr).await),
        _ => (drain(stdout).await, drain(stderr).await),
    };
    guard.disarm();
    let stdout = stdout.map(|bytes| Output::decode(bytes, options.text));
    let stderr = stderr.map(|bytes| Output::decode(bytes, options.text));

    let failure = |kind| ShellError {
        kind,
        command: inv.command.clone(),
        cwd: options.cwd.clone(),
        env: inv.env.clone(),
        stdout: stdout.clone(),
        stderr: stderr.clone(),
    };

    match outcome? {
        Outcome::TimedOut(timeout) => Err(failure(ShellErrorKind::Timeout { timeout }).into()),
        Outcome::Exited(status) => {
            let exit_code = exit_code(status);
            debug!("Command exited with {}", exit_code);

            if options.check && exit_code != 0 {
                return Err(failure(ShellErrorKind::Command { exit_code }).into());
            }

            Ok(ShellResult {
                exit_code,
                stdout,
                stderr,
            })
        }
    }
}

fn spawn(
    argv: &[String],
    env: &BTreeMap<OsString, OsString>,
    cwd: &Path,
    tree: bool,
    inv: Invocation<'_>,
) -> Result<Child> {
    let (program, args) = argv.split_first().ok_or(Error::EmptyCommand)?;
    let options = inv.options;

    let (stdout, stderr) = if options.capture_output {
        (Stdio::piped(), Stdio::piped())
    } else {
        (inv.stdout.stdio(), inv.stderr.stdio())
    };

    let mut command = Command::new(program);
    command
        .args(args)
        .env_clear()
        .envs(env)
        .current_dir(cwd)
        .stdin(Stdio::inherit())
        .stdout(stdout)
        .stderr(stderr)
        .kill_on_drop(true);

    if tree {
        Platform::process_tree().prepare(&mut command);
    }

    debug!("Spawning {:?} in {}", argv, cwd.display());
    command.spawn().map_err(|source| Error::CommandSpawnFailed {
        command: argv.join(" "),
        source,
    })
}

async fn wait(child: &mut Child, timeout: Option<Duration>) -> Result<Outcome> {
    let Some(limit) = timeout else {
        return Ok(Outcome::Exited(child.wait().await?));
    };

    match tokio::time::timeout(limit, child.wait()).await {
        Ok(status) => Ok(Outcome::Exited(status?)),
        Err(_) => {
            warn!("Command did not finish in {:?}, killing it", limit);
            kill_tree(child).await;
            Ok(Outcome::TimedOut(limit))
        }
    }
}

/// Kill the child together with its descendants and reap it.
async fn kill_tree(child: &mut Child) {
    if let Some(pid) = child.id() {
        if let Err(e) = Platform::process_tree().kill_process_tree(pid) {
            warn!("Failed to kill process tree {}: {}", pid, e);
        }
    }

    // The group kill may have missed the child itself (e.g. already reaped)
    if let Err(e) = child.start_kill() {
        debug!("Child already gone: {}", e);
    }

    if let Err(e) = child.wait().await {
        warn!("Failed to reap killed child: {}", e);
    }
}

async fn join(reader: Option<Reader>) -> Option<Vec<u8>> {
    match reader {
        Some(reader) => reader.join().await,
        None => None,
    }
}

async fn drain(reader: Option<Reader>) -> Option<Vec<u8>> {
    match reader {
        Some(reader) => reader.drain().await,
        None => None,
    }
}

/// Exit code, or the negated signal number when killed by a signal
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }

    -1
}
