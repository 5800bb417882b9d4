//! Subprocess execution with environment and working-directory management
//!
//! A [`Shell`] holds the defaults every command inherits (working directory,
//! environment overrides, interpreter, effect and process options). Each
//! [`Shell::call`] clones those defaults, applies per-call overrides and runs
//! exactly one command, so calls never observe each other's settings.
//!
//! ```no_run
//! # async fn demo() -> runbook::Result<()> {
//! use runbook::Shell;
//!
//! let sh = Shell::new();
//! sh.run("echo 'Hello World!'").await?;
//!
//! let result = sh
//!     .call("echo $GREETING")
//!     .env([("GREETING", "hi")])
//!     .capture_output(true)
//!     .run()
//!     .await?;
//! assert_eq!(result.stdout_text(), "hi\n");
//! # Ok(())
//! # }
//! ```

mod command;
mod environment;
mod error;
mod pipe;
mod printer;
mod process;
mod result;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{RuntimeFlags, ShellConfig};
use crate::decorators::{identity, LogExecution, SideEffect};
use crate::error::Result;
use crate::logging::{default_logger, Logger};
use process::{Invocation, ResolvedOptions};

pub use command::{dedent, default_interpreter, ShellCommand};
pub use environment::ShellEnvironment;
pub use error::{ShellError, ShellErrorKind};
pub use pipe::{LineCallback, LineSplitter, OutputSink};
pub use printer::CommandDescription;
pub use result::{Output, ShellResult};

/// What happens around a command besides running it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Effect {
    /// Just run it
    Blank,
    /// Describe it first when execution logging is on
    LogExecution,
    /// Describe it when execution logging or dry run is on; skip it in
    /// dry-run mode
    #[default]
    SideEffect,
}

/// Process options; unset fields fall back to the shell defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOptions {
    /// Decode captured output as text (default: true)
    pub text: Option<bool>,
    /// Capture both output streams (default: false)
    pub capture_output: Option<bool>,
    /// Fail on non-zero exit status (default: true)
    pub check: Option<bool>,
    /// Working directory (default: the shell's)
    pub cwd: Option<PathBuf>,
    /// Deadline (default: none)
    pub timeout: Option<Duration>,
}

impl ProcessOptions {
    /// `other` on top of `self`, set fields of `other` winning.
    pub fn overlay(&self, other: &ProcessOptions) -> ProcessOptions {
        ProcessOptions {
            text: other.text.or(self.text),
            capture_output: other.capture_output.or(self.capture_output),
            check: other.check.or(self.check),
            cwd: other.cwd.clone().or_else(|| self.cwd.clone()),
            timeout: other.timeout.or(self.timeout),
        }
    }

    fn resolve(self, cwd: &Path) -> ResolvedOptions {
        ResolvedOptions {
            text: self.text.unwrap_or(true),
            capture_output: self.capture_output.unwrap_or(false),
            check: self.check.unwrap_or(true),
            cwd: self.cwd.unwrap_or_else(|| cwd.to_path_buf()),
            timeout: self.timeout,
        }
    }
}

/// Runs commands in a controlled environment.
#[derive(Clone)]
pub struct Shell {
    cwd: PathBuf,
    interpreter: Vec<String>,
    default_effect: Effect,
    env: ShellEnvironment,
    defaults: ProcessOptions,
    flags: RuntimeFlags,
    logger: Arc<dyn Logger>,
}

impl Shell {
    /// Shell in the current directory with the inherited environment.
    pub fn new() -> Self {
        Self {
            cwd: current_dir(),
            interpreter: default_interpreter(),
            default_effect: Effect::default(),
            env: ShellEnvironment::new(false),
            defaults: ProcessOptions::default(),
            flags: RuntimeFlags::default(),
            logger: default_logger(),
        }
    }

    pub fn with_config(config: &ShellConfig) -> Self {
        let mut env = ShellEnvironment::new(config.clear_env);
        env.set(config.env.clone());

        Self {
            cwd: config.cwd.clone().unwrap_or_else(current_dir),
            interpreter: config.interpreter.clone(),
            default_effect: config.default_effect,
            env,
            defaults: ProcessOptions {
                timeout: config.timeout.as_ref().and_then(|t| t.duration()),
                ..Default::default()
            },
            flags: RuntimeFlags::default(),
            logger: default_logger(),
        }
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = cwd.into();
        self
    }

    /// Add environment overrides applied to every command.
    pub fn with_env<I, K, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env.set(values);
        self
    }

    /// Drop the inherited process environment, keeping overrides.
    pub fn with_clear_env(mut self) -> Self {
        let overrides = self.env.overrides().clone();
        self.env = ShellEnvironment::new(true).with(overrides);
        self
    }

    pub fn with_interpreter<I, S>(mut self, interpreter: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.interpreter = interpreter.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_default_effect(mut self, effect: Effect) -> Self {
        self.default_effect = effect;
        self
    }

    pub fn with_defaults(mut self, defaults: ProcessOptions) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_flags(mut self, flags: RuntimeFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn env(&self) -> &ShellEnvironment {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut ShellEnvironment {
        &mut self.env
    }

    pub fn interpreter(&self) -> &[String] {
        &self.interpreter
    }

    pub fn default_effect(&self) -> Effect {
        self.default_effect
    }

    pub fn defaults(&self) -> &ProcessOptions {
        &self.defaults
    }

    pub fn flags(&self) -> RuntimeFlags {
        self.flags
    }

    pub fn logger(&self) -> &Arc<dyn Logger> {
        &self.logger
    }

    /// Start building a call of `command`.
    pub fn call(&self, command: impl Into<ShellCommand>) -> ShellCall<'_> {
        ShellCall {
            shell: self,
            command: command.into(),
            env: BTreeMap::new(),
            effect: None,
            dry_run_result: None,
            execution_message: None,
            options: ProcessOptions::default(),
            stdout: OutputSink::Inherit,
            stderr: OutputSink::Inherit,
        }
    }

    /// Run `command` with the shell defaults.
    pub async fn run(&self, command: impl Into<ShellCommand>) -> Result<ShellResult> {
        self.call(command).run().await
    }
}

impl Default for Shell {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shell")
            .field("cwd", &self.cwd)
            .field("interpreter", &self.interpreter)
            .field("default_effect", &self.default_effect)
            .field("env", &self.env.overrides())
            .field("defaults", &self.defaults)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

/// A single pending command invocation, see [`Shell::call`].
#[must_use = "a shell call does nothing until `run` is awaited"]
pub struct ShellCall<'a> {
    shell: &'a Shell,
    command: ShellCommand,
    env: BTreeMap<String, String>,
    effect: Option<Effect>,
    dry_run_result: Option<ShellResult>,
    execution_message: Option<String>,
    options: ProcessOptions,
    stdout: OutputSink,
    stderr: OutputSink,
}

impl<'a> ShellCall<'a> {
    /// Environment overrides for this call only.
    pub fn env<I, K, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env
            .extend(values.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Set a single environment override.
    pub fn envs(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env([(key, value)])
    }

    pub fn effect(mut self, effect: Effect) -> Self {
        self.effect = Some(effect);
        self
    }

    /// Result returned instead of running in dry-run mode.
    pub fn dry_run_result(mut self, result: ShellResult) -> Self {
        self.dry_run_result = Some(result);
        self
    }

    /// Log `message` instead of the command description.
    pub fn execution_message(mut self, message: impl Into<String>) -> Self {
        self.execution_message = Some(message.into());
        self
    }

    pub fn text(mut self, text: bool) -> Self {
        self.options.text = Some(text);
        self
    }

    pub fn capture_output(mut self, capture: bool) -> Self {
        self.options.capture_output = Some(capture);
        self
    }

    pub fn check(mut self, check: bool) -> Self {
        self.options.check = Some(check);
        self
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.options.cwd = Some(cwd.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    /// Merge a whole set of options, set fields winning.
    pub fn options(mut self, options: ProcessOptions) -> Self {
        self.options = self.options.overlay(&options);
        self
    }

    pub fn stdout(mut self, sink: OutputSink) -> Self {
        self.stdout = sink;
        self
    }

    pub fn stderr(mut self, sink: OutputSink) -> Self {
        self.stderr = sink;
        self
    }

    /// Forward output lines to `logger`: stdout to `info`, stderr to `info`
    /// or, when `split` is set, to `error`.
    pub fn log_output(mut self, logger: Arc<dyn Logger>, split: bool) -> Self {
        let out = Arc::clone(&logger);
        self.stdout = OutputSink::lines(move |line| out.info(line));
        self.stderr = OutputSink::lines(move |line| {
            if split {
                logger.error(line);
            } else {
                logger.info(line);
            }
        });
        self
    }

    /// Run the command, applying the selected effect.
    pub async fn run(self) -> Result<ShellResult> {
        let shell = self.shell;
        let effect = self.effect.unwrap_or(shell.default_effect);

        let mut env = shell.env.clone();
        env.set(self.env);
        let options = shell.defaults.overlay(&self.options).resolve(&shell.cwd);

        let description = CommandDescription::new(&self.command, &env, &options.cwd);
        let execution = process::execute(Invocation {
            interpreter: &shell.interpreter,
            command: &self.command,
            env: &env,
            options: &options,
            stdout: &self.stdout,
            stderr: &self.stderr,
        });
        let logger: &dyn Logger = shell.logger.as_ref();

        match effect {
            Effect::Blank => identity(execution).await,
            Effect::LogExecution => {
                LogExecution::with_message(self.execution_message)
                    .run(shell.flags, logger, &description, execution)
                    .await
            }
            Effect::SideEffect => {
                SideEffect::new(Ok(self.dry_run_result.unwrap_or_default()))
                    .with_message(self.execution_message)
                    .run(shell.flags, logger, &description, execution)
                    .await
            }
        }
    }
}

fn current_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}
