//! Top-level entry point wiring
//!
//! [`Runner`] turns the common command-line switches into [`RuntimeFlags`],
//! builds the tagged application logger and shell, runs the application's
//! async entry point and maps its outcome to a process exit code.

use std::fmt;
use std::future::Future;
use std::io::IsTerminal;
use std::sync::Arc;

use crate::ansi;
use crate::config::{Config, RunnerConfig, RuntimeFlags, ShellConfig};
use crate::error::Error;
use crate::logging::{Logger, TracingLogger};
use crate::shell::Shell;

/// Exit code for failures that carry none of their own
pub const FAILURE_EXIT_CODE: i32 = 1;

/// What the application entry point gets to work with
#[derive(Clone)]
pub struct RunContext {
    pub flags: RuntimeFlags,
    pub logger: Arc<dyn Logger>,
    pub shell: Shell,
}

impl fmt::Debug for RunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunContext")
            .field("flags", &self.flags)
            .field("shell", &self.shell)
            .finish_non_exhaustive()
    }
}

/// Runs an application entry point and reports its failures.
#[derive(Debug, Clone)]
pub struct Runner {
    config: RunnerConfig,
    shell: ShellConfig,
    flags: RuntimeFlags,
    colors_set: bool,
}

impl Runner {
    /// Runner named `name`, otherwise with default settings.
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_config(&Config::default()).with_name(name)
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            config: config.runner.clone(),
            shell: config.shell.clone(),
            flags: config.flags,
            colors_set: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    pub fn with_timeout_exit_code(mut self, code: i32) -> Self {
        self.config.timeout_exit_code = code;
        self
    }

    pub fn with_flags(mut self, flags: RuntimeFlags) -> Self {
        self.flags = flags;
        self.colors_set = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn flags(&self) -> RuntimeFlags {
        self.flags
    }

    pub fn log_tag(&self) -> bool {
        self.config.log_tag
    }

    /// Consume the runner switches from `args`, returning the others.
    ///
    /// Recognized: `--log-execution`, `--dry-run`, `--colors`/`--no-colors`
    /// and `--log-tag`/`--no-log-tag`. Without a color switch, colors follow
    /// whether stdout is a terminal.
    pub fn parse_flags<I, S>(&mut self, args: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut rest = Vec::new();
        let mut colors = None;

        for arg in args.into_iter().map(Into::into) {
            match arg.as_str() {
                "--log-execution" => self.flags.log_execution = true,
                "--dry-run" => self.flags.dry_run = true,
                "--colors" => colors = Some(true),
                "--no-colors" => colors = Some(false),
                "--log-tag" => self.config.log_tag = true,
                "--no-log-tag" => self.config.log_tag = false,
                _ => rest.push(arg),
            }
        }

        match colors {
            Some(enabled) => self.flags.colors = enabled,
            None if !self.colors_set => self.flags.colors = std::io::stdout().is_terminal(),
            None => {}
        }
        self.colors_set = true;

        debug!("Runner flags: {:?}", self.flags);
        rest
    }

    /// The application logger, tagged `[name] ` unless disabled.
    pub fn logger(&self) -> Arc<dyn Logger> {
        if self.config.log_tag && !self.config.name.is_empty() {
            Arc::new(TracingLogger::with_tag(&self.config.name, self.flags.colors))
        } else {
            Arc::new(TracingLogger::new())
        }
    }

    /// The application shell, logging through `logger`.
    pub fn shell(&self, logger: Arc<dyn Logger>) -> Shell {
        Shell::with_config(&self.shell)
            .with_flags(self.flags)
            .with_logger(logger)
    }

    /// Exit status for an error that escaped the entry point.
    ///
    /// A command killed by a signal reports `128 + signal`, as shells do.
    pub fn exit_code(&self, err: &Error) -> i32 {
        if err.is_timeout() {
            return self.config.timeout_exit_code;
        }

        match err.as_shell().and_then(|shell| shell.exit_code()) {
            Some(code) if code >= 0 => code,
            Some(code) if code > -128 => 128 - code,
            _ => FAILURE_EXIT_CODE,
        }
    }

    /// Log `err` the way the runner reports failures.
    pub fn report(&self, logger: &dyn Logger, err: &Error) {
        match err.as_shell() {
            Some(shell) => {
                for line in shell.pretty_message(self.flags.colors) {
                    logger.error(&line);
                }
            }
            None => {
                let kind = ansi::paint(self.flags.colors, err.kind(), &[ansi::BRIGHT, ansi::RED]);
                logger.error(&format!("Exception {kind}: {err}"));
            }
        }
    }

    /// Run `entry` and return the process exit code.
    ///
    /// The entry point's own code is returned on success. Ctrl-C cancels it
    /// and yields the generic failure code.
    pub async fn execute<F, Fut>(&self, entry: F) -> i32
    where
        F: FnOnce(RunContext) -> Fut,
        Fut: Future<Output = crate::Result<i32>>,
    {
        let logger = self.logger();
        let ctx = RunContext {
            flags: self.flags,
            logger: Arc::clone(&logger),
            shell: self.shell(Arc::clone(&logger)),
        };

        tokio::select! {
            result = entry(ctx) => match result {
                Ok(code) => code,
                Err(err) => {
                    self.report(logger.as_ref(), &err);
                    self.exit_code(&err)
                }
            },
            _ = tokio::signal::ctrl_c() => {
                logger.error("Program interrupted by user.");
                FAILURE_EXIT_CODE
            }
        }
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
