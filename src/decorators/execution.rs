//! Execution logging and dry-run wrappers

use std::fmt::Debug;
use std::future::Future;

use crate::config::RuntimeFlags;
use crate::logging::Logger;

/// Something that can render itself as log lines before it runs.
pub trait Describe: Sync {
    fn describe(&self, colors: bool) -> Vec<String>;
}

impl Describe for &str {
    fn describe(&self, _colors: bool) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl Describe for String {
    fn describe(&self, _colors: bool) -> Vec<String> {
        vec![self.clone()]
    }
}

/// Renders a function call as `name(arg, key=value)`.
#[derive(Debug, Clone, Default)]
pub struct CallDescription {
    name: String,
    args: Vec<String>,
    kwargs: Vec<(String, String)>,
}

impl CallDescription {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn arg(mut self, value: impl Debug) -> Self {
        self.args.push(format!("{value:?}"));
        self
    }

    pub fn kwarg(mut self, key: impl Into<String>, value: impl Debug) -> Self {
        self.kwargs.push((key.into(), format!("{value:?}")));
        self
    }
}

impl Describe for CallDescription {
    fn describe(&self, _colors: bool) -> Vec<String> {
        let params = self
            .args
            .iter()
            .cloned()
            .chain(self.kwargs.iter().map(|(k, v)| format!("{k}={v}")))
            .collect::<Vec<_>>()
            .join(", ");

        vec![format!("{}({params})", self.name)]
    }
}

/// Logs a description of the wrapped call when execution logging is on.
#[derive(Debug, Clone, Default)]
pub struct LogExecution {
    message: Option<String>,
}

impl LogExecution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log `message` verbatim instead of describing the call.
    pub fn with_message(message: Option<String>) -> Self {
        Self { message }
    }

    fn log(&self, flags: RuntimeFlags, logger: &dyn Logger, subject: &dyn Describe) {
        let lines = match &self.message {
            Some(message) => vec![message.clone()],
            None => subject.describe(flags.colors),
        };
        for line in lines {
            logger.info(&line);
        }
    }

    pub async fn run<F>(
        &self,
        flags: RuntimeFlags,
        logger: &dyn Logger,
        subject: &dyn Describe,
        fut: F,
    ) -> F::Output
    where
        F: Future,
    {
        if flags.log_execution {
            self.log(flags, logger, subject);
        }
        fut.await
    }

    /// Blocking counterpart of [`run`](Self::run).
    pub fn invoke<T>(
        &self,
        flags: RuntimeFlags,
        logger: &dyn Logger,
        subject: &dyn Describe,
        f: impl FnOnce() -> T,
    ) -> T {
        if flags.log_execution {
            self.log(flags, logger, subject);
        }
        f()
    }
}

/// Like [`LogExecution`], but in dry-run mode the wrapped call is not
/// made and `returns` is handed back instead.
#[derive(Debug, Clone)]
pub struct SideEffect<T> {
    inner: LogExecution,
    returns: T,
}

impl<T> SideEffect<T> {
    pub fn new(returns: T) -> Self {
        Self {
            inner: LogExecution::new(),
            returns,
        }
    }

    pub fn with_message(mut self, message: Option<String>) -> Self {
        self.inner = LogExecution::with_message(message);
        self
    }

    pub async fn run<F>(
        self,
        flags: RuntimeFlags,
        logger: &dyn Logger,
        subject: &dyn Describe,
        fut: F,
    ) -> T
    where
        F: Future<Output = T>,
    {
        if flags.dry_run || flags.log_execution {
            self.inner.log(flags, logger, subject);
        }

        if flags.dry_run {
            return self.returns;
        }
        fut.await
    }

    /// Blocking counterpart of [`run`](Self::run).
    pub fn invoke(
        self,
        flags: RuntimeFlags,
        logger: &dyn Logger,
        subject: &dyn Describe,
        f: impl FnOnce() -> T,
    ) -> T {
        if flags.dry_run || flags.log_execution {
            self.inner.log(flags, logger, subject);
        }

        if flags.dry_run {
            return self.returns;
        }
        f()
    }
}

impl<T: Default> Default for SideEffect<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
