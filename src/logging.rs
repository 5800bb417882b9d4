//! Leveled logging capability
//!
//! Tasks and shells report progress through the [`Logger`] trait rather than
//! straight to `tracing`, so nested task lists can decorate every line with
//! their prefix and tests can capture output with [`MemoryLogger`].
//!
//! The default implementation, [`TracingLogger`], forwards to `tracing`
//! events; [`init_tracing`] installs a subscriber that prints them the way a
//! command-line tool expects (plain lines, INFO to stdout, WARN and above to
//! stderr).

use std::fmt;
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

use crate::ansi;

/// Log severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Level {
    /// Upper-case level name
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
        }
    }

    /// Whether the level is routed to stderr by the default subscriber
    pub fn is_problem(&self) -> bool {
        *self >= Level::Warning
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anything that can receive leveled log lines.
pub trait Logger: Send + Sync {
    /// Emit one line at `level`.
    fn log(&self, level: Level, message: &str);

    fn debug(&self, message: &str) {
        self.log(Level::Debug, message);
    }

    fn info(&self, message: &str) {
        self.log(Level::Info, message);
    }

    fn warning(&self, message: &str) {
        self.log(Level::Warning, message);
    }

    fn error(&self, message: &str) {
        self.log(Level::Error, message);
    }

    fn critical(&self, message: &str) {
        self.log(Level::Critical, message);
    }

    /// Number of columns every emitted line is prefixed with, if known.
    ///
    /// Used to size interactive output (e.g. a child's terminal width) so
    /// forwarded lines do not wrap.
    fn prefix_len(&self) -> Option<usize> {
        None
    }
}

impl<L: Logger + ?Sized> Logger for Arc<L> {
    fn log(&self, level: Level, message: &str) {
        (**self).log(level, message);
    }

    fn prefix_len(&self) -> Option<usize> {
        (**self).prefix_len()
    }
}

static DEFAULT_LOGGER: Lazy<Arc<dyn Logger>> = Lazy::new(|| Arc::new(TracingLogger::new()));

/// Process-wide logger used when a task or shell is not given one.
pub fn default_logger() -> Arc<dyn Logger> {
    Arc::clone(&DEFAULT_LOGGER)
}

/// Logger forwarding to `tracing` events, optionally tagged `[tag] `.
#[derive(Debug, Clone, Default)]
pub struct TracingLogger {
    tag: Option<String>,
    colors: bool,
}

impl TracingLogger {
    /// Untagged logger
    pub fn new() -> Self {
        Self::default()
    }

    /// Logger prefixing every line with `[tag] `
    pub fn with_tag(tag: impl Into<String>, colors: bool) -> Self {
        Self {
            tag: Some(tag.into()),
            colors,
        }
    }

    fn decorate(&self, level: Level, message: &str) -> String {
        let Some(tag) = &self.tag else {
            return message.to_string();
        };

        let color = if level.is_problem() { ansi::RED } else { ansi::BLUE };
        let tag = ansi::paint(self.colors, &format!("[{tag}] "), &[color, ansi::BRIGHT]);
        format!("{tag}{message}")
    }
}

impl Logger for TracingLogger {
    fn log(&self, level: Level, message: &str) {
        let line = self.decorate(level, message);
        match level {
            Level::Debug => debug!(target: "runbook::log", "{}", line),
            Level::Info => info!(target: "runbook::log", "{}", line),
            Level::Warning => warn!(target: "runbook::log", "{}", line),
            Level::Error => error!(target: "runbook::log", "{}", line),
            Level::Critical => error!(target: "runbook::log", critical = true, "{}", line),
        }
    }

    fn prefix_len(&self) -> Option<usize> {
        self.tag.as_ref().map(|tag| tag.chars().count() + 3)
    }
}

/// A single captured log line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub level: Level,
    pub message: String,
}

/// Logger that keeps every line in memory.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    records: Mutex<Vec<LogRecord>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle, ready to be passed to tasks and shells
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.lock().clone()
    }

    /// Messages without level information, in emission order
    pub fn messages(&self) -> Vec<String> {
        self.lock().iter().map(|r| r.message.clone()).collect()
    }

    /// All lines rendered as `LEVEL message`, newline separated
    pub fn text(&self) -> String {
        self.lock()
            .iter()
            .map(|r| format!("{} {}", r.level, r.message))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// True if any message contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.lock().iter().any(|r| r.message.contains(needle))
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<LogRecord>> {
        // A panicking test thread must not hide the lines logged before it
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Logger for MemoryLogger {
    fn log(&self, level: Level, message: &str) {
        self.lock().push(LogRecord {
            level,
            message: message.to_string(),
        });
    }
}

/// Install the command-line `tracing` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `verbose` selects DEBUG over INFO.
/// Returns `false` when a global subscriber was already installed.
pub fn init_tracing(verbose: bool) -> bool {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let writer = std::io::stderr
        .with_max_level(tracing::Level::WARN)
        .or_else(std::io::stdout);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .without_time()
        .with_level(false)
        .with_target(false)
        .try_init()
        .is_ok()
}
