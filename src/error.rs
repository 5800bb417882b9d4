//! Error types and Result aliases for runbook

use std::error::Error as StdError;
use std::path::PathBuf;
use std::time::Duration;

use crate::shell::ShellError;

/// Result type alias for runbook operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for runbook
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // === Configuration errors (programmer mistakes) ===
    /// Task was executed without a handler bound to it
    #[error("No task handler specified for task '{task}'")]
    MissingHandler { task: String },

    /// Timeout specification could not be parsed
    #[error("Unknown timeout format: {input}")]
    InvalidTimeout { input: String },

    /// Empty argument vector, or no interpreter for a command line
    #[error("Command cannot be empty")]
    EmptyCommand,

    // === Command errors ===
    /// The OS refused to start the program
    #[error("Failed to spawn command '{command}': {source}")]
    CommandSpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Subprocess exited with a non-zero status or did not finish in time
    #[error(transparent)]
    Shell(Box<ShellError>),

    /// An in-process operation did not finish before its deadline
    #[error("{message}")]
    Timeout { timeout: Duration, message: String },

    // === Configuration file errors ===
    /// Failed to read a configuration file
    #[error("Failed to load config from '{}': {reason}", path.display())]
    ConfigLoadFailed { path: PathBuf, reason: String },

    /// Failed to parse or serialize configuration
    #[error("Failed to parse {format} config: {reason}")]
    ConfigParseFailed { format: String, reason: String },

    /// Configuration parsed but holds an unusable value
    #[error("Invalid configuration for '{field}': {reason}")]
    ConfigValidationFailed { field: String, reason: String },

    // === I/O errors ===
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Handler failures ===
    /// Any other error raised by a task handler, with its original type name
    #[error("{message}")]
    Failure {
        kind: String,
        message: String,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },
}

impl Error {
    /// Wrap an arbitrary error, remembering its type name for log output.
    pub fn failure<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Error::Failure {
            kind: short_type_name::<E>().to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    /// Create a generic failure from a plain message.
    pub fn msg(message: impl Into<String>) -> Self {
        Error::Failure {
            kind: "Error".to_string(),
            message: message.into(),
            source: None,
        }
    }

    /// Taxonomy label shown in `ERROR <kind>: <message>` log lines.
    pub fn kind(&self) -> &str {
        match self {
            Error::MissingHandler { .. } | Error::InvalidTimeout { .. } | Error::EmptyCommand => {
                "ConfigurationError"
            }
            Error::CommandSpawnFailed { .. } => "SpawnError",
            Error::Shell(err) if err.is_timeout() => "TimeoutError",
            Error::Shell(_) => "CommandError",
            Error::Timeout { .. } => "TimeoutError",
            Error::ConfigLoadFailed { .. }
            | Error::ConfigParseFailed { .. }
            | Error::ConfigValidationFailed { .. } => "ConfigError",
            Error::Io(_) => "IoError",
            Error::Failure { kind, .. } => kind.as_str(),
        }
    }

    /// True for both subprocess and in-process deadline errors.
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Timeout { .. } => true,
            Error::Shell(err) => err.is_timeout(),
            _ => false,
        }
    }

    /// The shell error carried by this error, if any.
    pub fn as_shell(&self) -> Option<&ShellError> {
        match self {
            Error::Shell(err) => Some(&**err),
            _ => None,
        }
    }
}

impl From<ShellError> for Error {
    fn from(err: ShellError) -> Self {
        Error::Shell(Box::new(err))
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        let message = err.to_string();
        Error::Failure {
            kind: "Error".to_string(),
            message,
            source: Some(err.into()),
        }
    }
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Error::msg(err)
    }
}

impl From<&str> for Error {
    fn from(err: &str) -> Self {
        Error::msg(err)
    }
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    // Strip generic arguments first so `a::B<c::D>` becomes `B`
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
