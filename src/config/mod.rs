//! Configuration management for runbook
//!
//! [`RuntimeFlags`] carries the dry-run, execution-logging and color toggles
//! that shells and tasks read on every call. [`Config`] is the file-backed
//! configuration of a whole application; see [`loader`] for where it is
//! looked up.

pub mod loader;

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::decorators::Timeout;
use crate::shell::{default_interpreter, Effect};

pub use loader::{ConfigFormat, ConfigLoader};

/// Toggles consulted by every shell call and wrapped operation.
///
/// Set once, typically from command-line flags, and passed by value to
/// [`Shell`](crate::Shell) and [`Task`](crate::Task). Nested tasks inherit
/// the flags of the list that runs them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeFlags {
    /// Skip side effects, only log what would be done
    pub dry_run: bool,

    /// Log every call wrapped with execution logging
    pub log_execution: bool,

    /// Decorate log lines with ANSI colors
    pub colors: bool,
}

impl RuntimeFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    pub fn with_log_execution(mut self, enabled: bool) -> Self {
        self.log_execution = enabled;
        self
    }

    pub fn with_colors(mut self, enabled: bool) -> Self {
        self.colors = enabled;
        self
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Runtime toggles
    pub flags: RuntimeFlags,

    /// Defaults for the application shell
    pub shell: ShellConfig,

    /// Top-level runner settings
    pub runner: RunnerConfig,
}

/// Shell construction parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Default working directory, the process working directory if unset
    pub cwd: Option<PathBuf>,

    /// Environment overrides applied to every command
    pub env: BTreeMap<String, String>,

    /// Start from an empty environment instead of the process one
    pub clear_env: bool,

    /// Program and leading arguments used to run command lines
    pub interpreter: Vec<String>,

    /// Effect applied when a call does not choose one
    pub default_effect: Effect,

    /// Default deadline for every command
    pub timeout: Option<Timeout>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            cwd: None,
            env: BTreeMap::new(),
            clear_env: false,
            interpreter: default_interpreter(),
            default_effect: Effect::default(),
            timeout: None,
        }
    }
}

/// Top-level runner settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Application name, used as the log tag
    pub name: String,

    /// Exit code reported when a deadline elapses
    pub timeout_exit_code: i32,

    /// Prefix log lines with `[name] `
    pub log_tag: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            timeout_exit_code: 255,
            log_tag: true,
        }
    }
}
