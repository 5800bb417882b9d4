//! Runbook - sequential task lists and shell commands for command-line tools
//!
//! This library provides the execution core of a command-line application:
//! ordered task lists with skip-on-error and finalizer semantics, and a shell
//! wrapper that runs external commands with dry-run support, execution
//! logging and deadlines.
//!
//! ## Features
//!
//! - **Task lists:** `[i/N]` progress headers, nested lists with indented,
//!   tagged log lines, finalizers that run after a failure
//! - **Shell commands:** per-call environment overrides, captured or streamed
//!   output, typed errors for non-zero exits and timeouts
//! - **Dry run:** side-effecting calls are logged instead of performed
//! - **Timeouts:** composite duration strings such as `"1 hour 30 minutes"`;
//!   a timed-out command's whole process tree is killed
//! - **Configuration:** TOML or JSON files with defaults and validation
//!
//! ## Module Organization
//!
//! ### Core Functionality
//!
//! - [`tasks`] - `Task`, `TaskList` and the per-execution `TaskContext`
//! - [`shell`] - Command execution, environments, results and errors
//! - [`decorators`] - Timeouts, execution logging and dry-run side effects
//! - [`mod@error`] - Error types and Result aliases
//!
//! ### Supporting Modules
//!
//! - [`config`] - Runtime flags and configuration loading
//! - [`logging`] - The `Logger` capability and its `tracing` backend
//! - [`runner`] - Flag parsing, exit codes and the top-level entry point
//! - [`platform`] - Process tree handling per operating system
//! - [`ansi`] - ANSI color helpers
//!
//! ## Quick Start
//!
//! ```no_run
//! use runbook::{Logger, Runner, Task, TaskList, Timeout};
//!
//! # async fn demo() -> runbook::Result<()> {
//! let list = TaskList::tagged("deploy").report_duration(true).with_tasks([
//!     Task::new("Build").run_with(|ctx| async move {
//!         ctx.shell().run("cargo build --release").await?;
//!         Ok(())
//!     }),
//!     Task::new("Upload")
//!         .timeout(Timeout::parse("5 minutes")?)
//!         .run_with(|ctx| async move {
//!             ctx.shell().run("./upload.sh").await?;
//!             Ok(())
//!         }),
//!     Task::cleanup("Remove artifacts").run_with(|ctx| async move {
//!         ctx.info("Cleaning up");
//!         Ok(())
//!     }),
//! ]);
//!
//! let mut runner = Runner::new("deploy");
//! runner.parse_flags(std::env::args().skip(1));
//! let code = runner
//!     .execute(|ctx| async move {
//!         Task::from(list).logger(ctx.logger).flags(ctx.flags).execute().await?;
//!         Ok(0)
//!     })
//!     .await;
//! std::process::exit(code);
//! # }
//! ```
//!
//! ## Architecture
//!
//! Everything runs on `tokio`. Tasks run strictly one after another; the
//! only concurrency is the background readers that stream a child process's
//! output to a logger line by line. Runtime flags (`dry_run`,
//! `log_execution`, `colors`) are plain values passed to shells and tasks at
//! construction and inherited by nested tasks.
//!
//! ## Platform Support
//!
//! - ✅ Linux
//! - ✅ macOS
//! - 🚧 Windows (process trees are killed with `taskkill`)

#![allow(unexpected_cfgs)]

#[macro_use]
extern crate tracing;

pub mod ansi;
pub mod config;
pub mod decorators;
pub mod error;
pub mod logging;
pub mod platform;
pub mod runner;
pub mod shell;
pub mod tasks;

// Re-exports for core functionality
pub use error::{Error, Result};
pub use shell::{Effect, Shell, ShellCall, ShellCommand, ShellError, ShellErrorKind, ShellResult};
pub use tasks::{Task, TaskContext, TaskId, TaskList, TaskState};

// Convenience re-exports for common types
pub use config::loader::ConfigLoader;
pub use config::{Config, RuntimeFlags};
pub use decorators::{LogExecution, SideEffect, Timeout};
pub use logging::{Level, Logger, MemoryLogger, TracingLogger};
pub use runner::{RunContext, Runner};

// Version information
/// The current version of Runbook from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The library name from Cargo.toml
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// The library description from Cargo.toml
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
