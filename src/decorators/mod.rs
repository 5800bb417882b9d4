//! Composable wrappers around calls
//!
//! Each wrapper takes the future (or closure) to run and decides whether,
//! when and how it is run:
//!
//! - [`identity`]: runs it unchanged
//! - [`ignore_errors`]: swallows its error
//! - [`Timeout`]: aborts it after a deadline
//! - [`LogExecution`]: logs a description before running it
//! - [`SideEffect`]: logs it and, in dry-run mode, skips it

mod execution;
mod timeout;

use std::fmt::Display;
use std::future::Future;

pub use execution::{CallDescription, Describe, LogExecution, SideEffect};
pub use timeout::Timeout;
pub(crate) use timeout::under_deadline;

/// Pass the call through unchanged.
pub async fn identity<F: Future>(fut: F) -> F::Output {
    fut.await
}

/// Run `fut`, turning any error into `None`.
pub async fn ignore_errors<F, T, E>(fut: F) -> Option<T>
where
    F: Future<Output = std::result::Result<T, E>>,
    E: Display,
{
    match fut.await {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("Ignoring error: {}", e);
            None
        }
    }
}
