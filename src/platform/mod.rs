//! Platform abstraction layer
//!
//! This module provides a unified interface for platform-specific operations,
//! abstracting away differences between Unix and Windows.

mod traits;
#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

pub use traits::*;

/// Platform implementation factory
pub struct Platform;

impl Platform {
    /// Get the platform-specific process tree operations
    pub fn process_tree() -> Box<dyn ProcessTreeOps> {
        #[cfg(unix)]
        {
            Box::new(unix::UnixProcessTree::new())
        }

        #[cfg(windows)]
        {
            Box::new(windows::WindowsProcessTree::new())
        }

        #[cfg(not(any(unix, windows)))]
        {
            compile_error!("Unsupported platform");
        }
    }
}
