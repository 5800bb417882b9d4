//! Windows-specific platform implementations

mod process;

pub use process::WindowsProcessTree;
