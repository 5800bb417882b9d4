//! Per-execution view of a task
//!
//! A [`TaskContext`] is created every time a task executes. It carries the
//! nesting prefix, the logger and the runtime flags inherited from the list
//! that runs the task; handlers that ask for it use it to log and to build
//! shells.

use std::fmt;
use std::sync::Arc;

use crate::ansi;
use crate::config::RuntimeFlags;
use crate::logging::{default_logger, Level, Logger};
use crate::shell::Shell;

/// Nesting-aware logger and settings handed to task handlers.
#[derive(Clone)]
pub struct TaskContext {
    name: String,
    prefix: String,
    logger: Arc<dyn Logger>,
    flags: RuntimeFlags,
}

impl TaskContext {
    /// Context of a task executed under `parent`, or at the top level.
    ///
    /// At the top level the task's own logger and flags are used (falling
    /// back to the defaults); nested tasks log through the parent's chain
    /// and inherit its flags.
    pub(crate) fn derive(
        name: &str,
        tag: Option<&str>,
        logger: Option<&Arc<dyn Logger>>,
        flags: Option<RuntimeFlags>,
        parent: Option<&TaskContext>,
    ) -> Self {
        let (mut prefix, logger, flags) = match parent {
            Some(parent) => (
                format!("{}  ", parent.prefix),
                Arc::clone(&parent.logger),
                flags.unwrap_or(parent.flags),
            ),
            None => (
                String::new(),
                logger.cloned().unwrap_or_else(default_logger),
                flags.unwrap_or_default(),
            ),
        };

        if let Some(tag) = tag {
            let tag = format!("[{tag}] ");
            prefix.push_str(&ansi::paint(flags.colors, &tag, &[ansi::BLUE, ansi::BRIGHT]));
        }

        Self {
            name: name.to_string(),
            prefix,
            logger,
            flags,
        }
    }

    /// Top-level context with the default logger
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: String::new(),
            logger: default_logger(),
            flags: RuntimeFlags::default(),
        }
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_flags(mut self, flags: RuntimeFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Name of the running task
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Text prepended to every line logged through this context
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn flags(&self) -> RuntimeFlags {
        self.flags
    }

    /// The undecorated logger lines end up in
    pub fn root_logger(&self) -> &Arc<dyn Logger> {
        &self.logger
    }

    /// This context as a shareable logger
    pub fn as_logger(&self) -> Arc<dyn Logger> {
        Arc::new(self.clone())
    }

    /// A shell that logs through this context and honors its flags.
    pub fn shell(&self) -> Shell {
        Shell::new()
            .with_flags(self.flags)
            .with_logger(self.as_logger())
    }
}

impl Logger for TaskContext {
    fn log(&self, level: Level, message: &str) {
        if self.prefix.is_empty() {
            self.logger.log(level, message);
        } else {
            self.logger.log(level, &format!("{}{}", self.prefix, message));
        }
    }

    fn prefix_len(&self) -> Option<usize> {
        let own = ansi::strip(&self.prefix).chars().count();
        Some(self.logger.prefix_len().unwrap_or(0) + own)
    }
}

impl fmt::Debug for TaskContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskContext")
            .field("name", &self.name)
            .field("prefix", &self.prefix)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}
