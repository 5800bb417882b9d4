//! A single named unit of work

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

use super::{TaskContext, TaskId, TaskList, TaskState};
use crate::config::RuntimeFlags;
use crate::decorators::{ignore_errors, Timeout};
use crate::error::{Error, Result};
use crate::logging::Logger;

/// Future returned by task handlers
pub type HandlerFuture = BoxFuture<'static, Result<()>>;

/// The code a task runs, chosen when it is bound.
#[derive(Clone)]
pub enum Handler {
    /// Takes no arguments
    Plain(Arc<dyn Fn() -> HandlerFuture + Send + Sync>),
    /// Receives the task's execution context
    Contextual(Arc<dyn Fn(TaskContext) -> HandlerFuture + Send + Sync>),
}

#[derive(Clone)]
enum Work {
    Unbound,
    Handler(Handler),
    List(TaskList),
}

/// Per-call overrides of a task's policy
#[derive(Debug, Clone, Default)]
pub struct ExecuteOverrides {
    pub ignore_errors: Option<bool>,
    pub timeout: Option<Timeout>,
}

/// A named unit of work with enable, error-ignoring, finalizer and
/// timeout policy.
///
/// ```no_run
/// # async fn demo() -> runbook::Result<()> {
/// use runbook::{Logger, Task};
///
/// let task = Task::new("greet")
///     .timeout(5)
///     .run_with(|ctx| async move {
///         ctx.info("Hello");
///         Ok(())
///     });
/// task.execute().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Task {
    id: TaskId,
    name: String,
    enabled: bool,
    ignore_errors: bool,
    always: bool,
    timeout: Timeout,
    logger: Option<Arc<dyn Logger>>,
    flags: Option<RuntimeFlags>,
    work: Work,
}

impl Task {
    /// Enabled task without a handler
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: TaskId::new(),
            name: name.into(),
            enabled: true,
            ignore_errors: false,
            always: false,
            timeout: Timeout::none(),
            logger: None,
            flags: None,
            work: Work::Unbound,
        }
    }

    /// Finalizer: runs even after an earlier failure and never fails itself.
    pub fn cleanup(name: impl Into<String>) -> Self {
        Self::new(name).ignore_errors(true).always(true)
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn ignore_errors(mut self, ignore: bool) -> Self {
        self.ignore_errors = ignore;
        self
    }

    /// Mark as finalizer.
    pub fn always(mut self, always: bool) -> Self {
        self.always = always;
        self
    }

    pub fn timeout(mut self, timeout: impl Into<Timeout>) -> Self {
        self.timeout = timeout.into();
        self
    }

    /// Logger used when the task runs at the top level.
    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Flags used instead of the inherited ones.
    pub fn flags(mut self, flags: RuntimeFlags) -> Self {
        self.flags = Some(flags);
        self
    }

    /// Bind a handler that takes no arguments.
    pub fn run<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.work = Work::Handler(Handler::Plain(Arc::new(move || handler().boxed())));
        self
    }

    /// Bind a handler that receives the task context.
    pub fn run_with<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(TaskContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.work = Work::Handler(Handler::Contextual(Arc::new(move |ctx| {
            handler(ctx).boxed()
        })));
        self
    }

    /// Bind an already built handler.
    pub fn handler(mut self, handler: Handler) -> Self {
        self.work = Work::Handler(handler);
        self
    }

    /// Make this task run `list`.
    pub fn list(mut self, list: TaskList) -> Self {
        self.work = Work::List(list);
        self
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn ignores_errors(&self) -> bool {
        self.ignore_errors
    }

    pub fn is_always(&self) -> bool {
        self.always
    }

    pub fn deadline(&self) -> &Timeout {
        &self.timeout
    }

    /// `Idle` until a handler or list is bound, `Armed` afterwards.
    pub fn state(&self) -> TaskState {
        match self.work {
            Work::Unbound => TaskState::Idle,
            Work::Handler(_) | Work::List(_) => TaskState::Armed,
        }
    }

    pub fn as_list(&self) -> Option<&TaskList> {
        match &self.work {
            Work::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut TaskList> {
        match &mut self.work {
            Work::List(list) => Some(list),
            _ => None,
        }
    }

    /// Execute at the top level.
    pub fn execute(&self) -> BoxFuture<'_, Result<TaskState>> {
        self.execute_with(None, ExecuteOverrides::default())
    }

    /// Execute under `parent`, with per-call policy overrides.
    ///
    /// A disabled task is skipped without logging. Otherwise the handler runs
    /// under the effective timeout, and with `ignore_errors` its failure
    /// (including an elapsed timeout) is swallowed.
    pub fn execute_with<'a>(
        &'a self,
        parent: Option<&'a TaskContext>,
        overrides: ExecuteOverrides,
    ) -> BoxFuture<'a, Result<TaskState>> {
        async move {
            if !self.enabled {
                return Ok(TaskState::Skipped);
            }

            let ctx = self.context(parent);
            let invocation: BoxFuture<'a, Result<()>> = match &self.work {
                Work::Unbound => {
                    return Err(Error::MissingHandler {
                        task: self.name.clone(),
                    })
                }
                Work::Handler(Handler::Plain(handler)) => handler(),
                Work::Handler(Handler::Contextual(handler)) => handler(ctx),
                Work::List(list) => list.run(ctx),
            };

            let ignore = overrides.ignore_errors.unwrap_or(self.ignore_errors);
            let timeout = overrides.timeout.unwrap_or_else(|| self.timeout.clone());
            let guarded = timeout.guard(invocation);

            if ignore {
                ignore_errors(guarded).await;
            } else {
                guarded.await?;
            }

            Ok(TaskState::Completed)
        }
        .boxed()
    }

    fn context(&self, parent: Option<&TaskContext>) -> TaskContext {
        let tag = self.as_list().and_then(TaskList::tag);
        TaskContext::derive(&self.name, tag, self.logger.as_ref(), self.flags, parent)
    }
}

impl From<TaskList> for Task {
    fn from(list: TaskList) -> Self {
        Task::new("").list(list)
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let work = match &self.work {
            Work::Unbound => "unbound".to_string(),
            Work::Handler(Handler::Plain(_)) => "handler".to_string(),
            Work::Handler(Handler::Contextual(_)) => "contextual handler".to_string(),
            Work::List(list) => format!("list of {}", list.len()),
        };

        f.debug_struct("Task")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("enabled", &self.enabled)
            .field("ignore_errors", &self.ignore_errors)
            .field("always", &self.always)
            .field("timeout", &self.timeout)
            .field("flags", &self.flags)
            .field("work", &work)
            .finish_non_exhaustive()
    }
}
