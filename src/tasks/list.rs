//! Ordered task sequences with skip and finalize semantics

use std::ops::{Index, IndexMut};
use std::time::Instant;

use futures::future::BoxFuture;
use futures::FutureExt;

use super::{ExecuteOverrides, Task, TaskContext, TaskId};
use crate::ansi;
use crate::error::{Error, Result};
use crate::logging::Logger;

/// Ordered children executed one after another.
///
/// Once a child fails, the remaining children are skipped except finalizers
/// ([`Task::always`]), which still run with their errors ignored. The first
/// error is returned after the loop finishes.
#[derive(Debug, Clone, Default)]
pub struct TaskList {
    tag: Option<String>,
    report_duration: bool,
    tasks: Vec<Task>,
}

struct Failure {
    index: usize,
    name: String,
    error: Error,
}

impl TaskList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefix every line logged under this list with `[tag] `.
    pub fn tagged(tag: impl Into<String>) -> Self {
        Self::new().with_tag(tag)
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Log the elapsed time once the list finishes.
    pub fn report_duration(mut self, report: bool) -> Self {
        self.report_duration = report;
        self
    }

    pub fn with_tasks<I>(mut self, tasks: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Task>,
    {
        self.extend(tasks);
        self
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn reports_duration(&self) -> bool {
        self.report_duration
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn tasks_mut(&mut self) -> &mut Vec<Task> {
        &mut self.tasks
    }

    pub fn push(&mut self, task: impl Into<Task>) {
        self.tasks.push(task.into());
    }

    pub fn insert(&mut self, index: usize, task: impl Into<Task>) {
        self.tasks.insert(index, task.into());
    }

    pub fn remove(&mut self, index: usize) -> Task {
        self.tasks.remove(index)
    }

    /// Remove the task with `id`, if present.
    pub fn remove_task(&mut self, id: TaskId) -> Option<Task> {
        let index = self.tasks.iter().position(|task| task.id() == id)?;
        Some(self.tasks.remove(index))
    }

    pub fn pop(&mut self) -> Option<Task> {
        self.tasks.pop()
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    pub fn get(&self, index: usize) -> Option<&Task> {
        self.tasks.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Task> {
        self.tasks.get_mut(index)
    }

    /// Replace the task at `index`, returning the previous one.
    pub fn set(&mut self, index: usize, task: impl Into<Task>) -> Task {
        std::mem::replace(&mut self.tasks[index], task.into())
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.tasks.iter().any(|task| task.id() == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Task> {
        self.tasks.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Task> {
        self.tasks.iter_mut()
    }

    /// Execute at the top level with the default logger.
    pub async fn execute(&self) -> Result<()> {
        let ctx = TaskContext::derive("", self.tag(), None, None, None);
        self.run(ctx).await
    }

    /// Run the enabled children under `ctx`, the list's own context.
    pub(crate) fn run(&self, ctx: TaskContext) -> BoxFuture<'_, Result<()>> {
        async move {
            let started = Instant::now();
            let enabled: Vec<&Task> = self.tasks.iter().filter(|t| t.is_enabled()).collect();
            let total = enabled.len();
            let mut failure: Option<Failure> = None;

            for (index, task) in enabled.into_iter().enumerate() {
                let header = format!("[{}/{}] {}", index + 1, total, task.name());
                let header = header.trim_end();

                if failure.is_some() {
                    if !task.is_always() {
                        ctx.info(&format!("{header} (skipped on error)"));
                        continue;
                    }

                    ctx.info(&format!("{header} (finalizing)"));
                    let overrides = ExecuteOverrides {
                        ignore_errors: Some(true),
                        ..Default::default()
                    };
                    task.execute_with(Some(&ctx), overrides).await?;
                    continue;
                }

                ctx.info(header);
                if let Err(e) = task.execute_with(Some(&ctx), ExecuteOverrides::default()).await {
                    let label = ansi::paint(
                        ctx.flags().colors,
                        &format!("ERROR {}", e.kind()),
                        &[ansi::RED],
                    );
                    ctx.error(&format!("{label}: {e}"));
                    failure = Some(Failure {
                        index: index + 1,
                        name: task.name().to_string(),
                        error: e,
                    });
                }
            }

            if self.report_duration {
                ctx.info(&format!("Elapsed time: {}", format_elapsed(started)));
            }

            match failure {
                Some(Failure { index, name, error }) => {
                    let label = ansi::paint(ctx.flags().colors, "FAILED", &[ansi::RED]);
                    let summary = format!("{label} [{index}/{total}] {name}");
                    ctx.error(summary.trim_end());
                    Err(error)
                }
                None => Ok(()),
            }
        }
        .boxed()
    }
}

fn format_elapsed(started: Instant) -> String {
    let elapsed =
        chrono::Duration::from_std(started.elapsed()).unwrap_or_else(|_| chrono::Duration::zero());
    format!(
        "{:02}:{:02}:{:02}",
        elapsed.num_hours(),
        elapsed.num_minutes() % 60,
        elapsed.num_seconds() % 60
    )
}

impl Index<usize> for TaskList {
    type Output = Task;

    fn index(&self, index: usize) -> &Task {
        &self.tasks[index]
    }
}

impl IndexMut<usize> for TaskList {
    fn index_mut(&mut self, index: usize) -> &mut Task {
        &mut self.tasks[index]
    }
}

impl<T: Into<Task>> Extend<T> for TaskList {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.tasks.extend(iter.into_iter().map(Into::into));
    }
}

impl<T: Into<Task>> FromIterator<T> for TaskList {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = TaskList::new();
        list.extend(iter);
        list
    }
}

impl IntoIterator for TaskList {
    type Item = Task;
    type IntoIter = std::vec::IntoIter<Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.into_iter()
    }
}

impl<'a> IntoIterator for &'a TaskList {
    type Item = &'a Task;
    type IntoIter = std::slice::Iter<'a, Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.iter()
    }
}

impl<'a> IntoIterator for &'a mut TaskList {
    type Item = &'a mut Task;
    type IntoIter = std::slice::IterMut<'a, Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.iter_mut()
    }
}
