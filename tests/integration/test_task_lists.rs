//! Integration Tests for Task Lists
//!
//! These tests verify sequencing, skip-on-error and finalizer behavior,
//! nested log prefixes and flag inheritance through the public API.

use runbook::tasks::ExecuteOverrides;
use runbook::{Error, Logger, MemoryLogger, RuntimeFlags, Task, TaskList, TaskState, Timeout};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Task that records its name into `order` when invoked
fn recording(name: &'static str, order: &Arc<Mutex<Vec<&'static str>>>) -> Task {
    let order = Arc::clone(order);
    Task::new(name).run(move || {
        let order = Arc::clone(&order);
        async move {
            order.lock().unwrap().push(name);
            Ok(())
        }
    })
}

fn failing(name: &'static str, order: &Arc<Mutex<Vec<&'static str>>>) -> Task {
    let order = Arc::clone(order);
    Task::new(name).run(move || {
        let order = Arc::clone(&order);
        async move {
            order.lock().unwrap().push(name);
            Err(Error::msg(format!("{name} failed")))
        }
    })
}

#[tokio::test]
async fn test_runs_in_order() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let list = TaskList::new().with_tasks([
        recording("one", &order),
        recording("two", &order),
        recording("three", &order),
    ]);

    let logger = MemoryLogger::shared();
    Task::from(list).logger(logger.clone()).execute().await.unwrap();

    assert_eq!(*order.lock().unwrap(), vec!["one", "two", "three"]);
    assert_eq!(logger.messages(), vec!["[1/3] one", "[2/3] two", "[3/3] three"]);
}

#[tokio::test]
async fn test_only_finalizers_run_after_failure() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let list = TaskList::new().with_tasks([
        recording("setup", &order),
        failing("build", &order),
        recording("test", &order),
        recording("cleanup", &order).ignore_errors(true).always(true),
        failing("report", &order).always(true),
        recording("publish", &order),
    ]);

    let logger = MemoryLogger::shared();
    let err = Task::from(list)
        .logger(logger.clone())
        .execute()
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "build failed");
    assert_eq!(*order.lock().unwrap(), vec!["setup", "build", "cleanup", "report"]);
    assert!(logger.contains("[3/6] test (skipped on error)"));
    assert!(logger.contains("[4/6] cleanup (finalizing)"));
    assert!(logger.contains("[5/6] report (finalizing)"));
    assert!(logger.contains("[6/6] publish (skipped on error)"));
    // The failing finalizer is not reported as a second error
    assert!(!logger.contains("report failed"));
}

#[tokio::test]
async fn test_ignored_failure_does_not_stop_list() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let list = TaskList::new().with_tasks([
        failing("flaky", &order).ignore_errors(true),
        recording("next", &order),
    ]);

    list.execute().await.unwrap();
    assert_eq!(*order.lock().unwrap(), vec!["flaky", "next"]);
}

#[tokio::test]
async fn test_task_list_can_run_twice() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let list = TaskList::new().with_tasks([recording("again", &order)]);

    list.execute().await.unwrap();
    list.execute().await.unwrap();
    assert_eq!(order.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_deeply_nested_prefixes() {
    let leaf = Task::new("leaf").run_with(|ctx| async move {
        ctx.warning("deep");
        Ok(())
    });
    let inner = TaskList::tagged("inner").with_tasks([leaf]);
    let middle = TaskList::new().with_tasks([Task::new("middle").list(inner)]);
    let outer = TaskList::tagged("outer").with_tasks([Task::new("group").list(middle)]);

    let logger = MemoryLogger::shared();
    Task::from(outer).logger(logger.clone()).execute().await.unwrap();

    assert_eq!(
        logger.messages(),
        vec![
            "[outer] [1/1] group",
            "[outer]   [1/1] middle",
            "[outer]     [inner] [1/1] leaf",
            "[outer]     [inner]   deep",
        ]
    );
}

#[tokio::test]
async fn test_colored_tags() {
    let list = TaskList::tagged("T").with_tasks([Task::new("x").run(|| async { Ok(()) })]);
    let logger = MemoryLogger::shared();
    Task::from(list)
        .logger(logger.clone())
        .flags(RuntimeFlags::new().with_colors(true))
        .execute()
        .await
        .unwrap();

    let first = &logger.messages()[0];
    assert!(first.starts_with('\x1b'));
    assert!(runbook::ansi::strip(first).starts_with("[T] [1/1] x"));
}

#[tokio::test]
async fn test_flags_reach_nested_shells() {
    let logger = MemoryLogger::shared();
    let task = Task::new("deploy").run_with(|ctx| async move {
        // Never executed: dry run is inherited from the list
        let result = ctx.shell().run("exit 9").await?;
        assert_eq!(result.exit_code, 0);
        Ok(())
    });
    let list = TaskList::tagged("ci").with_tasks([task]);

    Task::from(list)
        .logger(logger.clone())
        .flags(RuntimeFlags::new().with_dry_run(true))
        .execute()
        .await
        .unwrap();

    assert!(logger.contains("[ci]   [shell] Command: exit 9"));
}

#[tokio::test]
async fn test_timeout_on_nested_list() {
    let slow = Task::new("slow").run(|| async {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok(())
    });
    let cleanups = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&cleanups);
    let cleanup = Task::cleanup("cleanup").run(move || {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    });

    let list = TaskList::new().with_tasks([
        Task::new("limited")
            .timeout(Timeout::from_secs(1).with_message("too slow"))
            .list(TaskList::new().with_tasks([slow])),
        cleanup,
    ]);

    let err = list.execute().await.unwrap_err();
    assert!(err.is_timeout());
    assert_eq!(err.to_string(), "too slow");
    assert_eq!(cleanups.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_execute_overrides() {
    let task = Task::new("slow").run(|| async {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok(())
    });

    let overrides = ExecuteOverrides {
        timeout: Some(Timeout::from_secs(1)),
        ignore_errors: Some(true),
    };
    assert_eq!(task.execute_with(None, overrides).await.unwrap(), TaskState::Completed);
}

#[tokio::test]
async fn test_mutating_list_between_runs() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let mut list = TaskList::new().with_tasks([recording("a", &order), recording("b", &order)]);

    let b = list[1].id();
    list.push(recording("c", &order));
    list.remove_task(b);
    list[0].set_enabled(false);

    list.execute().await.unwrap();
    assert_eq!(*order.lock().unwrap(), vec!["c"]);
}

#[tokio::test]
async fn test_context_logger_reports_prefix_len() {
    let seen = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&seen);
    let task = Task::new("probe").run_with(move |ctx| {
        let sink = Arc::clone(&sink);
        async move {
            *sink.lock().unwrap() = ctx.prefix_len();
            Ok(())
        }
    });

    TaskList::tagged("ab").with_tasks([task]).execute().await.unwrap();
    // "[ab] " from the list plus two spaces of nesting, on an untagged default logger
    assert_eq!(*seen.lock().unwrap(), Some(7));
}

#[cfg(unix)]
#[tokio::test]
async fn test_task_timeout_stops_running_command() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("late");
    let output = MemoryLogger::shared();

    let task = {
        let marker = marker.to_string_lossy().into_owned();
        let output = Arc::clone(&output);
        Task::new("slow").timeout(1).run(move || {
            let marker = marker.clone();
            let sink: Arc<dyn Logger> = output.clone();
            async move {
                runbook::Shell::new()
                    .with_logger(MemoryLogger::shared())
                    .call("sh -c 'sleep 2; echo late; touch \"$MARKER\"'; true")
                    .env([("MARKER", marker)])
                    .log_output(sink, false)
                    .run()
                    .await?;
                Ok(())
            }
        })
    };

    let err = task.execute().await.unwrap_err();
    assert!(err.is_timeout());

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert!(!marker.exists());
    assert!(!output.contains("late"));
}
