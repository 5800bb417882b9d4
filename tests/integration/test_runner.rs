//! Integration Tests for the Runner
//!
//! These tests verify flag parsing, configuration-driven runners and the
//! mapping of entry point outcomes to process exit codes.

use runbook::config::{Config, RunnerConfig, ShellConfig};
use runbook::{ConfigLoader, Error, Runner, RuntimeFlags, Task, TaskList};
use std::path::PathBuf;

#[test]
fn test_flags_are_stripped() {
    let mut runner = Runner::new("tool");
    let rest = runner.parse_flags([
        "deploy",
        "--log-execution",
        "--colors",
        "--target",
        "prod",
        "--dry-run",
    ]);

    assert_eq!(rest, vec!["deploy", "--target", "prod"]);
    let flags = runner.flags();
    assert!(flags.dry_run);
    assert!(flags.log_execution);
    assert!(flags.colors);
    assert!(runner.log_tag());
}

#[test]
fn test_last_color_switch_wins() {
    let mut runner = Runner::new("tool");
    runner.parse_flags(["--colors", "--no-colors"]);
    assert!(!runner.flags().colors);
}

#[test]
fn test_runner_from_config() {
    let config = Config {
        flags: RuntimeFlags::new().with_log_execution(true),
        shell: ShellConfig {
            cwd: Some(PathBuf::from("/")),
            ..Default::default()
        },
        runner: RunnerConfig {
            name: "from-file".to_string(),
            timeout_exit_code: 124,
            log_tag: false,
        },
    };

    let runner = Runner::from_config(&config);
    assert_eq!(runner.name(), "from-file");
    assert!(runner.flags().log_execution);
    assert!(!runner.log_tag());

    let shell = runner.shell(runner.logger());
    assert_eq!(shell.cwd(), std::path::Path::new("/"));
    assert!(shell.flags().log_execution);

    let timeout = Error::Timeout {
        timeout: std::time::Duration::from_secs(3),
        message: "late".to_string(),
    };
    assert_eq!(runner.exit_code(&timeout), 124);
}

#[test]
fn test_runner_from_loaded_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("runbook.toml");
    std::fs::write(
        &path,
        r#"
[runner]
name = "loaded"
timeout_exit_code = 2

[flags]
dry_run = true
"#,
    )
    .unwrap();

    let config = ConfigLoader::load_from(&path).unwrap();
    let runner = Runner::from_config(&config);
    assert_eq!(runner.name(), "loaded");
    assert!(runner.flags().dry_run);
}

#[tokio::test]
async fn test_task_failure_becomes_exit_code() {
    let runner = Runner::new("tool").with_flags(RuntimeFlags::new());
    let code = runner
        .execute(|ctx| async move {
            let list = TaskList::new().with_tasks([Task::new("fail").run(|| async {
                Err(Error::msg("broken"))
            })]);
            Task::from(list)
                .logger(ctx.logger)
                .flags(ctx.flags)
                .execute()
                .await?;
            Ok(0)
        })
        .await;

    assert_eq!(code, 1);
}

#[cfg(unix)]
#[tokio::test]
async fn test_command_exit_code_propagates() {
    let runner = Runner::new("tool").with_flags(RuntimeFlags::new());
    let code = runner
        .execute(|ctx| async move {
            ctx.shell.run("exit 17").await?;
            Ok(0)
        })
        .await;

    assert_eq!(code, 17);
}

#[cfg(unix)]
#[tokio::test]
async fn test_dry_run_runner_succeeds() {
    let mut runner = Runner::new("tool");
    runner.parse_flags(["--dry-run", "--no-colors"]);

    let code = runner
        .execute(|ctx| async move {
            let result = ctx.shell.run("exit 17").await?;
            Ok(result.exit_code)
        })
        .await;

    assert_eq!(code, 0);
}

#[cfg(unix)]
#[tokio::test]
async fn test_signal_death_maps_to_shell_status() {
    let runner = Runner::new("tool").with_flags(RuntimeFlags::new());
    let code = runner
        .execute(|ctx| async move {
            ctx.shell.run("kill -9 $$").await?;
            Ok(0)
        })
        .await;

    assert_eq!(code, 137);
}
