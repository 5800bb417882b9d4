//! Integration Tests for Shell Command Execution
//!
//! These tests run real processes through `/bin/sh` and verify captured
//! output, per-call environments, working directories and output streaming.

#[cfg(unix)]
mod shell_command_tests {
    use runbook::logging::Level;
    use runbook::{Effect, MemoryLogger, RuntimeFlags, Shell, ShellCommand, ShellResult};
    use std::time::{Duration, Instant};

    fn quiet_shell() -> Shell {
        Shell::new().with_logger(MemoryLogger::shared())
    }

    #[tokio::test]
    async fn test_capture_stdout() {
        let result = quiet_shell()
            .call("echo hello")
            .capture_output(true)
            .run()
            .await
            .unwrap();

        assert!(result.success());
        assert_eq!(result.stdout_text(), "hello\n");
        assert_eq!(result.stderr_text(), "");
    }

    #[tokio::test]
    async fn test_capture_as_bytes() {
        let result = quiet_shell()
            .call("printf 'a\\tb'")
            .capture_output(true)
            .text(false)
            .run()
            .await
            .unwrap();

        assert_eq!(result.stdout.unwrap().as_bytes(), b"a\tb");
    }

    #[tokio::test]
    async fn test_without_capture_output_is_none() {
        let result = quiet_shell().call("true").run().await.unwrap();
        assert_eq!(result, ShellResult::new(0));
    }

    #[tokio::test]
    async fn test_multiline_command() {
        let script = "
            echo one
            echo two
        ";
        let result = quiet_shell()
            .call(script)
            .capture_output(true)
            .run()
            .await
            .unwrap();

        assert_eq!(result.stdout_text(), "one\ntwo\n");
    }

    #[tokio::test]
    async fn test_argv_bypasses_interpreter() {
        let result = quiet_shell()
            .call(ShellCommand::argv(["echo", "$HOME", "a  b"]))
            .capture_output(true)
            .run()
            .await
            .unwrap();

        assert_eq!(result.stdout_text(), "$HOME a  b\n");
    }

    #[tokio::test]
    async fn test_per_call_env_does_not_leak() {
        let shell = quiet_shell().with_env([("GREETING", "hello")]);

        let result = shell
            .call("echo \"$GREETING $TARGET\"")
            .envs("TARGET", "world")
            .capture_output(true)
            .run()
            .await
            .unwrap();
        assert_eq!(result.stdout_text(), "hello world\n");

        assert_eq!(shell.env().get("TARGET"), None);
        let again = shell
            .call("echo \"${TARGET:-unset}\"")
            .capture_output(true)
            .run()
            .await
            .unwrap();
        assert_eq!(again.stdout_text(), "unset\n");
    }

    #[tokio::test]
    async fn test_clear_env() {
        let shell = quiet_shell().with_clear_env().with_env([("ONLY", "me")]);
        let result = shell
            .call(ShellCommand::argv(["/usr/bin/env"]))
            .capture_output(true)
            .run()
            .await
            .unwrap();

        assert_eq!(result.stdout_text(), "ONLY=me\n");
    }

    #[tokio::test]
    async fn test_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "x").unwrap();

        let shell = quiet_shell().with_cwd(dir.path());
        let result = shell.call("ls").capture_output(true).run().await.unwrap();
        assert!(result.stdout_text().contains("marker.txt"));

        let other = tempfile::tempdir().unwrap();
        let result = shell
            .call("ls")
            .cwd(other.path())
            .capture_output(true)
            .run()
            .await
            .unwrap();
        assert!(!result.stdout_text().contains("marker.txt"));
    }

    #[tokio::test]
    async fn test_log_output_streams_lines() {
        let logger = MemoryLogger::shared();
        let result = quiet_shell()
            .call("printf 'one\\ntwo\\n'; echo problem >&2")
            .log_output(logger.clone(), true)
            .run()
            .await
            .unwrap();

        assert!(result.success());
        assert!(result.stdout.is_none());

        let records = logger.records();
        let info: Vec<&str> = records
            .iter()
            .filter(|r| r.level == Level::Info)
            .map(|r| r.message.as_str())
            .collect();
        assert_eq!(info, vec!["one", "two"]);
        assert!(records
            .iter()
            .any(|r| r.level == Level::Error && r.message == "problem"));
    }

    #[tokio::test]
    async fn test_log_output_unsplit() {
        let logger = MemoryLogger::shared();
        quiet_shell()
            .call("echo problem >&2")
            .log_output(logger.clone(), false)
            .run()
            .await
            .unwrap();

        let records = logger.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].level, Level::Info);
        assert_eq!(records[0].message, "problem");
    }

    #[tokio::test]
    async fn test_dry_run_returns_configured_result() {
        let logger = MemoryLogger::shared();
        let shell = Shell::new()
            .with_flags(RuntimeFlags::new().with_dry_run(true))
            .with_logger(logger.clone());

        let result = shell
            .call("touch /should/not/exist")
            .dry_run_result(ShellResult::new(0).with_stdout("pretend"))
            .run()
            .await
            .unwrap();

        assert_eq!(result.stdout_text(), "pretend");
        assert!(logger.contains("[shell] Command: touch /should/not/exist"));
    }

    #[tokio::test]
    async fn test_log_execution_still_runs() {
        let logger = MemoryLogger::shared();
        let shell = Shell::new()
            .with_flags(RuntimeFlags::new().with_log_execution(true))
            .with_logger(logger.clone());

        let result = shell
            .call("echo real")
            .effect(Effect::LogExecution)
            .execution_message("Saying something")
            .capture_output(true)
            .run()
            .await
            .unwrap();

        assert_eq!(result.stdout_text(), "real\n");
        assert_eq!(logger.messages(), vec!["Saying something"]);
    }

    #[tokio::test]
    async fn test_timeout_kills_process_group() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("survived");

        let started = Instant::now();
        let err = quiet_shell()
            .call("(sleep 2; touch \"$MARKER\") & sleep 5; wait")
            .env([("MARKER", marker.to_string_lossy().into_owned())])
            .timeout(Duration::from_secs(1))
            .capture_output(true)
            .run()
            .await
            .unwrap_err();

        assert!(started.elapsed() < Duration::from_secs(4));
        assert!(err.is_timeout());
        assert_eq!(err.kind(), "TimeoutError");
        assert_eq!(err.as_shell().unwrap().timeout(), Some(Duration::from_secs(1)));

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn test_non_utf8_variables_inherited() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        std::env::set_var("RUNBOOK_RAW_BYTES", OsStr::from_bytes(b"a\xffb"));
        let result = quiet_shell()
            .call("printf '%s' \"$RUNBOOK_RAW_BYTES\"")
            .capture_output(true)
            .text(false)
            .run()
            .await
            .unwrap();
        std::env::remove_var("RUNBOOK_RAW_BYTES");

        assert_eq!(result.stdout.unwrap().as_bytes(), b"a\xffb");
    }

    #[tokio::test]
    async fn test_finishes_within_timeout() {
        let result = quiet_shell()
            .call("echo quick")
            .timeout(Duration::from_secs(5))
            .capture_output(true)
            .run()
            .await
            .unwrap();

        assert_eq!(result.stdout_text(), "quick\n");
    }
}
