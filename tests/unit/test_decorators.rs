//! Unit tests for the call decorators
//!
//! These tests exercise timeouts, execution logging and dry-run side
//! effects through the public API.

use runbook::decorators::{ignore_errors, CallDescription, LogExecution, SideEffect, Timeout};
use runbook::{Error, MemoryLogger, RuntimeFlags};

#[cfg(test)]
mod timeout_tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_parse_composite_durations() {
        assert_eq!(Timeout::parse("1 second 0.5 minutes").unwrap().seconds(), Some(31));
        assert_eq!(Timeout::parse("2 hours").unwrap().seconds(), Some(7200));
        assert_eq!(Timeout::parse("1 hour 1 minute 1 second").unwrap().seconds(), Some(3661));
        assert_eq!(Timeout::parse("90").unwrap().seconds(), Some(90));
    }

    #[test]
    fn test_zero_means_no_deadline() {
        let timeout = Timeout::from_secs(0);
        assert!(!timeout.is_enabled());
        assert_eq!(timeout.duration(), None);
    }

    #[test]
    fn test_guard_without_deadline() {
        let value = tokio_test::block_on(Timeout::none().guard(async { Ok(3) }));
        tokio_test::assert_ok!(value);

        let failed =
            tokio_test::block_on(Timeout::none().guard(async { Err::<(), _>(Error::msg("no")) }));
        tokio_test::assert_err!(failed);
    }

    #[tokio::test]
    async fn test_guard_cancels_slow_future() {
        let err = Timeout::from_secs(1)
            .with_message("gave up")
            .guard(async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(())
            })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Timeout { timeout, .. } if timeout == Duration::from_secs(1)));
        assert_eq!(err.to_string(), "gave up");
    }

    #[tokio::test]
    async fn test_ignore_errors_swallows_timeout() {
        let outcome = ignore_errors(Timeout::from_secs(1).guard(async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(())
        }))
        .await;

        assert!(outcome.is_none());
    }
}

#[cfg(test)]
mod execution_tests {
    use super::*;

    fn flags(dry_run: bool, log_execution: bool) -> RuntimeFlags {
        RuntimeFlags::new()
            .with_dry_run(dry_run)
            .with_log_execution(log_execution)
    }

    #[test]
    fn test_log_execution_off_is_silent() {
        let logger = MemoryLogger::new();
        let value = tokio_test::block_on(LogExecution::new().run(
            flags(false, false),
            &logger,
            &"copy",
            async { 5 },
        ));

        assert_eq!(value, 5);
        assert!(logger.is_empty());
    }

    #[tokio::test]
    async fn test_log_execution_describes_call() {
        let logger = MemoryLogger::new();
        let call = CallDescription::new("copy").arg("a.txt").kwarg("force", true);
        LogExecution::new()
            .run(flags(false, true), &logger, &call, async {})
            .await;

        assert_eq!(logger.messages(), vec!["copy(\"a.txt\", force=true)"]);
    }

    #[tokio::test]
    async fn test_side_effect_dry_run() {
        let logger = MemoryLogger::new();
        let mut ran = false;
        let value = SideEffect::new(-1)
            .with_message(Some("Deleting everything".to_string()))
            .run(flags(true, false), &logger, &"rm", async {
                ran = true;
                0
            })
            .await;

        assert_eq!(value, -1);
        assert!(!ran);
        assert_eq!(logger.messages(), vec!["Deleting everything"]);
    }

    #[test]
    fn test_side_effect_blocking_invoke() {
        let logger = MemoryLogger::new();
        let value = SideEffect::<u8>::default().invoke(flags(false, false), &logger, &"noop", || 9);

        assert_eq!(value, 9);
        assert!(logger.is_empty());
    }
}
