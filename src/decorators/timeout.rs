//! Deadline for in-process operations

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

tokio::task_local! {
    static UNDER_DEADLINE: ();
}

/// Whether the current task runs inside an enabled [`Timeout::guard`].
///
/// Subprocesses started under a deadline are made killable as a tree, since
/// the deadline may drop the call while the command is still running.
pub(crate) fn under_deadline() -> bool {
    UNDER_DEADLINE.try_with(|_| ()).is_ok()
}

static DURATION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(([\d\.]+)\W*(hours?|minutes?|seconds?)?)").expect("valid duration pattern")
});

/// A deadline in whole seconds plus the message of the error it raises.
///
/// Accepts a plain number of seconds or a composite string such as
/// `"1 hour 30 minutes"`; every component may be fractional, units may be
/// singular or omitted (seconds), and each converted component is truncated
/// to whole seconds before summing. Zero seconds means no deadline.
///
/// ```
/// use runbook::Timeout;
///
/// let timeout: Timeout = "1 second 0.5 minutes".parse().unwrap();
/// assert_eq!(timeout.seconds(), Some(31));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTimeout", into = "RawTimeout")]
pub struct Timeout {
    seconds: Option<u64>,
    message: String,
}

impl Timeout {
    pub const DEFAULT_MESSAGE: &'static str = "Operation timed out.";

    /// No deadline
    pub fn none() -> Self {
        Self {
            seconds: None,
            message: Self::DEFAULT_MESSAGE.to_string(),
        }
    }

    pub fn from_secs(seconds: u64) -> Self {
        Self {
            seconds: Some(seconds),
            ..Self::none()
        }
    }

    /// Parse a composite duration string.
    pub fn parse(spec: &str) -> Result<Self> {
        let invalid = || Error::InvalidTimeout {
            input: spec.to_string(),
        };

        let mut total: u64 = 0;
        let mut matched = false;
        for caps in DURATION_REGEX.captures_iter(spec) {
            matched = true;
            let value: f64 = caps[2].parse().map_err(|_| invalid())?;
            let unit = caps.get(3).map(|m| m.as_str()).unwrap_or("");
            let scale = match unit.chars().next() {
                Some('h') => 3600.0,
                Some('m') => 60.0,
                _ => 1.0,
            };
            total = total.saturating_add((value * scale) as u64);
        }

        if !matched {
            return Err(invalid());
        }

        Ok(Self::from_secs(total))
    }

    /// Replace the message of the raised error.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Effective deadline, `None` when disabled or zero.
    pub fn seconds(&self) -> Option<u64> {
        self.seconds.filter(|s| *s > 0)
    }

    pub fn duration(&self) -> Option<Duration> {
        self.seconds().map(Duration::from_secs)
    }

    pub fn is_enabled(&self) -> bool {
        self.seconds().is_some()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Run `fut` under the deadline.
    ///
    /// On expiry the future is dropped, so nothing keeps running in the
    /// background, and [`Error::Timeout`] is returned.
    pub async fn guard<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let Some(limit) = self.duration() else {
            return fut.await;
        };

        match tokio::time::timeout(limit, UNDER_DEADLINE.scope((), fut)).await {
            Ok(result) => result,
            Err(_) => {
                debug!("Deadline of {}s elapsed", limit.as_secs());
                Err(Error::Timeout {
                    timeout: limit,
                    message: self.message.clone(),
                })
            }
        }
    }
}

impl Default for Timeout {
    fn default() -> Self {
        Self::none()
    }
}

impl FromStr for Timeout {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<u64> for Timeout {
    fn from(seconds: u64) -> Self {
        Self::from_secs(seconds)
    }
}

impl fmt::Display for Timeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.seconds() {
            Some(seconds) => write!(f, "{seconds} seconds"),
            None => f.write_str("none"),
        }
    }
}

/// Configuration form: an integer or a composite string
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawTimeout {
    Seconds(u64),
    Text(String),
}

impl TryFrom<RawTimeout> for Timeout {
    type Error = Error;

    fn try_from(raw: RawTimeout) -> Result<Self> {
        match raw {
            RawTimeout::Seconds(seconds) => Ok(Self::from_secs(seconds)),
            RawTimeout::Text(text) => Self::parse(&text),
        }
    }
}

impl From<Timeout> for RawTimeout {
    fn from(timeout: Timeout) -> Self {
        RawTimeout::Seconds(timeout.seconds().unwrap_or(0))
    }
}
