//! Outcome of a successful command

use std::borrow::Cow;

/// Captured output of one stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// Decoded as UTF-8 (invalid sequences replaced)
    Text(String),
    /// Raw bytes, when text mode is off
    Bytes(Vec<u8>),
}

impl Output {
    pub(crate) fn decode(bytes: Vec<u8>, text: bool) -> Self {
        if text {
            match String::from_utf8(bytes) {
                Ok(s) => Output::Text(s),
                Err(e) => Output::Text(String::from_utf8_lossy(e.as_bytes()).into_owned()),
            }
        } else {
            Output::Bytes(bytes)
        }
    }

    /// Output as text, decoding bytes lossily.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Output::Text(s) => Cow::Borrowed(s),
            Output::Bytes(b) => String::from_utf8_lossy(b),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Output::Text(s) => s.as_bytes(),
            Output::Bytes(b) => b,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

/// Exit code and captured output of a finished command.
///
/// `stdout`/`stderr` are `None` unless capture was requested.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellResult {
    pub exit_code: i32,
    pub stdout: Option<Output>,
    pub stderr: Option<Output>,
}

impl ShellResult {
    pub fn new(exit_code: i32) -> Self {
        Self {
            exit_code,
            ..Default::default()
        }
    }

    pub fn with_stdout(mut self, stdout: impl Into<String>) -> Self {
        self.stdout = Some(Output::Text(stdout.into()));
        self
    }

    pub fn with_stderr(mut self, stderr: impl Into<String>) -> Self {
        self.stderr = Some(Output::Text(stderr.into()));
        self
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Captured stdout as text, empty when not captured.
    pub fn stdout_text(&self) -> Cow<'_, str> {
        self.stdout
            .as_ref()
            .map(Output::as_text)
            .unwrap_or(Cow::Borrowed(""))
    }

    /// Captured stderr as text, empty when not captured.
    pub fn stderr_text(&self) -> Cow<'_, str> {
        self.stderr
            .as_ref()
            .map(Output::as_text)
            .unwrap_or(Cow::Borrowed(""))
    }
}
