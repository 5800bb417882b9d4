//! Command representation
//!
//! A command is either a full command line, run through the shell
//! interpreter, or an argument vector that is executed exactly as given.

use std::fmt;

use crate::error::{Error, Result};

/// Interpreter used for command lines when none is configured.
pub fn default_interpreter() -> Vec<String> {
    #[cfg(windows)]
    {
        vec!["cmd".to_string(), "/C".to_string()]
    }

    #[cfg(not(windows))]
    {
        vec!["/bin/sh".to_string(), "-c".to_string()]
    }
}

/// A command to execute
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    /// Command line, dedented and trimmed
    Line(String),
    /// Program and arguments
    Argv(Vec<String>),
}

impl ShellCommand {
    /// Command line with common indentation and surrounding blank lines removed.
    pub fn line(text: &str) -> Self {
        ShellCommand::Line(dedent(text).trim().to_string())
    }

    pub fn argv<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ShellCommand::Argv(args.into_iter().map(Into::into).collect())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ShellCommand::Line(line) => line.is_empty(),
            ShellCommand::Argv(args) => args.is_empty(),
        }
    }

    /// True for command lines spanning several lines.
    pub fn is_multiline(&self) -> bool {
        matches!(self, ShellCommand::Line(line) if line.contains('\n'))
    }

    /// Program and arguments handed to the OS.
    ///
    /// A blank line is still handed to the interpreter, which treats it as a
    /// no-op; only an empty argument vector or interpreter is rejected.
    pub fn to_argv(&self, interpreter: &[String]) -> Result<Vec<String>> {
        match self {
            ShellCommand::Argv(args) if args.is_empty() => Err(Error::EmptyCommand),
            ShellCommand::Argv(args) => Ok(args.clone()),
            ShellCommand::Line(line) => {
                if interpreter.is_empty() {
                    return Err(Error::EmptyCommand);
                }
                let mut argv = interpreter.to_vec();
                argv.push(line.clone());
                Ok(argv)
            }
        }
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShellCommand::Line(line) => f.write_str(line),
            ShellCommand::Argv(args) => write!(f, "{args:?}"),
        }
    }
}

impl From<&str> for ShellCommand {
    fn from(text: &str) -> Self {
        ShellCommand::line(text)
    }
}

impl From<String> for ShellCommand {
    fn from(text: String) -> Self {
        ShellCommand::line(&text)
    }
}

impl From<&String> for ShellCommand {
    fn from(text: &String) -> Self {
        ShellCommand::line(text)
    }
}

impl From<Vec<String>> for ShellCommand {
    fn from(args: Vec<String>) -> Self {
        ShellCommand::Argv(args)
    }
}

impl From<Vec<&str>> for ShellCommand {
    fn from(args: Vec<&str>) -> Self {
        ShellCommand::argv(args)
    }
}

impl<const N: usize> From<[&str; N]> for ShellCommand {
    fn from(args: [&str; N]) -> Self {
        ShellCommand::argv(args)
    }
}

/// Remove the whitespace prefix shared by every non-blank line.
///
/// Whitespace-only lines do not take part in the prefix computation and are
/// emptied.
pub fn dedent(text: &str) -> String {
    let mut margin: Option<&str> = None;
    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        let indent = &line[..line.len() - line.trim_start().len()];
        margin = Some(match margin {
            None => indent,
            Some(current) => common_prefix(current, indent),
        });
    }
    let margin = margin.unwrap_or("");

    text.lines()
        .map(|line| {
            if line.trim().is_empty() {
                ""
            } else {
                &line[margin.len()..]
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn common_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let len = a
        .char_indices()
        .zip(b.chars())
        .take_while(|((_, x), y)| x == y)
        .last()
        .map(|((i, c), _)| i + c.len_utf8())
        .unwrap_or(0);
    &a[..len]
}
