//! Human-readable description of a shell invocation
//!
//! The same three lines are printed before a command runs (when execution
//! logging is on) and after it fails, as part of the error diagnostics.

use std::path::Path;

use super::{ShellCommand, ShellEnvironment};
use crate::ansi;
use crate::decorators::Describe;

/// Borrowed view of everything needed to describe one command.
#[derive(Debug, Clone, Copy)]
pub struct CommandDescription<'a> {
    pub command: &'a ShellCommand,
    pub env: &'a ShellEnvironment,
    pub cwd: &'a Path,
}

impl<'a> CommandDescription<'a> {
    pub fn new(command: &'a ShellCommand, env: &'a ShellEnvironment, cwd: &'a Path) -> Self {
        Self { command, env, cwd }
    }
}

impl Describe for CommandDescription<'_> {
    fn describe(&self, colors: bool) -> Vec<String> {
        let env = self
            .env
            .overrides()
            .iter()
            .map(|(key, value)| {
                let key = ansi::paint(colors, &format!("{key}="), &[ansi::MAGENTA, ansi::BRIGHT]);
                format!("{key}{}", quote(value))
            })
            .collect::<Vec<_>>()
            .join(" ");

        let command = match self.command {
            ShellCommand::Line(line) if self.command.is_multiline() => {
                let listing = line
                    .lines()
                    .map(|l| if l.trim().is_empty() { l.to_string() } else { format!("  {l}") })
                    .collect::<Vec<_>>()
                    .join("\n");
                format!("(see listing below)\n\n{listing}\n")
            }
            other => other.to_string(),
        };

        vec![
            line(colors, "Working directory:", &self.cwd.display().to_string()),
            line(colors, "Environment:", &env),
            line(colors, "Command:", &command),
        ]
    }
}

fn line(colors: bool, label: &str, value: &str) -> String {
    format!(
        "{} {} {}",
        ansi::paint(colors, "[shell]", &[ansi::BLUE, ansi::BRIGHT]),
        ansi::bold(colors, label),
        value
    )
}

/// Quote an environment value so empty strings and spaces stay visible.
fn quote(value: &str) -> String {
    if value.contains('\'') && !value.contains('"') {
        return format!("\"{}\"", escape(value));
    }
    format!("'{}'", escape(value).replace('\'', "\\'"))
}

fn escape(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace('\t', "\\t")
        .replace('\r', "\\r")
}
