//! ANSI escape code styling
//!
//! Cosmetic decoration for log lines. Every function returns its input
//! unchanged when colors are disabled, so callers never branch on the flag.

use once_cell::sync::Lazy;
use regex::Regex;

/// SGR reset sequence
pub const RESET: &str = "\x1b[0m";
/// Bright / bold text
pub const BRIGHT: &str = "\x1b[1m";
/// Red foreground
pub const RED: &str = "\x1b[31m";
/// Blue foreground
pub const BLUE: &str = "\x1b[34m";
/// Magenta foreground
pub const MAGENTA: &str = "\x1b[35m";

static ESCAPE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x1b\[[0-9;]*[mK]").expect("valid escape sequence pattern"));

/// Surround `text` with the given SGR codes followed by a reset.
pub fn paint(enabled: bool, text: &str, codes: &[&str]) -> String {
    if !enabled || text.is_empty() {
        return text.to_string();
    }

    format!("{RESET}{}{text}{RESET}", codes.concat())
}

/// Make `text` bold.
pub fn bold(enabled: bool, text: &str) -> String {
    paint(enabled, text, &[BRIGHT])
}

/// Remove SGR sequences, e.g. before measuring the visible width of a prefix.
pub fn strip(text: &str) -> String {
    ESCAPE_REGEX.replace_all(text, "").into_owned()
}
