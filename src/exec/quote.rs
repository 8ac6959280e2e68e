//! Shell quoting for display and shell-mode execution.
//!
//! For `sh`, arguments made only of characters the shell never interprets
//! are left bare; anything else is wrapped in single quotes, with embedded
//! single quotes written as `'\''`.
//!
//! ```text
//! hello          → hello
//! two words      → 'two words'
//! it's           → 'it'\''s'
//! (empty)        → ''
//! ```
//!
//! `cmd.exe` has no single quotes, so windows shell mode uses
//! [`cmd_quote`]: double quotes, with embedded double quotes doubled.
//! Environment references such as `%PATH%` still expand inside them.
//!
//! ```text
//! C:\site\out    → C:\site\out
//! two words      → "two words"
//! say "hi"       → "say ""hi"""
//! ```

use std::borrow::Cow;

fn is_bare(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | ':' | '=' | '@' | '%' | '+' | ',')
}

/// Quote one argument for a POSIX shell.
pub fn quote(arg: &str) -> Cow<'_, str> {
    if !arg.is_empty() && arg.chars().all(is_bare) {
        Cow::Borrowed(arg)
    } else {
        Cow::Owned(format!("'{}'", arg.replace('\'', r"'\''")))
    }
}

fn is_cmd_bare(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | '\\' | ':' | '=' | '@' | '+' | ',')
}

/// Quote one argument for `cmd.exe`.
pub fn cmd_quote(arg: &str) -> Cow<'_, str> {
    if !arg.is_empty() && arg.chars().all(is_cmd_bare) {
        Cow::Borrowed(arg)
    } else {
        Cow::Owned(format!("\"{}\"", arg.replace('"', "\"\"")))
    }
}

/// Like [`command_line`], quoting arguments for `cmd.exe`.
pub fn cmd_command_line<S: AsRef<str>>(exe: &str, argv: &[S]) -> String {
    let mut line = exe.to_string();
    for arg in argv {
        line.push(' ');
        line.push_str(&cmd_quote(arg.as_ref()));
    }
    line
}

/// Render `exe` followed by its quoted arguments.
///
/// `exe` is emitted verbatim so a shell-mode caller can pass a compound
/// program such as `npx sass`.
pub fn command_line<S: AsRef<str>>(exe: &str, argv: &[S]) -> String {
    let mut line = exe.to_string();
    for arg in argv {
        line.push(' ');
        line.push_str(&quote(arg.as_ref()));
    }
    line
}
