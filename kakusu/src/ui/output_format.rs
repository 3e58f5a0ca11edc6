// kakusu/src/ui/output_format.rs
//! Styled status messages on stderr.
//!
//! Color is applied only when the target stream is a terminal; piped output stays
//! plain so that scripts and tests see stable text.

use owo_colors::OwoColorize;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Warn,
    Error,
}

impl MessageKind {
    fn prefix(&self) -> &'static str {
        match self {
            MessageKind::Info => "Info",
            MessageKind::Warn => "Warning",
            MessageKind::Error => "Error",
        }
    }
}

/// Writes `[<kind>] message` to `writer`, colored if `supports_color`.
pub fn print_message<W: Write>(
    writer: &mut W,
    kind: MessageKind,
    message: &str,
    supports_color: bool,
) -> io::Result<()> {
    let prefix = format!("[{}]", kind.prefix());
    if supports_color {
        let styled = match kind {
            MessageKind::Info => prefix.cyan().to_string(),
            MessageKind::Warn => prefix.yellow().bold().to_string(),
            MessageKind::Error => prefix.red().bold().to_string(),
        };
        writeln!(writer, "{} {}", styled, message)
    } else {
        writeln!(writer, "{} {}", prefix, message)
    }
}

pub fn print_info_message<W: Write>(writer: &mut W, message: &str, supports_color: bool) -> io::Result<()> {
    print_message(writer, MessageKind::Info, message, supports_color)
}

pub fn print_warn_message<W: Write>(writer: &mut W, message: &str, supports_color: bool) -> io::Result<()> {
    print_message(writer, MessageKind::Warn, message, supports_color)
}

pub fn print_error_message<W: Write>(writer: &mut W, message: &str, supports_color: bool) -> io::Result<()> {
    print_message(writer, MessageKind::Error, message, supports_color)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_output_has_no_escape_codes() {
        let mut buf = Vec::new();
        print_warn_message(&mut buf, "2 mask(s) not found", false).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "[Warning] 2 mask(s) not found\n");
    }

    #[test]
    fn test_colored_output_keeps_message() {
        let mut buf = Vec::new();
        print_error_message(&mut buf, "boom", true).unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert!(out.contains("\u{1b}["));
        assert!(out.ends_with(" boom\n"));
    }
}
