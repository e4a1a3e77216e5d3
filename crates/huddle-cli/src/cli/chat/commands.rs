//! Slash command parsing for the chat loop.
//!
//! Commands start with `/`. Anything else is sent to the room.

use std::io::{self, Write};

use console::style;

#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    /// Show available commands.
    Help,
    /// Reprint the whole timeline in order.
    History,
    /// Show connection and history status.
    Status,
    /// Clear the terminal screen.
    Clear,
    /// Leave the room.
    Exit,
    /// Unknown command.
    Unknown(String),
}

/// Parse user input as a slash command.
///
/// Returns `None` if the input doesn't start with `/`.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let cmd = trimmed
        .split_whitespace()
        .next()
        .unwrap_or(trimmed)
        .to_lowercase();

    match cmd.as_str() {
        "/help" | "/h" | "/?" => Some(ChatCommand::Help),
        "/history" => Some(ChatCommand::History),
        "/status" => Some(ChatCommand::Status),
        "/clear" | "/cls" => Some(ChatCommand::Clear),
        "/exit" | "/quit" | "/q" => Some(ChatCommand::Exit),
        other => Some(ChatCommand::Unknown(other.to_string())),
    }
}

/// Write the help text listing all available commands.
pub fn write_help(out: &mut impl Write) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "  {}", style("Available commands:").bold())?;
    writeln!(out)?;
    for (name, about) in [
        ("/help   ", "Show this help message"),
        ("/history", "Reprint the room timeline in order"),
        ("/status ", "Show connection and history status"),
        ("/clear  ", "Clear the screen"),
        ("/exit   ", "Leave the room"),
    ] {
        writeln!(out, "  {} {}", style(name).cyan(), about)?;
    }
    writeln!(out)?;
    writeln!(
        out,
        "  {}",
        style("Messages can only be sent while connected. Ctrl+D to leave.").dim()
    )?;
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_help() {
        assert_eq!(parse("/help"), Some(ChatCommand::Help));
        assert_eq!(parse("/h"), Some(ChatCommand::Help));
        assert_eq!(parse("/?"), Some(ChatCommand::Help));
    }

    #[test]
    fn test_parse_exit() {
        assert_eq!(parse("/exit"), Some(ChatCommand::Exit));
        assert_eq!(parse("/quit"), Some(ChatCommand::Exit));
        assert_eq!(parse("  /Q  "), Some(ChatCommand::Exit));
    }

    #[test]
    fn test_parse_history_status_clear() {
        assert_eq!(parse("/history"), Some(ChatCommand::History));
        assert_eq!(parse("/status now"), Some(ChatCommand::Status));
        assert_eq!(parse("/cls"), Some(ChatCommand::Clear));
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(
            parse("/dance wildly"),
            Some(ChatCommand::Unknown("/dance".to_string()))
        );
    }

    #[test]
    fn test_plain_text_is_not_a_command() {
        assert_eq!(parse("hello"), None);
        assert_eq!(parse("see you at 5/6"), None);
    }

    #[test]
    fn test_help_lists_every_command() {
        let mut out = Vec::new();
        write_help(&mut out).unwrap();
        let text = console::strip_ansi_codes(&String::from_utf8(out).unwrap()).to_string();
        for cmd in ["/help", "/history", "/status", "/clear", "/exit"] {
            assert!(text.contains(cmd), "missing {cmd}");
        }
    }
}
