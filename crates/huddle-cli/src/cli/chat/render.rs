//! Line formatting for messages, status changes, and the prompt.

use std::collections::HashSet;
use std::fmt::Display;

use chrono::{DateTime, TimeZone, Utc};
use console::style;

use huddle_types::connection::ConnectionState;
use huddle_types::message::{Message, MessageId};

/// `HH:MM` in the given timezone.
pub fn format_clock<Tz: TimeZone>(at: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    at.with_timezone(tz).format("%H:%M").to_string()
}

/// One timeline line: time, author, content. The local user's messages are
/// highlighted.
pub fn format_message_line(message: &Message, own_name: &str) -> String {
    let clock = format_clock(&message.created_at, &chrono::Local);
    format_message_line_at(message, own_name, &clock)
}

fn format_message_line_at(message: &Message, own_name: &str, clock: &str) -> String {
    let author = if message.author_name == own_name {
        style(&message.author_name).green().bold()
    } else {
        style(&message.author_name).cyan().bold()
    };
    format!("  {} {} {}", style(clock).dim(), author, message.content)
}

/// Status line announced when the connection state changes. `Connecting`
/// is shown by the prompt only.
pub fn status_line(state: ConnectionState) -> Option<String> {
    match state {
        ConnectionState::Open => Some(format!("  {} Connected", style("●").green())),
        ConnectionState::Reconnecting => {
            Some(format!("  {} Reconnecting...", style("○").yellow()))
        }
        ConnectionState::Closed => Some(format!("  {} Disconnected", style("○").red())),
        ConnectionState::Connecting => None,
    }
}

pub fn prompt(display_name: &str, state: ConnectionState) -> String {
    let dot = match state {
        ConnectionState::Open => style("●").green(),
        ConnectionState::Connecting | ConnectionState::Reconnecting => style("○").yellow(),
        ConnectionState::Closed => style("○").red(),
    };
    format!("  {} {} ", dot, style(format!("{display_name} >")).green().bold())
}

/// Tracks which messages have already been printed so each timeline
/// snapshot only prints what is new.
///
/// A message merged into the middle of the timeline (late delivery) is
/// printed at the bottom; `/history` reprints in timeline order.
#[derive(Debug, Default)]
pub struct TimelinePrinter {
    printed: HashSet<MessageId>,
}

impl TimelinePrinter {
    pub fn take_new<'a>(&mut self, timeline: &'a [Message]) -> Vec<&'a Message> {
        timeline
            .iter()
            .filter(|m| self.printed.insert(m.id.clone()))
            .collect()
    }
}
