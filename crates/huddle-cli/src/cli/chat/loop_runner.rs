//! Main chat loop.
//!
//! Races the readline prompt, timeline snapshots, connection state changes,
//! and the reply to the message currently being sent. All output while the
//! prompt is active goes through the readline `SharedWriter`.

use std::future::Future;
use std::io::Write;
use std::pin::Pin;

use console::style;
use dialoguer::Input;

use huddle_core::session::{HistoryStatus, SessionHandle};
use huddle_types::connection::ConnectionState;
use huddle_types::error::SendError;
use huddle_types::room::RoomIdentity;

use super::banner::print_welcome_banner;
use super::commands::{self, ChatCommand};
use super::input::{ChatInput, InputEvent};
use super::render::{format_message_line, prompt, status_line, TimelinePrinter};
use crate::cli::display::spinner;
use crate::state::AppState;

type PendingSend<'a> = Pin<Box<dyn Future<Output = Result<(), SendError>> + 'a>>;

/// Join `room_id` and run the interactive loop until the user leaves.
///
/// The display name falls back to the remembered one and is prompted for
/// when neither is available.
pub async fn run_chat(
    state: &AppState,
    room_id: &str,
    display_name: Option<String>,
) -> anyhow::Result<()> {
    let display_name = match display_name.or_else(|| state.config.display_name.clone()) {
        Some(name) => name,
        None => Input::<String>::new()
            .with_prompt("Display name")
            .interact_text()?,
    };
    let identity = RoomIdentity::new(room_id, display_name)?;

    let controller = state.session_controller();
    let session = controller.start(identity.clone());
    print_welcome_banner(&identity, &session.id().to_string());

    let history = wait_for_history(&session).await;
    if let HistoryStatus::Failed { reason } = &history {
        println!(
            "  {} Failed to load message history. {}",
            style("!").yellow().bold(),
            style(reason).dim()
        );
    }

    let result = chat_loop(&session, &identity).await;
    session.shutdown().await;
    result
}

async fn wait_for_history(session: &SessionHandle) -> HistoryStatus {
    let progress = spinner("Loading messages...");
    let mut changes = session.history_changes();
    let status = match changes.wait_for(|s| !s.is_pending()).await {
        Ok(status) => status.clone(),
        Err(_) => HistoryStatus::Pending,
    };
    progress.finish_and_clear();
    status
}

async fn chat_loop(session: &SessionHandle, identity: &RoomIdentity) -> anyhow::Result<()> {
    let own_name = identity.display_name();
    let mut timeline_rx = session.timeline_changes();
    let mut connection_rx = session.connection_changes();
    let mut last_state = *connection_rx.borrow_and_update();

    let (mut input, mut out) = ChatInput::new(prompt(own_name, last_state))
        .map_err(|e| anyhow::anyhow!("Failed to initialize input: {e}"))?;

    let initial = timeline_rx.borrow_and_update().clone();
    let mut printer = TimelinePrinter::default();
    if initial.is_empty() {
        writeln!(out, "  {}", style("No messages yet").dim())?;
    }
    for message in printer.take_new(&initial) {
        writeln!(out, "{}", format_message_line(message, own_name))?;
    }
    if last_state.is_open() {
        if let Some(line) = status_line(last_state) {
            writeln!(out, "{line}")?;
        }
    }

    // At most one send awaits its reply; the other arms keep running meanwhile.
    let mut sending: Option<PendingSend<'_>> = None;

    loop {
        tokio::select! {
            Some(result) = async {
                match sending.as_mut() {
                    Some(send) => Some(send.await),
                    None => None,
                }
            }, if sending.is_some() => {
                sending = None;
                if let Err(err) = result {
                    writeln!(out, "{}", send_failure_line(&err))?;
                }
            }

            event = input.read_line() => match event {
                InputEvent::Eof => break,
                InputEvent::Interrupted => {
                    writeln!(out, "  {}", style("Press Ctrl+D or type /exit to leave.").dim())?;
                }
                InputEvent::Message(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    if let Some(cmd) = commands::parse(&line) {
                        match cmd {
                            ChatCommand::Help => commands::write_help(&mut out)?,
                            ChatCommand::History => {
                                let timeline = session.timeline();
                                writeln!(out)?;
                                if timeline.is_empty() {
                                    writeln!(out, "  {}", style("No messages yet").dim())?;
                                }
                                for message in timeline.iter() {
                                    writeln!(out, "{}", format_message_line(message, own_name))?;
                                }
                                writeln!(out)?;
                            }
                            ChatCommand::Status => {
                                writeln!(
                                    out,
                                    "  {} {}  {} {}  {} {}",
                                    style("Connection:").bold(),
                                    session.connection_state(),
                                    style("History:").bold(),
                                    session.history_status(),
                                    style("Messages:").bold(),
                                    session.timeline().len(),
                                )?;
                            }
                            ChatCommand::Clear => input.clear(),
                            ChatCommand::Exit => break,
                            ChatCommand::Unknown(name) => {
                                writeln!(
                                    out,
                                    "  {} Unknown command: {}. Type /help for available commands.",
                                    style("?").yellow().bold(),
                                    style(name).dim()
                                )?;
                            }
                        }
                        continue;
                    }

                    if sending.is_some() {
                        writeln!(
                            out,
                            "  {} Still sending the previous message, try again.",
                            style("!").yellow().bold()
                        )?;
                        continue;
                    }
                    sending = Some(Box::pin(async move { session.send_message(&line).await }));
                }
            },

            changed = timeline_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = timeline_rx.borrow_and_update().clone();
                for message in printer.take_new(&snapshot) {
                    writeln!(out, "{}", format_message_line(message, own_name))?;
                }
            }

            changed = connection_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *connection_rx.borrow_and_update();
                if state != last_state {
                    last_state = state;
                    if let Some(line) = status_line(state) {
                        writeln!(out, "{line}")?;
                    }
                    input.update_prompt(&prompt(own_name, state));
                }
                if state == ConnectionState::Closed {
                    break;
                }
            }
        }
    }

    writeln!(out, "\n  {}", style("Left the room.").dim())?;
    input.finish();
    Ok(())
}

fn send_failure_line(err: &SendError) -> String {
    match err {
        SendError::NotOpen(state) => format!(
            "  {} Not connected ({state}), message not sent.",
            style("!").yellow().bold()
        ),
        other => format!("  {} {other}", style("!").red().bold()),
    }
}
