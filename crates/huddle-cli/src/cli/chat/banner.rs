//! Welcome banner display for chat sessions.

use console::style;

use huddle_types::room::RoomIdentity;

/// Print the welcome banner before the prompt starts.
pub fn print_welcome_banner(identity: &RoomIdentity, session_id: &str) {
    println!();
    println!(
        "  {} {}",
        style("#").cyan().bold(),
        style(identity.room_id()).cyan().bold()
    );
    println!();
    println!(
        "  {}  {}",
        style("Joined as:").bold(),
        style(identity.display_name()).green()
    );
    println!(
        "  {}    {}",
        style("Session:").bold(),
        style(&session_id[..8.min(session_id.len())]).dim()
    );
    println!();
    println!(
        "  {}",
        style("Type /help for commands, Ctrl+D to leave").dim()
    );
    println!("  {}", style("---").dim());
    println!();
}
