//! `huddle rooms`: list and create rooms.

use anyhow::Result;
use chrono::Utc;
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;
use dialoguer::Input;

use huddle_core::directory::{normalize_room_name, RoomDirectory};
use huddle_types::room::Room;

use crate::cli::display::{format_relative_time, format_remaining, spinner};
use crate::state::AppState;

pub async fn list_rooms(state: &AppState, json: bool) -> Result<()> {
    let progress = spinner("Fetching rooms...");
    let result = state.directory.list_rooms().await;
    progress.finish_and_clear();
    let mut rooms = result?;
    rooms.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    if json {
        println!("{}", serde_json::to_string_pretty(&rooms)?);
        return Ok(());
    }

    if rooms.is_empty() {
        println!();
        println!(
            "  {} No rooms yet. Create one with: {}",
            style("i").blue().bold(),
            style("huddle rooms create <name>").yellow()
        );
        println!();
        return Ok(());
    }

    println!("{}", rooms_table(&rooms));
    println!();
    println!(
        "  {} {}",
        style(format!("{} room(s).", rooms.len())).dim(),
        style("Join with: huddle chat <id>").dim()
    );
    Ok(())
}

fn rooms_table(rooms: &[Room]) -> Table {
    let now = Utc::now();
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Name").fg(Color::White),
        Cell::new("ID").fg(Color::White),
        Cell::new("Created").fg(Color::White),
        Cell::new("Expires").fg(Color::White),
    ]);

    for room in rooms {
        let expires = match room.time_remaining(now) {
            Some(left) => Cell::new(format!("in {}", format_remaining(left))).fg(Color::Green),
            None => Cell::new("expired").fg(Color::DarkGrey),
        };
        table.add_row(vec![
            Cell::new(&room.name),
            Cell::new(&room.id).fg(Color::DarkGrey),
            Cell::new(format_relative_time(&room.created_at, now)),
            expires,
        ]);
    }
    table
}

/// Create a room and return it so the caller can join it.
pub async fn create_room(state: &AppState, name: Option<String>, json: bool) -> Result<Room> {
    let name = match name {
        Some(n) => n,
        None => Input::<String>::new()
            .with_prompt("Room name")
            .interact_text()?,
    };
    let name = normalize_room_name(&name)?;

    let progress = spinner("Creating room...");
    let result = state.directory.create_room(&name).await;
    progress.finish_and_clear();
    let room = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&room)?);
        return Ok(room);
    }

    println!();
    println!(
        "  {} Created room {} ({})",
        style("✓").green().bold(),
        style(&room.name).cyan().bold(),
        style(&room.id).dim()
    );
    if let Some(left) = room.time_remaining(Utc::now()) {
        println!(
            "  {} Expires in {}",
            style("i").blue().bold(),
            format_remaining(left)
        );
    }
    println!();
    Ok(room)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(name: &str, expires_in_mins: i64) -> Room {
        let now = Utc::now();
        Room {
            id: format!("id-{name}"),
            name: name.to_string(),
            created_at: now - chrono::Duration::hours(2),
            expires_at: now + chrono::Duration::minutes(expires_in_mins),
        }
    }

    #[test]
    fn table_marks_expired_rooms() {
        let rendered = rooms_table(&[room("lobby", 90), room("old", -5)]).to_string();
        assert!(rendered.contains("lobby"));
        assert!(rendered.contains("id-lobby"));
        assert!(rendered.contains("in 1h"));
        assert!(rendered.contains("expired"));
        assert!(rendered.contains("2h ago"));
    }
}
