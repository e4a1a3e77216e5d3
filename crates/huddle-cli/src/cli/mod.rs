//! CLI command definitions and dispatch for the `huddle` binary.
//!
//! Uses clap derive macros for argument parsing. Commands follow a
//! noun-verb pattern (e.g., `huddle rooms list`, `huddle rooms create`).

pub mod chat;
pub mod display;
pub mod register;
pub mod rooms;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Chat in short-lived rooms from your terminal.
#[derive(Parser)]
#[command(name = "huddle", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Also export tracing spans to stdout via OpenTelemetry.
    #[arg(long, global = true)]
    pub otel: bool,

    /// Directory holding config.toml (default: ~/.huddle).
    #[arg(long, global = true, env = "HUDDLE_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    /// Override the directory service base URL.
    #[arg(long, global = true, env = "HUDDLE_API_URL")]
    pub api_url: Option<String>,

    /// Override the live stream base URL.
    #[arg(long, global = true, env = "HUDDLE_WS_URL")]
    pub ws_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Register a username with the directory.
    Register {
        /// Username to register (prompted if omitted).
        name: Option<String>,

        /// Remember the name as the default display name for chats.
        #[arg(long)]
        remember: bool,
    },

    /// List or create rooms.
    Rooms {
        #[command(subcommand)]
        command: RoomsCommand,
    },

    /// Join a room and chat interactively.
    Chat {
        /// Room id (see `huddle rooms list`).
        room_id: String,

        /// Name shown to other participants (defaults to the remembered name).
        #[arg(long = "name", short = 'n', value_name = "DISPLAY_NAME")]
        display_name: Option<String>,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum RoomsCommand {
    /// List rooms with their remaining lifetime.
    #[command(alias = "ls")]
    List,

    /// Create a new room.
    Create {
        /// Room name (prompted if omitted).
        #[arg(value_name = "NAME")]
        room_name: Option<String>,

        /// Join the room right after creating it.
        #[arg(long)]
        join: bool,

        /// Display name to join with.
        #[arg(long = "name", short = 'n', value_name = "DISPLAY_NAME", requires = "join")]
        display_name: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_chat_with_display_name() {
        let cli = Cli::try_parse_from(["huddle", "chat", "r1", "--name", "ana"]).unwrap();
        match cli.command {
            Commands::Chat {
                room_id,
                display_name,
            } => {
                assert_eq!(room_id, "r1");
                assert_eq!(display_name.as_deref(), Some("ana"));
            }
            _ => panic!("expected chat command"),
        }
    }

    #[test]
    fn parses_rooms_create_and_join() {
        let cli =
            Cli::try_parse_from(["huddle", "--json", "rooms", "create", "lobby", "--join", "-n", "bo"])
                .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Rooms {
                command:
                    RoomsCommand::Create {
                        room_name,
                        join,
                        display_name,
                    },
            } => {
                assert_eq!(room_name.as_deref(), Some("lobby"));
                assert!(join);
                assert_eq!(display_name.as_deref(), Some("bo"));
            }
            _ => panic!("expected rooms create"),
        }
    }

    #[test]
    fn display_name_without_join_is_rejected() {
        assert!(Cli::try_parse_from(["huddle", "rooms", "create", "lobby", "--name", "bo"]).is_err());
    }

    #[test]
    fn verbosity_counts() {
        let cli = Cli::try_parse_from(["huddle", "-vv", "rooms", "ls"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(
            cli.command,
            Commands::Rooms {
                command: RoomsCommand::List
            }
        ));
    }
}
