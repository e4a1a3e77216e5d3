//! Huddle CLI entry point.
//!
//! Binary name: `huddle`
//!
//! Parses CLI arguments, loads configuration, then dispatches to the
//! appropriate command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands, RoomsCommand};
use state::{AppState, ConfigOverrides};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,huddle=debug",
        _ => "trace",
    };
    huddle_observe::init_tracing(filter, cli.otel)
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "huddle", &mut std::io::stdout());
        return Ok(());
    }

    let overrides = ConfigOverrides {
        api_url: cli.api_url.clone(),
        ws_url: cli.ws_url.clone(),
    };
    let state = AppState::init(cli.config_dir.clone(), &overrides).await?;

    let result = run(&state, cli).await;
    huddle_observe::shutdown_tracing();
    result
}

async fn run(state: &AppState, cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Register { name, remember } => {
            cli::register::register(state, name, remember, cli.json).await?;
        }

        Commands::Rooms { command } => match command {
            RoomsCommand::List => {
                cli::rooms::list_rooms(state, cli.json).await?;
            }
            RoomsCommand::Create {
                room_name,
                join,
                display_name,
            } => {
                let room = cli::rooms::create_room(state, room_name, cli.json).await?;
                if join {
                    cli::chat::loop_runner::run_chat(state, &room.id, display_name).await?;
                }
            }
        },

        Commands::Chat {
            room_id,
            display_name,
        } => {
            cli::chat::loop_runner::run_chat(state, &room_id, display_name).await?;
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}
