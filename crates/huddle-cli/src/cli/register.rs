//! `huddle register`: claim a username with the directory.

use anyhow::Result;
use console::style;
use dialoguer::Input;

use huddle_core::directory::{normalize_username, RoomDirectory};
use huddle_infra::config::{load_client_config, save_client_config};

use crate::cli::display::spinner;
use crate::state::AppState;

pub async fn register(
    state: &AppState,
    name: Option<String>,
    remember: bool,
    json: bool,
) -> Result<()> {
    let name = match name {
        Some(n) => n,
        None => Input::<String>::new()
            .with_prompt("Username")
            .interact_text()?,
    };
    let username = normalize_username(&name)?;

    let progress = spinner("Registering username...");
    let result = state.directory.register_username(&username).await;
    progress.finish_and_clear();
    let user = result?;

    let remembered = if remember {
        // Start from the file, not the effective config, so CLI overrides
        // are not persisted.
        let mut config = load_client_config(&state.config_dir).await;
        config.display_name = Some(username.clone());
        Some(save_client_config(&state.config_dir, &config).await?)
    } else {
        None
    };

    if json {
        let out = serde_json::json!({
            "username": username,
            "user_id": user.user_id.to_string(),
            "remembered": remembered.is_some(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Registered {} (id {})",
        style("✓").green().bold(),
        style(&username).cyan().bold(),
        style(&user.user_id).dim()
    );
    if let Some(path) = remembered {
        println!(
            "  {} Saved as default display name in {}",
            style("*").cyan(),
            style(path.display()).dim()
        );
    }
    println!();
    Ok(())
}
