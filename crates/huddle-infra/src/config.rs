//! Client configuration loader for Huddle.
//!
//! Reads `config.toml` from the config directory (`~/.huddle/` in production)
//! and deserializes it into [`ClientConfig`]. Falls back to defaults when the
//! file is missing or malformed.

use std::path::{Path, PathBuf};

use huddle_types::config::ClientConfig;

/// Environment variable overriding the config directory.
pub const CONFIG_DIR_ENV: &str = "HUDDLE_CONFIG_DIR";

const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigWriteError {
    #[error("failed to write config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Resolve the config directory from environment or platform defaults.
///
/// Priority:
/// 1. `HUDDLE_CONFIG_DIR` environment variable
/// 2. `~/.huddle`
/// 3. `./.huddle`
pub fn resolve_config_dir() -> PathBuf {
    config_dir_from(std::env::var(CONFIG_DIR_ENV).ok(), dirs::home_dir())
}

fn config_dir_from(env_dir: Option<String>, home: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = env_dir.filter(|d| !d.trim().is_empty()) {
        return PathBuf::from(dir);
    }
    match home {
        Some(home) => home.join(".huddle"),
        None => PathBuf::from(".huddle"),
    }
}

pub fn config_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE)
}

/// Load client configuration from `{config_dir}/config.toml`.
///
/// - If the file does not exist, returns [`ClientConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - Fields missing from the file take their defaults.
pub async fn load_client_config(config_dir: &Path) -> ClientConfig {
    let path = config_path(config_dir);

    let content = match tokio::fs::read_to_string(&path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", path.display());
            return ClientConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", path.display());
            return ClientConfig::default();
        }
    };

    match toml::from_str::<ClientConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", path.display());
            ClientConfig::default()
        }
    }
}

/// Write `config` to `{config_dir}/config.toml`, creating the directory.
pub async fn save_client_config(
    config_dir: &Path,
    config: &ClientConfig,
) -> Result<PathBuf, ConfigWriteError> {
    let path = config_path(config_dir);
    let content = toml::to_string_pretty(config)?;
    tokio::fs::create_dir_all(config_dir).await?;
    tokio::fs::write(&path, content).await?;
    tracing::debug!("Wrote {}", path.display());
    Ok(path)
}
