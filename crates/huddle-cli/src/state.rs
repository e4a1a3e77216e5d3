//! Application state wiring the client together.
//!
//! AppState holds the resolved configuration and the concrete adapters used
//! by every command. Sessions are generic over the history source and
//! connector; AppState pins them to the infra implementations.

use std::path::PathBuf;
use std::sync::Arc;

use huddle_core::session::{SessionConfig, SessionController};
use huddle_infra::config::{load_client_config, resolve_config_dir};
use huddle_infra::directory::DirectoryClient;
use huddle_infra::ws::WsConnector;
use huddle_types::config::ClientConfig;

/// Concrete session controller pinned to the HTTP directory and WebSocket
/// connector.
pub type ConcreteSessionController = SessionController<DirectoryClient, WsConnector>;

/// Values given on the command line that take precedence over `config.toml`.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_url: Option<String>,
    pub ws_url: Option<String>,
}

impl ConfigOverrides {
    pub fn apply(&self, config: &mut ClientConfig) {
        if let Some(url) = &self.api_url {
            config.api_base_url = url.clone();
        }
        if let Some(url) = &self.ws_url {
            config.ws_base_url = url.clone();
        }
    }
}

/// Shared application state for all commands.
pub struct AppState {
    pub config: ClientConfig,
    pub config_dir: PathBuf,
    pub directory: Arc<DirectoryClient>,
    pub connector: Arc<WsConnector>,
}

impl AppState {
    /// Resolve the config directory, load `config.toml`, apply overrides, and
    /// build the adapters.
    pub async fn init(config_dir: Option<PathBuf>, overrides: &ConfigOverrides) -> anyhow::Result<Self> {
        let config_dir = config_dir.unwrap_or_else(resolve_config_dir);
        let mut config = load_client_config(&config_dir).await;
        overrides.apply(&mut config);

        tracing::debug!(
            api = %config.api_base_url,
            ws = %config.ws_base_url,
            config_dir = %config_dir.display(),
            "Resolved client configuration"
        );

        let directory = Arc::new(DirectoryClient::new(&config)?);
        let connector = Arc::new(WsConnector::new(&config)?);

        Ok(Self {
            config,
            config_dir,
            directory,
            connector,
        })
    }

    pub fn session_controller(&self) -> ConcreteSessionController {
        SessionController::new(
            Arc::clone(&self.directory),
            Arc::clone(&self.connector),
            SessionConfig::from(&self.config),
        )
    }
}
