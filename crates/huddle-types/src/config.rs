//! Client configuration types for Huddle.
//!
//! `ClientConfig` represents the `config.toml` that points the client at a
//! directory service and live endpoint and tunes reconnect behavior.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Smallest reconnect delay honored regardless of configuration.
pub const MIN_RECONNECT_DELAY_MS: u64 = 100;

/// Top-level configuration for the Huddle client.
///
/// Loaded from `~/.huddle/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the REST room/message directory.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Base URL of the live message stream.
    #[serde(default = "default_ws_base_url")]
    pub ws_base_url: String,

    /// Fixed delay before each reconnect attempt, in milliseconds.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    /// Timeout for directory HTTP requests and live handshakes, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Display name remembered from `huddle register --remember`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

fn default_api_base_url() -> String {
    "https://chat-api-k4vi.onrender.com/chat".to_string()
}

fn default_ws_base_url() -> String {
    "wss://chat-api-k4vi.onrender.com/ws".to_string()
}

fn default_reconnect_delay_ms() -> u64 {
    3_000
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            ws_base_url: default_ws_base_url(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            display_name: None,
        }
    }
}

impl ClientConfig {
    /// Reconnect delay with the [`MIN_RECONNECT_DELAY_MS`] floor applied.
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms.max(MIN_RECONNECT_DELAY_MS))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}
