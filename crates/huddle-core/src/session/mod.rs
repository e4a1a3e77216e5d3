//! Session lifecycle for one room view.
//!
//! [`SessionController::start`] runs the history load and the live channel
//! concurrently and merges both into a [`Timeline`](crate::timeline::Timeline)
//! published through the returned [`SessionHandle`].

pub mod controller;
pub mod status;

use std::time::Duration;

use huddle_types::config::ClientConfig;

use crate::channel::ChannelTimings;

pub use controller::{SessionController, SessionHandle};
pub use status::HistoryStatus;

/// Tunables for sessions started by a [`SessionController`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Fixed wait between a lost connection and the next handshake.
    pub reconnect_delay: Duration,
    /// Upper bound on one live handshake before it counts as failed.
    pub handshake_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from(&ClientConfig::default())
    }
}

impl From<&ClientConfig> for SessionConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            reconnect_delay: config.reconnect_delay(),
            handshake_timeout: config.request_timeout(),
        }
    }
}

impl SessionConfig {
    pub(crate) fn channel_timings(&self) -> ChannelTimings {
        ChannelTimings {
            reconnect_delay: self.reconnect_delay,
            handshake_timeout: self.handshake_timeout,
        }
    }
}
