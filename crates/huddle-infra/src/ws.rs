//! WebSocket live connector built on tokio-tungstenite.
//!
//! The live target for a room is `{ws_base}/{room_id}/{display_name}`, each
//! segment percent-encoded.

use futures_util::{SinkExt, StreamExt};
use reqwest::Url;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;

use huddle_core::channel::{Connection, Connector};
use huddle_types::config::ClientConfig;
use huddle_types::error::ChannelError;
use huddle_types::room::RoomIdentity;

use crate::endpoint::with_segments;

/// Opens one WebSocket per handshake against the configured base URL.
#[derive(Debug, Clone)]
pub struct WsConnector {
    base_url: Url,
}

impl WsConnector {
    pub fn new(config: &ClientConfig) -> Result<Self, ChannelError> {
        Self::from_base(&config.ws_base_url)
    }

    /// Accepts `ws://` and `wss://` bases only.
    pub fn from_base(raw: &str) -> Result<Self, ChannelError> {
        let base_url = Url::parse(raw)
            .map_err(|e| ChannelError::InvalidTarget(format!("'{raw}': {e}")))?;
        match base_url.scheme() {
            "ws" | "wss" => Ok(Self { base_url }),
            other => Err(ChannelError::InvalidTarget(format!(
                "'{raw}': unsupported scheme '{other}'"
            ))),
        }
    }

    /// The URL a handshake for `identity` connects to.
    pub fn target(&self, identity: &RoomIdentity) -> Result<Url, ChannelError> {
        with_segments(
            &self.base_url,
            &[identity.room_id(), identity.display_name()],
        )
        .ok_or_else(|| {
            ChannelError::InvalidTarget(format!("'{}' cannot carry a path", self.base_url))
        })
    }
}

impl Connector for WsConnector {
    type Connection = WsConnection;

    async fn connect(&self, identity: &RoomIdentity) -> Result<WsConnection, ChannelError> {
        let url = self.target(identity)?;
        debug!(url = %url, "Opening live connection");
        let (stream, response) = connect_async(url.as_str())
            .await
            .map_err(|e| ChannelError::Handshake(e.to_string()))?;
        debug!(status = %response.status(), "Live connection upgraded");
        Ok(WsConnection { stream })
    }
}

/// An open WebSocket. Pings are answered by tungstenite during reads.
pub struct WsConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl Connection for WsConnection {
    async fn send_text(&mut self, text: String) -> Result<(), ChannelError> {
        self.stream
            .send(Message::text(text))
            .await
            .map_err(|e| ChannelError::Transport(e.to_string()))
    }

    async fn next_text(&mut self) -> Option<Result<String, ChannelError>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text.as_str().to_owned())),
                Ok(Message::Close(frame)) => {
                    debug!(?frame, "Live connection received close frame");
                    return None;
                }
                Ok(Message::Binary(data)) => {
                    debug!(len = data.len(), "Ignoring binary frame");
                }
                Ok(_) => {}
                Err(err) => return Some(Err(ChannelError::Transport(err.to_string()))),
            }
        }
    }

    async fn close(&mut self) {
        if let Err(err) = self.stream.close(None).await {
            debug!("Error closing live connection: {err}");
        }
    }
}
