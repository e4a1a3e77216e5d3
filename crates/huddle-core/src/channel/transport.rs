//! Connection factory and connection traits.
//!
//! `Connector` is the only way the channel obtains a connection, so the
//! reconnect policy in [`LiveChannel`](super::LiveChannel) is the only place
//! connections are created.

use std::future::Future;

use huddle_types::error::ChannelError;
use huddle_types::room::RoomIdentity;

/// An established duplex connection to a room's stream.
///
/// `next_text` must be cancel-safe: the channel polls it inside
/// `tokio::select!` alongside its command queue.
pub trait Connection: Send + 'static {
    /// Send one text frame.
    fn send_text(&mut self, text: String) -> impl Future<Output = Result<(), ChannelError>> + Send;

    /// Receive the next text frame.
    ///
    /// Returns `None` once the remote side has closed the connection.
    /// Non-text protocol frames are handled internally and never surface.
    fn next_text(&mut self) -> impl Future<Output = Option<Result<String, ChannelError>>> + Send;

    /// Close the connection. Errors during close are ignored.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

/// Factory producing connections for a room identity.
pub trait Connector: Send + Sync + 'static {
    type Connection: Connection;

    /// Perform the handshake against the live target for `identity`.
    fn connect(
        &self,
        identity: &RoomIdentity,
    ) -> impl Future<Output = Result<Self::Connection, ChannelError>> + Send;
}
