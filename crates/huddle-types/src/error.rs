use thiserror::Error;

use crate::connection::ConnectionState;

/// Errors from parsing a live-stream frame.
#[derive(Debug, Clone, Error)]
pub enum FrameError {
    #[error("malformed frame: {0}")]
    Malformed(String),

    #[error("frame has no event tag")]
    MissingEvent,

    #[error("message frame has no payload")]
    MissingPayload,
}

/// Errors from the room/message directory service.
#[derive(Debug, Clone, Error)]
pub enum DirectoryError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(String),
}

/// Errors raised by a live-channel transport.
#[derive(Debug, Clone, Error)]
pub enum ChannelError {
    #[error("invalid live endpoint: {0}")]
    InvalidTarget(String),

    #[error("handshake failed: {0}")]
    Handshake(String),

    #[error("transport error: {0}")]
    Transport(String),
}

/// Reasons a send was refused or failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    #[error("message is empty")]
    EmptyContent,

    #[error("not connected (state: {0})")]
    NotOpen(ConnectionState),

    #[error("channel is closed")]
    Closed,

    #[error("send failed: {0}")]
    Transport(String),

    #[error("failed to encode frame: {0}")]
    Encode(String),
}

/// Errors constructing a [`RoomIdentity`](crate::room::RoomIdentity).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("room id is empty")]
    EmptyRoomId,

    #[error("display name is empty")]
    EmptyDisplayName,
}
