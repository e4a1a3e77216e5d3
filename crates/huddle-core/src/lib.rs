//! Realtime session logic and port trait definitions for Huddle.
//!
//! This crate defines the "ports" the infrastructure layer implements
//! (`HistorySource`, `RoomDirectory`, `Connector`) and the session core
//! built on them. It depends only on `huddle-types` and tokio -- never on
//! `huddle-infra` or any HTTP/WebSocket crate.

pub mod channel;
pub mod directory;
pub mod history;
pub mod session;
pub mod timeline;

#[cfg(test)]
pub(crate) mod testing;
