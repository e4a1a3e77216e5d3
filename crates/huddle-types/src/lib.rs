//! Shared domain types for Huddle.
//!
//! This crate contains the types used across the Huddle client:
//! messages, rooms, connection state, live-stream frames, client
//! configuration, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod config;
pub mod connection;
pub mod error;
pub mod frame;
pub mod message;
pub mod room;
