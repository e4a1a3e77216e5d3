//! Infrastructure implementations for Huddle.
//!
//! Provides the concrete adapters for the ports defined in `huddle-core`:
//! the reqwest-backed room directory and history source, the
//! tokio-tungstenite live connector, and the config file loader.

pub mod config;
pub mod directory;
pub mod endpoint;
pub mod ws;
