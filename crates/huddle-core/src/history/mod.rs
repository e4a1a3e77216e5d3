//! One-shot history loading for a room session.
//!
//! `HistorySource` is the port infra implements; `HistoryLoader` turns its
//! result into a `HistoryOutcome` that never propagates as an error.

pub mod loader;
pub mod source;

pub use loader::{HistoryLoader, HistoryOutcome};
pub use source::HistorySource;
