//! Interactive room chat for Huddle.
//!
//! Runs one session per invocation: history is shown once it arrives, live
//! messages print as they are merged, and the prompt tracks the connection
//! state. Entry point: `loop_runner::run_chat`.

pub mod banner;
pub mod commands;
pub mod input;
pub mod loop_runner;
pub mod render;
