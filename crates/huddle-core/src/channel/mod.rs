//! Live channel for a room's message stream.
//!
//! - [`transport`]: the `Connector`/`Connection` ports infra implements.
//! - [`state`]: the pure connection state machine.
//! - [`live`]: `LiveChannel`, the driver task that owns the connection and
//!   runs the state machine, plus the handle callers use to send and close.

pub mod live;
pub mod state;
pub mod transport;

pub use live::{ChannelEvent, ChannelTimings, LiveChannel};
pub use state::{ChannelInput, ChannelStateMachine, Transition};
pub use transport::{Connection, Connector};
