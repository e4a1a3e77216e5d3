//! Connection state machine for the live channel.
//!
//! Pure and synchronous: the driver in [`live`](super::live) feeds it
//! inputs and acts on the resulting state. Keeping the single
//! authoritative state here means the reconnect policy cannot be bypassed.
//!
//! ```text
//!   Connecting --HandshakeSucceeded--> Open
//!   Connecting --HandshakeFailed-----> Reconnecting
//!   Open       --TransportLost-------> Reconnecting
//!   Reconnecting --RetryTimerFired---> Connecting
//!   (any)      --CloseRequested------> Closed   (terminal)
//! ```

use huddle_types::connection::ConnectionState;

/// Inputs the driver reports to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelInput {
    HandshakeSucceeded,
    HandshakeFailed,
    TransportLost,
    RetryTimerFired,
    CloseRequested,
}

/// A state change produced by [`ChannelStateMachine::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: ConnectionState,
    pub to: ConnectionState,
}

#[derive(Debug, Clone)]
pub struct ChannelStateMachine {
    state: ConnectionState,
}

impl Default for ChannelStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelStateMachine {
    /// A new machine starts in `Connecting`.
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Connecting,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Apply an input. Returns the transition if the state changed, or
    /// `None` if the input does not apply in the current state.
    ///
    /// A retry timer firing while already `Open` is skipped, so a stale
    /// timer can never start a second connection.
    pub fn apply(&mut self, input: ChannelInput) -> Option<Transition> {
        use ChannelInput::*;
        use ConnectionState::*;

        let next = match (self.state, input) {
            (Closed, _) => return None,
            (_, CloseRequested) => Closed,
            (Connecting, HandshakeSucceeded) => Open,
            (Connecting, HandshakeFailed) => Reconnecting,
            (Open, TransportLost) => Reconnecting,
            (Reconnecting, RetryTimerFired) => Connecting,
            _ => return None,
        };

        let transition = Transition {
            from: self.state,
            to: next,
        };
        self.state = next;
        Some(transition)
    }
}
