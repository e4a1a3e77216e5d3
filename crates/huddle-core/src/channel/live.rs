//! `LiveChannel` -- one persistent connection per session, with reconnect.
//!
//! `LiveChannel::open` spawns a driver task that exclusively owns the
//! connection and the [`ChannelStateMachine`]. The returned handle talks to
//! it through a command queue and reads state from a `watch` channel.
//! Every state change and every inbound message is also emitted, in order,
//! on an event stream.
//!
//! Transport errors never end the driver; they land in `Reconnecting` and
//! a single retry is scheduled after the configured delay. A handshake that
//! outlives its timeout counts as a failed one. Only
//! [`LiveChannel::close`] (or dropping the handle) ends it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use huddle_types::connection::ConnectionState;
use huddle_types::error::{ChannelError, SendError};
use huddle_types::frame::{parse_inbound, InboundFrame, OutboundFrame};
use huddle_types::message::{Message, Origin};
use huddle_types::room::RoomIdentity;

use super::state::{ChannelInput, ChannelStateMachine};
use super::transport::{Connection, Connector};

/// Depth of the handle → driver command queue.
const COMMAND_QUEUE_CAPACITY: usize = 32;

/// Notifications emitted by the driver, in the order they happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    State(ConnectionState),
    Message(Message),
}

/// Timing knobs for a [`LiveChannel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelTimings {
    /// Fixed wait between a lost connection and the next handshake.
    pub reconnect_delay: Duration,
    /// Upper bound on a single handshake attempt.
    pub handshake_timeout: Duration,
}

enum Command {
    Send {
        frame: String,
        reply: oneshot::Sender<Result<(), SendError>>,
    },
}

/// Handle to a room's live channel.
///
/// Dropping the handle closes the channel.
pub struct LiveChannel {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<ConnectionState>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl LiveChannel {
    /// Spawn the driver and start connecting immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open<C: Connector>(
        connector: Arc<C>,
        identity: RoomIdentity,
        timings: ChannelTimings,
    ) -> (Self, mpsc::UnboundedReceiver<ChannelEvent>) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let cancel = CancellationToken::new();

        let driver = Driver {
            connector,
            identity,
            timings,
            machine: ChannelStateMachine::new(),
            connection: None,
            commands: command_rx,
            events: event_tx,
            state: state_tx,
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(driver.run());

        let channel = Self {
            commands: command_tx,
            state: state_rx,
            cancel,
            task: Some(task),
        };
        (channel, event_rx)
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Observe state changes. Intermediate states may be coalesced; use the
    /// event stream when every transition matters.
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Send a chat message over the live connection.
    ///
    /// Blank content and sends while not `Open` are rejected before
    /// anything reaches the wire. The message is not echoed locally; it
    /// shows up once the server delivers it back.
    pub async fn send(&self, content: &str) -> Result<(), SendError> {
        if content.trim().is_empty() {
            return Err(SendError::EmptyContent);
        }
        if self.cancel.is_cancelled() {
            return Err(SendError::Closed);
        }
        match self.state() {
            ConnectionState::Open => {}
            ConnectionState::Closed => return Err(SendError::Closed),
            other => return Err(SendError::NotOpen(other)),
        }

        let frame = OutboundFrame::message(content)
            .encode()
            .map_err(|e| SendError::Encode(e.to_string()))?;
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Send { frame, reply })
            .await
            .map_err(|_| SendError::Closed)?;
        response.await.unwrap_or(Err(SendError::Closed))
    }

    /// Request closure. Cancels any pending reconnect and in-flight
    /// handshake. Idempotent.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Wait for the driver task to finish. Only returns after `close`.
    pub async fn closed(&mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for LiveChannel {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for LiveChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveChannel")
            .field("state", &self.state())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// The task that owns the connection.
struct Driver<C: Connector> {
    connector: Arc<C>,
    identity: RoomIdentity,
    timings: ChannelTimings,
    machine: ChannelStateMachine,
    connection: Option<C::Connection>,
    commands: mpsc::Receiver<Command>,
    events: mpsc::UnboundedSender<ChannelEvent>,
    state: watch::Sender<ConnectionState>,
    cancel: CancellationToken,
}

impl<C: Connector> Driver<C> {
    async fn run(mut self) {
        self.publish(self.machine.state());

        loop {
            let input = match self.machine.state() {
                ConnectionState::Connecting => self.handshake().await,
                ConnectionState::Open => {
                    let input = self.pump().await;
                    if input == ChannelInput::TransportLost {
                        self.connection = None;
                    }
                    input
                }
                ConnectionState::Reconnecting => self.wait_for_retry().await,
                ConnectionState::Closed => break,
            };
            self.apply(input);
        }

        if let Some(mut connection) = self.connection.take() {
            connection.close().await;
        }
        self.commands.close();
        while let Ok(command) = self.commands.try_recv() {
            reject(command, SendError::Closed);
        }
        debug!(room_id = self.identity.room_id(), "Live channel driver stopped");
    }

    fn apply(&mut self, input: ChannelInput) {
        match self.machine.apply(input) {
            Some(transition) => {
                debug!(
                    room_id = self.identity.room_id(),
                    from = %transition.from,
                    to = %transition.to,
                    "Live channel state change"
                );
                self.publish(transition.to);
            }
            None => debug!(
                room_id = self.identity.room_id(),
                ?input,
                state = %self.machine.state(),
                "Ignoring channel input"
            ),
        }
    }

    fn publish(&self, state: ConnectionState) {
        self.state.send_replace(state);
        let _ = self.events.send(ChannelEvent::State(state));
    }

    /// Connecting: one bounded handshake attempt, abandoned on close.
    async fn handshake(&mut self) -> ChannelInput {
        let connector = Arc::clone(&self.connector);
        let identity = &self.identity;
        let timeout = self.timings.handshake_timeout;
        let connect = async move {
            tokio::time::timeout(timeout, connector.connect(identity))
                .await
                .unwrap_or_else(|_| {
                    Err(ChannelError::Handshake(format!(
                        "no response within {}ms",
                        timeout.as_millis()
                    )))
                })
        };
        tokio::pin!(connect);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return ChannelInput::CloseRequested,
                result = &mut connect => {
                    return match result {
                        Ok(connection) => {
                            info!(room_id = self.identity.room_id(), "Live channel connected");
                            self.connection = Some(connection);
                            ChannelInput::HandshakeSucceeded
                        }
                        Err(err) => {
                            warn!(room_id = self.identity.room_id(), "Live channel handshake failed: {err}");
                            ChannelInput::HandshakeFailed
                        }
                    };
                }
                Some(command) = self.commands.recv() => {
                    reject(command, SendError::NotOpen(ConnectionState::Connecting));
                }
            }
        }
    }

    /// Open: forward frames and serve sends until the transport drops.
    async fn pump(&mut self) -> ChannelInput {
        let Some(connection) = self.connection.as_mut() else {
            return ChannelInput::TransportLost;
        };
        let room_id = self.identity.room_id();

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return ChannelInput::CloseRequested,
                Some(command) = self.commands.recv() => {
                    let Command::Send { frame, reply } = command;
                    let written = tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => {
                            let _ = reply.send(Err(SendError::Closed));
                            return ChannelInput::CloseRequested;
                        }
                        written = connection.send_text(frame) => written,
                    };
                    match written {
                        Ok(()) => {
                            let _ = reply.send(Ok(()));
                        }
                        Err(err) => {
                            warn!(room_id, "Live send failed: {err}");
                            let _ = reply.send(Err(SendError::Transport(err.to_string())));
                            return ChannelInput::TransportLost;
                        }
                    }
                }
                frame = connection.next_text() => match frame {
                    Some(Ok(text)) => forward_frame(&self.events, room_id, &text),
                    Some(Err(err)) => {
                        warn!(room_id, "Live connection error: {err}");
                        return ChannelInput::TransportLost;
                    }
                    None => {
                        info!(room_id, "Live connection closed by server");
                        return ChannelInput::TransportLost;
                    }
                },
            }
        }
    }

    /// Reconnecting: wait out the fixed delay, abandoned on close.
    async fn wait_for_retry(&mut self) -> ChannelInput {
        debug!(
            room_id = self.identity.room_id(),
            delay_ms = self.timings.reconnect_delay.as_millis() as u64,
            "Scheduling reconnect"
        );
        let timer = tokio::time::sleep(self.timings.reconnect_delay);
        tokio::pin!(timer);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return ChannelInput::CloseRequested,
                () = &mut timer => return ChannelInput::RetryTimerFired,
                Some(command) = self.commands.recv() => {
                    reject(command, SendError::NotOpen(ConnectionState::Reconnecting));
                }
            }
        }
    }
}

fn reject(command: Command, error: SendError) {
    let Command::Send { reply, .. } = command;
    let _ = reply.send(Err(error));
}

/// Parse one inbound frame and forward it if it is a message.
///
/// Unknown events are ignored; malformed frames are dropped and the
/// connection stays open.
fn forward_frame(events: &mpsc::UnboundedSender<ChannelEvent>, room_id: &str, text: &str) {
    match parse_inbound(text) {
        Ok(InboundFrame::Message(wire)) => {
            let _ = events.send(ChannelEvent::Message(wire.into_message(Origin::Live)));
        }
        Ok(InboundFrame::Other(event)) => {
            debug!(room_id, event = %event, "Ignoring live event");
        }
        Err(err) => {
            warn!(room_id, "Dropping malformed live frame: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{connection_pair, identity, message_frame, Attempt, FakeConnector};
    use huddle_types::message::MessageId;
    use tokio::time::Instant;

    const DELAY: Duration = Duration::from_millis(3_000);
    const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(30);
    const TIMINGS: ChannelTimings = ChannelTimings {
        reconnect_delay: DELAY,
        handshake_timeout: HANDSHAKE_TIMEOUT,
    };

    async fn next_state(events: &mut mpsc::UnboundedReceiver<ChannelEvent>) -> ConnectionState {
        loop {
            match events.recv().await.expect("channel events ended") {
                ChannelEvent::State(state) => return state,
                ChannelEvent::Message(_) => continue,
            }
        }
    }

    async fn next_message(events: &mut mpsc::UnboundedReceiver<ChannelEvent>) -> Message {
        match events.recv().await.expect("channel events ended") {
            ChannelEvent::Message(message) => message,
            other => panic!("expected message event, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn forwards_message_frames_and_skips_the_rest() {
        let (conn, remote) = connection_pair();
        let connector = Arc::new(FakeConnector::new(vec![Attempt::Accept(conn)]));
        let (channel, mut events) = LiveChannel::open(connector.clone(), identity(), TIMINGS);

        assert_eq!(next_state(&mut events).await, ConnectionState::Connecting);
        assert_eq!(next_state(&mut events).await, ConnectionState::Open);

        remote.push("garbage");
        remote.push(r#"{"event":"typing","username":"bo"}"#);
        remote.push(r#"{"event":"message"}"#);
        remote.push(message_frame(1, 10));

        let message = next_message(&mut events).await;
        assert_eq!(message.id, MessageId::Numeric(1));
        assert_eq!(message.origin, Origin::Live);
        assert_eq!(channel.state(), ConnectionState::Open);
        assert_eq!(connector.identities(), vec![identity()]);
    }

    #[tokio::test(start_paused = true)]
    async fn reconnects_after_transport_close() {
        let (conn1, mut remote1) = connection_pair();
        let (conn2, remote2) = connection_pair();
        let connector = Arc::new(FakeConnector::new(vec![
            Attempt::Accept(conn1),
            Attempt::Accept(conn2),
        ]));
        let (_channel, mut events) = LiveChannel::open(connector.clone(), identity(), TIMINGS);

        assert_eq!(next_state(&mut events).await, ConnectionState::Connecting);
        assert_eq!(next_state(&mut events).await, ConnectionState::Open);

        remote1.push(message_frame(1, 10));
        assert_eq!(next_message(&mut events).await.id, MessageId::Numeric(1));

        remote1.hang_up();
        assert_eq!(next_state(&mut events).await, ConnectionState::Reconnecting);
        let lost_at = Instant::now();
        assert_eq!(next_state(&mut events).await, ConnectionState::Connecting);
        assert!(lost_at.elapsed() >= DELAY);
        assert_eq!(next_state(&mut events).await, ConnectionState::Open);

        // Server redelivers what was sent during the outage.
        remote2.push(message_frame(1, 10));
        remote2.push(message_frame(2, 20));
        assert_eq!(next_message(&mut events).await.id, MessageId::Numeric(1));
        assert_eq!(next_message(&mut events).await.id, MessageId::Numeric(2));
        assert_eq!(connector.connect_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn handshake_failure_retries_once_per_delay() {
        let (conn, _remote) = connection_pair();
        let connector = Arc::new(FakeConnector::new(vec![Attempt::Refuse, Attempt::Accept(conn)]));
        let (channel, mut events) = LiveChannel::open(connector.clone(), identity(), TIMINGS);

        let mut states = Vec::new();
        for _ in 0..4 {
            states.push(next_state(&mut events).await);
        }
        assert_eq!(
            states,
            vec![
                ConnectionState::Connecting,
                ConnectionState::Reconnecting,
                ConnectionState::Connecting,
                ConnectionState::Open,
            ]
        );
        assert_eq!(connector.connect_count(), 2);
        assert!(channel.state().is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn send_is_rejected_unless_open() {
        let connector = Arc::new(FakeConnector::new(vec![Attempt::Refuse]));
        let (channel, mut events) = LiveChannel::open(connector, identity(), TIMINGS);

        assert_eq!(next_state(&mut events).await, ConnectionState::Connecting);
        assert_eq!(channel.send("").await, Err(SendError::EmptyContent));
        assert_eq!(channel.send("   ").await, Err(SendError::EmptyContent));

        assert_eq!(next_state(&mut events).await, ConnectionState::Reconnecting);
        assert_eq!(
            channel.send("hi").await,
            Err(SendError::NotOpen(ConnectionState::Reconnecting))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn send_while_open_emits_exactly_one_frame() {
        let (conn, mut remote) = connection_pair();
        let connector = Arc::new(FakeConnector::new(vec![Attempt::Accept(conn)]));
        let (channel, mut events) = LiveChannel::open(connector, identity(), TIMINGS);
        assert_eq!(next_state(&mut events).await, ConnectionState::Connecting);
        assert_eq!(next_state(&mut events).await, ConnectionState::Open);

        assert_eq!(channel.send("").await, Err(SendError::EmptyContent));
        assert_eq!(channel.send(" \n ").await, Err(SendError::EmptyContent));
        assert_eq!(channel.send("hi").await, Ok(()));

        assert_eq!(remote.sent(), vec![r#"{"event":"message","content":"hi"}"#.to_string()]);
        // No local echo.
        assert!(events.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn close_cancels_pending_reconnect() {
        let connector = Arc::new(FakeConnector::new(vec![Attempt::Refuse]));
        let (channel, mut events) = LiveChannel::open(connector.clone(), identity(), TIMINGS);
        assert_eq!(next_state(&mut events).await, ConnectionState::Connecting);
        assert_eq!(next_state(&mut events).await, ConnectionState::Reconnecting);

        channel.close();
        assert_eq!(next_state(&mut events).await, ConnectionState::Closed);
        assert!(events.recv().await.is_none());

        tokio::time::sleep(DELAY * 5).await;
        assert_eq!(connector.connect_count(), 1);
        assert_eq!(channel.state(), ConnectionState::Closed);
        assert_eq!(channel.send("hi").await, Err(SendError::Closed));
    }

    #[tokio::test(start_paused = true)]
    async fn close_while_open_releases_connection() {
        let (conn, remote) = connection_pair();
        let connector = Arc::new(FakeConnector::new(vec![Attempt::Accept(conn)]));
        let (mut channel, mut events) = LiveChannel::open(connector, identity(), TIMINGS);
        assert_eq!(next_state(&mut events).await, ConnectionState::Connecting);
        assert_eq!(next_state(&mut events).await, ConnectionState::Open);

        channel.close();
        channel.close();
        channel.closed().await;

        assert_eq!(next_state(&mut events).await, ConnectionState::Closed);
        assert!(events.recv().await.is_none());
        assert!(remote.is_disconnected());
    }

    #[tokio::test(start_paused = true)]
    async fn close_during_handshake_abandons_it() {
        // No scripted attempt: the handshake never completes.
        let connector = Arc::new(FakeConnector::new(Vec::new()));
        let (mut channel, mut events) = LiveChannel::open(connector.clone(), identity(), TIMINGS);
        assert_eq!(next_state(&mut events).await, ConnectionState::Connecting);

        channel.close();
        channel.closed().await;
        assert_eq!(next_state(&mut events).await, ConnectionState::Closed);
        assert_eq!(connector.connect_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unanswered_handshake_times_out_and_retries() {
        // No scripted attempt: the server never answers the upgrade.
        let connector = Arc::new(FakeConnector::new(Vec::new()));
        let (channel, mut events) = LiveChannel::open(connector.clone(), identity(), TIMINGS);

        assert_eq!(next_state(&mut events).await, ConnectionState::Connecting);
        let started = Instant::now();
        assert_eq!(next_state(&mut events).await, ConnectionState::Reconnecting);
        assert!(started.elapsed() >= HANDSHAKE_TIMEOUT);

        assert_eq!(next_state(&mut events).await, ConnectionState::Connecting);
        assert_eq!(connector.connect_count(), 2);
        channel.close();
    }

    #[tokio::test(start_paused = true)]
    async fn failed_write_reports_transport_error_and_reconnects() {
        let (conn1, remote1) = connection_pair();
        let (conn2, _remote2) = connection_pair();
        let connector = Arc::new(FakeConnector::new(vec![
            Attempt::Accept(conn1),
            Attempt::Accept(conn2),
        ]));
        let (channel, mut events) = LiveChannel::open(connector.clone(), identity(), TIMINGS);
        assert_eq!(next_state(&mut events).await, ConnectionState::Connecting);
        assert_eq!(next_state(&mut events).await, ConnectionState::Open);

        drop(remote1);
        assert!(matches!(channel.send("hi").await, Err(SendError::Transport(_))));
        assert_eq!(next_state(&mut events).await, ConnectionState::Reconnecting);

        let lost_at = Instant::now();
        assert_eq!(next_state(&mut events).await, ConnectionState::Connecting);
        assert!(lost_at.elapsed() >= DELAY);
        assert_eq!(next_state(&mut events).await, ConnectionState::Open);
        assert_eq!(connector.connect_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn close_interrupts_a_stalled_write() {
        let (conn, remote) = connection_pair();
        let connector = Arc::new(FakeConnector::new(vec![Attempt::Accept(conn)]));
        let (channel, mut events) = LiveChannel::open(connector, identity(), TIMINGS);
        assert_eq!(next_state(&mut events).await, ConnectionState::Connecting);
        assert_eq!(next_state(&mut events).await, ConnectionState::Open);

        remote.stall_writes();
        let channel = Arc::new(channel);
        let sender = {
            let channel = Arc::clone(&channel);
            tokio::spawn(async move { channel.send("hi").await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!sender.is_finished());

        channel.close();
        assert_eq!(sender.await.unwrap(), Err(SendError::Closed));
        assert_eq!(next_state(&mut events).await, ConnectionState::Closed);
        assert!(events.recv().await.is_none());
    }
}
