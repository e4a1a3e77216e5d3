//! `SessionController` and the per-session task it spawns.
//!
//! Each session is one tokio task that handles, one at a time, the history
//! completion, live channel events, and stop. All timeline mutation happens
//! inside that task, so merges never interleave. Readers only see `Arc`
//! snapshots through `watch` channels.
//!
//! Every mutation first checks the session's cancellation token. Once
//! `stop()` has returned, nothing (including a history response still in
//! flight) can change what the handle publishes.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use huddle_types::connection::ConnectionState;
use huddle_types::error::SendError;
use huddle_types::message::Message;
use huddle_types::room::RoomIdentity;

use crate::channel::{ChannelEvent, Connector, LiveChannel};
use crate::history::{HistoryLoader, HistoryOutcome, HistorySource};
use crate::timeline::{Timeline, TimelineMerger};

use super::status::HistoryStatus;
use super::SessionConfig;

/// Starts sessions against a history source and a live connector.
pub struct SessionController<H, C> {
    history: Arc<H>,
    connector: Arc<C>,
    config: SessionConfig,
}

impl<H: HistorySource, C: Connector> SessionController<H, C> {
    pub fn new(history: Arc<H>, connector: Arc<C>, config: SessionConfig) -> Self {
        Self {
            history,
            connector,
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Start a session for `identity`.
    ///
    /// The history load and the live handshake begin immediately and run
    /// concurrently. Must be called from within a tokio runtime.
    pub fn start(&self, identity: RoomIdentity) -> SessionHandle {
        let id = Uuid::now_v7();
        let (channel, events) = LiveChannel::open(
            Arc::clone(&self.connector),
            identity.clone(),
            self.config.channel_timings(),
        );
        let (timeline_tx, timeline_rx) = watch::channel::<Timeline>(Arc::from(Vec::new()));
        let (history_tx, history_rx) = watch::channel(HistoryStatus::Pending);
        let cancel = CancellationToken::new();

        info!(session_id = %id, room_id = identity.room_id(), "Starting session");

        let task = SessionTask {
            session_id: id,
            identity: identity.clone(),
            events,
            merger: TimelineMerger::new(),
            pending: Vec::new(),
            history_applied: false,
            timeline: timeline_tx,
            history: history_tx,
            cancel: cancel.clone(),
        };
        let loader = HistoryLoader::new(Arc::clone(&self.history));
        let task = tokio::spawn(task.run(loader));

        SessionHandle {
            id,
            identity,
            channel,
            timeline: timeline_rx,
            history: history_rx,
            cancel,
            task: Some(task),
        }
    }
}

/// What the view holds for a running session.
///
/// Dropping the handle stops the session.
pub struct SessionHandle {
    id: Uuid,
    identity: RoomIdentity,
    channel: LiveChannel,
    timeline: watch::Receiver<Timeline>,
    history: watch::Receiver<HistoryStatus>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl SessionHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn identity(&self) -> &RoomIdentity {
        &self.identity
    }

    /// Latest timeline snapshot, oldest first.
    pub fn timeline(&self) -> Timeline {
        self.timeline.borrow().clone()
    }

    /// Observe timeline snapshots. A new one is published only when a merge
    /// changed the timeline.
    pub fn timeline_changes(&self) -> watch::Receiver<Timeline> {
        self.timeline.clone()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.channel.state()
    }

    pub fn connection_changes(&self) -> watch::Receiver<ConnectionState> {
        self.channel.subscribe_state()
    }

    pub fn history_status(&self) -> HistoryStatus {
        self.history.borrow().clone()
    }

    pub fn history_changes(&self) -> watch::Receiver<HistoryStatus> {
        self.history.clone()
    }

    /// Send a chat message. See [`LiveChannel::send`] for the gating rules.
    pub async fn send_message(&self, text: &str) -> Result<(), SendError> {
        let result = self.channel.send(text).await;
        if let Err(err) = &result {
            debug!(session_id = %self.id, "Message not sent: {err}");
        }
        result
    }

    /// Stop the session: close the channel and freeze the published state.
    /// Idempotent.
    pub fn stop(&self) {
        if !self.cancel.is_cancelled() {
            info!(session_id = %self.id, room_id = self.identity.room_id(), "Stopping session");
        }
        self.cancel.cancel();
        self.channel.close();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stop the session and wait until its tasks have finished.
    pub async fn shutdown(mut self) {
        self.stop();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        self.channel.closed().await;
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.id)
            .field("identity", &self.identity)
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

struct SessionTask {
    session_id: Uuid,
    identity: RoomIdentity,
    events: mpsc::UnboundedReceiver<ChannelEvent>,
    merger: TimelineMerger,
    /// Live messages that arrived before history was applied.
    pending: Vec<Message>,
    history_applied: bool,
    timeline: watch::Sender<Timeline>,
    history: watch::Sender<HistoryStatus>,
    cancel: CancellationToken,
}

impl SessionTask {
    async fn run<H: HistorySource>(mut self, loader: HistoryLoader<H>) {
        let room_id = self.identity.room_id().to_string();
        let history = loader.load(&room_id);
        tokio::pin!(history);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                outcome = &mut history, if !self.history_applied => {
                    self.apply_history(outcome);
                }
                event = self.events.recv() => match event {
                    Some(ChannelEvent::Message(message)) => self.on_live(message),
                    Some(ChannelEvent::State(state)) => {
                        debug!(session_id = %self.session_id, %state, "Session connection state");
                    }
                    None => break,
                },
            }
        }

        debug!(session_id = %self.session_id, "Session task finished");
    }

    fn is_active(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    fn apply_history(&mut self, outcome: HistoryOutcome) {
        if !self.is_active() {
            debug!(session_id = %self.session_id, "Discarding history for stopped session");
            return;
        }
        self.history_applied = true;

        let (added, status) = match outcome {
            HistoryOutcome::Loaded(batch) => {
                let added = self.merger.seed_history(batch);
                (added, HistoryStatus::Loaded { count: added })
            }
            HistoryOutcome::Failed { reason } => (0, HistoryStatus::Failed { reason }),
        };

        let buffered = std::mem::take(&mut self.pending);
        let buffered_count = buffered.len();
        let mut merged = 0;
        for message in buffered {
            if self.merger.insert(message) {
                merged += 1;
            }
        }

        info!(
            session_id = %self.session_id,
            room_id = self.identity.room_id(),
            history = added,
            buffered = buffered_count,
            merged,
            "History applied"
        );
        self.history.send_replace(status);
        if added > 0 || merged > 0 {
            self.publish();
        }
    }

    fn on_live(&mut self, message: Message) {
        if !self.is_active() {
            return;
        }
        if !self.history_applied {
            self.pending.push(message);
            return;
        }
        if self.merger.insert(message) {
            self.publish();
        }
    }

    fn publish(&self) {
        self.timeline.send_replace(self.merger.snapshot());
    }
}
