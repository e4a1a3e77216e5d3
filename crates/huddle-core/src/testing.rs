//! In-memory fakes for the history source and the live connector.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::{mpsc, Notify};

use huddle_types::error::{ChannelError, DirectoryError};
use huddle_types::message::{Message, MessageId, Origin, WireMessage};
use huddle_types::room::RoomIdentity;

use crate::channel::{Connection, Connector};
use crate::history::HistorySource;

pub(crate) fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

pub(crate) fn message(id: i64, secs: i64) -> Message {
    Message {
        id: MessageId::Numeric(id),
        content: format!("msg {id}"),
        author_name: "ana".to_string(),
        created_at: ts(secs),
        origin: Origin::Live,
    }
}

pub(crate) fn wire(id: i64, secs: i64) -> WireMessage {
    WireMessage {
        id: MessageId::Numeric(id),
        content: format!("msg {id}"),
        created_at: ts(secs),
        username: "ana".to_string(),
    }
}

/// A `message` event frame as the server sends it.
pub(crate) fn message_frame(id: i64, secs: i64) -> String {
    format!(
        r#"{{"event":"message","message":{{"id":{id},"content":"msg {id}","created_at":"{}","username":"ana"}}}}"#,
        ts(secs).to_rfc3339()
    )
}

pub(crate) fn identity() -> RoomIdentity {
    RoomIdentity::new("r1", "ana").unwrap()
}

// -- history -----------------------------------------------------------------

pub(crate) struct StaticHistory {
    result: Result<Vec<WireMessage>, DirectoryError>,
    gate: Option<Arc<Notify>>,
    requests: Mutex<Vec<String>>,
}

impl StaticHistory {
    pub(crate) fn ok(batch: Vec<WireMessage>) -> Self {
        Self {
            result: Ok(batch),
            gate: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing(reason: &str) -> Self {
        Self {
            result: Err(DirectoryError::Request(reason.to_string())),
            gate: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// History that only resolves after the returned `Notify` fires.
    pub(crate) fn gated(batch: Vec<WireMessage>) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let source = Self {
            result: Ok(batch),
            gate: Some(gate.clone()),
            requests: Mutex::new(Vec::new()),
        };
        (source, gate)
    }

    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl HistorySource for StaticHistory {
    async fn fetch_messages(&self, room_id: &str) -> Result<Vec<WireMessage>, DirectoryError> {
        self.requests.lock().unwrap().push(room_id.to_string());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.result.clone()
    }
}

// -- live connection ---------------------------------------------------------

pub(crate) struct FakeConnection {
    inbound: mpsc::UnboundedReceiver<String>,
    outbound: mpsc::UnboundedSender<String>,
    stalled: Arc<AtomicBool>,
}

/// The server side of a [`FakeConnection`].
pub(crate) struct Remote {
    inbound: Option<mpsc::UnboundedSender<String>>,
    outbound: mpsc::UnboundedReceiver<String>,
    stalled: Arc<AtomicBool>,
}

impl Remote {
    pub(crate) fn push(&self, frame: impl Into<String>) {
        if let Some(tx) = &self.inbound {
            tx.send(frame.into()).unwrap();
        }
    }

    /// Close the connection from the server side.
    pub(crate) fn hang_up(&mut self) {
        self.inbound = None;
    }

    /// Make every further client write hang.
    pub(crate) fn stall_writes(&self) {
        self.stalled.store(true, Ordering::SeqCst);
    }

    /// Frames the client has written so far.
    pub(crate) fn sent(&mut self) -> Vec<String> {
        let mut frames = Vec::new();
        while let Ok(frame) = self.outbound.try_recv() {
            frames.push(frame);
        }
        frames
    }

    /// True once the client side has closed or dropped the connection.
    pub(crate) fn is_disconnected(&self) -> bool {
        self.inbound.as_ref().is_none_or(|tx| tx.is_closed())
    }
}

pub(crate) fn connection_pair() -> (FakeConnection, Remote) {
    let (in_tx, in_rx) = mpsc::unbounded_channel();
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let stalled = Arc::new(AtomicBool::new(false));
    (
        FakeConnection {
            inbound: in_rx,
            outbound: out_tx,
            stalled: stalled.clone(),
        },
        Remote {
            inbound: Some(in_tx),
            outbound: out_rx,
            stalled,
        },
    )
}

impl Connection for FakeConnection {
    async fn send_text(&mut self, text: String) -> Result<(), ChannelError> {
        if self.stalled.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.outbound
            .send(text)
            .map_err(|_| ChannelError::Transport("remote gone".to_string()))
    }

    async fn next_text(&mut self) -> Option<Result<String, ChannelError>> {
        self.inbound.recv().await.map(Ok)
    }

    async fn close(&mut self) {
        self.inbound.close();
    }
}

pub(crate) enum Attempt {
    Refuse,
    Accept(FakeConnection),
}

/// Connector that plays back scripted handshake outcomes. Once the script
/// runs out, further handshakes never complete.
pub(crate) struct FakeConnector {
    attempts: Mutex<VecDeque<Attempt>>,
    identities: Mutex<Vec<RoomIdentity>>,
    connects: AtomicUsize,
}

impl FakeConnector {
    pub(crate) fn new(attempts: Vec<Attempt>) -> Self {
        Self {
            attempts: Mutex::new(attempts.into()),
            identities: Mutex::new(Vec::new()),
            connects: AtomicUsize::new(0),
        }
    }

    pub(crate) fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub(crate) fn identities(&self) -> Vec<RoomIdentity> {
        self.identities.lock().unwrap().clone()
    }
}

impl Connector for FakeConnector {
    type Connection = FakeConnection;

    async fn connect(&self, identity: &RoomIdentity) -> Result<FakeConnection, ChannelError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.identities.lock().unwrap().push(identity.clone());
        let next = self.attempts.lock().unwrap().pop_front();
        match next {
            Some(Attempt::Accept(connection)) => Ok(connection),
            Some(Attempt::Refuse) => Err(ChannelError::Handshake("refused".to_string())),
            None => std::future::pending().await,
        }
    }
}
