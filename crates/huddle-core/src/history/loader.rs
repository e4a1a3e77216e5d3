use std::sync::Arc;

use tracing::{debug, warn};

use huddle_types::message::{Message, Origin};

use super::source::HistorySource;

/// Result of a history load. Failure is a value, not an error, so the
/// session can warn and continue with an empty history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryOutcome {
    Loaded(Vec<Message>),
    Failed { reason: String },
}

/// Issues the single history read a session performs on start.
pub struct HistoryLoader<H> {
    source: Arc<H>,
}

impl<H: HistorySource> HistoryLoader<H> {
    pub fn new(source: Arc<H>) -> Self {
        Self { source }
    }

    /// Fetch the room's history, tagging every message `Origin::History`.
    ///
    /// Messages are returned in server order.
    pub async fn load(&self, room_id: &str) -> HistoryOutcome {
        match self.source.fetch_messages(room_id).await {
            Ok(batch) => {
                debug!(room_id, count = batch.len(), "Loaded message history");
                HistoryOutcome::Loaded(
                    batch
                        .into_iter()
                        .map(|wire| wire.into_message(Origin::History))
                        .collect(),
                )
            }
            Err(err) => {
                warn!(room_id, "Failed to load message history: {err}");
                HistoryOutcome::Failed {
                    reason: err.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{wire, StaticHistory};
    use huddle_types::message::MessageId;

    #[tokio::test]
    async fn load_tags_history_and_keeps_server_order() {
        let source = Arc::new(StaticHistory::ok(vec![wire(2, 20), wire(1, 10)]));
        let outcome = HistoryLoader::new(source.clone()).load("r1").await;

        let HistoryOutcome::Loaded(messages) = outcome else {
            panic!("expected loaded history");
        };
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].id, MessageId::Numeric(2));
        assert!(messages.iter().all(|m| m.origin == Origin::History));
        assert_eq!(source.requests(), vec!["r1".to_string()]);
    }

    #[tokio::test]
    async fn load_failure_is_a_value() {
        let source = Arc::new(StaticHistory::failing("connection reset"));
        let outcome = HistoryLoader::new(source).load("r1").await;
        match outcome {
            HistoryOutcome::Failed { reason } => assert!(reason.contains("connection reset")),
            other => panic!("expected failure, got {other:?}"),
        }
    }
}
