//! Timeline merging for a room session.
//!
//! `TimelineMerger` combines one history batch and an unbounded stream of
//! live messages into a single chronological, de-duplicated sequence.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use huddle_types::message::{Message, MessageId};

/// Immutable snapshot of a timeline, oldest first.
pub type Timeline = Arc<[Message]>;

/// Owns the ordered message list of one session.
///
/// Ordering is `created_at` ascending with ties broken by id. An id is
/// present at most once, no matter how often it is delivered.
#[derive(Debug, Default)]
pub struct TimelineMerger {
    entries: Vec<Message>,
    seen: HashSet<MessageId>,
}

impl TimelineMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge the history batch. Returns how many messages were added.
    ///
    /// The batch may arrive in any order; duplicates within it, or of
    /// messages already present, are dropped.
    pub fn seed_history(&mut self, batch: Vec<Message>) -> usize {
        let before = self.entries.len();
        for message in batch {
            if self.seen.insert(message.id.clone()) {
                self.entries.push(message);
            }
        }
        self.entries.sort_by(Message::chronological_cmp);
        self.entries.len() - before
    }

    /// Insert a single message at its chronological position.
    ///
    /// Returns `false` (and leaves the timeline untouched) if a message with
    /// the same id is already present.
    pub fn insert(&mut self, message: Message) -> bool {
        if !self.seen.insert(message.id.clone()) {
            return false;
        }
        let position = self
            .entries
            .partition_point(|existing| existing.chronological_cmp(&message) == Ordering::Less);
        self.entries.insert(position, message);
        true
    }

    pub fn contains(&self, id: &MessageId) -> bool {
        self.seen.contains(id)
    }

    pub fn messages(&self) -> &[Message] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn snapshot(&self) -> Timeline {
        Arc::from(self.entries.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::message;

    fn ids(merger: &TimelineMerger) -> Vec<i64> {
        merger
            .messages()
            .iter()
            .map(|m| match m.id {
                MessageId::Numeric(id) => id,
                MessageId::Text(_) => panic!("unexpected text id"),
            })
            .collect()
    }

    #[test]
    fn seed_history_sorts_unordered_batch() {
        let mut merger = TimelineMerger::new();
        let added = merger.seed_history(vec![message(3, 30), message(1, 10), message(2, 20)]);
        assert_eq!(added, 3);
        assert_eq!(ids(&merger), vec![1, 2, 3]);
    }

    #[test]
    fn seed_history_drops_duplicate_ids() {
        let mut merger = TimelineMerger::new();
        let added = merger.seed_history(vec![message(1, 10), message(1, 10), message(2, 20)]);
        assert_eq!(added, 2);
        assert_eq!(merger.len(), 2);
    }

    #[test]
    fn live_message_inserted_in_chronological_position() {
        let mut merger = TimelineMerger::new();
        merger.seed_history(vec![message(1, 10), message(3, 30)]);
        // Delivered late after a reconnect gap.
        assert!(merger.insert(message(2, 20)));
        assert_eq!(ids(&merger), vec![1, 2, 3]);

        assert!(merger.insert(message(0, 5)));
        assert!(merger.insert(message(4, 40)));
        assert_eq!(ids(&merger), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn redelivered_message_is_discarded() {
        let mut merger = TimelineMerger::new();
        merger.seed_history(vec![message(1, 10)]);
        assert!(merger.insert(message(2, 20)));
        assert!(!merger.insert(message(2, 20)));
        assert!(!merger.insert(message(1, 10)));
        assert_eq!(ids(&merger), vec![1, 2]);
    }

    #[test]
    fn equal_timestamps_ordered_by_id() {
        let mut merger = TimelineMerger::new();
        merger.insert(message(9, 10));
        merger.insert(message(7, 10));
        merger.insert(message(8, 10));
        assert_eq!(ids(&merger), vec![7, 8, 9]);
    }

    #[test]
    fn chronological_invariant_holds_for_any_arrival_order() {
        let arrivals = [5, 1, 9, 3, 7, 2, 8, 4, 6, 3, 9, 1];
        let mut merger = TimelineMerger::new();
        merger.seed_history(vec![message(10, 100), message(0, 0)]);
        for id in arrivals {
            merger.insert(message(id, id * 10));
        }
        let entries = merger.messages();
        assert_eq!(entries.len(), 11);
        for pair in entries.windows(2) {
            assert!(pair[0].created_at <= pair[1].created_at);
        }
    }

    #[test]
    fn snapshot_is_detached_from_later_inserts() {
        let mut merger = TimelineMerger::new();
        merger.insert(message(1, 10));
        let snapshot = merger.snapshot();
        merger.insert(message(2, 20));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(merger.len(), 2);
        assert!(merger.contains(&MessageId::Numeric(2)));
    }
}
