use std::future::Future;

use huddle_types::error::DirectoryError;
use huddle_types::message::WireMessage;

/// Trait for backends that can fetch a room's prior messages.
///
/// Implementations return messages in whatever order the server used;
/// ordering is the timeline's job.
pub trait HistorySource: Send + Sync + 'static {
    fn fetch_messages(
        &self,
        room_id: &str,
    ) -> impl Future<Output = Result<Vec<WireMessage>, DirectoryError>> + Send;
}
