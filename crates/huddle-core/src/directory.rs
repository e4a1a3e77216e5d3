//! Room directory port.
//!
//! The directory is the REST collaborator that lists and creates rooms and
//! registers usernames. The session core never calls it; the CLI does.

use std::future::Future;

use huddle_types::error::DirectoryError;
use huddle_types::room::{RegisteredUser, Room};

/// Trait for room directory backends.
///
/// Implementations live in huddle-infra (e.g., `DirectoryClient`).
pub trait RoomDirectory: Send + Sync {
    /// List the rooms currently known to the directory.
    fn list_rooms(&self) -> impl Future<Output = Result<Vec<Room>, DirectoryError>> + Send;

    /// Create a room with the given name.
    fn create_room(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Room, DirectoryError>> + Send;

    /// Register a username and receive the assigned user id.
    fn register_username(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<RegisteredUser, DirectoryError>> + Send;
}

/// Trim a room name and reject it if nothing is left.
pub fn normalize_room_name(name: &str) -> Result<String, DirectoryError> {
    normalize(name, "room name")
}

/// Trim a username and reject it if nothing is left.
pub fn normalize_username(username: &str) -> Result<String, DirectoryError> {
    normalize(username, "username")
}

fn normalize(raw: &str, what: &str) -> Result<String, DirectoryError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DirectoryError::InvalidInput(format!("{what} must not be empty")));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims() {
        assert_eq!(normalize_room_name("  lobby ").unwrap(), "lobby");
        assert_eq!(normalize_username("ana\n").unwrap(), "ana");
    }

    #[test]
    fn normalize_rejects_blank() {
        let err = normalize_room_name(" \t ").unwrap_err();
        assert_eq!(err.to_string(), "invalid input: room name must not be empty");
        assert!(matches!(
            normalize_username(""),
            Err(DirectoryError::InvalidInput(_))
        ));
    }
}
