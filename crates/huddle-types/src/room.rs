//! Room and identity types for Huddle.
//!
//! Rooms are ephemeral: each carries an `expires_at` after which the
//! directory service discards it.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::IdentityError;
use crate::message::timestamp;

/// The immutable input to a chat session: which room, and as whom.
///
/// Both fields are validated and trimmed at construction and cannot be
/// changed afterwards. Switching rooms or names means starting a new session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomIdentity {
    room_id: String,
    display_name: String,
}

impl RoomIdentity {
    pub fn new(
        room_id: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Result<Self, IdentityError> {
        let room_id = room_id.into().trim().to_string();
        let display_name = display_name.into().trim().to_string();
        if room_id.is_empty() {
            return Err(IdentityError::EmptyRoomId);
        }
        if display_name.is_empty() {
            return Err(IdentityError::EmptyDisplayName);
        }
        Ok(Self {
            room_id,
            display_name,
        })
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

impl fmt::Display for RoomIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.display_name, self.room_id)
    }
}

/// A room descriptor as returned by the directory service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    pub name: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub expires_at: DateTime<Utc>,
}

impl Room {
    /// Whether the room has passed its expiry time.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Time left before the room expires, or `None` once it has expired.
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        if self.is_expired(now) {
            None
        } else {
            Some(self.expires_at - now)
        }
    }
}

/// Request body for `POST /rooms`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRoomRequest {
    pub name: String,
}

/// Request body for `POST /username`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUsernameRequest {
    pub username: String,
}

/// Identifier the directory assigns to a registered username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    Numeric(i64),
    Text(String),
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserId::Numeric(id) => write!(f, "{id}"),
            UserId::Text(id) => write!(f, "{id}"),
        }
    }
}

/// Response body for `POST /username`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredUser {
    #[serde(rename = "userID")]
    pub user_id: UserId,
}
