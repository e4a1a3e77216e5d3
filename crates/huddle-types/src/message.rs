//! Chat message types for Huddle.
//!
//! [`Message`] is the immutable timeline entry. [`WireMessage`] is the
//! shape the directory service and the live stream both use on the wire
//! (`{id, content, created_at, username}`).

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-assigned message identifier.
///
/// The service has used both integer and string ids, so both are accepted.
/// A string holding a canonical integer (`"5"`, not `"05"`) is read as
/// `Numeric`, so history and live deliveries of the same message compare
/// equal whichever form each one used.
///
/// Ordering is only used to break timestamp ties: numeric ids compare
/// numerically and sort before textual ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum MessageId {
    Numeric(i64),
    Text(String),
}

impl MessageId {
    /// Build an id from its textual form, preferring `Numeric`.
    pub fn parse(id: &str) -> Self {
        match id.parse::<i64>() {
            Ok(n) if n.to_string() == id => MessageId::Numeric(n),
            _ => MessageId::Text(id.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for MessageId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Numeric(i64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Numeric(n) => MessageId::Numeric(n),
            Raw::Text(text) => MessageId::parse(&text),
        })
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageId::Numeric(id) => write!(f, "{id}"),
            MessageId::Text(id) => write!(f, "{id}"),
        }
    }
}

impl From<i64> for MessageId {
    fn from(id: i64) -> Self {
        MessageId::Numeric(id)
    }
}

impl From<&str> for MessageId {
    fn from(id: &str) -> Self {
        MessageId::parse(id)
    }
}

/// How a message entered the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    History,
    Live,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::History => write!(f, "history"),
            Origin::Live => write!(f, "live"),
        }
    }
}

/// A single chat message within a room timeline.
///
/// Messages are never edited once created. Within a timeline they are
/// ordered by `created_at`, then by `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub content: String,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
    pub origin: Origin,
}

impl Message {
    /// Chronological ordering: `created_at` ascending, ties broken by id.
    pub fn chronological_cmp(&self, other: &Self) -> Ordering {
        self.created_at
            .cmp(&other.created_at)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Message payload as sent by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    pub id: MessageId,
    pub content: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    pub username: String,
}

impl WireMessage {
    /// Convert into a timeline [`Message`] tagged with its origin.
    pub fn into_message(self, origin: Origin) -> Message {
        Message {
            id: self.id,
            content: self.content,
            author_name: self.username,
            created_at: self.created_at,
            origin,
        }
    }
}

/// Parse a server timestamp.
///
/// Accepts RFC 3339 (`2024-05-01T12:00:00Z`, `...+02:00`) and timezone-less
/// ISO-8601 (`2024-05-01T12:00:00.123456`, also with a space separator),
/// which is interpreted as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Serde adapter for server timestamps (see [`parse_timestamp`]).
pub mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&dt.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: '{raw}'")))
    }
}
