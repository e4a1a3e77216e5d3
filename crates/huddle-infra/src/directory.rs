//! HTTP room directory client.
//!
//! Implements [`RoomDirectory`] and [`HistorySource`] against the REST
//! directory service:
//!
//! - `GET  {api}/rooms`                 list rooms
//! - `POST {api}/rooms`                 create a room `{name}`
//! - `POST {api}/username`              register `{username}` → `{userID}`
//! - `GET  {api}/rooms/{id}/messages`   room history

use reqwest::Url;
use serde::de::DeserializeOwned;

use huddle_core::directory::{normalize_room_name, normalize_username, RoomDirectory};
use huddle_core::history::HistorySource;
use huddle_types::config::ClientConfig;
use huddle_types::error::DirectoryError;
use huddle_types::message::WireMessage;
use huddle_types::room::{CreateRoomRequest, RegisterUsernameRequest, RegisteredUser, Room};

use crate::endpoint::with_segments;

/// reqwest-backed directory client. Cheap to clone.
#[derive(Debug, Clone)]
pub struct DirectoryClient {
    http: reqwest::Client,
    base_url: Url,
}

impl DirectoryClient {
    /// Build a client for `config.api_base_url` with the configured
    /// request timeout.
    pub fn new(config: &ClientConfig) -> Result<Self, DirectoryError> {
        let base_url = Url::parse(&config.api_base_url).map_err(|e| {
            DirectoryError::InvalidInput(format!(
                "invalid api base url '{}': {e}",
                config.api_base_url
            ))
        })?;
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| DirectoryError::Request(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, DirectoryError> {
        with_segments(&self.base_url, segments).ok_or_else(|| {
            DirectoryError::InvalidInput(format!(
                "api base url '{}' cannot carry a path",
                self.base_url
            ))
        })
    }

    async fn read_json<T: DeserializeOwned>(
        response: Result<reqwest::Response, reqwest::Error>,
    ) -> Result<T, DirectoryError> {
        let response =
            response.map_err(|e| DirectoryError::Request(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DirectoryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| DirectoryError::Decode(format!("failed to parse response: {e}")))
    }
}

impl RoomDirectory for DirectoryClient {
    async fn list_rooms(&self) -> Result<Vec<Room>, DirectoryError> {
        let url = self.endpoint(&["rooms"])?;
        let rooms: Vec<Room> = Self::read_json(self.http.get(url).send().await).await?;
        tracing::debug!(count = rooms.len(), "Listed rooms");
        Ok(rooms)
    }

    async fn create_room(&self, name: &str) -> Result<Room, DirectoryError> {
        let name = normalize_room_name(name)?;
        let url = self.endpoint(&["rooms"])?;
        let body = CreateRoomRequest { name };
        let room: Room = Self::read_json(self.http.post(url).json(&body).send().await).await?;
        tracing::info!(room_id = %room.id, name = %room.name, "Created room");
        Ok(room)
    }

    async fn register_username(&self, username: &str) -> Result<RegisteredUser, DirectoryError> {
        let username = normalize_username(username)?;
        let url = self.endpoint(&["username"])?;
        let body = RegisterUsernameRequest { username };
        let user: RegisteredUser =
            Self::read_json(self.http.post(url).json(&body).send().await).await?;
        tracing::info!(user_id = %user.user_id, "Registered username");
        Ok(user)
    }
}

impl HistorySource for DirectoryClient {
    async fn fetch_messages(&self, room_id: &str) -> Result<Vec<WireMessage>, DirectoryError> {
        let url = self.endpoint(&["rooms", room_id, "messages"])?;
        Self::read_json(self.http.get(url).send().await).await
    }
}
