//! Room registry - named channels with dynamic membership
//!
//! Rooms are implicitly created on first join and vanish when the last
//! member leaves. Joining twice and leaving a room one is not in are both
//! no-ops; a broadcast is scoped to the membership at send time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

/// A message broadcast to a room's members
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomMessage {
    pub id: Uuid,
    pub room_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<String>,
    pub body: Value,
    pub sent_at: DateTime<Utc>,
}

impl RoomMessage {
    pub fn new<T: Into<String>>(room_id: T, body: Value, sender_id: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            room_id: room_id.into(),
            sender_id,
            body,
            sent_at: Utc::now(),
        }
    }
}

/// Tracks which users are members of which rooms
pub struct RoomRegistry {
    rooms: Arc<RwLock<HashMap<String, HashSet<String>>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Add a user to a room, creating the room if needed. Idempotent.
    pub async fn join_room(&self, room_id: &str, user_id: &str) {
        let mut rooms = self.rooms.write().await;
        let members = rooms.entry(room_id.to_string()).or_default();

        if members.insert(user_id.to_string()) {
            info!("User {} joined room {}", user_id, room_id);
        } else {
            debug!("User {} already in room {}", user_id, room_id);
        }
    }

    /// Remove a user from a room. A no-op if the room or membership does not
    /// exist; empty rooms are dropped.
    pub async fn leave_room(&self, room_id: &str, user_id: &str) {
        let mut rooms = self.rooms.write().await;

        if let Some(members) = rooms.get_mut(room_id) {
            if members.remove(user_id) {
                info!("User {} left room {}", user_id, room_id);
            }
            if members.is_empty() {
                rooms.remove(room_id);
                debug!("Room {} is empty, removed", room_id);
            }
        }
    }

    /// Remove a user from every room they are in; returns the rooms left
    pub async fn leave_all_rooms(&self, user_id: &str) -> Vec<String> {
        let mut rooms = self.rooms.write().await;
        let mut left = Vec::new();

        rooms.retain(|room_id, members| {
            if members.remove(user_id) {
                left.push(room_id.clone());
            }
            !members.is_empty()
        });

        if !left.is_empty() {
            info!("User {} left {} room(s)", user_id, left.len());
        }

        left
    }

    /// Membership snapshot for a broadcast; empty if the room does not exist
    pub async fn recipients(&self, room_id: &str) -> Vec<String> {
        let rooms = self.rooms.read().await;
        rooms
            .get(room_id)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Current participants of a room
    pub async fn participants(&self, room_id: &str) -> Vec<String> {
        self.recipients(room_id).await
    }

    pub async fn is_member(&self, room_id: &str, user_id: &str) -> bool {
        let rooms = self.rooms.read().await;
        rooms
            .get(room_id)
            .map_or(false, |members| members.contains(user_id))
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}
