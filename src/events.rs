//! Typed realtime events
//!
//! Events are the unit of information delivered to subscribers: typed,
//! timestamped, immutable once constructed. The transport adapter creates
//! them; the dispatcher owns them for the duration of a delivery pass.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Unique identifier for realtime events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub Uuid);

impl EventId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Event categories delivered over the realtime stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// In-app notification (grades posted, announcement, ...)
    Notification,
    /// Direct or room-scoped chat message
    Message,
    /// A generated report became available
    Report,
    /// System-level status change (maintenance window, degraded mode)
    System,
    /// Presence / activity ping for a user
    UserActivity,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Notification => "notification",
            EventType::Message => "message",
            EventType::Report => "report",
            EventType::System => "system",
            EventType::UserActivity => "user_activity",
        }
    }

    /// All known event types, in a stable order
    pub fn all() -> [EventType; 5] {
        [
            EventType::Notification,
            EventType::Message,
            EventType::Report,
            EventType::System,
            EventType::UserActivity,
        ]
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Delivery priority attached to each event
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Default for EventPriority {
    fn default() -> Self {
        EventPriority::Medium
    }
}

/// A single realtime event as delivered to subscribers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeEvent {
    pub id: EventId,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub timestamp: DateTime<Utc>,
    /// Opaque payload; the dispatcher never inspects it
    pub payload: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub priority: EventPriority,
}

impl RealtimeEvent {
    /// Create a new event with a fresh id and the current timestamp
    pub fn new(event_type: EventType, payload: Value) -> Self {
        Self {
            id: EventId::new(),
            event_type,
            timestamp: Utc::now(),
            payload,
            user_id: None,
            priority: EventPriority::default(),
        }
    }

    /// Scope the event to a specific user
    pub fn with_user<T: Into<String>>(mut self, user_id: T) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_priority(mut self, priority: EventPriority) -> Self {
        self.priority = priority;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_construction() {
        let event = RealtimeEvent::new(EventType::Notification, json!({"title": "Report card"}))
            .with_user("student-42")
            .with_priority(EventPriority::High);

        assert_eq!(event.event_type, EventType::Notification);
        assert_eq!(event.user_id.as_deref(), Some("student-42"));
        assert_eq!(event.priority, EventPriority::High);
    }

    #[test]
    fn test_event_type_serde_names() {
        let json = serde_json::to_string(&EventType::UserActivity).unwrap();
        assert_eq!(json, "\"user_activity\"");

        let parsed: EventType = serde_json::from_str("\"report\"").unwrap();
        assert_eq!(parsed, EventType::Report);
    }

    #[test]
    fn test_event_wire_format() {
        let event = RealtimeEvent::new(EventType::Message, json!({"body": "hi"}));
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["type"], "message");
        assert!(value.get("user_id").is_none());

        let back: RealtimeEvent = serde_json::from_value(value).unwrap();
        assert_eq!(back.id, event.id);
        assert_eq!(back.priority, EventPriority::Medium);
    }

    #[test]
    fn test_default_priority_is_medium() {
        assert_eq!(EventPriority::default(), EventPriority::Medium);
        assert!(EventPriority::Urgent > EventPriority::Low);
    }
}
