//! Realtime service - the composition root facade
//!
//! One explicitly constructed instance per session owns the transport,
//! dispatcher, room registry, stats and supervisor, and is passed by handle
//! to consumers (dashboards, notification UIs, messaging screens). Lifecycle
//! is explicit: `connect` starts it, `shutdown` tears it down.

use crate::config::RealtimeConfig;
use crate::connection::{ConnectionState, ConnectionSupervisor};
use crate::dispatcher::{EventDispatcher, Subscription};
use crate::errors::RealtimeResult;
use crate::events::{EventType, RealtimeEvent};
use crate::rooms::{RoomMessage, RoomRegistry};
use crate::status::{ConnectionStats, StatsRecorder, StatusReporter, SystemStatus};
use crate::transport::{EventTransport, HttpTransport};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Facade over the realtime core
pub struct RealtimeService {
    transport: Arc<dyn EventTransport>,
    dispatcher: Arc<EventDispatcher>,
    rooms: Arc<RoomRegistry>,
    stats: Arc<StatsRecorder>,
    supervisor: ConnectionSupervisor,
    status: StatusReporter,
    current_user: RwLock<Option<String>>,
}

impl RealtimeService {
    /// Create a service polling the configured HTTP endpoint
    pub fn new(config: RealtimeConfig) -> RealtimeResult<Self> {
        config.validate()?;
        let transport: Arc<dyn EventTransport> = Arc::new(HttpTransport::new(&config.endpoint)?);
        Ok(Self::with_transport(config, transport))
    }

    /// Create a service over a caller-supplied transport adapter
    pub fn with_transport(config: RealtimeConfig, transport: Arc<dyn EventTransport>) -> Self {
        let stats = Arc::new(StatsRecorder::new());
        let dispatcher = Arc::new(EventDispatcher::new(Arc::clone(&stats)));
        let supervisor = ConnectionSupervisor::new(
            config,
            Arc::clone(&transport),
            Arc::clone(&dispatcher),
            Arc::clone(&stats),
        );
        let status = StatusReporter::new(Arc::clone(&transport), Arc::clone(&stats));

        Self {
            transport,
            dispatcher,
            rooms: Arc::new(RoomRegistry::new()),
            stats,
            supervisor,
            status,
            current_user: RwLock::new(None),
        }
    }

    /// Start the realtime session for a user
    pub async fn connect(&self, user_id: &str) -> RealtimeResult<()> {
        self.supervisor.connect(user_id).await?;
        *self.current_user.write().await = Some(user_id.to_string());
        Ok(())
    }

    /// Stop polling; subscriptions and room memberships stay in place
    pub async fn disconnect(&self) {
        self.supervisor.disconnect().await;
    }

    /// Full teardown: disconnect and drop the user's room memberships
    pub async fn shutdown(&self) {
        self.supervisor.disconnect().await;

        let user = self.current_user.write().await.take();
        if let Some(user_id) = user {
            let left = self.rooms.leave_all_rooms(&user_id).await;
            if !left.is_empty() {
                debug!("Shutdown cleared {} room membership(s)", left.len());
            }
        }

        info!("Realtime service shut down");
    }

    /// Register a callback for an event type
    pub async fn subscribe<F>(&self, event_type: EventType, callback: F) -> Subscription
    where
        F: Fn(RealtimeEvent) + Send + Sync + 'static,
    {
        self.dispatcher.subscribe(event_type, callback).await
    }

    pub async fn join_room(&self, room_id: &str, user_id: &str) {
        self.rooms.join_room(room_id, user_id).await;
    }

    pub async fn leave_room(&self, room_id: &str, user_id: &str) {
        self.rooms.leave_room(room_id, user_id).await;
    }

    pub async fn participants(&self, room_id: &str) -> Vec<String> {
        self.rooms.participants(room_id).await
    }

    /// Broadcast a message to a room's current members
    ///
    /// Fire and forget: the recipient set is the membership at send time, an
    /// empty room delivers to nobody without erroring. Returns the number of
    /// recipients.
    pub async fn send_room_message(&self, room_id: &str, body: Value) -> usize {
        let recipients = self.rooms.recipients(room_id).await;
        if recipients.is_empty() {
            debug!("Room {} has no members, message dropped", room_id);
            return 0;
        }

        let sender = self.current_user.read().await.clone();
        let message = RoomMessage::new(room_id, body, sender);

        let event = RealtimeEvent::new(
            EventType::Message,
            json!({
                "room_id": message.room_id,
                "message_id": message.id,
                "sender_id": message.sender_id,
                "body": message.body,
                "recipients": recipients,
            }),
        );

        self.stats.record_sent(1);
        self.dispatcher.publish(event).await;

        info!(
            "Room message {} broadcast to {} member(s) of {}",
            message.id,
            recipients.len(),
            room_id
        );
        recipients.len()
    }

    /// Best-effort system status; never errors
    pub async fn system_status(&self) -> SystemStatus {
        self.status.system_status().await
    }

    /// Process-local connection counters
    pub fn connection_stats(&self) -> ConnectionStats {
        self.status.connection_stats()
    }

    pub async fn connection_state(&self) -> ConnectionState {
        self.supervisor.state().await
    }

    pub async fn is_connected(&self) -> bool {
        self.supervisor.is_connected().await
    }

    /// The transport this service polls; useful for diagnostics
    pub fn transport(&self) -> &Arc<dyn EventTransport> {
        &self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::SystemHealth;
    use crate::transport::MockTransport;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn quiet_service() -> (RealtimeService, Arc<MockTransport>) {
        let transport = Arc::new(MockTransport::new());
        let service = RealtimeService::with_transport(
            RealtimeConfig {
                poll_interval_ms: 10,
                reconnect_base_delay_ms: 10,
                max_reconnect_delay_ms: 50,
                ..Default::default()
            },
            Arc::clone(&transport) as Arc<dyn EventTransport>,
        );
        (service, transport)
    }

    #[tokio::test]
    async fn test_room_message_reaches_message_subscribers() {
        let (service, _) = quiet_service();

        let deliveries = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&deliveries);
        let _subscription = service
            .subscribe(EventType::Message, move |event| {
                assert_eq!(event.payload["room_id"], "math-101");
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .await;

        service.join_room("math-101", "student-1").await;
        service.join_room("math-101", "student-2").await;

        let recipients = service
            .send_room_message("math-101", json!({"text": "quiz tomorrow"}))
            .await;

        assert_eq!(recipients, 2);
        assert_eq!(deliveries.load(Ordering::SeqCst), 1);
        assert_eq!(service.connection_stats().messages_sent, 1);
    }

    #[tokio::test]
    async fn test_empty_room_message_is_dropped() {
        let (service, _) = quiet_service();
        let recipients = service.send_room_message("ghost-room", json!({})).await;
        assert_eq!(recipients, 0);
        assert_eq!(service.connection_stats().messages_sent, 0);
    }

    #[tokio::test]
    async fn test_status_fallback_when_transport_down() {
        let (service, transport) = quiet_service();
        transport.set_status_failing(true);

        let status = service.system_status().await;
        assert_eq!(status.status, SystemHealth::Offline);
        assert_eq!(status.active_users, 0);
    }

    #[tokio::test]
    async fn test_shutdown_clears_room_memberships() {
        let (service, _) = quiet_service();

        service.connect("U1").await.unwrap();
        service.join_room("homeroom", "U1").await;
        service.join_room("homeroom", "U2").await;

        service.shutdown().await;

        assert_eq!(service.connection_state().await, ConnectionState::Disconnected);
        assert_eq!(service.participants("homeroom").await, vec!["U2".to_string()]);
    }
}
