//! End-to-end exercises of the realtime service over a scripted transport

use campus_realtime::{
    ConnectionState, EventType, MockTransport, RealtimeConfig, RealtimeEvent, RealtimeService,
    SystemHealth,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn fast_config() -> RealtimeConfig {
    RealtimeConfig {
        poll_interval_ms: 10,
        max_reconnect_attempts: 3,
        reconnect_base_delay_ms: 10,
        max_reconnect_delay_ms: 50,
        ..Default::default()
    }
}

fn service_over(transport: Arc<MockTransport>) -> RealtimeService {
    RealtimeService::with_transport(fast_config(), transport)
}

#[tokio::test]
async fn notification_reaches_only_its_subscribers() {
    let transport = Arc::new(MockTransport::new());
    let event = RealtimeEvent::new(EventType::Notification, json!({"title": "Report ready"}))
        .with_user("U1");
    let expected_id = event.id;
    transport.push_events(vec![event]);

    let service = service_over(Arc::clone(&transport));

    let notification_ids = Arc::new(Mutex::new(Vec::new()));
    let message_calls = Arc::new(AtomicUsize::new(0));

    let ids = Arc::clone(&notification_ids);
    let _notifications = service
        .subscribe(EventType::Notification, move |event| {
            ids.lock().unwrap().push(event.id);
        })
        .await;

    let calls = Arc::clone(&message_calls);
    let _messages = service
        .subscribe(EventType::Message, move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
        })
        .await;

    service.connect("U1").await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    service.disconnect().await;

    let ids = notification_ids.lock().unwrap();
    assert_eq!(ids.len(), 1, "exactly one notification delivery expected");
    assert_eq!(ids[0], expected_id);
    assert_eq!(message_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn flaky_transport_recovers_within_the_cap() {
    let transport = Arc::new(MockTransport::new());
    transport.push_failures(2);
    transport.push_events(vec![RealtimeEvent::new(
        EventType::Report,
        json!({"report_id": "rpt-7"}),
    )]);

    let service = service_over(Arc::clone(&transport));

    let reports = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&reports);
    let _subscription = service
        .subscribe(EventType::Report, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .await;

    service.connect("U1").await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(service.connection_state().await, ConnectionState::Connected);
    assert_eq!(reports.load(Ordering::SeqCst), 1);

    let stats = service.connection_stats();
    assert_eq!(stats.reconnect_attempts, 0, "success resets the counter");
    assert_eq!(stats.messages_received, 1);

    service.disconnect().await;
}

#[tokio::test]
async fn persistent_outage_ends_the_session() {
    let transport = Arc::new(MockTransport::new());
    transport.push_failures(3);

    let service = service_over(Arc::clone(&transport));
    service.connect("U1").await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(
        service.connection_state().await,
        ConnectionState::Disconnected
    );
    assert_eq!(service.connection_stats().reconnect_attempts, 3);

    // the session stays down until a caller explicitly reconnects
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(
        service.connection_state().await,
        ConnectionState::Disconnected
    );

    service.connect("U1").await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(service.connection_state().await, ConnectionState::Connected);

    service.disconnect().await;
}

#[tokio::test]
async fn dashboards_always_get_a_status_snapshot() {
    let transport = Arc::new(MockTransport::new());
    let service = service_over(Arc::clone(&transport));

    let healthy = service.system_status().await;
    assert_eq!(healthy.status, SystemHealth::Online);

    transport.set_status_failing(true);
    let fallback = service.system_status().await;
    assert_eq!(fallback.status, SystemHealth::Offline);
    assert!(fallback.system_load <= 1.0);
}

#[tokio::test]
async fn rooms_scope_broadcasts_to_current_members() {
    let transport = Arc::new(MockTransport::new());
    let service = service_over(transport);

    service.join_room("year-9", "student-1").await;
    service.join_room("year-9", "student-2").await;
    service.join_room("year-9", "student-2").await; // idempotent

    let mut participants = service.participants("year-9").await;
    participants.sort();
    assert_eq!(
        participants,
        vec!["student-1".to_string(), "student-2".to_string()]
    );

    let first = service
        .send_room_message("year-9", json!({"text": "assembly at 9"}))
        .await;
    assert_eq!(first, 2);

    // a member joining later is not retroactively delivered to
    service.join_room("year-9", "student-3").await;
    let second = service
        .send_room_message("year-9", json!({"text": "second call"}))
        .await;
    assert_eq!(second, 3);

    service.leave_room("year-9", "student-1").await;
    service.leave_room("year-9", "student-1").await; // no-op
    assert_eq!(service.participants("year-9").await.len(), 2);

    assert_eq!(service.connection_stats().messages_sent, 2);
}

#[tokio::test]
async fn subscription_lifecycle_across_polls() {
    let transport = Arc::new(MockTransport::new());
    transport.push_events(vec![RealtimeEvent::new(
        EventType::UserActivity,
        json!({"user": "teacher-1"}),
    )]);

    let service = service_over(Arc::clone(&transport));

    let pings = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&pings);
    let subscription = service
        .subscribe(EventType::UserActivity, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .await;

    service.connect("U1").await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(pings.load(Ordering::SeqCst), 1);

    // after unsubscribe returns, later events must not reach the callback
    subscription.unsubscribe().await;
    transport.push_events(vec![RealtimeEvent::new(
        EventType::UserActivity,
        json!({"user": "teacher-2"}),
    )]);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(pings.load(Ordering::SeqCst), 1);

    service.disconnect().await;
}
