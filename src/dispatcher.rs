//! Event dispatcher - per-type subscriber registries and fan-out
//!
//! Each received event is delivered to every callback registered for its
//! type, in registration order. Callback invocations are isolated: a panic
//! in one subscriber is caught and logged without affecting the rest of the
//! fan-out or later events.

use crate::events::{EventType, RealtimeEvent};
use crate::status::StatsRecorder;
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

/// Unique identifier for subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub Uuid);

impl SubscriptionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Boxed subscriber callback
pub type EventCallback = Arc<dyn Fn(RealtimeEvent) + Send + Sync>;

struct Subscriber {
    id: SubscriptionId,
    callback: EventCallback,
}

type SubscriberRegistry = Arc<RwLock<HashMap<EventType, Vec<Subscriber>>>>;

/// Handle returned from [`EventDispatcher::subscribe`]
///
/// Removal goes through this token rather than callback identity, so
/// unsubscribing removes exactly the entry that was registered. Dropping the
/// token does not unsubscribe; the lifecycle is explicit.
pub struct Subscription {
    id: SubscriptionId,
    event_type: EventType,
    registry: SubscriberRegistry,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    /// Remove this subscription from the registry. Idempotent.
    pub async fn unsubscribe(&self) {
        let mut registry = self.registry.write().await;
        if let Some(subscribers) = registry.get_mut(&self.event_type) {
            let before = subscribers.len();
            subscribers.retain(|s| s.id != self.id);
            if subscribers.len() < before {
                debug!("Unsubscribed {} from {}", self.id, self.event_type);
            }
            if subscribers.is_empty() {
                registry.remove(&self.event_type);
            }
        }
    }
}

/// Fans received events out to registered subscribers
pub struct EventDispatcher {
    subscribers: SubscriberRegistry,
    stats: Arc<StatsRecorder>,
}

impl EventDispatcher {
    pub fn new(stats: Arc<StatsRecorder>) -> Self {
        Self {
            subscribers: Arc::new(RwLock::new(HashMap::new())),
            stats,
        }
    }

    /// Register a callback for an event type, preserving registration order
    pub async fn subscribe<F>(&self, event_type: EventType, callback: F) -> Subscription
    where
        F: Fn(RealtimeEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId::new();

        {
            let mut registry = self.subscribers.write().await;
            registry.entry(event_type).or_default().push(Subscriber {
                id,
                callback: Arc::new(callback),
            });
        }

        debug!("Subscribed {} to {}", id, event_type);
        Subscription {
            id,
            event_type,
            registry: Arc::clone(&self.subscribers),
        }
    }

    /// Deliver an event to every subscriber of its type
    ///
    /// The subscriber list is snapshotted before iteration, so subscribing or
    /// unsubscribing while a fan-out is in flight cannot corrupt delivery.
    /// Returns the number of callbacks invoked.
    pub async fn publish(&self, event: RealtimeEvent) -> usize {
        self.stats.record_received(1);

        let snapshot: Vec<(SubscriptionId, EventCallback)> = {
            let registry = self.subscribers.read().await;
            match registry.get(&event.event_type) {
                Some(subscribers) => subscribers
                    .iter()
                    .map(|s| (s.id, Arc::clone(&s.callback)))
                    .collect(),
                None => return 0,
            }
        };

        let mut delivered = 0;
        for (id, callback) in snapshot {
            let delivered_event = event.clone();
            match catch_unwind(AssertUnwindSafe(|| (*callback)(delivered_event))) {
                Ok(()) => delivered += 1,
                Err(_) => {
                    warn!(
                        "Subscriber {} panicked handling {} event {}",
                        id, event.event_type, event.id
                    );
                }
            }
        }

        delivered
    }

    /// Number of subscribers currently registered for an event type
    pub async fn subscriber_count(&self, event_type: EventType) -> usize {
        let registry = self.subscribers.read().await;
        registry.get(&event_type).map_or(0, |s| s.len())
    }
}
