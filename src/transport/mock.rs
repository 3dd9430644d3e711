//! In-process mock transport
//!
//! Stands in for the real backend during development and tests. Polls can be
//! scripted (queued event batches or forced failures); with an empty script
//! the mock behaves like the thin backend stub it replaces and occasionally
//! generates a synthetic event.

use super::EventTransport;
use crate::errors::{RealtimeError, RealtimeResult};
use crate::events::{EventPriority, EventType, RealtimeEvent};
use crate::status::{SystemHealth, SystemStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Instant;

/// One scripted poll outcome
#[derive(Debug, Clone)]
enum ScriptedPoll {
    Events(Vec<RealtimeEvent>),
    Failure,
}

/// Mock transport with scriptable poll outcomes
pub struct MockTransport {
    script: Mutex<VecDeque<ScriptedPoll>>,
    status_failing: AtomicBool,
    generate_random_events: bool,
    started_at: Instant,
}

impl MockTransport {
    /// Create a quiet mock: polls succeed with empty batches unless scripted
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            status_failing: AtomicBool::new(false),
            generate_random_events: false,
            started_at: Instant::now(),
        }
    }

    /// Create a mock that occasionally emits synthetic events, mimicking the
    /// backend stub
    pub fn with_random_events() -> Self {
        Self {
            generate_random_events: true,
            ..Self::new()
        }
    }

    /// Queue a batch of events to be returned by the next unscripted poll
    pub fn push_events(&self, events: Vec<RealtimeEvent>) {
        self.script
            .lock()
            .expect("mock script lock poisoned")
            .push_back(ScriptedPoll::Events(events));
    }

    /// Queue `count` consecutive poll failures
    pub fn push_failures(&self, count: usize) {
        let mut script = self.script.lock().expect("mock script lock poisoned");
        for _ in 0..count {
            script.push_back(ScriptedPoll::Failure);
        }
    }

    /// Make `fetch_system_status` fail until switched back
    pub fn set_status_failing(&self, failing: bool) {
        self.status_failing.store(failing, Ordering::Relaxed);
    }

    fn generate_event(&self) -> RealtimeEvent {
        let mut rng = rand::thread_rng();
        let event_type = match rng.gen_range(0..5) {
            0 => EventType::Notification,
            1 => EventType::Message,
            2 => EventType::Report,
            3 => EventType::System,
            _ => EventType::UserActivity,
        };

        RealtimeEvent::new(
            event_type,
            json!({ "generated": true, "sequence": rng.gen_range(0..1_000) }),
        )
        .with_priority(EventPriority::Low)
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventTransport for MockTransport {
    async fn fetch_pending_events(
        &self,
        user_id: &str,
        _since: DateTime<Utc>,
    ) -> RealtimeResult<Vec<RealtimeEvent>> {
        let scripted = self
            .script
            .lock()
            .expect("mock script lock poisoned")
            .pop_front();

        match scripted {
            Some(ScriptedPoll::Events(events)) => Ok(events),
            Some(ScriptedPoll::Failure) => Err(RealtimeError::transport(format!(
                "Simulated poll failure for user {}",
                user_id
            ))),
            None => {
                if self.generate_random_events && rand::thread_rng().gen::<f64>() > 0.7 {
                    Ok(vec![self.generate_event().with_user(user_id)])
                } else {
                    Ok(Vec::new())
                }
            }
        }
    }

    async fn fetch_system_status(&self) -> RealtimeResult<SystemStatus> {
        if self.status_failing.load(Ordering::Relaxed) {
            return Err(RealtimeError::transport("Simulated status failure"));
        }

        let mut rng = rand::thread_rng();
        Ok(SystemStatus {
            status: SystemHealth::Online,
            uptime_seconds: self.started_at.elapsed().as_secs(),
            active_users: rng.gen_range(10..60),
            system_load: rng.gen_range(0.0..1.0),
            last_update: Utc::now(),
        })
    }
}
