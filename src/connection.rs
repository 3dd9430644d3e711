//! Connection supervisor - logical connection lifecycle and polling loop
//!
//! Owns the connection state machine, drives the fixed-cadence poll against
//! the transport adapter and applies reconnection-with-backoff when polls
//! fail repeatedly. Fan-out for a poll cycle completes before the next tick
//! is scheduled, so cycles never overlap.

use crate::config::RealtimeConfig;
use crate::dispatcher::EventDispatcher;
use crate::errors::RealtimeResult;
use crate::status::StatsRecorder;
use crate::transport::EventTransport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Logical connection state, mutated only by supervisor transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

impl ConnectionState {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// True while a poll task exists for this session
    pub fn is_running(&self) -> bool {
        !matches!(self, Self::Disconnected)
    }
}

struct PollTask {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Supervises the logical connection for one user session
pub struct ConnectionSupervisor {
    config: RealtimeConfig,
    transport: Arc<dyn EventTransport>,
    dispatcher: Arc<EventDispatcher>,
    stats: Arc<StatsRecorder>,
    state: Arc<RwLock<ConnectionState>>,
    last_sync: Arc<RwLock<DateTime<Utc>>>,
    task: Mutex<Option<PollTask>>,
}

impl ConnectionSupervisor {
    pub fn new(
        config: RealtimeConfig,
        transport: Arc<dyn EventTransport>,
        dispatcher: Arc<EventDispatcher>,
        stats: Arc<StatsRecorder>,
    ) -> Self {
        Self {
            config,
            transport,
            dispatcher,
            stats,
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            last_sync: Arc::new(RwLock::new(Utc::now())),
            task: Mutex::new(None),
        }
    }

    /// Start polling for the given user. Idempotent: calling while a session
    /// is already starting or running is a no-op.
    pub async fn connect(&self, user_id: &str) -> RealtimeResult<()> {
        {
            let mut state = self.state.write().await;
            if state.is_running() {
                debug!("connect({}) ignored, session already {:?}", user_id, *state);
                return Ok(());
            }
            *state = ConnectionState::Connecting;
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(poll_loop(
            user_id.to_string(),
            self.config.clone(),
            Arc::clone(&self.transport),
            Arc::clone(&self.dispatcher),
            Arc::clone(&self.stats),
            Arc::clone(&self.state),
            Arc::clone(&self.last_sync),
            shutdown_rx,
        ));

        let mut task = self.task.lock().await;
        if let Some(stale) = task.replace(PollTask {
            shutdown: shutdown_tx,
            handle,
        }) {
            // a previous session that ended terminally; its loop has exited
            let _ = stale.shutdown.send(true);
        }

        info!("Realtime session starting for user {}", user_id);
        Ok(())
    }

    /// Stop the poll loop and force `Disconnected`. Safe from any state,
    /// including when no session is running.
    pub async fn disconnect(&self) {
        let task = self.task.lock().await.take();

        if let Some(task) = task {
            let _ = task.shutdown.send(true);
            let _ = task.handle.await;
        }

        let mut state = self.state.write().await;
        if *state != ConnectionState::Disconnected {
            info!("Realtime session disconnected");
        }
        *state = ConnectionState::Disconnected;
    }

    /// Current connection state
    pub async fn state(&self) -> ConnectionState {
        *self.state.read().await
    }

    pub async fn is_connected(&self) -> bool {
        self.state().await.is_active()
    }

    /// Cursor of the last successful sync
    pub async fn last_sync(&self) -> DateTime<Utc> {
        *self.last_sync.read().await
    }
}

/// The poll loop: one fetch + fan-out per tick, backoff between failed polls.
/// Any successful fetch fully resets the failure counter.
#[allow(clippy::too_many_arguments)]
async fn poll_loop(
    user_id: String,
    config: RealtimeConfig,
    transport: Arc<dyn EventTransport>,
    dispatcher: Arc<EventDispatcher>,
    stats: Arc<StatsRecorder>,
    state: Arc<RwLock<ConnectionState>>,
    last_sync: Arc<RwLock<DateTime<Utc>>>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut attempts: u32 = 0;
    let mut interval = time::interval(config.poll_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    debug!("Poll loop started for user {}", user_id);

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                debug!("Poll loop for user {} cancelled", user_id);
                break;
            }
            _ = interval.tick() => {
                let since = *last_sync.read().await;
                let started = Instant::now();

                match transport.fetch_pending_events(&user_id, since).await {
                    Ok(events) => {
                        stats.record_latency(started.elapsed());

                        if attempts > 0 {
                            info!(
                                "Connection restored for user {} after {} failed attempt(s)",
                                user_id, attempts
                            );
                        }
                        attempts = 0;
                        stats.reset_reconnect_attempts();

                        {
                            let mut current = state.write().await;
                            if *current != ConnectionState::Connected {
                                info!("Realtime connection established for user {}", user_id);
                                *current = ConnectionState::Connected;
                            }
                        }

                        *last_sync.write().await = Utc::now();

                        if !events.is_empty() {
                            debug!("Dispatching {} event(s) for user {}", events.len(), user_id);
                        }
                        for event in events {
                            dispatcher.publish(event).await;
                        }
                    }
                    Err(e) => {
                        attempts += 1;
                        stats.record_reconnect_attempt();

                        if attempts >= config.max_reconnect_attempts {
                            error!(
                                "Giving up after {} consecutive poll failures for user {}: {}",
                                attempts, user_id, e
                            );
                            *state.write().await = ConnectionState::Disconnected;
                            break;
                        }

                        *state.write().await = ConnectionState::Reconnecting;
                        let delay = config.backoff_delay(attempts);
                        warn!(
                            "Poll failed for user {} (attempt {}/{}), retrying in {:?}: {}",
                            user_id, attempts, config.max_reconnect_attempts, delay, e
                        );

                        tokio::select! {
                            _ = shutdown.changed() => break,
                            _ = time::sleep(delay) => {}
                        }
                    }
                }
            }
        }
    }

    debug!("Poll loop finished for user {}", user_id);
}
