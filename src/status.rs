//! System status snapshots and connection statistics
//!
//! Dashboards must always have something to render, so status queries never
//! fail: a transport outage yields a clearly-marked fallback snapshot. The
//! connection counters are process-local diagnostics, reset on restart.

use crate::errors::RealtimeResult;
use crate::transport::EventTransport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

/// Overall backend health as reported by the status endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemHealth {
    Online,
    Offline,
    Maintenance,
}

/// Point-in-time system health snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemStatus {
    pub status: SystemHealth,
    pub uptime_seconds: u64,
    pub active_users: u32,
    /// Normalized load, 0.0..=1.0
    pub system_load: f64,
    pub last_update: DateTime<Utc>,
}

impl SystemStatus {
    /// Fallback snapshot returned when the transport cannot be reached
    pub fn fallback() -> Self {
        Self {
            status: SystemHealth::Offline,
            uptime_seconds: 0,
            active_users: 0,
            system_load: 0.0,
            last_update: Utc::now(),
        }
    }
}

/// Connection-quality counters exposed to dashboards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionStats {
    pub messages_sent: u64,
    pub messages_received: u64,
    pub reconnect_attempts: u32,
    pub average_latency_ms: f64,
}

/// Number of poll latency samples kept for the rolling average
const LATENCY_WINDOW: usize = 50;

/// Shared counter sink written by the supervisor and dispatcher
#[derive(Debug, Default)]
pub struct StatsRecorder {
    messages_sent: AtomicU64,
    messages_received: AtomicU64,
    reconnect_attempts: AtomicU32,
    latency_samples_ms: Mutex<VecDeque<u64>>,
}

impl StatsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_sent(&self, count: u64) {
        self.messages_sent.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_received(&self, count: u64) {
        self.messages_received.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_reconnect_attempt(&self) {
        self.reconnect_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn reset_reconnect_attempts(&self) {
        self.reconnect_attempts.store(0, Ordering::Relaxed);
    }

    /// Record the round-trip time of one successful poll
    pub fn record_latency(&self, latency: Duration) {
        let mut samples = self
            .latency_samples_ms
            .lock()
            .expect("latency sample lock poisoned");
        if samples.len() == LATENCY_WINDOW {
            samples.pop_front();
        }
        samples.push_back(latency.as_millis() as u64);
    }

    /// Current counters as a snapshot value
    pub fn snapshot(&self) -> ConnectionStats {
        let samples = self
            .latency_samples_ms
            .lock()
            .expect("latency sample lock poisoned");
        let average_latency_ms = if samples.is_empty() {
            0.0
        } else {
            samples.iter().sum::<u64>() as f64 / samples.len() as f64
        };

        ConnectionStats {
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            reconnect_attempts: self.reconnect_attempts.load(Ordering::Relaxed),
            average_latency_ms,
        }
    }
}

/// Read-side facade over the status endpoint and local counters
pub struct StatusReporter {
    transport: Arc<dyn EventTransport>,
    stats: Arc<StatsRecorder>,
}

impl StatusReporter {
    pub fn new(transport: Arc<dyn EventTransport>, stats: Arc<StatsRecorder>) -> Self {
        Self { transport, stats }
    }

    /// Best-effort system status; a transport failure yields the fallback
    /// snapshot instead of an error
    pub async fn system_status(&self) -> SystemStatus {
        match self.transport.fetch_system_status().await {
            Ok(status) => status,
            Err(e) => {
                warn!("Status fetch failed, serving fallback snapshot: {}", e);
                SystemStatus::fallback()
            }
        }
    }

    /// Same as [`system_status`](Self::system_status) but preserving the error
    /// for callers that care about the distinction
    pub async fn try_system_status(&self) -> RealtimeResult<SystemStatus> {
        self.transport.fetch_system_status().await
    }

    pub fn connection_stats(&self) -> ConnectionStats {
        self.stats.snapshot()
    }
}
