//! Transport adapters for the realtime core
//!
//! The [`EventTransport`] trait is the only boundary where real network
//! behavior is assumed. The supervisor, dispatcher and room registry are
//! written against it, so a push transport can be substituted for the
//! default HTTP polling adapter without touching their contracts.

pub mod http;
pub mod mock;

pub use http::HttpTransport;
pub use mock::MockTransport;

use crate::errors::RealtimeResult;
use crate::events::RealtimeEvent;
use crate::status::SystemStatus;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Boundary to whatever backend delivers pending events and health snapshots
#[async_trait]
pub trait EventTransport: Send + Sync {
    /// Retrieve events queued for `user_id` since the given cursor.
    /// Returns an empty list when nothing is pending; an `Err` means this
    /// poll cycle failed and the supervisor decides whether to retry.
    async fn fetch_pending_events(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> RealtimeResult<Vec<RealtimeEvent>>;

    /// Retrieve a point-in-time system health snapshot
    async fn fetch_system_status(&self) -> RealtimeResult<SystemStatus>;
}
