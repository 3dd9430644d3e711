//! HTTP polling transport
//!
//! Default transport adapter: polls the backend's realtime endpoints over
//! plain HTTP. Authentication of the exchange is handled by the surrounding
//! session layer, not here.

use super::EventTransport;
use crate::errors::{RealtimeError, RealtimeResult};
use crate::events::RealtimeEvent;
use crate::status::SystemStatus;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::debug;

/// Request timeout for a single poll round-trip
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling transport over the backend's `/api/realtime` endpoints
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport against the given base URL
    pub fn new<T: Into<String>>(base_url: T) -> RealtimeResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| RealtimeError::transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl EventTransport for HttpTransport {
    async fn fetch_pending_events(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> RealtimeResult<Vec<RealtimeEvent>> {
        let since = since.to_rfc3339();
        let response = self
            .client
            .get(self.url("/api/realtime/events"))
            .query(&[("user_id", user_id), ("since", since.as_str())])
            .send()
            .await?
            .error_for_status()
            .map_err(RealtimeError::from)?;

        let events: Vec<RealtimeEvent> = response.json().await?;
        debug!(
            "Fetched {} pending event(s) for user {}",
            events.len(),
            user_id
        );

        Ok(events)
    }

    async fn fetch_system_status(&self) -> RealtimeResult<SystemStatus> {
        let response = self
            .client
            .get(self.url("/api/realtime/status"))
            .send()
            .await?
            .error_for_status()
            .map_err(RealtimeError::from)?;

        Ok(response.json().await?)
    }
}
