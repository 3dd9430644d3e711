//! Realtime client configuration
//!
//! Poll cadence, reconnect policy and transport endpoint for the realtime
//! core. Values can be overridden from the environment for deployments that
//! cannot ship a config file.

use crate::errors::{RealtimeError, RealtimeResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Default configuration values
pub struct RealtimeDefaults;

impl RealtimeDefaults {
    pub const ENDPOINT: &'static str = "http://localhost:3001";
    pub const POLL_INTERVAL_MS: u64 = 5_000;
    pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;
    pub const RECONNECT_BASE_DELAY_MS: u64 = 1_000;
    pub const MAX_RECONNECT_DELAY_MS: u64 = 30_000;
}

/// How the retry delay grows with consecutive failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// base * attempt
    Linear,
    /// base * 2^(attempt - 1)
    Exponential,
}

/// Realtime core configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Base URL of the backend serving the polling endpoints
    pub endpoint: String,
    /// Poll cadence in milliseconds
    pub poll_interval_ms: u64,
    /// Consecutive failures tolerated before the session is given up
    pub max_reconnect_attempts: u32,
    /// Base retry delay in milliseconds
    pub reconnect_base_delay_ms: u64,
    /// Upper bound on any single retry delay
    pub max_reconnect_delay_ms: u64,
    /// Retry delay growth strategy
    pub backoff: BackoffStrategy,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            endpoint: RealtimeDefaults::ENDPOINT.to_string(),
            poll_interval_ms: RealtimeDefaults::POLL_INTERVAL_MS,
            max_reconnect_attempts: RealtimeDefaults::MAX_RECONNECT_ATTEMPTS,
            reconnect_base_delay_ms: RealtimeDefaults::RECONNECT_BASE_DELAY_MS,
            max_reconnect_delay_ms: RealtimeDefaults::MAX_RECONNECT_DELAY_MS,
            backoff: BackoffStrategy::Linear,
        }
    }
}

impl RealtimeConfig {
    /// Validate configuration values
    pub fn validate(&self) -> RealtimeResult<()> {
        if self.endpoint.is_empty() {
            return Err(RealtimeError::config("Endpoint must not be empty"));
        }

        if self.poll_interval_ms == 0 {
            return Err(RealtimeError::config(
                "Poll interval must be greater than 0",
            ));
        }

        if self.max_reconnect_attempts == 0 {
            return Err(RealtimeError::config(
                "Max reconnect attempts must be greater than 0",
            ));
        }

        if self.reconnect_base_delay_ms == 0 {
            return Err(RealtimeError::config(
                "Reconnect base delay must be greater than 0",
            ));
        }

        if self.max_reconnect_delay_ms < self.reconnect_base_delay_ms {
            return Err(RealtimeError::config(
                "Max reconnect delay must be at least the base delay",
            ));
        }

        Ok(())
    }

    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> RealtimeResult<Self> {
        let endpoint =
            env::var("REALTIME_ENDPOINT").unwrap_or_else(|_| RealtimeDefaults::ENDPOINT.to_string());

        let poll_interval_ms = parse_env_u64("REALTIME_POLL_INTERVAL_MS", RealtimeDefaults::POLL_INTERVAL_MS)?;
        let max_reconnect_attempts =
            parse_env_u64("REALTIME_MAX_RECONNECT_ATTEMPTS", RealtimeDefaults::MAX_RECONNECT_ATTEMPTS as u64)?
                as u32;
        let reconnect_base_delay_ms = parse_env_u64(
            "REALTIME_RECONNECT_BASE_DELAY_MS",
            RealtimeDefaults::RECONNECT_BASE_DELAY_MS,
        )?;
        let max_reconnect_delay_ms = parse_env_u64(
            "REALTIME_MAX_RECONNECT_DELAY_MS",
            RealtimeDefaults::MAX_RECONNECT_DELAY_MS,
        )?;

        let config = Self {
            endpoint,
            poll_interval_ms,
            max_reconnect_attempts,
            reconnect_base_delay_ms,
            max_reconnect_delay_ms,
            backoff: BackoffStrategy::Linear,
        };

        config.validate()?;
        Ok(config)
    }

    /// Poll cadence as a `Duration`
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Retry delay for the given attempt number (1-based), capped
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        let delay = match self.backoff {
            BackoffStrategy::Linear => self.reconnect_base_delay_ms.saturating_mul(attempt as u64),
            BackoffStrategy::Exponential => self
                .reconnect_base_delay_ms
                .saturating_mul(1u64 << (attempt - 1).min(16)),
        };

        Duration::from_millis(delay.min(self.max_reconnect_delay_ms))
    }
}

fn parse_env_u64(var: &str, default: u64) -> RealtimeResult<u64> {
    match env::var(var) {
        Ok(raw) => raw.parse::<u64>().map_err(|_| {
            RealtimeError::config(format!("{} must be a valid number, got '{}'", var, raw))
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = RealtimeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
    }

    #[test]
    fn test_validation_rejects_zero_interval() {
        let config = RealtimeConfig {
            poll_interval_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_inverted_delay_bounds() {
        let config = RealtimeConfig {
            reconnect_base_delay_ms: 5_000,
            max_reconnect_delay_ms: 1_000,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_linear_backoff_grows_with_attempts() {
        let config = RealtimeConfig::default();
        assert_eq!(config.backoff_delay(1), Duration::from_millis(1_000));
        assert_eq!(config.backoff_delay(3), Duration::from_millis(3_000));
        // attempt 0 is treated as the first attempt
        assert_eq!(config.backoff_delay(0), Duration::from_millis(1_000));
    }

    #[test]
    fn test_exponential_backoff_is_capped() {
        let config = RealtimeConfig {
            backoff: BackoffStrategy::Exponential,
            ..Default::default()
        };
        assert_eq!(config.backoff_delay(1), Duration::from_millis(1_000));
        assert_eq!(config.backoff_delay(2), Duration::from_millis(2_000));
        assert_eq!(config.backoff_delay(4), Duration::from_millis(8_000));
        assert_eq!(
            config.backoff_delay(12),
            Duration::from_millis(RealtimeDefaults::MAX_RECONNECT_DELAY_MS)
        );
    }
}
