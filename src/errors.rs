//! Realtime error types
//!
//! Error handling for the realtime core. Transient transport failures are
//! retried by the connection supervisor and never surface here; the variants
//! below cover terminal conditions and caller mistakes.

use thiserror::Error;

/// Result type for realtime operations
pub type RealtimeResult<T> = Result<T, RealtimeError>;

/// Realtime core errors
#[derive(Error, Debug)]
pub enum RealtimeError {
    #[error("Transport failed: {message}")]
    TransportFailed { message: String },

    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("Reconnect attempts exhausted after {attempts} tries")]
    ReconnectExhausted { attempts: u32 },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RealtimeError {
    /// Create a transport error
    pub fn transport<T: Into<String>>(message: T) -> Self {
        RealtimeError::TransportFailed {
            message: message.into(),
        }
    }

    /// Create a connection error
    pub fn connection<T: Into<String>>(message: T) -> Self {
        RealtimeError::ConnectionFailed {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config<T: Into<String>>(message: T) -> Self {
        RealtimeError::ConfigError {
            message: message.into(),
        }
    }

    /// Whether this error is worth retrying at the transport boundary
    pub fn is_transient(&self) -> bool {
        matches!(self, RealtimeError::TransportFailed { .. })
    }
}

impl From<reqwest::Error> for RealtimeError {
    fn from(err: reqwest::Error) -> Self {
        RealtimeError::TransportFailed {
            message: err.to_string(),
        }
    }
}
