//! # campus-realtime
//!
//! Realtime event delivery core for the Campus school-management platform.
//!
//! The crate implements the live-update layer sitting between a backend and
//! the UI surfaces that consume it:
//! - A connection supervisor that polls the backend on a fixed cadence and
//!   recovers from flaky transports with bounded backoff
//! - An event dispatcher fanning typed events out to isolated subscribers
//! - A room registry for ephemeral, dynamically-membered broadcast channels
//! - Status and connection-quality reporting that always returns a value,
//!   so dashboards can render even while the backend is down
//!
//! The transport is a trait boundary: the default adapter polls HTTP
//! endpoints, and a push transport can be substituted without touching the
//! supervisor, dispatcher or room contracts.

pub mod config;
pub mod connection;
pub mod dispatcher;
pub mod errors;
pub mod events;
pub mod logging;
pub mod rooms;
pub mod service;
pub mod status;
pub mod transport;

// Main service API
pub use config::{BackoffStrategy, RealtimeConfig, RealtimeDefaults};
pub use errors::{RealtimeError, RealtimeResult};
pub use service::RealtimeService;

// Event model
pub use events::{EventId, EventPriority, EventType, RealtimeEvent};

// Connection lifecycle
pub use connection::{ConnectionState, ConnectionSupervisor};

// Subscriptions
pub use dispatcher::{EventDispatcher, Subscription, SubscriptionId};

// Rooms
pub use rooms::{RoomMessage, RoomRegistry};

// Status and statistics
pub use status::{ConnectionStats, StatsRecorder, StatusReporter, SystemHealth, SystemStatus};

// Transport boundary
pub use transport::{EventTransport, HttpTransport, MockTransport};

// Logging
pub use logging::{init_logging, LoggingConfig};
