//! # relay-client
//!
//! Resilient client for a real-time messaging gateway.
//!
//! [`GatewayConnection`] owns the single live transport session: it
//! authenticates, translates raw transport events into a small typed event
//! set, and classifies failures. [`ConnectionManager`] sits above it as the
//! authoritative lifecycle state machine: timeout-bound connects, periodic
//! health checks, backoff-scheduled reconnection, and derived statistics.
//! The manager - not the connection - owns reconnect policy.

pub mod backoff;
pub mod connection;
pub mod error;
pub mod events;
pub mod subscribers;
pub mod transport;

pub use connection::{
    ConnectionHealth, ConnectionManager, ConnectionState, ConnectionStats, ConnectionStatus,
    GatewayConnection,
};
pub use error::ClientError;
pub use events::ManagerEvent;
pub use subscribers::{SubscriberSet, SubscriberToken};
pub use transport::{SessionHandle, Transport, TransportError, TransportEvent, TransportSession};
