//! High-level manager events

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::connection::{ConnectionHealth, ConnectionState};

/// Events emitted by the connection manager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ManagerEvent {
    /// Lifecycle state transition
    StateChange {
        old: ConnectionState,
        new: ConnectionState,
    },
    /// Periodic health snapshot
    HealthUpdate { health: ConnectionHealth },
    /// A reconnect was scheduled; fires before the delay elapses
    ReconnectAttempt { attempt: u32, delay: Duration },
    /// A scheduled reconnect succeeded
    ReconnectSuccess { attempt: u32 },
    /// A scheduled reconnect failed
    ReconnectFailed { attempt: u32, reason: String },
    /// Connection loss detected
    ConnectionLost { reason: String },
}

impl ManagerEvent {
    /// Get the event name (the serialized `type` tag)
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::StateChange { .. } => "stateChange",
            Self::HealthUpdate { .. } => "healthUpdate",
            Self::ReconnectAttempt { .. } => "reconnectAttempt",
            Self::ReconnectSuccess { .. } => "reconnectSuccess",
            Self::ReconnectFailed { .. } => "reconnectFailed",
            Self::ConnectionLost { .. } => "connectionLost",
        }
    }
}

impl fmt::Display for ManagerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
