//! Connection states
//!
//! Two layers, two state sets: [`ConnectionStatus`] is the gateway
//! connection's own view of its transport session; [`ConnectionState`] is
//! the manager's authoritative lifecycle state, the one callers should
//! treat as the source of truth.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Manager lifecycle state. Exactly one current value per manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// Never connected
    #[default]
    Idle,
    /// Connect in progress
    Connecting,
    /// Connected and healthy
    Connected,
    /// Automatic reconnection in progress
    Reconnecting,
    /// Teardown in progress
    Disconnecting,
    /// Cleanly disconnected
    Disconnected,
    /// Terminal failure; requires explicit connect/reconnect
    Error,
}

impl ConnectionState {
    /// Get the string representation of the state
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Reconnecting => "reconnecting",
            Self::Disconnecting => "disconnecting",
            Self::Disconnected => "disconnected",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Gateway connection sub-state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// No live session
    #[default]
    Disconnected,
    /// Session opening
    Connecting,
    /// Session ready
    Connected,
    /// Session opening with a replayed credential
    Reconnecting,
    /// Last attempt failed
    Error,
}

impl ConnectionStatus {
    /// Get the string representation of the status
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Reconnecting => "reconnecting",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
