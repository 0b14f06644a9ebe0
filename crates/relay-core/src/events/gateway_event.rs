//! Low-level gateway events
//!
//! The small typed event set emitted by the gateway connection. Message
//! events for a given channel are emitted in the order the transport
//! produced them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::entities::Message;
use crate::error::ConnectionError;

/// Events emitted by the gateway connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GatewayEvent {
    /// Session is authenticated and ready
    Ready,
    /// New message observed
    Message { message: Message },
    /// Existing message edited
    MessageUpdate { message: Message },
    /// Message removed
    MessageDelete {
        message_id: String,
        channel_id: String,
    },
    /// Connection attempt started
    Connecting,
    /// Connection attempt with a replayed credential started
    Reconnecting,
    /// Session ended
    Disconnect { reason: String },
    /// Classified failure
    Error { error: ConnectionError },
}

impl GatewayEvent {
    /// Get the event name (the serialized `type` tag)
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Message { .. } => "message",
            Self::MessageUpdate { .. } => "messageUpdate",
            Self::MessageDelete { .. } => "messageDelete",
            Self::Connecting => "connecting",
            Self::Reconnecting => "reconnecting",
            Self::Disconnect { .. } => "disconnect",
            Self::Error { .. } => "error",
        }
    }
}

impl fmt::Display for GatewayEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
