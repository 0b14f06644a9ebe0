//! Transport seam
//!
//! The remote gateway's wire protocol (framing, heartbeats, payload
//! decoding) lives behind this trait as an opaque dependency. A transport
//! opens one authenticated session at a time and streams decoded events
//! over a channel, in the order the wire produced them.

use async_trait::async_trait;
use tokio::sync::mpsc;

use relay_core::Message;

/// Raw failure reported by the transport, before classification
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
    /// Structured status code, when the transport has one
    pub code: Option<u16>,
}

impl TransportError {
    #[must_use]
    pub fn new(message: impl Into<String>, code: Option<u16>) -> Self {
        Self {
            message: message.into(),
            code,
        }
    }
}

/// Decoded events delivered by an open session
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// Session authenticated and ready
    Ready,
    /// New message
    MessageCreate(Message),
    /// Message edited
    MessageUpdate(Message),
    /// Message removed
    MessageDelete {
        message_id: String,
        channel_id: String,
    },
    /// Session ended remotely
    Disconnected { reason: String },
    /// Transport-level failure
    Error {
        message: String,
        code: Option<u16>,
    },
}

/// Control handle for an open session
#[async_trait]
pub trait SessionHandle: Send + Sync {
    /// Whether the underlying session currently reports readiness
    fn is_ready(&self) -> bool;

    /// Tear the session down. Idempotent.
    async fn close(&self);
}

/// An open, authenticated gateway session
pub struct TransportSession {
    /// Decoded event stream, in wire order
    pub events: mpsc::Receiver<TransportEvent>,
    /// Control handle
    pub handle: Box<dyn SessionHandle>,
}

impl std::fmt::Debug for TransportSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportSession")
            .field("ready", &self.handle.is_ready())
            .finish()
    }
}

/// Connector for the remote gateway
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open a session authenticated with `token`.
    ///
    /// The token has already passed the local format check; failures here
    /// are remote or I/O failures.
    async fn open(&self, token: &str) -> Result<TransportSession, TransportError>;
}
