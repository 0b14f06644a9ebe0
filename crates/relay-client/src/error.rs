//! Client error types
//!
//! Caller-misuse errors (`InvalidState`, `MissingCredential`,
//! `AlreadyConnecting`, `InvalidToken`) surface synchronously and are never
//! retried. Classified gateway failures carry their own recoverability,
//! which drives the manager's reconnect policy.

use std::time::Duration;

use relay_common::TokenError;
use relay_core::ConnectionError;

use crate::connection::ConnectionState;

/// Errors returned by the connection layer
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClientError {
    /// Credential failed the local format check
    #[error("invalid bot token: {0}")]
    InvalidToken(#[from] TokenError),

    /// Gateway connect called while already connecting or connected
    #[error("already connecting or connected")]
    AlreadyConnecting,

    /// Manager lifecycle call rejected by the state machine
    #[error("operation not allowed while {state}")]
    InvalidState { state: ConnectionState },

    /// Manual reconnect without a previously stored credential
    #[error("no stored credential; connect first")]
    MissingCredential,

    /// Connect attempt exceeded the configured timeout
    #[error("connect timed out after {0:?}")]
    Timeout(Duration),

    /// Automatic reconnection gave up
    #[error("reconnect attempts exhausted after {attempts}")]
    ReconnectExhausted { attempts: u32 },

    /// Classified gateway failure
    #[error(transparent)]
    Gateway(#[from] ConnectionError),
}

impl ClientError {
    /// Whether retrying later could succeed
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Gateway(err) => err.recoverable,
            Self::Timeout(_) => true,
            Self::InvalidToken(_)
            | Self::AlreadyConnecting
            | Self::InvalidState { .. }
            | Self::MissingCredential
            | Self::ReconnectExhausted { .. } => false,
        }
    }
}
