//! Connection failure classification
//!
//! Raw transport failures are folded into a small taxonomy that decides
//! whether automatic reconnection is worthwhile. Classification prefers a
//! structured status code when the transport provides one and falls back to
//! substring heuristics for unstructured failures.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Broad category of a connection failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionErrorKind {
    /// Transient I/O failure (reset, timeout, DNS)
    Network,
    /// Credential rejected
    Auth,
    /// Remote throttling
    RateLimit,
    /// Anything unclassified
    Unknown,
}

impl ConnectionErrorKind {
    /// Get the string representation of the kind
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Auth => "auth",
            Self::RateLimit => "rate_limit",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ConnectionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classified connection failure. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[error("{kind} error: {message}")]
pub struct ConnectionError {
    pub kind: ConnectionErrorKind,
    pub message: String,
    pub code: Option<u16>,
    pub recoverable: bool,
}

impl ConnectionError {
    /// Create a recoverable network error
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: ConnectionErrorKind::Network,
            message: message.into(),
            code: None,
            recoverable: true,
        }
    }

    /// Create a non-recoverable authentication error
    #[must_use]
    pub fn auth(message: impl Into<String>, code: Option<u16>) -> Self {
        Self {
            kind: ConnectionErrorKind::Auth,
            message: message.into(),
            code,
            recoverable: false,
        }
    }

    /// Create a recoverable rate-limit error
    #[must_use]
    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self {
            kind: ConnectionErrorKind::RateLimit,
            message: message.into(),
            code: Some(429),
            recoverable: true,
        }
    }

    /// Create an unclassified error. Treated as recoverable so retry logic
    /// fails open.
    #[must_use]
    pub fn unknown(message: impl Into<String>) -> Self {
        Self {
            kind: ConnectionErrorKind::Unknown,
            message: message.into(),
            code: None,
            recoverable: true,
        }
    }

    /// Classify a raw failure into the taxonomy.
    ///
    /// A structured status code wins over the message text; the substring
    /// heuristics only apply to unstructured/legacy failures.
    #[must_use]
    pub fn classify(code: Option<u16>, message: impl Into<String>) -> Self {
        let message = message.into();

        if let Some(code) = code {
            match code {
                401 | 403 => {
                    return Self {
                        kind: ConnectionErrorKind::Auth,
                        message,
                        code: Some(code),
                        recoverable: false,
                    }
                }
                429 => {
                    return Self {
                        kind: ConnectionErrorKind::RateLimit,
                        message,
                        code: Some(code),
                        recoverable: true,
                    }
                }
                408 | 500..=599 => {
                    return Self {
                        kind: ConnectionErrorKind::Network,
                        message,
                        code: Some(code),
                        recoverable: true,
                    }
                }
                _ => {}
            }
        }

        let lower = message.to_lowercase();

        if lower.contains("connection reset")
            || lower.contains("connection refused")
            || lower.contains("timed out")
            || lower.contains("timeout")
            || lower.contains("broken pipe")
            || lower.contains("dns")
            || lower.contains("failed to lookup")
        {
            return Self {
                kind: ConnectionErrorKind::Network,
                message,
                code,
                recoverable: true,
            };
        }

        if lower.contains("invalid token")
            || lower.contains("unauthorized")
            || lower.contains("forbidden")
            || lower.contains("401")
            || lower.contains("403")
        {
            return Self {
                kind: ConnectionErrorKind::Auth,
                message,
                code,
                recoverable: false,
            };
        }

        if lower.contains("rate limit") || lower.contains("too many requests") || lower.contains("429")
        {
            return Self {
                kind: ConnectionErrorKind::RateLimit,
                message,
                code,
                recoverable: true,
            };
        }

        Self {
            kind: ConnectionErrorKind::Unknown,
            message,
            code,
            recoverable: true,
        }
    }

    /// Check if this is an authentication failure
    #[inline]
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self.kind, ConnectionErrorKind::Auth)
    }

    /// Check if this is a rate-limit failure
    #[inline]
    #[must_use]
    pub fn is_rate_limit(&self) -> bool {
        matches!(self.kind, ConnectionErrorKind::RateLimit)
    }
}
