//! Connection health metrics and derived statistics

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Health metrics owned and mutated exclusively by the manager.
///
/// Callers only ever see a cloned snapshot, never a live reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionHealth {
    /// When the current connection was established
    pub connected_at: Option<DateTime<Utc>>,
    /// When the last health probe ran
    pub last_ping: Option<DateTime<Utc>>,
    /// Latency measured by the last health probe
    pub ping_latency: Option<Duration>,
    pub messages_received: u64,
    pub messages_sent: u64,
    pub reconnect_count: u32,
    pub last_disconnect_reason: Option<String>,
}

/// Derived, point-in-time statistics. Computed on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConnectionStats {
    /// Time since the connection was established; zero if never connected
    pub uptime: Duration,
    /// Mean of the retained latency samples
    pub avg_ping_latency: Option<Duration>,
    /// Received-message rate over the trailing five minutes
    pub messages_per_minute: f64,
    /// 100 with no reconnects, degraded by reconnects per uptime hour
    pub connection_stability: f64,
}

impl ConnectionStats {
    /// Stability score: 100 when no reconnect happened, otherwise
    /// `max(0, 100 - (reconnects / uptime_hours) * 10)`.
    #[must_use]
    pub fn stability(reconnect_count: u32, uptime: Duration) -> f64 {
        if reconnect_count == 0 {
            return 100.0;
        }
        let uptime_hours = uptime.as_secs_f64() / 3600.0;
        if uptime_hours <= 0.0 {
            return 0.0;
        }
        (100.0 - (f64::from(reconnect_count) / uptime_hours) * 10.0).max(0.0)
    }
}
