//! Reconnect backoff schedule
//!
//! Delay doubles with each consecutive failed attempt, capped at a maximum:
//! `delay(n) = min(base * 2^(n-1), max)` with attempt numbering starting
//! at 1.

use std::time::Duration;

/// Compute the delay before reconnect attempt `attempt` (1-based).
///
/// Saturates instead of overflowing for large attempt numbers.
#[must_use]
pub fn reconnect_delay(attempt: u32, base: Duration, max: Duration) -> Duration {
    let attempt = attempt.max(1);
    let shift = (attempt - 1).min(63);
    let factor = 1u64.checked_shl(shift).unwrap_or(u64::MAX);
    let delay_ms = base.as_millis() as u64;
    let scaled = Duration::from_millis(delay_ms.saturating_mul(factor));
    scaled.min(max)
}
