//! Client configuration structs
//!
//! Loads configuration from environment variables with defaults for every
//! field, so a zero-config start is always possible.

use serde::Deserialize;
use std::env;
use std::time::Duration;

/// Main client configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub connection: ConnectionSettings,
    #[serde(default)]
    pub store: StoreSettings,
}

/// Connection lifecycle settings
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionSettings {
    /// Initial connect timeout in milliseconds
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Health-check interval in milliseconds
    #[serde(default = "default_health_check_interval_ms")]
    pub health_check_interval_ms: u64,
    /// Reconnect attempts before giving up
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
    /// First reconnect delay in milliseconds; doubles per attempt
    #[serde(default = "default_reconnect_delay_start_ms")]
    pub reconnect_delay_start_ms: u64,
    /// Reconnect delay cap in milliseconds
    #[serde(default = "default_reconnect_delay_max_ms")]
    pub reconnect_delay_max_ms: u64,
    /// Whether periodic health checks run while connected
    #[serde(default = "default_enable_health_checks")]
    pub enable_health_checks: bool,
}

impl ConnectionSettings {
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    #[must_use]
    pub fn health_check_interval(&self) -> Duration {
        Duration::from_millis(self.health_check_interval_ms)
    }

    #[must_use]
    pub fn reconnect_delay_start(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_start_ms)
    }

    #[must_use]
    pub fn reconnect_delay_max(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_max_ms)
    }
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout_ms(),
            health_check_interval_ms: default_health_check_interval_ms(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
            reconnect_delay_start_ms: default_reconnect_delay_start_ms(),
            reconnect_delay_max_ms: default_reconnect_delay_max_ms(),
            enable_health_checks: default_enable_health_checks(),
        }
    }
}

/// Message store settings
#[derive(Debug, Clone, Deserialize)]
pub struct StoreSettings {
    /// Per-channel bounded cache capacity
    #[serde(default = "default_max_messages_per_channel")]
    pub max_messages_per_channel: usize,
    /// Store-wide cap across all channel caches
    #[serde(default = "default_max_total_messages")]
    pub max_total_messages: usize,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            max_messages_per_channel: default_max_messages_per_channel(),
            max_total_messages: default_max_total_messages(),
        }
    }
}

// Default value functions
fn default_connect_timeout_ms() -> u64 {
    10_000 // 10 seconds
}

fn default_health_check_interval_ms() -> u64 {
    30_000 // 30 seconds
}

fn default_max_reconnect_attempts() -> u32 {
    5
}

fn default_reconnect_delay_start_ms() -> u64 {
    1_000 // 1 second
}

fn default_reconnect_delay_max_ms() -> u64 {
    30_000 // 30 seconds
}

fn default_enable_health_checks() -> bool {
    true
}

fn default_max_messages_per_channel() -> usize {
    1_000
}

fn default_max_total_messages() -> usize {
    10_000
}

impl ClientConfig {
    /// Load configuration from `RELAY_*` environment variables.
    ///
    /// Unset variables fall back to defaults; variables that are set but do
    /// not parse are an error rather than a silent default.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            connection: ConnectionSettings {
                connect_timeout_ms: env_parse(
                    "RELAY_CONNECT_TIMEOUT_MS",
                    default_connect_timeout_ms(),
                )?,
                health_check_interval_ms: env_parse(
                    "RELAY_HEALTH_CHECK_INTERVAL_MS",
                    default_health_check_interval_ms(),
                )?,
                max_reconnect_attempts: env_parse(
                    "RELAY_MAX_RECONNECT_ATTEMPTS",
                    default_max_reconnect_attempts(),
                )?,
                reconnect_delay_start_ms: env_parse(
                    "RELAY_RECONNECT_DELAY_START_MS",
                    default_reconnect_delay_start_ms(),
                )?,
                reconnect_delay_max_ms: env_parse(
                    "RELAY_RECONNECT_DELAY_MAX_MS",
                    default_reconnect_delay_max_ms(),
                )?,
                enable_health_checks: env_parse(
                    "RELAY_ENABLE_HEALTH_CHECKS",
                    default_enable_health_checks(),
                )?,
            },
            store: StoreSettings {
                max_messages_per_channel: env_parse(
                    "RELAY_MAX_MESSAGES_PER_CHANNEL",
                    default_max_messages_per_channel(),
                )?,
                max_total_messages: env_parse(
                    "RELAY_MAX_TOTAL_MESSAGES",
                    default_max_total_messages(),
                )?,
            },
        })
    }
}

/// Parse an environment variable, falling back to `default` when unset.
fn env_parse<T: std::str::FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue(var, raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
