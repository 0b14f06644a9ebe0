//! # relay-common
//!
//! Shared utilities: configuration loading, tracing setup, and credential
//! format validation.

pub mod auth;
pub mod config;
pub mod telemetry;

pub use auth::{mask_token, validate_token, TokenError};
pub use config::{ClientConfig, ConfigError, ConnectionSettings, StoreSettings};
pub use telemetry::{init_tracing, try_init_tracing, TracingConfig, TracingError};
