//! Connection lifecycle
//!
//! [`GatewayConnection`] owns the live transport session;
//! [`ConnectionManager`] is the authoritative state machine above it.

mod gateway;
mod health;
mod manager;
mod state;

pub use gateway::GatewayConnection;
pub use health::{ConnectionHealth, ConnectionStats};
pub use manager::ConnectionManager;
pub use state::{ConnectionState, ConnectionStatus};
