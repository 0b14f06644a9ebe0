//! Typed gateway event set

mod gateway_event;

pub use gateway_event::GatewayEvent;
