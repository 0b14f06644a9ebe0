//! Error classification for connection failures

mod connection_error;

pub use connection_error::{ConnectionError, ConnectionErrorKind};
