//! Integration test utilities for the relay client
//!
//! This crate provides a scripted mock transport and shared fixtures for
//! driving connect/loss/reconnect/cache flows end to end.

pub mod fixtures;
pub mod mock;

pub use fixtures::*;
pub use mock::*;
