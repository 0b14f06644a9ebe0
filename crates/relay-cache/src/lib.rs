//! # relay-cache
//!
//! Memory-bounded caching for observed gateway state: a generic
//! least-recently-used [`BoundedCache`] and the [`MessageStore`] that keeps
//! one bounded cache per channel plus flat channel/group registries.
//!
//! Nothing here is persisted; the store resets on restart by design.

pub mod error;
pub mod lru;
pub mod store;

pub use error::StoreError;
pub use lru::BoundedCache;
pub use store::{ChannelMessages, MessageStore, StoreStats};
