//! Store error types

/// Errors surfaced by the message store
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A message was pushed through a channel-scoped handle whose channel
    /// differs from the message's own channel id.
    #[error("message channel {message_channel} does not match store channel {store_channel}")]
    ChannelMismatch {
        message_channel: String,
        store_channel: String,
    },
}
