//! Per-channel message cache
//!
//! A channel-scoped handle over one bounded cache. The handle rejects
//! messages whose `channel_id` differs from its own; the owning store always
//! routes by the message's channel id, so a mismatch only occurs through
//! direct misuse of a handle.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use relay_core::Message;

use crate::error::StoreError;
use crate::lru::BoundedCache;

/// Messages cached for a single channel, newest queries first
pub struct ChannelMessages {
    channel_id: String,
    messages: Mutex<BoundedCache<String, Message>>,
}

impl ChannelMessages {
    /// Create a cache for `channel_id` holding at most `capacity` messages
    #[must_use]
    pub fn new(channel_id: impl Into<String>, capacity: usize) -> Self {
        Self {
            channel_id: channel_id.into(),
            messages: Mutex::new(BoundedCache::new(capacity)),
        }
    }

    /// Get the owning channel id
    #[must_use]
    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    /// Insert or overwrite a message keyed by its id.
    ///
    /// Fails with [`StoreError::ChannelMismatch`] when the message belongs
    /// to a different channel; the cache is left unchanged in that case.
    pub fn add(&self, message: Message) -> Result<(), StoreError> {
        if message.channel_id != self.channel_id {
            return Err(StoreError::ChannelMismatch {
                message_channel: message.channel_id,
                store_channel: self.channel_id.clone(),
            });
        }

        let mut messages = self.messages.lock();
        if let Some((evicted_id, _)) = messages.set(message.id.clone(), message) {
            tracing::trace!(
                channel_id = %self.channel_id,
                message_id = %evicted_id,
                "evicted least-recently-used message"
            );
        }
        Ok(())
    }

    /// Replacement semantics identical to [`add`](Self::add)
    pub fn update(&self, message: Message) -> Result<(), StoreError> {
        self.add(message)
    }

    /// Get a message by id, marking it most-recently-used
    #[must_use]
    pub fn get(&self, message_id: &str) -> Option<Message> {
        self.messages.lock().get(&message_id.to_string()).cloned()
    }

    /// All cached messages, newest first
    #[must_use]
    pub fn all(&self) -> Vec<Message> {
        let messages = self.messages.lock();
        let mut all: Vec<Message> = messages.values().cloned().collect();
        all.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        all
    }

    /// Messages newest-first with pagination bounds.
    ///
    /// `before`/`after` are inclusive timestamp bounds; `limit` caps the
    /// result after filtering.
    #[must_use]
    pub fn page(
        &self,
        limit: Option<usize>,
        before: Option<DateTime<Utc>>,
        after: Option<DateTime<Utc>>,
    ) -> Vec<Message> {
        let mut messages = self.all();

        if let Some(before) = before {
            messages.retain(|m| m.timestamp <= before);
        }
        if let Some(after) = after {
            messages.retain(|m| m.timestamp >= after);
        }
        if let Some(limit) = limit {
            messages.truncate(limit);
        }
        messages
    }

    /// Case-insensitive substring search over message content, newest first
    #[must_use]
    pub fn search(&self, query: &str, limit: Option<usize>) -> Vec<Message> {
        let query = query.to_lowercase();
        let mut matches: Vec<Message> = self
            .all()
            .into_iter()
            .filter(|m| m.content.to_lowercase().contains(&query))
            .collect();
        if let Some(limit) = limit {
            matches.truncate(limit);
        }
        matches
    }

    /// Delete a message by id, reporting whether a deletion occurred
    pub fn delete(&self, message_id: &str) -> bool {
        self.messages.lock().remove(&message_id.to_string())
    }

    /// Evict the least-recently-used message, reporting whether one existed
    pub(crate) fn evict_lru(&self) -> bool {
        self.messages.lock().evict_lru().is_some()
    }

    /// Get the number of cached messages
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    /// Check if the cache is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }

    /// Drop all cached messages
    pub fn clear(&self) {
        self.messages.lock().clear();
    }
}

impl std::fmt::Debug for ChannelMessages {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelMessages")
            .field("channel_id", &self.channel_id)
            .field("len", &self.len())
            .finish()
    }
}
