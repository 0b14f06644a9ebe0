//! Multi-channel message store
//!
//! One bounded cache per channel, created lazily on first insert, plus flat
//! registries for channel and group metadata. All methods take `&self`;
//! share the store behind an `Arc`.

mod channel;

pub use channel::ChannelMessages;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;

use relay_common::StoreSettings;
use relay_core::{Channel, ChannelKind, Group, Message};

use crate::error::StoreError;

/// Point-in-time store counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Sum of cached messages across all channel caches
    pub total_messages: usize,
    /// Registered channels
    pub channel_count: usize,
    /// Registered groups
    pub group_count: usize,
    /// Channel caches created so far
    pub channel_cache_count: usize,
}

/// Bounded, queryable cache of recently observed messages, channels, and groups
pub struct MessageStore {
    settings: StoreSettings,
    caches: DashMap<String, Arc<ChannelMessages>>,
    channels: DashMap<String, Channel>,
    groups: DashMap<String, Group>,
}

impl MessageStore {
    /// Create a store with the given settings
    #[must_use]
    pub fn new(settings: StoreSettings) -> Self {
        Self {
            settings,
            caches: DashMap::new(),
            channels: DashMap::new(),
            groups: DashMap::new(),
        }
    }

    /// Create a store wrapped in Arc
    #[must_use]
    pub fn new_shared(settings: StoreSettings) -> Arc<Self> {
        Arc::new(Self::new(settings))
    }

    /// Get the channel-scoped handle for `channel_id`, if one exists yet
    #[must_use]
    pub fn channel(&self, channel_id: &str) -> Option<Arc<ChannelMessages>> {
        self.caches.get(channel_id).map(|c| c.clone())
    }

    /// Add or overwrite a message, routed by its own `channel_id`.
    ///
    /// The per-channel cache is created lazily on first insert.
    pub fn add_message(&self, message: Message) -> Result<(), StoreError> {
        let cache = self
            .caches
            .entry(message.channel_id.clone())
            .or_insert_with(|| {
                tracing::debug!(
                    channel_id = %message.channel_id,
                    capacity = self.settings.max_messages_per_channel,
                    "created channel cache"
                );
                Arc::new(ChannelMessages::new(
                    message.channel_id.clone(),
                    self.settings.max_messages_per_channel,
                ))
            })
            .clone();

        cache.add(message)?;
        self.enforce_total_cap();
        Ok(())
    }

    /// Replace an existing message. A no-op (not an insert) when the
    /// message's channel has no cache yet.
    pub fn update_message(&self, message: Message) -> Result<(), StoreError> {
        match self.channel(&message.channel_id) {
            Some(cache) => cache.update(message),
            None => Ok(()),
        }
    }

    /// Delete a message.
    ///
    /// With a `channel_id`, deletes from exactly that channel's cache.
    /// Without one, scans channel caches in a stable (id-sorted) order and
    /// stops at the first match.
    pub fn delete_message(&self, message_id: &str, channel_id: Option<&str>) -> bool {
        if let Some(channel_id) = channel_id {
            return self
                .channel(channel_id)
                .is_some_and(|cache| cache.delete(message_id));
        }

        for cache in self.caches_in_stable_order() {
            if cache.delete(message_id) {
                return true;
            }
        }
        false
    }

    /// Look up a message by id across all channel caches (linear cost)
    #[must_use]
    pub fn get_message(&self, message_id: &str) -> Option<Message> {
        self.caches_in_stable_order()
            .into_iter()
            .find_map(|cache| cache.get(message_id))
    }

    /// Messages for a channel, newest first. Empty when the channel has no
    /// cache yet.
    #[must_use]
    pub fn channel_messages(
        &self,
        channel_id: &str,
        limit: Option<usize>,
        before: Option<DateTime<Utc>>,
        after: Option<DateTime<Utc>>,
    ) -> Vec<Message> {
        match self.channel(channel_id) {
            Some(cache) => cache.page(limit, before, after),
            None => Vec::new(),
        }
    }

    /// Case-insensitive substring search across all channels, globally
    /// sorted newest-first before `limit` applies
    #[must_use]
    pub fn search_messages(&self, query: &str, limit: Option<usize>) -> Vec<Message> {
        let mut matches: Vec<Message> = self
            .caches
            .iter()
            .flat_map(|cache| cache.search(query, None))
            .collect();
        matches.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        if let Some(limit) = limit {
            matches.truncate(limit);
        }
        matches
    }

    /// Add or update a channel in the registry
    pub fn add_channel(&self, channel: Channel) {
        self.channels.insert(channel.id.clone(), channel);
    }

    /// Get a channel by id
    #[must_use]
    pub fn get_channel(&self, channel_id: &str) -> Option<Channel> {
        self.channels.get(channel_id).map(|c| c.clone())
    }

    /// All registered channels
    #[must_use]
    pub fn channels(&self) -> Vec<Channel> {
        self.channels.iter().map(|c| c.clone()).collect()
    }

    /// Registered channels belonging to a group
    #[must_use]
    pub fn group_channels(&self, group_id: &str) -> Vec<Channel> {
        self.channels
            .iter()
            .filter(|c| c.group_id.as_deref() == Some(group_id))
            .map(|c| c.clone())
            .collect()
    }

    /// Registered direct-message channels
    #[must_use]
    pub fn dm_channels(&self) -> Vec<Channel> {
        self.channels
            .iter()
            .filter(|c| c.kind == ChannelKind::Dm)
            .map(|c| c.clone())
            .collect()
    }

    /// Add or update a group. Every channel the group lists is upserted
    /// into the flat channel registry.
    pub fn add_group(&self, group: Group) {
        for channel in &group.channels {
            self.add_channel(channel.clone());
        }
        tracing::debug!(
            group_id = %group.id,
            channels = group.channels.len(),
            "registered group"
        );
        self.groups.insert(group.id.clone(), group);
    }

    /// Get a group by id
    #[must_use]
    pub fn get_group(&self, group_id: &str) -> Option<Group> {
        self.groups.get(group_id).map(|g| g.clone())
    }

    /// All registered groups
    #[must_use]
    pub fn groups(&self) -> Vec<Group> {
        self.groups.iter().map(|g| g.clone()).collect()
    }

    /// Point-in-time counters
    #[must_use]
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            total_messages: self.caches.iter().map(|c| c.len()).sum(),
            channel_count: self.channels.len(),
            group_count: self.groups.len(),
            channel_cache_count: self.caches.len(),
        }
    }

    /// Drop all channel caches and registries
    pub fn clear(&self) {
        self.caches.clear();
        self.channels.clear();
        self.groups.clear();
        tracing::debug!("message store cleared");
    }

    /// Channel caches sorted by channel id, so cross-channel scans have a
    /// deterministic order within a process.
    fn caches_in_stable_order(&self) -> Vec<Arc<ChannelMessages>> {
        let mut caches: Vec<Arc<ChannelMessages>> =
            self.caches.iter().map(|c| c.clone()).collect();
        caches.sort_by(|a, b| a.channel_id().cmp(b.channel_id()));
        caches
    }

    /// Keep the store-wide total within `max_total_messages` by evicting
    /// LRU entries from the most heavily loaded channel cache.
    fn enforce_total_cap(&self) {
        loop {
            let total: usize = self.caches.iter().map(|c| c.len()).sum();
            if total <= self.settings.max_total_messages {
                return;
            }

            let largest = self
                .caches
                .iter()
                .max_by_key(|c| c.len())
                .map(|c| c.clone());
            let Some(cache) = largest else {
                return;
            };
            if !cache.evict_lru() {
                return;
            }
            tracing::debug!(
                channel_id = %cache.channel_id(),
                "evicted message to respect store-wide cap"
            );
        }
    }
}

impl Default for MessageStore {
    fn default() -> Self {
        Self::new(StoreSettings::default())
    }
}

impl std::fmt::Debug for MessageStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageStore")
            .field("channel_caches", &self.caches.len())
            .field("channels", &self.channels.len())
            .field("groups", &self.groups.len())
            .finish()
    }
}
