//! Group entity - a server-like collection of channels and roles

use serde::{Deserialize, Serialize};

use super::{Channel, ChannelKind};

/// Role inside a group. Permissions are an opaque string from the remote
/// gateway and are never interpreted here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
    pub name: String,
    pub color: u32,
    pub position: i32,
    pub permissions: String,
}

/// Group (server-like collection of channels) entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    #[serde(default)]
    pub roles: Vec<Role>,
    pub member_count: u32,
    #[serde(default)]
    pub channels: Vec<Channel>,
}

impl Group {
    /// Channels of a given kind, in position order
    #[must_use]
    pub fn channels_of_kind(&self, kind: ChannelKind) -> Vec<&Channel> {
        let mut channels: Vec<&Channel> = self.channels.iter().filter(|c| c.kind == kind).collect();
        channels.sort_by_key(|c| c.position);
        channels
    }

    /// Look up a channel by id
    #[must_use]
    pub fn channel(&self, channel_id: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.id == channel_id)
    }
}
