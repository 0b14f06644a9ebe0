//! Channel entity - a named conversation scope inside a group, or a DM

use serde::{Deserialize, Serialize};

/// Channel kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    /// Group text channel
    #[default]
    Text,
    /// Direct message between users
    Dm,
    /// Voice channel
    Voice,
    /// Announcement channel
    Announcement,
    /// Category for organizing channels
    Category,
}

impl ChannelKind {
    /// Get the string representation of the kind
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Dm => "dm",
            Self::Voice => "voice",
            Self::Announcement => "announcement",
            Self::Category => "category",
        }
    }
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Channel entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub kind: ChannelKind,
    /// None for direct messages
    pub group_id: Option<String>,
    /// Containing category, if any
    pub parent_id: Option<String>,
    pub position: i32,
    pub topic: Option<String>,
}

impl Channel {
    /// Create a new group text channel
    #[must_use]
    pub fn new_text(id: impl Into<String>, group_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: ChannelKind::Text,
            group_id: Some(group_id.into()),
            parent_id: None,
            position: 0,
            topic: None,
        }
    }

    /// Create a new DM channel
    #[must_use]
    pub fn new_dm(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: ChannelKind::Dm,
            group_id: None,
            parent_id: None,
            position: 0,
            topic: None,
        }
    }

    /// Check if this channel carries messages (text, DM, or announcement)
    #[inline]
    #[must_use]
    pub fn is_text(&self) -> bool {
        matches!(
            self.kind,
            ChannelKind::Text | ChannelKind::Dm | ChannelKind::Announcement
        )
    }

    /// Check if this is a DM channel
    #[inline]
    #[must_use]
    pub fn is_dm(&self) -> bool {
        matches!(self.kind, ChannelKind::Dm)
    }

    /// Check if this is a category
    #[inline]
    #[must_use]
    pub fn is_category(&self) -> bool {
        matches!(self.kind, ChannelKind::Category)
    }

    /// Check if this channel belongs to a group
    #[inline]
    #[must_use]
    pub fn is_group_channel(&self) -> bool {
        self.group_id.is_some()
    }
}
