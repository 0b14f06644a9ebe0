//! Domain entities

mod channel;
mod group;
mod message;

pub use channel::{Channel, ChannelKind};
pub use group::{Group, Role};
pub use message::{
    Attachment, Author, Embed, EmbedAuthor, EmbedField, EmbedFooter, EmbedMedia, Message,
    MessageRef, Reaction, ReactionEmoji,
};
