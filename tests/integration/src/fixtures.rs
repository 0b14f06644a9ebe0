//! Shared test fixtures

use std::time::Duration;

use chrono::{DateTime, Utc};

use relay_common::ConnectionSettings;
use relay_core::{Author, Channel, Group, Message};

/// A token that passes the local format check
#[must_use]
pub fn valid_token() -> String {
    format!("M{}.{}.{}", "A".repeat(23), "bcdef1", "x".repeat(27))
}

/// Millisecond-scale settings so reconnect scenarios run fast
#[must_use]
pub fn fast_settings() -> ConnectionSettings {
    ConnectionSettings {
        connect_timeout_ms: 500,
        health_check_interval_ms: 25,
        max_reconnect_attempts: 3,
        reconnect_delay_start_ms: 10,
        reconnect_delay_max_ms: 40,
        enable_health_checks: true,
    }
}

#[must_use]
pub fn author(id: &str, name: &str) -> Author {
    Author {
        id: id.to_string(),
        username: name.to_lowercase(),
        display_name: name.to_string(),
        avatar: None,
        bot: false,
    }
}

#[must_use]
pub fn message(id: &str, channel_id: &str, content: &str) -> Message {
    message_at(id, channel_id, content, Utc::now())
}

#[must_use]
pub fn message_at(id: &str, channel_id: &str, content: &str, timestamp: DateTime<Utc>) -> Message {
    Message {
        id: id.to_string(),
        author: author("10", "Quokka"),
        content: content.to_string(),
        timestamp,
        edited_timestamp: None,
        channel_id: channel_id.to_string(),
        channel_name: format!("channel-{channel_id}"),
        group_id: Some("1000".to_string()),
        group_name: Some("Test Server".to_string()),
        attachments: Vec::new(),
        embeds: Vec::new(),
        reactions: Vec::new(),
        reply_to: None,
    }
}

#[must_use]
pub fn bot_message(id: &str, channel_id: &str, content: &str) -> Message {
    let mut msg = message(id, channel_id, content);
    msg.author.bot = true;
    msg
}

#[must_use]
pub fn group_with_channels() -> Group {
    Group {
        id: "1000".to_string(),
        name: "Test Server".to_string(),
        owner_id: "10".to_string(),
        roles: Vec::new(),
        member_count: 5,
        channels: vec![
            Channel::new_text("100", "1000", "general"),
            Channel::new_text("101", "1000", "random"),
        ],
    }
}

/// Poll `condition` until it holds or `timeout` elapses
pub async fn wait_until<F>(condition: F, timeout: Duration) -> bool
where
    F: Fn() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
