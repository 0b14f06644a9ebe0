//! Message store scenarios: bounded caches, channel scoping, search,
//! pagination, and registry cascades.

use chrono::{Duration as ChronoDuration, Utc};

use integration_tests::{group_with_channels, message, message_at};
use relay_cache::{MessageStore, StoreError};
use relay_common::StoreSettings;
use relay_core::Channel;

fn store_with(per_channel: usize, total: usize) -> MessageStore {
    MessageStore::new(StoreSettings {
        max_messages_per_channel: per_channel,
        max_total_messages: total,
    })
}

#[test]
fn added_message_is_queryable_by_channel() {
    let store = store_with(10, 100);
    store.add_message(message("1", "A", "hello")).unwrap();

    let messages = store.channel_messages("A", None, None, None);
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].id, "1");

    // Unknown channels yield an empty sequence, not an error.
    assert!(store.channel_messages("B", None, None, None).is_empty());
}

#[test]
fn channel_scoped_handle_rejects_foreign_message() {
    let store = store_with(10, 100);
    store.add_message(message("1", "A", "hello")).unwrap();

    let handle = store.channel("A").expect("cache exists after insert");
    let err = handle.add(message("2", "B", "stray")).unwrap_err();
    assert!(matches!(err, StoreError::ChannelMismatch { .. }));

    // Store unchanged by the rejected insert.
    let stats = store.stats();
    assert_eq!(stats.total_messages, 1);
    assert_eq!(stats.channel_cache_count, 1);
    assert!(store.get_message("2").is_none());
}

#[test]
fn per_channel_cache_evicts_oldest_when_full() {
    let store = store_with(3, 100);
    for i in 0..5 {
        store
            .add_message(message(&i.to_string(), "A", &format!("msg {i}")))
            .unwrap();
    }

    let stats = store.stats();
    assert_eq!(stats.total_messages, 3);
    assert!(store.get_message("0").is_none());
    assert!(store.get_message("1").is_none());
    assert!(store.get_message("4").is_some());
}

#[test]
fn recently_read_messages_survive_eviction() {
    let store = store_with(3, 100);
    store.add_message(message("1", "A", "first")).unwrap();
    store.add_message(message("2", "A", "second")).unwrap();
    store.add_message(message("3", "A", "third")).unwrap();

    // Reading "1" promotes it; "2" becomes the eviction candidate.
    let handle = store.channel("A").unwrap();
    assert!(handle.get("1").is_some());

    store.add_message(message("4", "A", "fourth")).unwrap();
    assert!(store.get_message("1").is_some());
    assert!(store.get_message("2").is_none());
}

#[test]
fn search_is_case_insensitive_and_newest_first() {
    let store = store_with(10, 100);
    let base = Utc::now();
    store
        .add_message(message_at("1", "A", "food", base))
        .unwrap();
    store
        .add_message(message_at("2", "B", "Foobar", base + ChronoDuration::seconds(1)))
        .unwrap();
    store
        .add_message(message_at("3", "A", "nothing here", base + ChronoDuration::seconds(2)))
        .unwrap();

    let results = store.search_messages("foo", None);
    let ids: Vec<&str> = results.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["2", "1"]);

    let capped = store.search_messages("FOO", Some(1));
    assert_eq!(capped.len(), 1);
    assert_eq!(capped[0].id, "2");
}

#[test]
fn pagination_applies_bounds_then_limit() {
    let store = store_with(10, 100);
    let base = Utc::now();
    for i in 0..6 {
        store
            .add_message(message_at(
                &i.to_string(),
                "A",
                "msg",
                base + ChronoDuration::seconds(i),
            ))
            .unwrap();
    }

    let page = store.channel_messages(
        "A",
        Some(2),
        Some(base + ChronoDuration::seconds(4)),
        Some(base + ChronoDuration::seconds(1)),
    );
    let ids: Vec<&str> = page.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["4", "3"]);
}

#[test]
fn update_is_noop_for_unknown_channel() {
    let store = store_with(10, 100);
    store.update_message(message("1", "A", "edit")).unwrap();
    assert_eq!(store.stats().total_messages, 0);

    store.add_message(message("1", "A", "original")).unwrap();
    store.update_message(message("1", "A", "edited")).unwrap();
    let messages = store.channel_messages("A", None, None, None);
    assert_eq!(messages[0].content, "edited");
    assert_eq!(store.stats().total_messages, 1);
}

#[test]
fn delete_without_channel_scans_all_caches() {
    let store = store_with(10, 100);
    store.add_message(message("1", "A", "one")).unwrap();
    store.add_message(message("2", "B", "two")).unwrap();
    store.add_message(message("3", "C", "three")).unwrap();

    assert!(store.delete_message("2", None));
    assert!(!store.delete_message("2", None));
    assert_eq!(store.stats().total_messages, 2);

    // Scoped delete misses when pointed at the wrong channel.
    assert!(!store.delete_message("3", Some("A")));
    assert!(store.delete_message("3", Some("C")));
}

#[test]
fn store_total_cap_bounds_memory() {
    let store = store_with(10, 5);
    for i in 0..8 {
        store
            .add_message(message(&format!("a{i}"), "A", "msg"))
            .unwrap();
    }

    assert!(store.stats().total_messages <= 5);
    // The newest messages are the survivors.
    assert!(store.get_message("a7").is_some());
}

#[test]
fn group_registration_cascades_channels() {
    let store = store_with(10, 100);
    store.add_group(group_with_channels());

    assert_eq!(store.stats().group_count, 1);
    assert_eq!(store.stats().channel_count, 2);
    assert_eq!(store.group_channels("1000").len(), 2);
    assert!(store.get_channel("100").is_some());

    store.add_channel(Channel::new_dm("200", "quokka"));
    let dms = store.dm_channels();
    assert_eq!(dms.len(), 1);
    assert_eq!(dms[0].id, "200");
}

#[test]
fn clear_resets_everything() {
    let store = store_with(10, 100);
    store.add_message(message("1", "A", "hello")).unwrap();
    store.add_group(group_with_channels());

    store.clear();
    let stats = store.stats();
    assert_eq!(stats.total_messages, 0);
    assert_eq!(stats.channel_count, 0);
    assert_eq!(stats.group_count, 0);
    assert_eq!(stats.channel_cache_count, 0);
    assert!(store.channel("A").is_none());
}
