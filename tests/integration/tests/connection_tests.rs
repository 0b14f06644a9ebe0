//! End-to-end connection lifecycle scenarios against the scripted mock
//! transport: message delivery into the store, loss detection, backoff
//! reconnection, exhaustion, timeouts, and teardown guarantees.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use integration_tests::{
    bot_message, fast_settings, message, valid_token, wait_until, MockTransport,
};
use relay_cache::MessageStore;
use relay_client::{
    ClientError, ConnectionManager, ConnectionState, GatewayConnection, ManagerEvent,
    TransportError, TransportEvent,
};
use relay_common::{ConnectionSettings, StoreSettings};
use relay_core::GatewayEvent;

fn build_manager(
    settings: ConnectionSettings,
) -> (Arc<MockTransport>, Arc<ConnectionManager>) {
    let transport = MockTransport::new();
    let gateway = GatewayConnection::new(transport.clone());
    let manager = ConnectionManager::new(gateway, settings);
    (transport, manager)
}

/// Record every manager event for later inspection
fn record_events(manager: &Arc<ConnectionManager>) -> Arc<Mutex<Vec<ManagerEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let events_clone = events.clone();
    manager.subscribe(move |event| {
        events_clone.lock().push(event.clone());
        Ok(())
    });
    events
}

#[tokio::test]
async fn messages_flow_from_transport_into_store() {
    let (transport, manager) = build_manager(ConnectionSettings {
        enable_health_checks: false,
        ..fast_settings()
    });
    let store = MessageStore::new_shared(StoreSettings::default());

    // The consumer wiring: gateway message events feed the store.
    let store_clone = store.clone();
    manager.gateway().subscribe(move |event| {
        match event {
            GatewayEvent::Message { message } | GatewayEvent::MessageUpdate { message } => {
                store_clone.add_message(message.clone())?;
            }
            GatewayEvent::MessageDelete {
                message_id,
                channel_id,
            } => {
                store_clone.delete_message(message_id, Some(channel_id));
            }
            _ => {}
        }
        Ok(())
    });

    manager.connect(&valid_token()).await.unwrap();

    transport.push(TransportEvent::MessageCreate(message("1", "100", "first")));
    transport.push(TransportEvent::MessageCreate(message("2", "100", "second")));
    transport.push(TransportEvent::MessageCreate(message("3", "101", "elsewhere")));

    assert!(
        wait_until(
            || store.stats().total_messages == 3,
            Duration::from_secs(1)
        )
        .await
    );

    let general = store.channel_messages("100", None, None, None);
    assert_eq!(general.len(), 2);

    // Deletes propagate too.
    transport.push(TransportEvent::MessageDelete {
        message_id: "1".to_string(),
        channel_id: "100".to_string(),
    });
    assert!(
        wait_until(
            || store.stats().total_messages == 2,
            Duration::from_secs(1)
        )
        .await
    );

    // Received counter tracked by the manager.
    assert_eq!(manager.health().messages_received, 3);
}

#[tokio::test]
async fn empty_and_bot_messages_are_dropped() {
    let (transport, manager) = build_manager(ConnectionSettings {
        enable_health_checks: false,
        ..fast_settings()
    });

    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = seen.clone();
    manager.gateway().subscribe(move |event| {
        if let GatewayEvent::Message { message } = event {
            seen_clone.lock().push(message.id.clone());
        }
        Ok(())
    });

    manager.connect(&valid_token()).await.unwrap();

    transport.push(TransportEvent::MessageCreate(message("1", "100", "   ")));
    transport.push(TransportEvent::MessageCreate(bot_message("2", "100", "beep")));
    transport.push(TransportEvent::MessageCreate(message("3", "100", "real")));

    assert!(wait_until(|| seen.lock().len() == 1, Duration::from_secs(1)).await);
    assert_eq!(*seen.lock(), vec!["3".to_string()]);
    assert_eq!(manager.health().messages_received, 1);
}

#[tokio::test]
async fn health_check_detects_loss_and_reconnects() {
    let (transport, manager) = build_manager(fast_settings());
    let events = record_events(&manager);

    manager.connect(&valid_token()).await.unwrap();
    assert_eq!(transport.open_count(), 1);

    // Session silently stops reporting ready; the next probe notices.
    transport.set_ready(false);

    assert!(
        wait_until(
            || {
                manager.state() == ConnectionState::Connected && transport.open_count() == 2
            },
            Duration::from_secs(2)
        )
        .await,
        "manager should have reconnected"
    );

    let names: Vec<&str> = events.lock().iter().map(ManagerEvent::name).collect();
    assert!(names.contains(&"connectionLost"));
    assert!(names.contains(&"reconnectAttempt"));
    assert!(names.contains(&"reconnectSuccess"));
    assert_eq!(manager.health().reconnect_count, 1);
}

#[tokio::test]
async fn unexpected_disconnect_triggers_reconnect() {
    let (transport, manager) = build_manager(ConnectionSettings {
        enable_health_checks: false,
        ..fast_settings()
    });
    let events = record_events(&manager);

    let gateway_events = Arc::new(Mutex::new(Vec::new()));
    let gateway_events_clone = gateway_events.clone();
    manager.gateway().subscribe(move |event: &GatewayEvent| {
        gateway_events_clone.lock().push(event.name());
        Ok(())
    });

    manager.connect(&valid_token()).await.unwrap();
    transport.push(TransportEvent::Disconnected {
        reason: "connection reset by peer".to_string(),
    });

    assert!(
        wait_until(
            || manager.state() == ConnectionState::Connected && transport.open_count() == 2,
            Duration::from_secs(2)
        )
        .await
    );

    assert_eq!(
        manager.health().last_disconnect_reason, None,
        "reason cleared after successful reconnect"
    );
    let names: Vec<&str> = events.lock().iter().map(ManagerEvent::name).collect();
    assert!(names.contains(&"connectionLost"));
    // The low-level stream saw the credential replay.
    assert!(gateway_events.lock().contains(&"reconnecting"));
}

#[tokio::test]
async fn backoff_delays_double_until_exhaustion() {
    let (transport, manager) = build_manager(ConnectionSettings {
        enable_health_checks: false,
        max_reconnect_attempts: 3,
        reconnect_delay_start_ms: 10,
        reconnect_delay_max_ms: 40,
        ..fast_settings()
    });
    let events = record_events(&manager);

    manager.connect(&valid_token()).await.unwrap();

    // Every reconnect attempt will fail at open.
    transport.fail_next_opens(u32::MAX);
    transport.push(TransportEvent::Disconnected {
        reason: "connection reset".to_string(),
    });

    assert!(
        wait_until(
            || manager.state() == ConnectionState::Error,
            Duration::from_secs(2)
        )
        .await,
        "manager should give up after exhausting attempts"
    );

    let recorded = events.lock();
    let delays: Vec<u64> = recorded
        .iter()
        .filter_map(|event| match event {
            ManagerEvent::ReconnectAttempt { delay, .. } => Some(delay.as_millis() as u64),
            _ => None,
        })
        .collect();
    assert_eq!(delays, vec![10, 20, 40]);

    let failed: Vec<u32> = recorded
        .iter()
        .filter_map(|event| match event {
            ManagerEvent::ReconnectFailed { attempt, .. } => Some(*attempt),
            _ => None,
        })
        .collect();
    assert_eq!(failed, vec![1, 2, 3]);
    drop(recorded);

    // No further timer fires once exhausted.
    let opens = transport.open_count();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(transport.open_count(), opens);
    assert_eq!(manager.state(), ConnectionState::Error);
}

#[tokio::test]
async fn auth_failure_stops_reconnecting_immediately() {
    let (transport, manager) = build_manager(ConnectionSettings {
        enable_health_checks: false,
        ..fast_settings()
    });
    let events = record_events(&manager);

    manager.connect(&valid_token()).await.unwrap();

    transport.set_open_error(TransportError::new("unauthorized", Some(401)));
    transport.fail_next_opens(u32::MAX);
    transport.push(TransportEvent::Disconnected {
        reason: "connection reset".to_string(),
    });

    assert!(
        wait_until(
            || manager.state() == ConnectionState::Error,
            Duration::from_secs(2)
        )
        .await
    );

    // One reconnect open, rejected terminally; no retries of a bad credential.
    assert_eq!(transport.open_count(), 2);
    let names: Vec<&str> = events.lock().iter().map(ManagerEvent::name).collect();
    assert_eq!(
        names.iter().filter(|n| **n == "reconnectFailed").count(),
        1
    );
}

#[tokio::test]
async fn connect_timeout_fails_into_error_state() {
    let (transport, manager) = build_manager(ConnectionSettings {
        connect_timeout_ms: 50,
        enable_health_checks: false,
        ..fast_settings()
    });

    transport.hang_opens(true);
    let err = manager.connect(&valid_token()).await.unwrap_err();

    assert_eq!(err, ClientError::Timeout(Duration::from_millis(50)));
    assert_eq!(manager.state(), ConnectionState::Error);

    // A fresh connect succeeds once the transport behaves again.
    transport.hang_opens(false);
    manager.connect(&valid_token()).await.unwrap();
    assert_eq!(manager.state(), ConnectionState::Connected);
}

#[tokio::test]
async fn second_concurrent_connect_is_rejected() {
    let (transport, manager) = build_manager(ConnectionSettings {
        connect_timeout_ms: 400,
        enable_health_checks: false,
        ..fast_settings()
    });

    transport.hang_opens(true);
    let first = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.connect(&valid_token()).await })
    };

    assert!(
        wait_until(
            || manager.state() == ConnectionState::Connecting,
            Duration::from_secs(1)
        )
        .await
    );

    let err = manager.connect(&valid_token()).await.unwrap_err();
    assert_eq!(
        err,
        ClientError::InvalidState {
            state: ConnectionState::Connecting
        }
    );
    // The in-flight attempt is unaffected by the rejected call.
    assert_eq!(manager.state(), ConnectionState::Connecting);

    first.abort();
}

#[tokio::test]
async fn manual_reconnect_after_disconnect() {
    let (_transport, manager) = build_manager(ConnectionSettings {
        enable_health_checks: false,
        ..fast_settings()
    });

    manager.connect(&valid_token()).await.unwrap();
    manager.disconnect().await;
    assert_eq!(manager.state(), ConnectionState::Disconnected);

    // The manager kept the credential; no token re-input needed.
    manager.reconnect().await.unwrap();
    assert_eq!(manager.state(), ConnectionState::Connected);
    assert_eq!(manager.health().reconnect_count, 1);
}

#[tokio::test]
async fn destroy_silences_all_callbacks() {
    let (transport, manager) = build_manager(ConnectionSettings {
        health_check_interval_ms: 15,
        ..fast_settings()
    });
    let events = record_events(&manager);

    manager.connect(&valid_token()).await.unwrap();

    // Let at least one health probe land.
    assert!(
        wait_until(
            || {
                events
                    .lock()
                    .iter()
                    .any(|e| matches!(e, ManagerEvent::HealthUpdate { .. }))
            },
            Duration::from_secs(2)
        )
        .await
    );

    manager.destroy();
    let events_after_destroy = events.lock().len();
    let health_after_destroy = manager.health();

    // Even a dead session changes nothing once destroyed.
    transport.set_ready(false);
    tokio::time::sleep(Duration::from_millis(120)).await;

    assert_eq!(events.lock().len(), events_after_destroy);
    assert_eq!(manager.health(), health_after_destroy);
    assert_eq!(transport.open_count(), 1);
}
