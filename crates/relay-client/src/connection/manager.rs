//! Connection manager
//!
//! The authoritative lifecycle state machine above [`GatewayConnection`]:
//! timeout-bound connects, periodic health checks, backoff-scheduled
//! reconnection, and derived statistics. Callers and tests should treat
//! this layer - not the gateway connection - as the source of truth for
//! connection state.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use relay_common::{mask_token, ConnectionSettings};
use relay_core::GatewayEvent;

use crate::backoff::reconnect_delay;
use crate::error::ClientError;
use crate::events::ManagerEvent;
use crate::subscribers::{SubscriberSet, SubscriberToken};

use super::gateway::GatewayConnection;
use super::health::{ConnectionHealth, ConnectionStats};
use super::state::ConnectionState;

/// Retained latency samples for averaging
const PING_SAMPLE_WINDOW: usize = 10;
/// Retained received-message timestamps for rate derivation
const MESSAGE_TIME_WINDOW: usize = 100;
/// Trailing window in minutes for the messages-per-minute rate
const MESSAGE_RATE_WINDOW_MINUTES: i64 = 5;

/// Lifecycle manager for a gateway connection
pub struct ConnectionManager {
    settings: ConnectionSettings,
    gateway: Arc<GatewayConnection>,
    state: RwLock<ConnectionState>,
    health: Mutex<ConnectionHealth>,
    ping_samples: Mutex<VecDeque<Duration>>,
    message_times: Mutex<VecDeque<DateTime<Utc>>>,
    reconnect_attempts: AtomicU32,
    /// Last successfully used credential, for manual reconnect
    token: Mutex<Option<String>>,
    health_task: Mutex<Option<JoinHandle<()>>>,
    reconnect_task: Mutex<Option<JoinHandle<()>>>,
    gateway_subscription: Mutex<Option<SubscriberToken>>,
    subscribers: SubscriberSet<ManagerEvent>,
    destroyed: AtomicBool,
    /// Back reference handed to timer tasks
    weak_self: Weak<Self>,
}

impl ConnectionManager {
    /// Create a manager over the given gateway connection.
    ///
    /// The manager subscribes to the gateway's event stream to track
    /// received messages and detect connection loss.
    #[must_use]
    pub fn new(gateway: Arc<GatewayConnection>, settings: ConnectionSettings) -> Arc<Self> {
        let manager = Arc::new_cyclic(|weak| Self {
            settings,
            gateway,
            state: RwLock::new(ConnectionState::Idle),
            health: Mutex::new(ConnectionHealth::default()),
            ping_samples: Mutex::new(VecDeque::with_capacity(PING_SAMPLE_WINDOW)),
            message_times: Mutex::new(VecDeque::with_capacity(MESSAGE_TIME_WINDOW)),
            reconnect_attempts: AtomicU32::new(0),
            token: Mutex::new(None),
            health_task: Mutex::new(None),
            reconnect_task: Mutex::new(None),
            gateway_subscription: Mutex::new(None),
            subscribers: SubscriberSet::new(),
            destroyed: AtomicBool::new(false),
            weak_self: weak.clone(),
        });

        let weak = Arc::downgrade(&manager);
        let token = manager.gateway.subscribe(move |event| {
            if let Some(manager) = weak.upgrade() {
                manager.on_gateway_event(event);
            }
            Ok(())
        });
        *manager.gateway_subscription.lock() = Some(token);

        manager
    }

    /// Get the underlying gateway connection (for message subscriptions)
    #[must_use]
    pub fn gateway(&self) -> &Arc<GatewayConnection> {
        &self.gateway
    }

    /// Get the current lifecycle state
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Get a snapshot of the health metrics
    #[must_use]
    pub fn health(&self) -> ConnectionHealth {
        self.health.lock().clone()
    }

    /// Derive point-in-time statistics
    #[must_use]
    pub fn stats(&self) -> ConnectionStats {
        let now = Utc::now();
        let health = self.health.lock().clone();

        let uptime = health
            .connected_at
            .and_then(|at| (now - at).to_std().ok())
            .unwrap_or_default();

        let samples = self.ping_samples.lock();
        let avg_ping_latency = if samples.is_empty() {
            None
        } else {
            let total: Duration = samples.iter().sum();
            Some(total / samples.len() as u32)
        };
        drop(samples);

        let cutoff = now - chrono::Duration::minutes(MESSAGE_RATE_WINDOW_MINUTES);
        let recent = self
            .message_times
            .lock()
            .iter()
            .filter(|ts| **ts > cutoff)
            .count();
        let messages_per_minute = recent as f64 / MESSAGE_RATE_WINDOW_MINUTES as f64;

        ConnectionStats {
            uptime,
            avg_ping_latency,
            messages_per_minute,
            connection_stability: ConnectionStats::stability(health.reconnect_count, uptime),
        }
    }

    /// Register an event handler
    pub fn subscribe<F>(&self, handler: F) -> SubscriberToken
    where
        F: Fn(&ManagerEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.subscribers.subscribe(handler)
    }

    /// Remove an event handler
    pub fn unsubscribe(&self, token: SubscriberToken) -> bool {
        self.subscribers.unsubscribe(token)
    }

    /// Connect with the given credential, bounded by the configured timeout.
    ///
    /// Fails with [`ClientError::InvalidState`] while already connecting or
    /// connected. A timeout abandons the attempt, resets the gateway, and
    /// transitions to the error state.
    pub async fn connect(&self, token: &str) -> Result<(), ClientError> {
        {
            let state = *self.state.read();
            if matches!(
                state,
                ConnectionState::Connecting | ConnectionState::Connected
            ) {
                return Err(ClientError::InvalidState { state });
            }
        }

        self.set_state(ConnectionState::Connecting);
        self.reconnect_attempts.store(0, Ordering::SeqCst);

        match tokio::time::timeout(self.settings.connect_timeout(), self.gateway.connect(token))
            .await
        {
            Err(_) => {
                self.gateway.reset_session().await;
                self.set_state(ConnectionState::Error);
                Err(ClientError::Timeout(self.settings.connect_timeout()))
            }
            Ok(Err(error)) => {
                self.set_state(ConnectionState::Error);
                Err(error)
            }
            Ok(Ok(())) => {
                self.on_connected(token);
                tracing::info!(token = %mask_token(token), "connected");
                Ok(())
            }
        }
    }

    /// Disconnect cleanly. A no-op from `Idle`/`Disconnected`; otherwise
    /// halts health checks and any pending reconnect before delegating to
    /// the gateway.
    pub async fn disconnect(&self) {
        {
            let state = *self.state.read();
            if matches!(state, ConnectionState::Idle | ConnectionState::Disconnected) {
                return;
            }
        }

        self.set_state(ConnectionState::Disconnecting);
        self.stop_health_checks();
        self.cancel_pending_reconnect();
        self.gateway.disconnect().await;
        self.set_state(ConnectionState::Disconnected);
    }

    /// Manually reconnect using the stored credential.
    ///
    /// Fails with [`ClientError::InvalidState`] while a connect or
    /// automatic reconnect is in flight, and with
    /// [`ClientError::MissingCredential`] when no successful connect stored
    /// a credential earlier.
    pub async fn reconnect(&self) -> Result<(), ClientError> {
        {
            let state = *self.state.read();
            if matches!(
                state,
                ConnectionState::Connecting | ConnectionState::Reconnecting
            ) {
                return Err(ClientError::InvalidState { state });
            }
        }

        let token = self
            .token
            .lock()
            .clone()
            .ok_or(ClientError::MissingCredential)?;

        // Enter the reconnecting state before tearing the session down, so
        // nothing in flight is mistaken for connection loss.
        self.set_state(ConnectionState::Reconnecting);
        self.health.lock().reconnect_count += 1;
        self.stop_health_checks();
        self.gateway.reset_session().await;

        match tokio::time::timeout(self.settings.connect_timeout(), self.gateway.connect(&token))
            .await
        {
            Err(_) => {
                self.gateway.reset_session().await;
                self.set_state(ConnectionState::Error);
                Err(ClientError::Timeout(self.settings.connect_timeout()))
            }
            Ok(Err(error)) => {
                self.set_state(ConnectionState::Error);
                Err(error)
            }
            Ok(Ok(())) => {
                self.on_connected(&token);
                tracing::info!("manual reconnect succeeded");
                Ok(())
            }
        }
    }

    /// Record an outbound message in the health counters
    pub fn record_message_sent(&self) {
        self.health.lock().messages_sent += 1;
    }

    /// Cancel all timers and drop every subscriber registration.
    ///
    /// After this returns no scheduled callback fires and the health
    /// snapshot stays static.
    pub fn destroy(&self) {
        self.destroyed.store(true, Ordering::SeqCst);
        self.stop_health_checks();
        self.cancel_pending_reconnect();
        if let Some(token) = self.gateway_subscription.lock().take() {
            self.gateway.unsubscribe(token);
        }
        self.subscribers.clear();
        tracing::debug!("connection manager destroyed");
    }

    /// Bookkeeping for a successful connect/reconnect
    fn on_connected(&self, token: &str) {
        {
            let mut health = self.health.lock();
            health.connected_at = Some(Utc::now());
            health.last_disconnect_reason = None;
        }
        *self.token.lock() = Some(token.to_string());
        self.reconnect_attempts.store(0, Ordering::SeqCst);
        self.set_state(ConnectionState::Connected);
        if self.settings.enable_health_checks {
            self.start_health_checks();
        }
    }

    /// React to the low-level gateway stream
    fn on_gateway_event(&self, event: &GatewayEvent) {
        if self.destroyed.load(Ordering::SeqCst) {
            return;
        }

        match event {
            GatewayEvent::Message { .. } => {
                self.health.lock().messages_received += 1;
                let mut times = self.message_times.lock();
                times.push_back(Utc::now());
                if times.len() > MESSAGE_TIME_WINDOW {
                    times.pop_front();
                }
            }
            GatewayEvent::Disconnect { reason } => {
                if *self.state.read() == ConnectionState::Connected {
                    self.handle_connection_lost(reason);
                }
            }
            GatewayEvent::Error { error } if error.recoverable => {
                if *self.state.read() == ConnectionState::Connected {
                    self.handle_connection_lost(&error.message);
                }
            }
            _ => {}
        }
    }

    /// Start the periodic health probe
    fn start_health_checks(&self) {
        self.stop_health_checks();

        let weak = self.weak_self.clone();
        let interval = self.settings.health_check_interval();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; skip it so probes run
            // one full interval after connect.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(manager) = weak.upgrade() else { break };
                manager.run_health_check();
            }
        });
        *self.health_task.lock() = Some(task);
    }

    fn stop_health_checks(&self) {
        if let Some(task) = self.health_task.lock().take() {
            task.abort();
        }
    }

    fn cancel_pending_reconnect(&self) {
        if let Some(task) = self.reconnect_task.lock().take() {
            task.abort();
        }
    }

    /// One health probe: measure latency since the previous probe, retain a
    /// rolling sample window, and verify the gateway still reports ready.
    fn run_health_check(&self) {
        if self.destroyed.load(Ordering::SeqCst) {
            return;
        }
        if *self.state.read() != ConnectionState::Connected {
            return;
        }

        let now = Utc::now();
        {
            let mut health = self.health.lock();
            if let Some(last) = health.last_ping {
                let latency = (now - last).to_std().unwrap_or_default();
                health.ping_latency = Some(latency);

                let mut samples = self.ping_samples.lock();
                samples.push_back(latency);
                if samples.len() > PING_SAMPLE_WINDOW {
                    samples.pop_front();
                }
            }
            health.last_ping = Some(now);
        }

        if !self.gateway.is_ready() {
            self.handle_connection_lost("gateway not ready");
            return;
        }

        self.subscribers.emit(&ManagerEvent::HealthUpdate {
            health: self.health(),
        });
    }

    /// Connection-loss path: record the reason, stop probing, and either
    /// schedule a backoff reconnect or give up into the error state.
    fn handle_connection_lost(&self, reason: &str) {
        if self.destroyed.load(Ordering::SeqCst) {
            return;
        }

        tracing::warn!(reason = %reason, "connection lost");
        self.health.lock().last_disconnect_reason = Some(reason.to_string());
        self.stop_health_checks();
        self.subscribers.emit(&ManagerEvent::ConnectionLost {
            reason: reason.to_string(),
        });

        if self.reconnect_attempts.load(Ordering::SeqCst) < self.settings.max_reconnect_attempts {
            self.schedule_reconnect();
        } else {
            self.set_state(ConnectionState::Error);
        }
    }

    /// Schedule the next reconnect attempt with exponential backoff
    fn schedule_reconnect(&self) {
        let attempt = self.reconnect_attempts.fetch_add(1, Ordering::SeqCst) + 1;
        let delay = reconnect_delay(
            attempt,
            self.settings.reconnect_delay_start(),
            self.settings.reconnect_delay_max(),
        );

        self.set_state(ConnectionState::Reconnecting);
        self.subscribers
            .emit(&ManagerEvent::ReconnectAttempt { attempt, delay });
        tracing::info!(attempt, delay_ms = delay.as_millis() as u64, "reconnect scheduled");

        let weak = self.weak_self.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(manager) = weak.upgrade() else { return };
            manager.run_scheduled_reconnect(attempt).await;
        });
        *self.reconnect_task.lock() = Some(task);
    }

    /// Execute one scheduled reconnect attempt
    async fn run_scheduled_reconnect(&self, attempt: u32) {
        if self.destroyed.load(Ordering::SeqCst) {
            return;
        }

        let token = self.token.lock().clone();
        let Some(token) = token else {
            self.set_state(ConnectionState::Error);
            return;
        };

        // The gateway may still think its lost session is live; reset it so
        // the connect below is not rejected by its own state check.
        self.gateway.reset_session().await;

        let outcome =
            tokio::time::timeout(self.settings.connect_timeout(), self.gateway.connect(&token))
                .await;

        match outcome {
            Ok(Ok(())) => {
                {
                    let mut health = self.health.lock();
                    health.reconnect_count += 1;
                    health.connected_at = Some(Utc::now());
                    health.last_disconnect_reason = None;
                }
                self.reconnect_attempts.store(0, Ordering::SeqCst);
                self.set_state(ConnectionState::Connected);
                self.subscribers
                    .emit(&ManagerEvent::ReconnectSuccess { attempt });
                tracing::info!(attempt, "reconnect succeeded");
                if self.settings.enable_health_checks {
                    self.start_health_checks();
                }
            }
            Ok(Err(error)) => {
                self.subscribers.emit(&ManagerEvent::ReconnectFailed {
                    attempt,
                    reason: error.to_string(),
                });
                if !error.is_recoverable() {
                    // Retrying a rejected credential cannot help.
                    tracing::error!(attempt, error = %error, "reconnect failed terminally");
                    self.set_state(ConnectionState::Error);
                    return;
                }
                self.retry_or_give_up();
            }
            Err(_) => {
                self.gateway.reset_session().await;
                self.subscribers.emit(&ManagerEvent::ReconnectFailed {
                    attempt,
                    reason: "connect timed out".to_string(),
                });
                self.retry_or_give_up();
            }
        }
    }

    fn retry_or_give_up(&self) {
        if self.reconnect_attempts.load(Ordering::SeqCst) < self.settings.max_reconnect_attempts {
            self.schedule_reconnect();
        } else {
            tracing::error!(
                attempts = self.settings.max_reconnect_attempts,
                "reconnect attempts exhausted"
            );
            self.set_state(ConnectionState::Error);
        }
    }

    /// Transition the lifecycle state, notifying subscribers on change
    fn set_state(&self, new: ConnectionState) {
        let old = {
            let mut state = self.state.write();
            let old = *state;
            *state = new;
            old
        };
        if old != new {
            tracing::debug!(old = %old, new = %new, "state change");
            self.subscribers.emit(&ManagerEvent::StateChange { old, new });
        }
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("state", &self.state())
            .field("reconnect_attempts", &self.reconnect_attempts.load(Ordering::SeqCst))
            .field("destroyed", &self.destroyed.load(Ordering::SeqCst))
            .finish()
    }
}
