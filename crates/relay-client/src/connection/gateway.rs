//! Gateway connection
//!
//! Owns exactly one live transport session at a time. Translates raw
//! transport events into the typed [`GatewayEvent`] set, filters messages
//! with nothing worth caching, and classifies failures. Reconnect policy
//! deliberately lives in the manager: on loss this layer only emits events
//! and awaits commands.

use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;

use relay_common::{mask_token, validate_token};
use relay_core::{ConnectionError, GatewayEvent, Message};

use crate::error::ClientError;
use crate::subscribers::{SubscriberSet, SubscriberToken};
use crate::transport::{SessionHandle, Transport, TransportEvent};

use super::state::ConnectionStatus;

/// Client connection to the remote gateway
pub struct GatewayConnection {
    transport: Arc<dyn Transport>,
    status: RwLock<ConnectionStatus>,
    /// Credential retained for manager-driven reconnects; cleared on
    /// disconnect, never logged in cleartext.
    token: Mutex<Option<String>>,
    last_error: Mutex<Option<ConnectionError>>,
    session: Mutex<Option<Box<dyn SessionHandle>>>,
    reader: Mutex<Option<JoinHandle<()>>>,
    subscribers: SubscriberSet<GatewayEvent>,
    /// Back reference handed to the read-loop task
    weak_self: Weak<Self>,
}

impl GatewayConnection {
    /// Create a connection over the given transport
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            transport,
            status: RwLock::new(ConnectionStatus::Disconnected),
            token: Mutex::new(None),
            last_error: Mutex::new(None),
            session: Mutex::new(None),
            reader: Mutex::new(None),
            subscribers: SubscriberSet::new(),
            weak_self: weak.clone(),
        })
    }

    /// Get the current connection status
    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        *self.status.read()
    }

    /// Get the most recent classified failure, if any
    #[must_use]
    pub fn last_error(&self) -> Option<ConnectionError> {
        self.last_error.lock().clone()
    }

    /// True only while connected and the transport session reports ready
    #[must_use]
    pub fn is_ready(&self) -> bool {
        *self.status.read() == ConnectionStatus::Connected
            && self.session.lock().as_ref().is_some_and(|s| s.is_ready())
    }

    /// Register an event handler
    pub fn subscribe<F>(&self, handler: F) -> SubscriberToken
    where
        F: Fn(&GatewayEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.subscribers.subscribe(handler)
    }

    /// Remove an event handler
    pub fn unsubscribe(&self, token: SubscriberToken) -> bool {
        self.subscribers.unsubscribe(token)
    }

    /// Connect with the given credential and drive the session to ready.
    ///
    /// Fails fast with [`ClientError::InvalidToken`] when the credential
    /// fails the local format check, and with
    /// [`ClientError::AlreadyConnecting`] while a connect is in flight or a
    /// session is live. On success the internal read loop takes over event
    /// delivery.
    pub async fn connect(&self, token: &str) -> Result<(), ClientError> {
        if let Err(reason) = validate_token(token) {
            let error = ConnectionError::auth(reason.to_string(), None);
            self.record_error(error);
            return Err(ClientError::InvalidToken(reason));
        }
        let token = token.trim();

        let replaying = {
            let mut status = self.status.write();
            if matches!(
                *status,
                ConnectionStatus::Connecting
                    | ConnectionStatus::Connected
                    | ConnectionStatus::Reconnecting
            ) {
                return Err(ClientError::AlreadyConnecting);
            }
            let replaying = self.token.lock().is_some();
            *status = if replaying {
                ConnectionStatus::Reconnecting
            } else {
                ConnectionStatus::Connecting
            };
            replaying
        };

        self.stop_reader();
        self.close_session().await;
        self.subscribers.emit(if replaying {
            &GatewayEvent::Reconnecting
        } else {
            &GatewayEvent::Connecting
        });
        tracing::debug!(token = %mask_token(token), replaying, "opening gateway session");

        let mut session = match self.transport.open(token).await {
            Ok(session) => session,
            Err(raw) => {
                let error = ConnectionError::classify(raw.code, raw.message);
                self.record_error(error.clone());
                *self.status.write() = ConnectionStatus::Error;
                return Err(ClientError::Gateway(error));
            }
        };

        // Drive the stream until the session reports ready; anything fatal
        // before that fails the connect itself.
        loop {
            match session.events.recv().await {
                Some(TransportEvent::Ready) => break,
                Some(TransportEvent::Error { message, code }) => {
                    let error = ConnectionError::classify(code, message);
                    self.record_error(error.clone());
                    *self.status.write() = ConnectionStatus::Error;
                    return Err(ClientError::Gateway(error));
                }
                Some(TransportEvent::Disconnected { reason }) => {
                    let error = ConnectionError::classify(None, reason);
                    self.record_error(error.clone());
                    *self.status.write() = ConnectionStatus::Error;
                    return Err(ClientError::Gateway(error));
                }
                Some(event) => self.handle_event(event),
                None => {
                    let error = ConnectionError::network("gateway stream ended during handshake");
                    self.record_error(error.clone());
                    *self.status.write() = ConnectionStatus::Error;
                    return Err(ClientError::Gateway(error));
                }
            }
        }

        *self.token.lock() = Some(token.to_string());
        *self.session.lock() = Some(session.handle);
        *self.last_error.lock() = None;
        *self.status.write() = ConnectionStatus::Connected;
        self.subscribers.emit(&GatewayEvent::Ready);
        tracing::info!("gateway session ready");

        let weak = self.weak_self.clone();
        let mut events = session.events;
        let reader = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                let Some(connection) = weak.upgrade() else { break };
                connection.handle_event(event);
            }
            tracing::debug!("gateway event stream ended");
        });
        *self.reader.lock() = Some(reader);

        Ok(())
    }

    /// Tear down the live session. Idempotent: a no-op when already
    /// disconnected. Releases the transport handle and clears the cached
    /// credential.
    pub async fn disconnect(&self) {
        {
            let status = self.status.read();
            if *status == ConnectionStatus::Disconnected && self.session.lock().is_none() {
                return;
            }
        }

        self.stop_reader();
        self.close_session().await;
        *self.token.lock() = None;
        *self.status.write() = ConnectionStatus::Disconnected;
        self.subscribers.emit(&GatewayEvent::Disconnect {
            reason: "disconnected by user".to_string(),
        });
        tracing::info!("gateway session closed");
    }

    /// Quietly drop the live session while keeping the stored credential,
    /// so a later connect replays it as a reconnect. Emits no event; used
    /// by the manager between reconnect attempts.
    pub(crate) async fn reset_session(&self) {
        self.stop_reader();
        self.close_session().await;
        *self.status.write() = ConnectionStatus::Disconnected;
    }

    /// Translate one transport event into the typed event set
    fn handle_event(&self, event: TransportEvent) {
        match event {
            TransportEvent::Ready => {
                *self.status.write() = ConnectionStatus::Connected;
                *self.last_error.lock() = None;
                self.subscribers.emit(&GatewayEvent::Ready);
            }
            TransportEvent::MessageCreate(message) => {
                if let Some(message) = Self::filter_message(message) {
                    self.subscribers.emit(&GatewayEvent::Message { message });
                }
            }
            TransportEvent::MessageUpdate(message) => {
                if let Some(message) = Self::filter_message(message) {
                    self.subscribers
                        .emit(&GatewayEvent::MessageUpdate { message });
                }
            }
            TransportEvent::MessageDelete {
                message_id,
                channel_id,
            } => {
                self.subscribers.emit(&GatewayEvent::MessageDelete {
                    message_id,
                    channel_id,
                });
            }
            TransportEvent::Disconnected { reason } => {
                *self.status.write() = ConnectionStatus::Disconnected;
                tracing::warn!(reason = %reason, "gateway session dropped");
                self.subscribers.emit(&GatewayEvent::Disconnect { reason });
            }
            TransportEvent::Error { message, code } => {
                let error = ConnectionError::classify(code, message);
                if !error.recoverable {
                    *self.status.write() = ConnectionStatus::Error;
                }
                self.record_error(error);
            }
        }
    }

    /// Drop bot-authored messages and messages with nothing worth caching
    fn filter_message(message: Message) -> Option<Message> {
        if message.author.bot {
            return None;
        }
        if !message.has_content() {
            tracing::trace!(message_id = %message.id, "dropped empty message");
            return None;
        }
        Some(message)
    }

    /// Record a classified failure and notify subscribers
    fn record_error(&self, error: ConnectionError) {
        tracing::warn!(
            kind = %error.kind,
            code = ?error.code,
            recoverable = error.recoverable,
            "gateway error: {}",
            error.message
        );
        *self.last_error.lock() = Some(error.clone());
        self.subscribers.emit(&GatewayEvent::Error { error });
    }

    fn stop_reader(&self) {
        if let Some(reader) = self.reader.lock().take() {
            reader.abort();
        }
    }

    async fn close_session(&self) {
        let session = self.session.lock().take();
        if let Some(session) = session {
            session.close().await;
        }
    }
}

impl std::fmt::Debug for GatewayConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConnection")
            .field("status", &self.status())
            .field("has_token", &self.token.lock().is_some())
            .finish()
    }
}
