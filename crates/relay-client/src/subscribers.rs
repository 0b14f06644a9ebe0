//! Event subscriber registry
//!
//! An observer list where every registration gets an explicit token, so
//! removal is O(1) and handlers cannot leak. A failing handler is logged
//! and never breaks delivery to the other subscribers or the emitter.
//!
//! Handlers run inline on the emitting task, in token (registration) order,
//! which preserves the transport's event ordering. Handlers must not
//! register or remove subscribers from within a callback.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

type Handler<E> = Box<dyn Fn(&E) -> anyhow::Result<()> + Send + Sync>;

/// Opaque registration token for a subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriberToken(u64);

/// Set of event handlers keyed by registration token
pub struct SubscriberSet<E> {
    next_token: AtomicU64,
    handlers: RwLock<BTreeMap<u64, Handler<E>>>,
}

impl<E> SubscriberSet<E> {
    /// Create an empty set
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_token: AtomicU64::new(1),
            handlers: RwLock::new(BTreeMap::new()),
        }
    }

    /// Register a handler, returning its removal token
    pub fn subscribe<F>(&self, handler: F) -> SubscriberToken
    where
        F: Fn(&E) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let token = self.next_token.fetch_add(1, Ordering::SeqCst);
        self.handlers.write().insert(token, Box::new(handler));
        SubscriberToken(token)
    }

    /// Remove a handler, reporting whether it was registered
    pub fn unsubscribe(&self, token: SubscriberToken) -> bool {
        self.handlers.write().remove(&token.0).is_some()
    }

    /// Deliver an event to every handler in registration order.
    ///
    /// Handler errors are logged and swallowed; one faulty subscriber must
    /// not break the stream for the others.
    pub fn emit(&self, event: &E) {
        let handlers = self.handlers.read();
        for (token, handler) in handlers.iter() {
            if let Err(error) = handler(event) {
                tracing::warn!(subscriber = token, error = %error, "event handler failed");
            }
        }
    }

    /// Drop all registrations
    pub fn clear(&self) {
        self.handlers.write().clear();
    }

    /// Get the number of registered handlers
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    /// Check if no handlers are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }
}

impl<E> Default for SubscriberSet<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for SubscriberSet<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberSet")
            .field("handlers", &self.len())
            .finish()
    }
}
