//! Scripted mock transport
//!
//! Lets tests fail a configurable number of opens, flip session readiness,
//! and push events into the live session from the outside.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use relay_client::{SessionHandle, Transport, TransportError, TransportEvent, TransportSession};

/// Transport double with scriptable failure and readiness behavior
pub struct MockTransport {
    /// Sessions report ready while set
    ready: Arc<AtomicBool>,
    /// Number of opens to fail before succeeding
    fail_opens: AtomicU32,
    /// Failure returned for failed opens
    open_error: Mutex<TransportError>,
    /// Opens never resolve while set (for timeout scenarios)
    hang: AtomicBool,
    /// Total open attempts observed
    opens: AtomicU32,
    /// Sender feeding the most recently opened session
    sender: Mutex<Option<mpsc::Sender<TransportEvent>>>,
}

impl MockTransport {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            ready: Arc::new(AtomicBool::new(false)),
            fail_opens: AtomicU32::new(0),
            open_error: Mutex::new(TransportError::new("connection refused", None)),
            hang: AtomicBool::new(false),
            opens: AtomicU32::new(0),
            sender: Mutex::new(None),
        })
    }

    /// Make opens hang forever instead of resolving
    pub fn hang_opens(&self, hang: bool) {
        self.hang.store(hang, Ordering::SeqCst);
    }

    /// Fail the next `count` opens with the configured error
    pub fn fail_next_opens(&self, count: u32) {
        self.fail_opens.store(count, Ordering::SeqCst);
    }

    /// Set the error returned for failed opens
    pub fn set_open_error(&self, error: TransportError) {
        *self.open_error.lock() = error;
    }

    /// Get the number of open attempts observed so far
    #[must_use]
    pub fn open_count(&self) -> u32 {
        self.opens.load(Ordering::SeqCst)
    }

    /// Flip the readiness reported by the live session
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Push an event into the live session, if one is open
    pub fn push(&self, event: TransportEvent) {
        if let Some(sender) = self.sender.lock().as_ref() {
            sender.try_send(event).expect("mock session buffer full");
        }
    }
}

struct MockHandle {
    ready: Arc<AtomicBool>,
    _keepalive: mpsc::Sender<TransportEvent>,
}

#[async_trait]
impl SessionHandle for MockHandle {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn close(&self) {
        self.ready.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn open(&self, _token: &str) -> Result<TransportSession, TransportError> {
        self.opens.fetch_add(1, Ordering::SeqCst);

        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }

        let remaining = self.fail_opens.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_opens.store(remaining - 1, Ordering::SeqCst);
            return Err(self.open_error.lock().clone());
        }

        let (tx, rx) = mpsc::channel(64);
        tx.send(TransportEvent::Ready)
            .await
            .expect("fresh mock session must accept ready");
        self.ready.store(true, Ordering::SeqCst);
        *self.sender.lock() = Some(tx.clone());

        Ok(TransportSession {
            events: rx,
            handle: Box::new(MockHandle {
                ready: self.ready.clone(),
                _keepalive: tx,
            }),
        })
    }
}
