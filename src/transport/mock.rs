//! In-memory transport for tests and demos.
//!
//! [`MockConnector`] scripts the connect outcome; the [`MockLink`] it hands
//! out captures every outbound frame, injects inbound events, and drives
//! the close path - enough to exercise the whole lifecycle without a
//! network.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::{mpsc, Notify};

use super::{Connection, Connector, TransportEvent};
use crate::error::{ImwireError, Result};

/// Capacity of the mock's event channel; tests never come close.
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// How [`MockConnector::connect`] behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectBehavior {
    /// Resolve immediately with an open connection.
    Open,
    /// Never resolve - drives the login timeout path.
    Hang,
    /// Fail with a transport error.
    Refuse,
}

#[derive(Default)]
struct LinkInner {
    sent: Mutex<Vec<Bytes>>,
    sent_signal: Notify,
    events: Mutex<Option<mpsc::Sender<TransportEvent>>>,
    closed: AtomicBool,
    fail_sends: AtomicBool,
    connects: AtomicUsize,
}

/// Shared handle a test keeps to observe and drive a mock connection.
#[derive(Clone, Default)]
pub struct MockLink {
    inner: Arc<LinkInner>,
}

impl MockLink {
    /// Frames the client has sent, in order.
    pub fn sent_frames(&self) -> Vec<Bytes> {
        self.inner.sent.lock().unwrap().clone()
    }

    /// Number of frames the client has sent.
    pub fn sent_count(&self) -> usize {
        self.inner.sent.lock().unwrap().len()
    }

    /// How many times `connect` has been called.
    pub fn connect_count(&self) -> usize {
        self.inner.connects.load(Ordering::SeqCst)
    }

    /// Whether the connection has been closed (locally or by the peer).
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Make every subsequent `send` fail with a write error.
    pub fn set_fail_sends(&self, fail: bool) {
        self.inner.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Deliver one inbound binary message. Dropped silently once closed.
    pub fn inject(&self, frame: Bytes) {
        let tx = self.inner.events.lock().unwrap().clone();
        if let Some(tx) = tx {
            let _ = tx.try_send(TransportEvent::Message(frame));
        }
    }

    /// Close from the peer side: a close notification, then the channel
    /// ends. A no-op when already closed.
    pub fn close_from_peer(&self) {
        self.inner.shut_down();
    }

    /// Wait until the client has sent at least `n` frames.
    pub async fn wait_for_sends(&self, n: usize) {
        loop {
            let notified = self.inner.sent_signal.notified();
            if self.sent_count() >= n {
                return;
            }
            notified.await;
        }
    }
}

impl LinkInner {
    /// Mark closed and emit exactly one close notification. Idempotent.
    fn shut_down(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(tx) = self.events.lock().unwrap().take() {
            let _ = tx.try_send(TransportEvent::Closed);
        }
    }
}

/// Connector whose outcome is scripted per test.
pub struct MockConnector {
    behavior: Mutex<ConnectBehavior>,
    link: MockLink,
}

impl MockConnector {
    /// Create a connector with the given connect behavior.
    pub fn new(behavior: ConnectBehavior) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            link: MockLink::default(),
        }
    }

    /// The link shared with every connection this connector opens.
    pub fn link(&self) -> MockLink {
        self.link.clone()
    }

    /// Change how the next `connect` behaves (retry scenarios).
    pub fn set_behavior(&self, behavior: ConnectBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(
        &self,
        url: &str,
    ) -> Result<(Arc<dyn Connection>, mpsc::Receiver<TransportEvent>)> {
        self.link.inner.connects.fetch_add(1, Ordering::SeqCst);
        let behavior = *self.behavior.lock().unwrap();
        match behavior {
            ConnectBehavior::Open => {
                let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
                *self.link.inner.events.lock().unwrap() = Some(tx);
                self.link.inner.closed.store(false, Ordering::SeqCst);
                let conn = MockConnection {
                    link: self.link.clone(),
                };
                Ok((Arc::new(conn), rx))
            }
            ConnectBehavior::Hang => {
                std::future::pending::<()>().await;
                unreachable!("pending future resolved")
            }
            ConnectBehavior::Refuse => {
                Err(ImwireError::ConnectFailed(format!("{url}: connection refused")))
            }
        }
    }
}

struct MockConnection {
    link: MockLink,
}

#[async_trait]
impl Connection for MockConnection {
    async fn send(&self, frame: Bytes) -> Result<()> {
        if self.link.inner.fail_sends.load(Ordering::SeqCst) {
            return Err(ImwireError::SendFailed("scripted write failure".into()));
        }
        if self.link.inner.closed.load(Ordering::SeqCst) {
            return Err(ImwireError::ConnectionClosed);
        }
        self.link.inner.sent.lock().unwrap().push(frame);
        self.link.inner.sent_signal.notify_waiters();
        Ok(())
    }

    async fn close(&self) {
        self.link.inner.shut_down();
    }
}
