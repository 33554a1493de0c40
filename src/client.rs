//! Client builder and connection lifecycle.
//!
//! The [`ClientBuilder`] provides a fluent API for configuring the session.
//! The [`Client`] runs login, then supervises three tasks for the life of
//! the connection:
//! 1. the event loop - refreshes the read clock and routes inbound frames
//! 2. the heartbeat loop - sends a basic PING every interval
//! 3. the read-deadline loop - force-closes a connection that has gone
//!    silent, which the transport itself would never report
//!
//! # Example
//!
//! ```ignore
//! use imwire_client::{ClientBuilder, LoginAck};
//!
//! let client = ClientBuilder::new("ws://192.168.3.26:9502", "ccc")
//!     .build(connector);
//! match client.login().await {
//!     LoginAck::Success => { /* connected, loops running */ }
//!     ack => eprintln!("login refused: {ack:?}"),
//! }
//! ```

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, Instant};
use tracing::{debug, info, trace, warn};

use crate::error::Result;
use crate::protocol::{BasicPacket, WireReader, MAGIC_BASIC_PACKET};
use crate::router::BasicRouter;
use crate::transport::{Connection, Connector, TransportEvent};

/// Default heartbeat interval.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(10);

/// Default bound on how long `login` waits for the transport to open.
pub const DEFAULT_LOGIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Cadence of the read-deadline watchdog.
const DEADLINE_TICK: Duration = Duration::from_secs(1);

/// Read deadline as a multiple of the heartbeat interval. Three intervals
/// absorb two lost pongs before the connection is declared dead.
const READ_DEADLINE_FACTOR: u32 = 3;

/// Connection lifecycle states.
///
/// Only `Init/Closed -> Connecting -> Connected -> Closed` are driven
/// today; `Reconnecting` and `Closing` are reserved for a future
/// reconnect/drain design.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    /// Fresh session, never connected.
    Init = 0,
    /// A login attempt is in flight.
    Connecting = 1,
    /// Transport open, loops running.
    Connected = 2,
    /// Reserved.
    Reconnecting = 3,
    /// Reserved.
    Closing = 4,
    /// Transport gone; a new `login` may start over.
    Closed = 5,
}

impl ConnectionState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Init,
            1 => Self::Connecting,
            2 => Self::Connected,
            3 => Self::Reconnecting,
            4 => Self::Closing,
            _ => Self::Closed,
        }
    }
}

/// Outcome of a [`Client::login`] attempt.
///
/// Connect failures surface here as statuses, not as errors: callers branch
/// on the ack the way they would on a server response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginAck {
    /// Transport open, session connected.
    Success,
    /// The transport did not report open within the login timeout.
    Timeout,
    /// The transport reported a failure before the timeout.
    Failed(String),
    /// The session was already connected; no second transport was opened.
    AlreadyLoggedIn,
}

/// Instant cell the event loop writes and the watchdog reads, without a
/// lock on the hot path. Stores milliseconds since a per-session epoch.
struct AtomicInstant {
    epoch: Instant,
    offset_ms: AtomicU64,
}

impl AtomicInstant {
    fn new(now: Instant) -> Self {
        Self {
            epoch: now,
            offset_ms: AtomicU64::new(0),
        }
    }

    fn store(&self, t: Instant) {
        let ms = t.saturating_duration_since(self.epoch).as_millis() as u64;
        self.offset_ms.store(ms, Ordering::Relaxed);
    }

    fn load(&self) -> Instant {
        self.epoch + Duration::from_millis(self.offset_ms.load(Ordering::Relaxed))
    }

    fn idle_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.load())
    }
}

/// Mutable session state shared between the client and its loops.
///
/// `state` and `last_read` are each read-then-branched by three schedulers
/// (event loop, heartbeat, watchdog), so both live in atomics.
struct Session {
    state: AtomicU8,
    last_read: AtomicInstant,
    heartbeat_interval: Duration,
    conn: Mutex<Option<Arc<dyn Connection>>>,
}

impl Session {
    fn new(heartbeat_interval: Duration) -> Self {
        Self {
            state: AtomicU8::new(ConnectionState::Init as u8),
            last_read: AtomicInstant::new(Instant::now()),
            heartbeat_interval,
            conn: Mutex::new(None),
        }
    }

    fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    fn set_state(&self, state: ConnectionState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }

    fn connection(&self) -> Option<Arc<dyn Connection>> {
        self.conn.lock().unwrap().clone()
    }

    fn install(&self, conn: Arc<dyn Connection>) {
        *self.conn.lock().unwrap() = Some(conn);
    }

    fn release(&self) {
        self.conn.lock().unwrap().take();
    }

    fn read_deadline(&self) -> Duration {
        self.heartbeat_interval * READ_DEADLINE_FACTOR
    }
}

/// Builder for configuring and creating a [`Client`].
pub struct ClientBuilder {
    url: String,
    username: String,
    heartbeat_interval: Duration,
    login_timeout: Duration,
}

impl ClientBuilder {
    /// Create a builder for the given server URL and username.
    pub fn new(url: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: username.into(),
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            login_timeout: DEFAULT_LOGIN_TIMEOUT,
        }
    }

    /// Set the heartbeat interval. The read deadline follows at 3x.
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Set how long `login` waits for the transport to open.
    pub fn login_timeout(mut self, timeout: Duration) -> Self {
        self.login_timeout = timeout;
        self
    }

    /// Build the client on top of the given connector.
    pub fn build(self, connector: Arc<dyn Connector>) -> Client {
        Client {
            login_url: format!("{}?username={}", self.url, self.username),
            login_timeout: self.login_timeout,
            connector,
            session: Arc::new(Session::new(self.heartbeat_interval)),
        }
    }
}

/// A messaging client owning one session.
pub struct Client {
    login_url: String,
    login_timeout: Duration,
    connector: Arc<dyn Connector>,
    session: Arc<Session>,
}

impl Client {
    /// Create a new client builder.
    pub fn builder(url: impl Into<String>, username: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(url, username)
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.session.state()
    }

    /// The URL login connects to, username parameter included.
    pub fn login_url(&self) -> &str {
        &self.login_url
    }

    /// Open the transport and bring the session up.
    ///
    /// Exactly one of three outcomes occurs per attempt: the transport
    /// opens before the timeout (`Success`), the timeout fires first
    /// (`Timeout`), or the transport reports a failure (`Failed`). On
    /// success the event, heartbeat, and read-deadline loops are started;
    /// they stop on their own once the session leaves `Connected`.
    ///
    /// A failed attempt reverts the state to `Init` so the session stays
    /// retriable.
    pub async fn login(&self) -> LoginAck {
        if self.session.state() == ConnectionState::Connected {
            return LoginAck::AlreadyLoggedIn;
        }
        self.session.set_state(ConnectionState::Connecting);
        info!(url = %self.login_url, "logging in");

        match time::timeout(self.login_timeout, self.connector.connect(&self.login_url)).await {
            Ok(Ok((conn, events))) => {
                self.session.install(conn);
                self.session.last_read.store(Instant::now());
                self.session.set_state(ConnectionState::Connected);

                spawn_event_loop(self.session.clone(), events);
                spawn_heartbeat_loop(self.session.clone());
                spawn_deadline_loop(self.session.clone());

                info!("login succeeded");
                LoginAck::Success
            }
            Ok(Err(e)) => {
                warn!(error = %e, "login failed");
                self.session.set_state(ConnectionState::Init);
                LoginAck::Failed(e.to_string())
            }
            Err(_) => {
                warn!(timeout = ?self.login_timeout, "login timed out");
                self.session.set_state(ConnectionState::Init);
                LoginAck::Timeout
            }
        }
    }
}

/// Inbound side: refresh the read clock, then decode and route.
fn spawn_event_loop(session: Arc<Session>, mut events: mpsc::Receiver<TransportEvent>) {
    tokio::spawn(async move {
        let router = BasicRouter::new();
        while let Some(event) = events.recv().await {
            match event {
                TransportEvent::Message(frame) => {
                    // liveness first: a frame we cannot parse still proves
                    // the peer is alive
                    session.last_read.store(Instant::now());
                    if let Err(e) = route_frame(&router, &frame) {
                        warn!(error = %e, len = frame.len(), "discarding undecodable frame");
                    }
                }
                TransportEvent::Closed => break,
            }
        }
        session.set_state(ConnectionState::Closed);
        session.release();
        info!("connection closed");
    });
}

fn route_frame(router: &BasicRouter, frame: &[u8]) -> Result<()> {
    let mut reader = WireReader::new(frame);
    let magic = reader.read_u32()?;
    if magic == MAGIC_BASIC_PACKET {
        router.handle(reader.rest())
    } else {
        trace!(magic, "ignoring frame of an unrouted family");
        Ok(())
    }
}

/// Periodic PING sender. First run one interval after connect; stops only
/// when the session leaves `Connected`.
fn spawn_heartbeat_loop(session: Arc<Session>) {
    tokio::spawn(async move {
        debug!("heartbeat loop started");
        let ping = BasicPacket::ping().encode();
        loop {
            time::sleep(session.heartbeat_interval).await;
            if session.state() != ConnectionState::Connected {
                break;
            }
            let Some(conn) = session.connection() else {
                break;
            };
            debug!("sending ping");
            if let Err(e) = conn.send(ping.clone()).await {
                // a lost ping only weakens the liveness signal; the read
                // deadline is the sole authority on declaring the link dead
                warn!(error = %e, "heartbeat send failed");
            }
        }
        debug!("heartbeat loop exited");
    });
}

/// Watchdog: once a second, close the transport if nothing has been read
/// within three heartbeat intervals.
fn spawn_deadline_loop(session: Arc<Session>) {
    tokio::spawn(async move {
        debug!("read-deadline loop started");
        let deadline = session.read_deadline();
        loop {
            time::sleep(DEADLINE_TICK).await;
            if session.state() != ConnectionState::Connected {
                break;
            }
            let idle = session.last_read.idle_at(Instant::now());
            if idle > deadline {
                warn!(?idle, ?deadline, "read deadline exceeded, closing connection");
                if let Some(conn) = session.connection() {
                    // the transport's close notification flows back through
                    // the event loop, which settles the state
                    conn.close().await;
                }
                break;
            }
        }
        debug!("read-deadline loop exited");
    });
}
