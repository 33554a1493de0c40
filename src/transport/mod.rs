//! Transport boundary - what the client consumes from a connection library.
//!
//! The protocol core is transport agnostic: anything that delivers discrete
//! binary messages plus open/close notifications can carry it (a WebSocket
//! in the original deployment). [`mock`] ships an in-memory implementation
//! for tests and demos.

pub mod mock;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use crate::error::Result;

/// Asynchronous notifications a connection delivers after opening.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// One complete binary message.
    Message(Bytes),
    /// The connection is gone - peer close, transport failure, or local
    /// close. Closing the event channel counts as the same signal.
    Closed,
}

/// An open connection.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Send one binary message. Fails on write error.
    async fn send(&self, frame: Bytes) -> Result<()>;

    /// Close the connection. Implementations must make this idempotent:
    /// the watchdog and the transport's own close path may both reach it.
    async fn close(&self);
}

/// Opens connections.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a connection to `url`. Resolves once the transport reports
    /// open, or errs on transport failure; the caller bounds the wait with
    /// its own timeout.
    async fn connect(&self, url: &str)
        -> Result<(Arc<dyn Connection>, mpsc::Receiver<TransportEvent>)>;
}
