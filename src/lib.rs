//! # imwire-client
//!
//! Rust client SDK for the IMWire binary messaging protocol.
//!
//! IMWire frames travel over any transport that delivers discrete binary
//! messages (a WebSocket in the original deployment). The client logs in,
//! then keeps the session alive with an application-level heartbeat and a
//! read-deadline watchdog that catches the silent failures the transport
//! itself never reports.
//!
//! ## Architecture
//!
//! - **protocol**: cursor-based wire codec and the basic packet format
//! - **router**: dispatch of decoded frames by command code
//! - **client**: login, heartbeat loop, and read-deadline loop
//! - **transport**: connection traits plus an in-memory mock
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use imwire_client::transport::mock::{ConnectBehavior, MockConnector};
//! use imwire_client::{ClientBuilder, LoginAck};
//!
//! #[tokio::main]
//! async fn main() {
//!     let connector = Arc::new(MockConnector::new(ConnectBehavior::Open));
//!     let client = ClientBuilder::new("ws://192.168.3.26:9502", "ccc")
//!         .build(connector);
//!     match client.login().await {
//!         LoginAck::Success => println!("connected"),
//!         ack => println!("login refused: {ack:?}"),
//!     }
//! }
//! ```

pub mod error;
pub mod protocol;
pub mod router;
pub mod transport;

mod client;

pub use client::{
    Client, ClientBuilder, ConnectionState, LoginAck, DEFAULT_HEARTBEAT_INTERVAL,
    DEFAULT_LOGIN_TIMEOUT,
};
pub use error::{ImwireError, Result};
