//! Login demo against the in-memory transport.
//!
//! A scripted "server" answers every ping with a pong, so the session
//! stays alive for the whole run:
//!
//! ```sh
//! cargo run --example login
//! ```

use std::sync::Arc;
use std::time::Duration;

use imwire_client::protocol::BasicPacket;
use imwire_client::transport::mock::{ConnectBehavior, MockConnector};
use imwire_client::{ClientBuilder, LoginAck};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("imwire_client=debug")),
        )
        .init();

    let connector = Arc::new(MockConnector::new(ConnectBehavior::Open));
    let link = connector.link();

    let client = ClientBuilder::new("ws://192.168.3.26:9502", "ccc")
        .heartbeat_interval(Duration::from_secs(2))
        .build(connector);

    let ack = client.login().await;
    println!("client login returned {ack:?}");
    if ack != LoginAck::Success {
        return;
    }

    // answer each ping with a pong
    let responder = link.clone();
    tokio::spawn(async move {
        for n in 1.. {
            responder.wait_for_sends(n).await;
            responder.inject(BasicPacket::pong().encode());
        }
    });

    tokio::time::sleep(Duration::from_secs(7)).await;
    println!(
        "after 7s: state={:?}, pings sent={}",
        client.state(),
        link.sent_count()
    );
}
