//! Integration tests for imwire-client.
//!
//! Lifecycle tests run on tokio's paused clock: timers auto-advance, so a
//! 40-second heartbeat scenario completes instantly and deterministically.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::time::{self, Instant};

use imwire_client::protocol::{BasicPacket, WireReader, MAGIC_BASIC_PACKET, MAGIC_LOGIC_PACKET};
use imwire_client::transport::mock::{ConnectBehavior, MockConnector, MockLink};
use imwire_client::{Client, ClientBuilder, ConnectionState, LoginAck};

const INTERVAL: Duration = Duration::from_secs(10);

/// Client with a 10 s heartbeat on an immediately-opening mock transport.
fn connected_client() -> (Client, MockLink) {
    let connector = Arc::new(MockConnector::new(ConnectBehavior::Open));
    let link = connector.link();
    let client = ClientBuilder::new("ws://127.0.0.1:9502", "ccc")
        .heartbeat_interval(INTERVAL)
        .build(connector);
    (client, link)
}

async fn sleep_until(t0: Instant, offset: Duration) {
    time::sleep_until(t0 + offset).await;
}

fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}

fn millis(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

/// Full-frame round trip, magic included, across the public codec surface.
#[test]
fn test_full_frame_roundtrip() {
    let pkt = BasicPacket::new(2, "alive").unwrap();
    let bytes = pkt.encode();

    let mut reader = WireReader::new(&bytes);
    assert_eq!(reader.read_u32().unwrap(), MAGIC_BASIC_PACKET);

    let decoded = BasicPacket::decode(reader.rest()).unwrap();
    assert_eq!(decoded.code(), pkt.code());
    assert_eq!(decoded.body(), pkt.body());
}

/// While connected, exactly one PING goes out per interval; message arrival
/// does not trigger extra sends.
#[tokio::test(start_paused = true)]
async fn test_heartbeat_cadence() {
    let (client, link) = connected_client();
    let t0 = Instant::now();
    assert_eq!(client.login().await, LoginAck::Success);

    sleep_until(t0, secs(9)).await;
    assert_eq!(link.sent_count(), 0, "first ping only after a full interval");

    sleep_until(t0, secs(11)).await;
    assert_eq!(link.sent_count(), 1);

    // inbound traffic must not change the cadence
    link.inject(BasicPacket::pong().encode());
    sleep_until(t0, secs(19)).await;
    assert_eq!(link.sent_count(), 1);

    sleep_until(t0, secs(21)).await;
    assert_eq!(link.sent_count(), 2);

    // every frame on the wire is a well-formed PING
    for frame in link.sent_frames() {
        let mut reader = WireReader::new(&frame);
        assert_eq!(reader.read_u32().unwrap(), MAGIC_BASIC_PACKET);
        let pkt = BasicPacket::decode(reader.rest()).unwrap();
        assert_eq!(pkt.code(), 1);
        assert_eq!(pkt.body(), "");
    }
}

/// The watchdog boundary is strict: alive through 3x the interval, closed
/// on the first tick past it.
#[tokio::test(start_paused = true)]
async fn test_read_deadline_boundary() {
    let (client, link) = connected_client();
    let t0 = Instant::now();
    assert_eq!(client.login().await, LoginAck::Success);

    // the server never answers; outbound pings do not refresh the clock
    sleep_until(t0, secs(29)).await;
    assert_eq!(client.state(), ConnectionState::Connected);

    sleep_until(t0, millis(30_500)).await;
    assert_eq!(
        client.state(),
        ConnectionState::Connected,
        "idle of exactly 3x the interval must not close"
    );

    sleep_until(t0, millis(31_500)).await;
    assert_eq!(client.state(), ConnectionState::Closed);
    assert!(link.is_closed());

    // a late peer-side close notification must be harmless
    link.close_from_peer();
    assert_eq!(client.state(), ConnectionState::Closed);
}

/// Happy path: login resolves fast, first ping at ~10 s,
/// one pong at 10.1 s keeps the session alive through t = 40 s.
#[tokio::test(start_paused = true)]
async fn test_pong_refreshes_read_deadline() {
    let (client, link) = connected_client();
    let t0 = Instant::now();

    assert_eq!(client.login().await, LoginAck::Success);
    assert!(t0.elapsed() < secs(5), "login resolved well under the timeout");

    sleep_until(t0, millis(10_050)).await;
    assert_eq!(link.sent_count(), 1, "first ping on the wire at ~10s");

    sleep_until(t0, millis(10_100)).await;
    link.inject(BasicPacket::pong().encode());

    // without the refresh the watchdog would close at 31s
    sleep_until(t0, secs(40)).await;
    assert_eq!(client.state(), ConnectionState::Connected);
    assert!(link.sent_count() >= 3);
    assert!(!link.is_closed());
}

/// The read clock refreshes before parsing: even unparseable traffic
/// proves the peer alive, and a bad frame never tears the session down.
#[tokio::test(start_paused = true)]
async fn test_malformed_frame_refreshes_clock_and_keeps_session_open() {
    let (client, link) = connected_client();
    let t0 = Instant::now();
    assert_eq!(client.login().await, LoginAck::Success);

    sleep_until(t0, secs(29)).await;
    link.inject(Bytes::from_static(&[0xDE, 0xAD]));

    // a frame of an unrouted family also counts as liveness
    sleep_until(t0, secs(30)).await;
    let logic = BasicPacket::new(100, "").unwrap().encode();
    let mut reframed = logic.to_vec();
    reframed[..4].copy_from_slice(&MAGIC_LOGIC_PACKET.to_be_bytes());
    link.inject(Bytes::from(reframed));

    sleep_until(t0, secs(45)).await;
    assert_eq!(
        client.state(),
        ConnectionState::Connected,
        "clock was refreshed at 29s and 30s, deadline moved to 60s"
    );

    sleep_until(t0, millis(61_500)).await;
    assert_eq!(client.state(), ConnectionState::Closed);
}

/// A transport-level close settles the state and stops both loops.
#[tokio::test(start_paused = true)]
async fn test_peer_close_stops_loops() {
    let (client, link) = connected_client();
    let t0 = Instant::now();
    assert_eq!(client.login().await, LoginAck::Success);

    sleep_until(t0, secs(11)).await;
    assert_eq!(link.sent_count(), 1);

    link.close_from_peer();
    sleep_until(t0, secs(12)).await;
    assert_eq!(client.state(), ConnectionState::Closed);

    // no heartbeat survives the close
    sleep_until(t0, secs(60)).await;
    assert_eq!(link.sent_count(), 1);
}

/// Heartbeat send failures are swallowed; only a state change stops the
/// loop, and the watchdog alone decides when the link is dead.
#[tokio::test(start_paused = true)]
async fn test_heartbeat_survives_send_failures() {
    let (client, link) = connected_client();
    let t0 = Instant::now();
    assert_eq!(client.login().await, LoginAck::Success);

    link.set_fail_sends(true);
    // keep the watchdog quiet while the pings fail
    sleep_until(t0, secs(15)).await;
    link.inject(BasicPacket::pong().encode());

    sleep_until(t0, secs(21)).await;
    assert_eq!(link.sent_count(), 0, "pings at 10s and 20s failed to write");
    assert_eq!(client.state(), ConnectionState::Connected);

    sleep_until(t0, secs(25)).await;
    link.inject(BasicPacket::pong().encode());
    link.set_fail_sends(false);
    sleep_until(t0, secs(31)).await;
    assert_eq!(link.sent_count(), 1, "loop kept running and sent the next ping");
    assert_eq!(client.state(), ConnectionState::Connected);
}

/// A hung transport resolves `Timeout` at exactly the login bound and
/// leaves the session retriable.
#[tokio::test(start_paused = true)]
async fn test_login_timeout_then_retry() {
    let connector = Arc::new(MockConnector::new(ConnectBehavior::Hang));
    let client = ClientBuilder::new("ws://127.0.0.1:9502", "ccc")
        .login_timeout(secs(5))
        .build(connector.clone());

    let started = Instant::now();
    assert_eq!(client.login().await, LoginAck::Timeout);
    assert_eq!(started.elapsed(), secs(5));
    assert_eq!(client.state(), ConnectionState::Init);

    connector.set_behavior(ConnectBehavior::Open);
    assert_eq!(client.login().await, LoginAck::Success);
    assert_eq!(client.state(), ConnectionState::Connected);
}
