//! Stateless dispatch from a decoded basic frame to its handler.

use tracing::{debug, trace};

use crate::error::Result;
use crate::protocol::{BasicCommand, BasicPacket};

/// Routes basic-family frames by command code.
///
/// Unknown command codes are ignored so newer servers can speak to older
/// clients without breaking them. The read-deadline refresh happens in the
/// client's event loop before a frame ever reaches the router; routing a
/// pong has no side effect beyond diagnostics.
#[derive(Debug, Default, Clone)]
pub struct BasicRouter;

impl BasicRouter {
    /// Create a router.
    pub fn new() -> Self {
        Self
    }

    /// Decode `raw` (positioned at the command code, magic already consumed
    /// by the caller) and dispatch it.
    ///
    /// Decode failures propagate; the caller decides whether they are fatal.
    pub fn handle(&self, raw: &[u8]) -> Result<()> {
        let packet = BasicPacket::decode(raw)?;
        match packet.command() {
            Some(BasicCommand::Pong) => self.on_pong(&packet),
            Some(BasicCommand::Ping) => {
                // servers ping us only by mistake; answering would be wrong
                debug!("ignoring ping addressed to a client");
            }
            None => trace!(code = packet.code(), "ignoring unknown command code"),
        }
        Ok(())
    }

    fn on_pong(&self, packet: &BasicPacket) {
        debug!(body_len = packet.body().len(), "pong received");
    }
}
