//! Control server: bounded drain of pending request datagrams.
//!
//! Called once per tick while the link is online.  At most
//! `max_requests_per_tick` datagrams are taken per call so a flood of
//! requests cannot starve the sensor scan; the rest wait in the socket
//! buffer for the next tick.

use log::{debug, info, warn};

use crate::app::ports::{DatagramPort, EventSink};
use crate::app::service::AppService;
use crate::config::AlarmConfig;

use super::codec::{self, MAX_DATAGRAM};

pub struct ControlServer {
    max_per_tick: u16,
    buf: [u8; MAX_DATAGRAM],
}

impl ControlServer {
    pub fn new(config: &AlarmConfig) -> Self {
        Self {
            max_per_tick: config.max_requests_per_tick,
            buf: [0; MAX_DATAGRAM],
        }
    }

    /// Serve pending requests in arrival order, one reply each.
    /// Returns the number of datagrams taken off the socket.
    pub fn poll(
        &mut self,
        app: &mut AppService,
        transport: &mut impl DatagramPort,
        sink: &mut impl EventSink,
    ) -> usize {
        let mut taken = 0;
        while taken < usize::from(self.max_per_tick) {
            let Some((peer, len)) = transport.recv(&mut self.buf) else {
                break;
            };
            taken += 1;

            let payload = &self.buf[..len.min(MAX_DATAGRAM)];
            let Some(cmd) = codec::decode(payload, &app.config().codes) else {
                debug!("Control: ignored {}-byte request from {}", len, peer);
                continue;
            };

            let outcome = app.handle_command(cmd, sink);
            let reply = codec::encode(outcome);
            info!("Control: {:?} from {} -> {}", cmd, peer, reply);
            if let Err(e) = transport.send_to(peer, reply.as_bytes()) {
                warn!("Control: reply to {} lost: {}", peer, e);
            }
        }
        taken
    }
}
