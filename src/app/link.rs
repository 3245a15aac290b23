//! WiFi link supervision.
//!
//! Keeps the station associated and the control server listening only
//! while the link is up.  Polled once per tick before the control server
//! is drained; never blocks.
//!
//! ```text
//!             link up (open server)
//!  Connecting ─────────────────────▶ Online
//!      │  ▲                            │
//!      │  │ restart         link lost  │
//!      │  └────────────────────────────┘
//!      │ timeout                 ▲
//!      ▼                         │ link up (open server)
//!   Offline ─────────────────────┘
//!      │ link still down: restart
//!      └──────────────────────▶ Connecting
//! ```
//!
//! A restart closes the server, drops the association and begins a new
//! one.  The alarm itself keeps running whatever the link does.

use log::{info, warn};

use super::events::AppEvent;
use super::ports::{ConnectivityPort, DatagramPort, EventSink};
use crate::config::AlarmConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Association started at `since_ms`, not up yet.
    Connecting { since_ms: u32 },
    /// Associated; control server listening.
    Online,
    /// Last attempt timed out.
    Offline,
}

pub struct LinkSupervisor {
    state: LinkState,
    timeout_ms: u32,
    udp_port: u16,
}

impl LinkSupervisor {
    pub fn new(config: &AlarmConfig) -> Self {
        Self {
            state: LinkState::Offline,
            timeout_ms: config.wifi_timeout_ms,
            udp_port: config.udp_port,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn is_online(&self) -> bool {
        self.state == LinkState::Online
    }

    /// Begin the first association.
    pub fn start(&mut self, now_ms: u32, wifi: &mut impl ConnectivityPort) {
        if let Err(e) = wifi.begin() {
            warn!("Link: WiFi begin failed: {}", e);
        }
        self.state = LinkState::Connecting { since_ms: now_ms };
        info!("Link: connecting (timeout {}ms)", self.timeout_ms);
    }

    /// Advance the supervisor.  Returns `true` while control traffic may
    /// be served.
    pub fn poll(
        &mut self,
        now_ms: u32,
        wifi: &mut impl ConnectivityPort,
        server: &mut impl DatagramPort,
        sink: &mut impl EventSink,
    ) -> bool {
        let connected = wifi.is_connected();
        match self.state {
            LinkState::Connecting { since_ms } => {
                if connected {
                    self.go_online(server, sink);
                } else if now_ms.wrapping_sub(since_ms) >= self.timeout_ms {
                    warn!("Link: no association after {}ms", self.timeout_ms);
                    self.state = LinkState::Offline;
                    sink.emit(&AppEvent::LinkDown);
                }
            }
            LinkState::Online => {
                if !connected {
                    warn!("Link: connection lost");
                    sink.emit(&AppEvent::LinkDown);
                    self.restart(now_ms, wifi, server);
                }
            }
            LinkState::Offline => {
                if connected {
                    self.go_online(server, sink);
                } else {
                    self.restart(now_ms, wifi, server);
                }
            }
        }
        self.is_online()
    }

    fn go_online(&mut self, server: &mut impl DatagramPort, sink: &mut impl EventSink) {
        match server.open(self.udp_port) {
            Ok(()) => {
                info!("Link: online, control server on port {}", self.udp_port);
                self.state = LinkState::Online;
                sink.emit(&AppEvent::LinkUp);
            }
            Err(e) => {
                // Retried through a restart on the next poll.
                warn!("Link: control server not opened: {}", e);
                self.state = LinkState::Offline;
            }
        }
    }

    fn restart(
        &mut self,
        now_ms: u32,
        wifi: &mut impl ConnectivityPort,
        server: &mut impl DatagramPort,
    ) {
        server.close();
        wifi.disconnect();
        if let Err(e) = wifi.begin() {
            warn!("Link: WiFi begin failed: {}", e);
        }
        self.state = LinkState::Connecting { since_ms: now_ms };
        info!("Link: reconnecting");
    }
}
