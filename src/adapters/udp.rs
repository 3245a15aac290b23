//! UDP adapter: control-server socket and notification sender.
//!
//! Implements [`DatagramPort`] and [`NotifierPort`] on `std::net::UdpSocket`,
//! which ESP-IDF provides through its lwIP-backed std port as well as on
//! host.  Both sockets are non-blocking; an empty receive queue is not an
//! error.
//!
//! Notifications leave from the control socket while it is open, so the
//! bot sees the control port as the source.  While offline they fall back
//! to an ephemeral socket.

use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};

use log::{debug, info, warn};

use crate::app::ports::{DatagramPort, NotifierPort};
use crate::error::CommsError;

pub struct UdpAdapter {
    server: Option<UdpSocket>,
    notifier: Option<UdpSocket>,
    notify_addr: SocketAddr,
}

impl UdpAdapter {
    pub fn new(notify_addr: SocketAddr) -> Self {
        Self {
            server: None,
            notifier: None,
            notify_addr,
        }
    }

    /// Port the control socket is bound to, if open.
    pub fn local_port(&self) -> Option<u16> {
        self.server
            .as_ref()
            .and_then(|s| s.local_addr().ok())
            .map(|a| a.port())
    }

    fn bind_nonblocking(addr: SocketAddr) -> Result<UdpSocket, CommsError> {
        let socket = UdpSocket::bind(addr).map_err(|e| {
            warn!("UDP: bind {} failed: {}", addr, e);
            CommsError::SocketBindFailed
        })?;
        socket
            .set_nonblocking(true)
            .map_err(|_| CommsError::SocketBindFailed)?;
        Ok(socket)
    }

    fn notifier_socket(&mut self) -> Result<&UdpSocket, CommsError> {
        if let Some(server) = self.server.as_ref() {
            return Ok(server);
        }
        if self.notifier.is_none() {
            let any: SocketAddr = ([0, 0, 0, 0], 0).into();
            self.notifier = Some(Self::bind_nonblocking(any)?);
        }
        self.notifier.as_ref().ok_or(CommsError::SocketClosed)
    }
}

// ── DatagramPort ──────────────────────────────────────────────

impl DatagramPort for UdpAdapter {
    fn open(&mut self, port: u16) -> Result<(), CommsError> {
        if self.server.is_some() {
            return Ok(());
        }
        let addr: SocketAddr = ([0, 0, 0, 0], port).into();
        self.server = Some(Self::bind_nonblocking(addr)?);
        self.notifier = None;
        info!("UDP: control server listening on port {}", self.local_port().unwrap_or(port));
        Ok(())
    }

    fn close(&mut self) {
        if self.server.take().is_some() {
            info!("UDP: control server closed");
        }
    }

    fn is_open(&self) -> bool {
        self.server.is_some()
    }

    fn recv(&mut self, buf: &mut [u8]) -> Option<(SocketAddr, usize)> {
        let socket = self.server.as_ref()?;
        match socket.recv_from(buf) {
            Ok((len, peer)) => Some((peer, len)),
            Err(e) if e.kind() == ErrorKind::WouldBlock => None,
            Err(e) => {
                warn!("UDP: receive failed: {}", e);
                None
            }
        }
    }

    fn send_to(&mut self, addr: SocketAddr, bytes: &[u8]) -> Result<(), CommsError> {
        let socket = self.server.as_ref().ok_or(CommsError::SocketClosed)?;
        socket
            .send_to(bytes, addr)
            .map(|_| ())
            .map_err(|_| CommsError::SendFailed)
    }
}

// ── NotifierPort ──────────────────────────────────────────────

impl NotifierPort for UdpAdapter {
    fn notify(&mut self, message: &str) -> Result<(), CommsError> {
        let addr = self.notify_addr;
        let socket = self.notifier_socket()?;
        socket
            .send_to(message.as_bytes(), addr)
            .map_err(|_| CommsError::SendFailed)?;
        debug!("UDP: notified {}: {}", addr, message);
        Ok(())
    }
}
