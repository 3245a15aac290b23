//! Mock adapters for integration tests.
//!
//! Every port records what it was asked to do so tests can assert on the
//! full history without touching GPIO, flash or sockets.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;

use homealarm::app::events::AppEvent;
use homealarm::app::ports::{
    ConnectivityError, ConnectivityPort, DatagramPort, EventSink, MotionInputPort, NotifierPort,
    SirenPort, StatePort, StorageError,
};
use homealarm::app::service::AppService;
use homealarm::config::AlarmConfig;
use homealarm::error::{ActuatorError, CommsError};
use homealarm::fsm::StateId;
use homealarm::pins::MOTION_SENSORS;
use homealarm::protocol::server::ControlServer;
use homealarm::sensors::MotionSnapshot;

// ── MockHardware ──────────────────────────────────────────────

/// Scripted PIR levels plus a recorded siren line.
pub struct MockHardware {
    pub levels: Vec<bool>,
    pub siren_calls: Vec<bool>,
    siren_on: bool,
}

impl MockHardware {
    pub fn new() -> Self {
        Self {
            levels: vec![false; MOTION_SENSORS.len()],
            siren_calls: Vec::new(),
            siren_on: false,
        }
    }

    /// Drive the sensor called `name` high or low.
    pub fn set_motion(&mut self, name: &str, high: bool) {
        let idx = MOTION_SENSORS
            .iter()
            .position(|p| p.name == name)
            .unwrap_or_else(|| panic!("no sensor named {name}"));
        self.levels[idx] = high;
    }

    pub fn clear_motion(&mut self) {
        self.levels.iter_mut().for_each(|l| *l = false);
    }

    pub fn siren_sounding(&self) -> bool {
        self.siren_on
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionInputPort for MockHardware {
    fn read_levels(&mut self) -> MotionSnapshot {
        self.levels.iter().copied().collect()
    }
}

impl SirenPort for MockHardware {
    fn set_siren(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.siren_calls.push(on);
        self.siren_on = on;
        Ok(())
    }

    fn is_siren_on(&self) -> bool {
        self.siren_on
    }
}

// ── MockStore ─────────────────────────────────────────────────

#[derive(Default)]
pub struct MockStore {
    pub stored: Option<StateId>,
    pub writes: Vec<StateId>,
    pub fail_writes: bool,
}

impl MockStore {
    pub fn holding(state: StateId) -> Self {
        Self {
            stored: Some(state),
            ..Default::default()
        }
    }
}

impl StatePort for MockStore {
    fn read_persisted_state(&self) -> Result<Option<StateId>, StorageError> {
        Ok(self.stored)
    }

    fn write_persisted_state(&mut self, state: StateId) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::IoError);
        }
        self.stored = Some(state);
        self.writes.push(state);
        Ok(())
    }
}

// ── MockBot ───────────────────────────────────────────────────

#[derive(Default)]
pub struct MockBot {
    pub messages: Vec<String>,
    pub offline: bool,
}

impl NotifierPort for MockBot {
    fn notify(&mut self, message: &str) -> Result<(), CommsError> {
        if self.offline {
            return Err(CommsError::SendFailed);
        }
        self.messages.push(message.to_string());
        Ok(())
    }
}

// ── MockTransport ─────────────────────────────────────────────

/// In-memory datagram socket: tests queue requests, replies are recorded.
#[derive(Default)]
pub struct MockTransport {
    pub inbox: VecDeque<(SocketAddr, Vec<u8>)>,
    pub sent: Vec<(SocketAddr, Vec<u8>)>,
    pub opened_on: Option<u16>,
    pub open_count: u32,
    pub fail_open: bool,
}

impl MockTransport {
    pub fn push(&mut self, peer: SocketAddr, payload: &[u8]) {
        self.inbox.push_back((peer, payload.to_vec()));
    }

    /// Replies sent so far, as strings.
    pub fn replies(&self) -> Vec<String> {
        self.sent
            .iter()
            .map(|(_, b)| String::from_utf8_lossy(b).into_owned())
            .collect()
    }

    pub fn last_reply(&self) -> Option<String> {
        self.replies().pop()
    }
}

impl DatagramPort for MockTransport {
    fn open(&mut self, port: u16) -> Result<(), CommsError> {
        if self.fail_open {
            return Err(CommsError::SocketBindFailed);
        }
        self.opened_on = Some(port);
        self.open_count += 1;
        Ok(())
    }

    fn close(&mut self) {
        self.opened_on = None;
    }

    fn is_open(&self) -> bool {
        self.opened_on.is_some()
    }

    fn recv(&mut self, buf: &mut [u8]) -> Option<(SocketAddr, usize)> {
        let (peer, payload) = self.inbox.pop_front()?;
        let len = payload.len().min(buf.len());
        buf[..len].copy_from_slice(&payload[..len]);
        Some((peer, len))
    }

    fn send_to(&mut self, addr: SocketAddr, bytes: &[u8]) -> Result<(), CommsError> {
        self.sent.push((addr, bytes.to_vec()));
        Ok(())
    }
}

// ── MockWifi ──────────────────────────────────────────────────

#[derive(Default)]
pub struct MockWifi {
    pub link_up: bool,
    pub begins: u32,
    pub disconnects: u32,
}

impl ConnectivityPort for MockWifi {
    fn begin(&mut self) -> Result<(), ConnectivityError> {
        self.begins += 1;
        Ok(())
    }

    fn disconnect(&mut self) {
        self.disconnects += 1;
    }

    fn is_connected(&self) -> bool {
        self.link_up
    }

    fn set_credentials(&mut self, _ssid: &str, _password: &str) -> Result<(), ConnectivityError> {
        Ok(())
    }
}

// ── LogSink ───────────────────────────────────────────────────

#[derive(Default)]
pub struct LogSink {
    pub events: Vec<AppEvent>,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for LogSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Rig ───────────────────────────────────────────────────────

pub fn peer(port: u16) -> SocketAddr {
    SocketAddr::from(([192, 168, 1, 50], port))
}

/// A booted controller wired to mocks, driven one tick at a time.
pub struct Rig {
    pub app: AppService,
    pub server: ControlServer,
    pub hw: MockHardware,
    pub store: MockStore,
    pub bot: MockBot,
    pub net: MockTransport,
    pub sink: LogSink,
}

impl Rig {
    /// Boot at t=0 from whatever `store` holds.
    pub fn boot(store: MockStore) -> Self {
        Self::boot_with(AlarmConfig::default(), store)
    }

    pub fn boot_with(config: AlarmConfig, mut store: MockStore) -> Self {
        let initial = AppService::restored_state(&store);
        let mut app = AppService::new(config.clone(), initial);
        let mut hw = MockHardware::new();
        let mut bot = MockBot::default();
        let mut sink = LogSink::new();
        app.start(0, &mut hw, &mut store, &mut bot, &mut sink);

        let mut net = MockTransport::default();
        net.open(config.udp_port).expect("mock transport opens");

        Self {
            app,
            server: ControlServer::new(&config),
            hw,
            store,
            bot,
            net,
            sink,
        }
    }

    /// One main-loop iteration at `now_ms`.
    pub fn step(&mut self, now_ms: u32) -> usize {
        self.app.tick(now_ms, &mut self.hw, &mut self.sink);
        let served = self.server.poll(&mut self.app, &mut self.net, &mut self.sink);
        self.app
            .flush_effects(&mut self.hw, &mut self.store, &mut self.bot, &mut self.sink);
        served
    }

    /// Run ticks every `period_ms` from `from_ms` up to and including `to_ms`.
    pub fn run(&mut self, from_ms: u32, to_ms: u32, period_ms: u32) {
        let mut t = from_ms;
        while t <= to_ms {
            self.step(t);
            t += period_ms;
        }
    }

    /// Send `payload` from the default peer and process it at `now_ms`.
    pub fn request(&mut self, now_ms: u32, payload: &[u8]) -> Option<String> {
        let before = self.net.sent.len();
        self.net.push(peer(5000), payload);
        self.step(now_ms);
        if self.net.sent.len() > before {
            self.net.last_reply()
        } else {
            None
        }
    }
}
