//! Home alarm firmware: main entry point.
//!
//! Hexagonal architecture around a single cooperative tick loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   LogEventSink   NvsAdapter   Esp32Time       │
//! │  (Motion+Siren)    (EventSink)    (Config+State)               │
//! │  WifiAdapter       UdpAdapter                                  │
//! │  (Connectivity)    (Datagram+Notifier)                         │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  FSM · debounced sensors · effects queue               │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  LinkSupervisor · ControlServer · Watchdog                     │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every tick: supervise the link, sample and advance the FSM, serve
//! pending control requests, then execute the queued effects.
#![deny(unused_must_use)]

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use log::{info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::EspWifi;

use homealarm::adapters::hardware::HardwareAdapter;
use homealarm::adapters::log_sink::LogEventSink;
use homealarm::adapters::nvs::NvsAdapter;
use homealarm::adapters::time::Esp32TimeAdapter;
use homealarm::adapters::udp::UdpAdapter;
use homealarm::adapters::wifi::WifiAdapter;
use homealarm::app::link::LinkSupervisor;
use homealarm::app::ports::{ConfigError, ConfigPort, ConnectivityPort};
use homealarm::app::service::AppService;
use homealarm::config::AlarmConfig;
use homealarm::drivers::{hw_init, watchdog::Watchdog};
use homealarm::error::Error;
use homealarm::protocol::server::ControlServer;

/// Task watchdog timeout for the tick loop.
const WATCHDOG_TIMEOUT_MS: u32 = 5_000;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  HomeAlarm v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Peripherals ────────────────────────────────────────
    hw_init::init_peripherals().map_err(Error::from)?;

    // ── 3. NVS: config and persisted state ────────────────────
    let mut nvs = match NvsAdapter::new() {
        Ok(n) => n,
        Err(e) => {
            warn!("NVS init failed ({}), running with defaults and no persistence", e);
            NvsAdapter::default()
        }
    };
    let config = match nvs.load() {
        Ok(cfg) => cfg,
        Err(ConfigError::Corrupted) => {
            warn!("NVS config unreadable, using defaults");
            if let Err(e) = nvs.discard_config() {
                warn!("NVS config erase failed ({})", e);
            }
            AlarmConfig::default()
        }
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            AlarmConfig::default()
        }
    };
    let initial = AppService::restored_state(&nvs);
    info!("Boot: restoring {}", initial);

    // ── 4. Construct adapters ─────────────────────────────────
    let clock = Esp32TimeAdapter::new();
    let mut hw = HardwareAdapter::default();
    let mut log_sink = LogEventSink::new();
    let mut udp = UdpAdapter::new(SocketAddr::V4(config.notify_addr()));

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take()?;
    let mut wifi = WifiAdapter::new(EspWifi::new(
        peripherals.modem,
        sysloop,
        Some(nvs_partition),
    )?);
    if let Err(e) = wifi.set_credentials(&config.wifi_ssid, &config.wifi_password) {
        warn!("WiFi credentials rejected: {}", e);
    }

    // ── 5. Start the alarm before any network traffic ─────────
    let mut app = AppService::new(config.clone(), initial);
    app.start(clock.uptime_ms(), &mut hw, &mut nvs, &mut udp, &mut log_sink);

    let mut link = LinkSupervisor::new(&config);
    link.start(clock.uptime_ms(), &mut wifi);
    let mut server = ControlServer::new(&config);

    let watchdog = Watchdog::subscribe(WATCHDOG_TIMEOUT_MS);
    let tick = Duration::from_millis(u64::from(config.tick_interval_ms));

    info!("System ready. Entering tick loop.");

    // ── 6. Tick loop ──────────────────────────────────────────
    loop {
        let now_ms = clock.uptime_ms();

        link.poll(now_ms, &mut wifi, &mut udp, &mut log_sink);
        app.tick(now_ms, &mut hw, &mut log_sink);
        if link.is_online() {
            server.poll(&mut app, &mut udp, &mut log_sink);
        }
        app.flush_effects(&mut hw, &mut nvs, &mut udp, &mut log_sink);

        watchdog.feed();
        std::thread::sleep(tick);
    }
}
