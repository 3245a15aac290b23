//! System configuration parameters
//!
//! All tunable parameters for the alarm controller.
//! Defaults can be overridden at build time (operator secrets) and at
//! runtime via NVS.

use core::net::{Ipv4Addr, SocketAddrV4};

use serde::{Deserialize, Serialize};

/// Maximum length of an operator command code.
pub const MAX_CODE_LEN: usize = 32;

/// Literal status-query token.  Not configurable.
pub const STATUS_CODE: &str = "STATO";

pub type Code = heapless::String<MAX_CODE_LEN>;

/// The three operator-configured secret codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandCodes {
    /// Arm after the countdown.
    pub arm_countdown: Code,
    /// Arm immediately, skipping the countdown.
    pub arm_immediate: Code,
    /// Disarm from any state.
    pub disarm: Code,
}

impl Default for CommandCodes {
    fn default() -> Self {
        Self {
            arm_countdown: bounded(option_env!("ALARM_CODE_ARM_COUNTDOWN").unwrap_or("CODICE1")),
            arm_immediate: bounded(option_env!("ALARM_CODE_ARM_IMMEDIATE").unwrap_or("CODICE2")),
            disarm: bounded(option_env!("ALARM_CODE_DISARM").unwrap_or("CODICE3")),
        }
    }
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmConfig {
    // --- State machine timing ---
    /// Countdown between the arm-with-countdown command and ARMED (ms)
    pub arm_delay_ms: u32,
    /// Grace period between motion and the siren (ms)
    pub alarm_delay_ms: u32,

    // --- Sensors ---
    /// Second-read offset that confirms a motion reading (ms)
    pub confirm_offset_ms: u32,
    /// Minimum interval between repeated alerts for one sensor (ms)
    pub realert_interval_ms: u32,

    // --- Network ---
    /// Maximum wait for a WiFi association before giving up (ms)
    pub wifi_timeout_ms: u32,
    /// Control datagrams processed per tick at most
    pub max_requests_per_tick: u16,
    /// UDP port of the control server
    pub udp_port: u16,
    /// Notification bot address
    pub notify_ip: [u8; 4],
    pub notify_port: u16,
    pub wifi_ssid: heapless::String<32>,
    pub wifi_password: heapless::String<64>,

    // --- Timing ---
    /// Main loop tick interval (ms)
    pub tick_interval_ms: u32,

    pub codes: CommandCodes,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            arm_delay_ms: 30_000,
            alarm_delay_ms: 15_000,

            confirm_offset_ms: 100,
            realert_interval_ms: 5_000,

            wifi_timeout_ms: 20_000,
            max_requests_per_tick: 100,
            udp_port: 4210,
            notify_ip: default_notify_ip(),
            notify_port: 4120,
            wifi_ssid: bounded(option_env!("ALARM_WIFI_SSID").unwrap_or("")),
            wifi_password: bounded(option_env!("ALARM_WIFI_PASSWORD").unwrap_or("")),

            tick_interval_ms: 50, // 20 Hz

            codes: CommandCodes::default(),
        }
    }
}

impl AlarmConfig {
    /// Whole seconds of the arming countdown, as announced to the user.
    pub fn arm_delay_secs(&self) -> u32 {
        self.arm_delay_ms / 1000
    }

    /// Whole seconds between motion and the siren, as announced to the user.
    pub fn alarm_delay_secs(&self) -> u32 {
        self.alarm_delay_ms / 1000
    }

    /// Socket address of the notification bot.
    pub fn notify_addr(&self) -> SocketAddrV4 {
        SocketAddrV4::new(Ipv4Addr::from(self.notify_ip), self.notify_port)
    }
}

fn default_notify_ip() -> [u8; 4] {
    option_env!("ALARM_NOTIFY_IP")
        .and_then(|s| s.parse::<Ipv4Addr>().ok())
        .map_or([192, 168, 1, 2], |ip| ip.octets())
}

/// Copy `s` into a fixed-capacity string, truncating at a char boundary.
pub fn bounded<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}
