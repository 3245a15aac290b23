//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (sensors, siren, storage, network, event sinks)
//! implement these traits.  The [`AppService`](super::service::AppService)
//! and the [`ControlServer`](crate::protocol::server::ControlServer)
//! consume them via generics, so the domain core never touches hardware
//! directly.
//!
//! ## Security notes
//!
//! - **ConfigPort** implementations MUST validate before persisting.
//! - Control codes are compared in plain text; the network is trusted.

use core::fmt;
use core::net::SocketAddr;

use crate::config::AlarmConfig;
use crate::error::{ActuatorError, CommsError};
use crate::fsm::StateId;
use crate::sensors::MotionSnapshot;

// ───────────────────────────────────────────────────────────────
// Motion input port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: raw PIR levels, one per sensor, in table order.
pub trait MotionInputPort {
    fn read_levels(&mut self) -> MotionSnapshot;
}

// ───────────────────────────────────────────────────────────────
// Siren port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

pub trait SirenPort {
    /// Drive the siren output.
    fn set_siren(&mut self, on: bool) -> Result<(), ActuatorError>;

    /// Level last written successfully.
    fn is_siren_on(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// State persistence port
// ───────────────────────────────────────────────────────────────

/// Survives power loss: the alarm resumes in the stored state.
pub trait StatePort {
    /// `Ok(None)` when nothing usable was stored.
    fn read_persisted_state(&self) -> Result<Option<StateId>, StorageError>;

    fn write_persisted_state(&mut self, state: StateId) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Notification port
// ───────────────────────────────────────────────────────────────

/// Fire-and-forget text messages to the notification bot.
pub trait NotifierPort {
    fn notify(&mut self, message: &str) -> Result<(), CommsError>;
}

// ───────────────────────────────────────────────────────────────
// Datagram port (control server transport)
// ───────────────────────────────────────────────────────────────

/// Connectionless transport for the control protocol.
pub trait DatagramPort {
    /// Start listening on `port`.
    fn open(&mut self, port: u16) -> Result<(), CommsError>;

    /// Stop listening.  Pending datagrams are discarded.
    fn close(&mut self);

    fn is_open(&self) -> bool;

    /// Non-blocking receive.  Returns the sender and the payload length,
    /// or `None` when nothing is pending.
    fn recv(&mut self, buf: &mut [u8]) -> Option<(SocketAddr, usize)>;

    fn send_to(&mut self, addr: SocketAddr, bytes: &[u8]) -> Result<(), CommsError>;
}

// ───────────────────────────────────────────────────────────────
// Connectivity port (WiFi station)
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    ConnectionFailed,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(
                f,
                "password invalid (must be 8-64 bytes for WPA2, or empty for open)"
            ),
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
        }
    }
}

pub trait ConnectivityPort {
    /// Start an association attempt.  Does not wait for the link.
    fn begin(&mut self) -> Result<(), ConnectivityError>;
    fn disconnect(&mut self);
    fn is_connected(&self) -> bool;
    fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// # Security
///
/// Implementations MUST validate config values before persisting.
/// Invalid values are rejected with [`ConfigError::ValidationFailed`],
/// not silently clamped.  A disarm code equal to the status token, for
/// example, would make the alarm impossible to switch off.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`AlarmConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<AlarmConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &AlarmConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage.
///
/// - Keys are namespaced to prevent collisions between subsystems.
/// - Write operations MUST be atomic: no partial writes on power loss.
///   The ESP-IDF NVS API guarantees this natively.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`StoragePort`] and [`StatePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Generic I/O error.
    IoError,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
