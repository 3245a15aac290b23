//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to              |
//! |----------------|--------------------|--------------------------|
//! | `hardware`     | MotionInputPort    | ESP32 GPIO (PIR inputs)  |
//! |                | SirenPort          | ESP32 GPIO (siren relay) |
//! | `log_sink`     | EventSink          | Serial log output        |
//! | `nvs`          | ConfigPort         | NVS / in-memory store    |
//! |                | StoragePort        |                          |
//! |                | StatePort          |                          |
//! | `time`         |                    | ESP32 system timer       |
//! | `udp`          | DatagramPort       | UDP control socket       |
//! |                | NotifierPort       | Notification bot         |
//! | `wifi`         | ConnectivityPort   | ESP-IDF WiFi STA         |

pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod time;
pub mod udp;
pub(super) mod utils;
pub mod wifi;
