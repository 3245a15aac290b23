//! Siren relay driver.
//!
//! The siren is a 12 V horn switched by a relay on [`pins::SIREN_GPIO`].
//! This driver is a dumb actuator: the state machine decides when it
//! sounds, the driver only remembers what it last wrote.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives the real GPIO via hw_init.
//! On host/test: writes the simulated pin level.

use log::{info, warn};

use crate::drivers::hw_init;
use crate::error::ActuatorError;
use crate::pins;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SirenState {
    Silent,
    Sounding,
    /// The last write failed; the physical level is unknown.
    Faulted(i32),
}

pub struct SirenDriver {
    gpio: i32,
    state: SirenState,
}

impl Default for SirenDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl SirenDriver {
    pub fn new() -> Self {
        Self::on_pin(pins::SIREN_GPIO)
    }

    pub fn on_pin(gpio: i32) -> Self {
        Self {
            gpio,
            state: SirenState::Silent,
        }
    }

    pub fn set(&mut self, on: bool) -> Result<(), ActuatorError> {
        match hw_init::gpio_write(self.gpio, on) {
            Ok(()) => {
                self.state = if on { SirenState::Sounding } else { SirenState::Silent };
                info!("Siren: {}", if on { "ON" } else { "off" });
                Ok(())
            }
            Err(rc) => {
                warn!("Siren: GPIO{} write failed (rc={})", self.gpio, rc);
                self.state = SirenState::Faulted(rc);
                Err(ActuatorError::GpioWriteFailed(rc))
            }
        }
    }

    pub fn state(&self) -> SirenState {
        self.state
    }

    pub fn is_on(&self) -> bool {
        self.state == SirenState::Sounding
    }
}
