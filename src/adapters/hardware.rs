//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the sensor pin table and the siren driver, exposing them through
//! [`MotionInputPort`] and [`SirenPort`].  This is the only module in the
//! system that touches actual hardware.  On non-espidf targets, the
//! underlying GPIO helpers use cfg-gated simulation.

use crate::app::ports::{MotionInputPort, SirenPort};
use crate::drivers::siren::SirenDriver;
use crate::error::ActuatorError;
use crate::pins::{MOTION_SENSORS, SensorPin};
use crate::sensors::{self, MotionSnapshot};

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter {
    sensor_pins: &'static [SensorPin],
    siren: SirenDriver,
}

impl Default for HardwareAdapter {
    fn default() -> Self {
        Self::new(&MOTION_SENSORS, SirenDriver::new())
    }
}

impl HardwareAdapter {
    pub fn new(sensor_pins: &'static [SensorPin], siren: SirenDriver) -> Self {
        Self { sensor_pins, siren }
    }
}

// ── MotionInputPort implementation ────────────────────────────

impl MotionInputPort for HardwareAdapter {
    fn read_levels(&mut self) -> MotionSnapshot {
        sensors::read_levels(self.sensor_pins)
    }
}

// ── SirenPort implementation ──────────────────────────────────

impl SirenPort for HardwareAdapter {
    fn set_siren(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.siren.set(on)
    }

    fn is_siren_on(&self) -> bool {
        self.siren.is_on()
    }
}
