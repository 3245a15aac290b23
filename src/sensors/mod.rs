//! Sensor subsystem: the motion sensor driver and the ordered
//! [`SensorArray`] that owns every installed sensor.
//!
//! The array is built once from the static table in [`crate::pins`] and is
//! scanned in registration order.  Raw input levels are sampled by the
//! hardware adapter into a [`MotionSnapshot`] before each tick.

pub mod motion;

use crate::drivers::hw_init;
use crate::pins::{MAX_SENSORS, SensorPin};
use motion::{DebounceTiming, MotionSensor};

/// Raw input levels, one per sensor, in table order.  `true` = HIGH.
pub type MotionSnapshot = heapless::Vec<bool, MAX_SENSORS>;

/// Fixed-capacity ordered collection of motion sensors.
#[derive(Debug, Clone)]
pub struct SensorArray {
    sensors: heapless::Vec<MotionSensor, MAX_SENSORS>,
}

impl SensorArray {
    /// Build the array from a sensor table.  Rows beyond
    /// [`MAX_SENSORS`] are ignored.
    pub fn from_table(table: &[SensorPin], timing: DebounceTiming) -> Self {
        let mut sensors = heapless::Vec::new();
        for pin in table.iter().take(MAX_SENSORS) {
            // Cannot overflow: the iterator is capped at capacity.
            let _ = sensors.push(MotionSensor::new(pin.name, pin.gpio, timing));
        }
        Self { sensors }
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MotionSensor> {
        self.sensors.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut MotionSensor> {
        self.sensors.iter_mut()
    }

    pub fn get(&self, index: usize) -> Option<&MotionSensor> {
        self.sensors.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut MotionSensor> {
        self.sensors.get_mut(index)
    }

    /// Return every sensor to idle (used on disarm).
    pub fn reset_all(&mut self) {
        for s in &mut self.sensors {
            s.reset();
        }
    }
}

/// Sample the raw level of every pin in `table`.
pub fn read_levels(table: &[SensorPin]) -> MotionSnapshot {
    table
        .iter()
        .take(MAX_SENSORS)
        .map(|pin| hw_init::gpio_read(pin.gpio))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pins::MOTION_SENSORS;

    #[test]
    fn array_keeps_table_order() {
        let arr = SensorArray::from_table(&MOTION_SENSORS, DebounceTiming::default());
        let names: Vec<_> = arr.iter().map(MotionSensor::name).collect();
        assert_eq!(names, ["Sala", "Scale", "Cucina", "Corridoio"]);
        assert_eq!(arr.get(2).map(MotionSensor::gpio), Some(12));
    }

    #[test]
    fn reset_all_returns_sensors_to_idle() {
        let mut arr = SensorArray::from_table(&MOTION_SENSORS, DebounceTiming::default());
        for s in arr.iter_mut() {
            s.poll(true, 0);
        }
        assert!(arr.iter().all(MotionSensor::is_pending));
        arr.reset_all();
        assert!(arr.iter().all(|s| !s.is_pending()));
    }

    #[test]
    fn oversized_table_is_truncated() {
        let table = [SensorPin { name: "X", gpio: 1 }; MAX_SENSORS + 3];
        let arr = SensorArray::from_table(&table, DebounceTiming::default());
        assert_eq!(arr.len(), MAX_SENSORS);
    }
}
