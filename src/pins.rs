//! GPIO / peripheral pin assignments for the alarm main board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Siren
// ---------------------------------------------------------------------------

/// Digital output driving the siren relay (active HIGH).
pub const SIREN_GPIO: i32 = 13;

// ---------------------------------------------------------------------------
// PIR motion sensors: Digital
// ---------------------------------------------------------------------------

/// Upper bound on the number of sensors the firmware can carry.
pub const MAX_SENSORS: usize = 8;

/// One row of the static sensor table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorPin {
    pub name: &'static str,
    pub gpio: i32,
}

/// Installed PIR sensors, in scan order.  HIGH = motion.
pub const MOTION_SENSORS: [SensorPin; 4] = [
    SensorPin { name: "Sala", gpio: 4 },
    SensorPin { name: "Scale", gpio: 5 },
    SensorPin { name: "Cucina", gpio: 12 },
    SensorPin { name: "Corridoio", gpio: 14 },
];

const _: () = assert!(MOTION_SENSORS.len() <= MAX_SENSORS);
