//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the single struct that state handlers read from and
//! write to.  It holds the clock, the raw sensor levels sampled for this
//! tick, the debounced sensor array, configuration, and the queue of
//! side effects the handlers request.  Handlers never perform I/O
//! themselves; the application service drains [`FsmContext::effects`]
//! after each tick and executes them through the port traits.

use crate::config::AlarmConfig;
use crate::fsm::StateId;
use crate::pins::SensorPin;
use crate::sensors::motion::DebounceTiming;
use crate::sensors::{MotionSnapshot, SensorArray};

// ---------------------------------------------------------------------------
// Side-effect requests (written by state handlers; consumed by AppService)
// ---------------------------------------------------------------------------

/// A side effect requested by a state handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Drive the siren output.
    Siren(bool),
    /// Write this state to persistent storage.
    Persist(StateId),
    /// Send a text notification to the bot.
    Notify(String),
    /// A sensor confirmed motion (reported to the event sink only).
    MotionConfirmed(&'static str),
}

/// Raw level of sensor `index`; missing samples read as LOW.
pub fn level_at(levels: &MotionSnapshot, index: usize) -> bool {
    levels.get(index).copied().unwrap_or(false)
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct FsmContext {
    // -- Timing --
    /// Milliseconds since boot at the start of the current tick.
    pub now_ms: u32,
    /// Origin of the pending timer in ARMING and MOTION-DETECTED.
    pub timer_origin_ms: u32,

    // -- Sensors --
    /// Raw input levels sampled for this tick, in table order.
    pub levels: MotionSnapshot,
    /// Debounced motion sensors.
    pub sensors: SensorArray,

    // -- Outputs --
    /// Effects queued since the last drain.
    pub effects: Vec<Effect>,

    // -- Configuration --
    pub config: AlarmConfig,
}

impl FsmContext {
    /// Create a new context with one sensor per row of `table`.
    pub fn new(config: AlarmConfig, table: &[SensorPin]) -> Self {
        let timing = DebounceTiming {
            confirm_offset_ms: config.confirm_offset_ms,
            realert_interval_ms: config.realert_interval_ms,
        };
        Self {
            now_ms: 0,
            timer_origin_ms: 0,
            levels: MotionSnapshot::new(),
            sensors: SensorArray::from_table(table, timing),
            effects: Vec::new(),
            config,
        }
    }

    /// Milliseconds elapsed since the timer origin.
    pub fn timer_elapsed_ms(&self) -> u32 {
        self.now_ms.wrapping_sub(self.timer_origin_ms)
    }

    /// Whole seconds left until `delay_ms` has elapsed since the timer
    /// origin, or `-1` once the deadline has passed.
    pub fn remaining_secs(&self, delay_ms: u32) -> i32 {
        self.remaining_secs_at(delay_ms, self.now_ms)
    }

    /// As [`remaining_secs`](Self::remaining_secs), measured at `now_ms`.
    pub fn remaining_secs_at(&self, delay_ms: u32, now_ms: u32) -> i32 {
        let elapsed = now_ms.wrapping_sub(self.timer_origin_ms);
        let remaining = i64::from(delay_ms) - i64::from(elapsed);
        if remaining < 0 {
            -1
        } else {
            // Bounded by u32::MAX / 1000, fits in i32.
            (remaining / 1000) as i32
        }
    }

    pub fn push(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    /// Take every queued effect, leaving the queue empty.
    pub fn drain_effects(&mut self) -> Vec<Effect> {
        core::mem::take(&mut self.effects)
    }
}
