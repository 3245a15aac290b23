//! PIR motion sensor with double-read debounce.
//!
//! ## Hardware
//!
//! HC-SR501 style PIR module, digital output, HIGH while motion is seen.
//! A single HIGH sample can be an electrical spike on a long cable run,
//! so a detection is only trusted when the input is still HIGH on a
//! second read taken at least `confirm_offset_ms` after the first.
//!
//! ## Debounce state machine
//!
//! ```text
//!            high
//!  Idle ──────────▶ Pending { since_ms }
//!   ▲                  │
//!   └──────────────────┘
//!     offset elapsed (trigger if still high)
//! ```
//!
//! Every confirming read returns the sensor to `Idle`. A continuous HIGH
//! therefore confirms again one offset window later; callers that want
//! fewer reports gate polling on [`MotionSensor::cooling_down`].

/// Timing parameters shared by every sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceTiming {
    /// Minimum gap between the first and the confirming read.
    pub confirm_offset_ms: u32,
    /// Minimum gap between two alerts from the same sensor.
    pub realert_interval_ms: u32,
}

impl Default for DebounceTiming {
    fn default() -> Self {
        Self {
            confirm_offset_ms: 100,
            realert_interval_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    Idle,
    /// First HIGH seen at `since_ms`, waiting for the confirming read.
    Pending { since_ms: u32 },
}

#[derive(Debug, Clone)]
pub struct MotionSensor {
    name: &'static str,
    gpio: i32,
    timing: DebounceTiming,
    state: DebounceState,
    last_confirmed_ms: Option<u32>,
    triggered: bool,
}

impl MotionSensor {
    pub fn new(name: &'static str, gpio: i32, timing: DebounceTiming) -> Self {
        Self {
            name,
            gpio,
            timing,
            state: DebounceState::Idle,
            last_confirmed_ms: None,
            triggered: false,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// GPIO pin this sensor is attached to.
    pub fn gpio(&self) -> i32 {
        self.gpio
    }

    pub fn state(&self) -> DebounceState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, DebounceState::Pending { .. })
    }

    /// Feed one raw sample.  `now_ms` is monotonic milliseconds since boot.
    pub fn poll(&mut self, raw_high: bool, now_ms: u32) {
        match self.state {
            DebounceState::Idle => {
                if raw_high {
                    self.state = DebounceState::Pending { since_ms: now_ms };
                }
            }

            DebounceState::Pending { since_ms } => {
                if now_ms.wrapping_sub(since_ms) >= self.timing.confirm_offset_ms {
                    self.last_confirmed_ms = Some(now_ms);
                    if raw_high {
                        self.triggered = true;
                    }
                    self.state = DebounceState::Idle;
                }
            }
        }
    }

    /// Consume the confirmed-detection flag.
    ///
    /// Returns `true` at most once per detection and never while a
    /// confirmation is pending.
    pub fn take_triggered(&mut self) -> bool {
        if self.is_pending() {
            return false;
        }
        core::mem::take(&mut self.triggered)
    }

    /// `true` while fewer than `realert_interval_ms` have passed since the
    /// last confirming read.
    pub fn cooling_down(&self, now_ms: u32) -> bool {
        self.last_confirmed_ms
            .is_some_and(|t| now_ms.wrapping_sub(t) < self.timing.realert_interval_ms)
    }

    pub fn reset(&mut self) {
        self.state = DebounceState::Idle;
        self.last_confirmed_ms = None;
        self.triggered = false;
    }
}
