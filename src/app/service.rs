//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the FSM and its shared context.  It exposes a
//! hardware-agnostic API; all I/O flows through port traits injected at
//! call sites, making the entire service testable with mock adapters.
//!
//! ```text
//!  MotionInputPort ──▶ ┌────────────────────────┐ ──▶ EventSink
//!                      │       AppService        │
//!        SirenPort ◀── │   FSM · effect queue    │ ──▶ NotifierPort
//!                      └────────────────────────┘ ──▶ StatePort
//! ```
//!
//! One control cycle is three calls, in order:
//!
//! 1. [`AppService::tick`]: sample sensors, advance the FSM.
//! 2. [`AppService::handle_command`], zero or more times (control server).
//! 3. [`AppService::flush_effects`]: siren, persistence, notifications.

use log::{error, info, warn};

use crate::config::AlarmConfig;
use crate::fsm::context::{Effect, FsmContext};
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId};
use crate::pins::{MOTION_SENSORS, SensorPin};
use crate::sensors::SensorArray;

use super::commands::{CommandOutcome, ControlCommand, StatusReply};
use super::events::AppEvent;
use super::ports::{EventSink, MotionInputPort, NotifierPort, SirenPort, StatePort};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    fsm: Fsm,
    ctx: FsmContext,
    tick_count: u64,
}

impl AppService {
    /// Construct the service over the installed sensor table.
    ///
    /// Does **not** start the FSM; call [`start`](Self::start) next.
    pub fn new(config: AlarmConfig, initial: StateId) -> Self {
        Self::with_sensors(config, &MOTION_SENSORS, initial)
    }

    /// Construct the service over an explicit sensor table.
    pub fn with_sensors(config: AlarmConfig, table: &[SensorPin], initial: StateId) -> Self {
        Self {
            fsm: Fsm::new(build_state_table(), initial),
            ctx: FsmContext::new(config, table),
            tick_count: 0,
        }
    }

    /// The state to boot into, as found in storage.
    ///
    /// Nothing stored, an unreadable store, or an unknown value all mean
    /// OFF.  Transient states are mapped to what they would have
    /// persisted.
    pub fn restored_state(store: &impl StatePort) -> StateId {
        match store.read_persisted_state() {
            Ok(Some(state)) => state.persisted_form(),
            Ok(None) => StateId::Off,
            Err(e) => {
                warn!("AppService: persisted state unreadable ({}), booting OFF", e);
                StateId::Off
            }
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Enter the initial state and execute its entry effects at once,
    /// so a restored ALARM-TRIGGERED sounds the siren before any
    /// command is served.
    pub fn start(
        &mut self,
        now_ms: u32,
        siren: &mut impl SirenPort,
        store: &mut impl StatePort,
        notifier: &mut impl NotifierPort,
        sink: &mut impl EventSink,
    ) {
        self.ctx.now_ms = now_ms;
        self.fsm.start(&mut self.ctx);
        sink.emit(&AppEvent::Started(self.fsm.current_state()));
        info!("AppService started in {}", self.fsm.current_state());
        self.flush_effects(siren, store, notifier, sink);
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Sample the sensors and advance the FSM by one tick.
    ///
    /// Effects queued here are executed by the next
    /// [`flush_effects`](Self::flush_effects).
    pub fn tick(&mut self, now_ms: u32, hw: &mut impl MotionInputPort, sink: &mut impl EventSink) {
        self.tick_count += 1;
        let prev_state = self.fsm.current_state();

        // 1. Read raw sensor levels via MotionInputPort
        self.ctx.now_ms = now_ms;
        self.ctx.levels = hw.read_levels();

        // 2. FSM tick (timers and sensor scans)
        self.fsm.tick(&mut self.ctx);

        // 3. Emit state change if the FSM moved
        let new_state = self.fsm.current_state();
        if new_state != prev_state {
            sink.emit(&AppEvent::StateChanged {
                from: prev_state,
                to: new_state,
            });
        }
    }

    /// Execute every queued effect, then clear the edge flag.
    ///
    /// Failures are logged and reported; they never roll back a
    /// transition.
    pub fn flush_effects(
        &mut self,
        siren: &mut impl SirenPort,
        store: &mut impl StatePort,
        notifier: &mut impl NotifierPort,
        sink: &mut impl EventSink,
    ) {
        for effect in self.ctx.drain_effects() {
            match effect {
                Effect::Siren(on) => {
                    if let Err(e) = siren.set_siren(on) {
                        error!("Siren write failed: {}", e);
                    }
                }
                Effect::Persist(state) => {
                    if let Err(e) = store.write_persisted_state(state) {
                        error!("Persisting {} failed: {}", state, e);
                        sink.emit(&AppEvent::PersistFailed { state, error: e });
                    }
                }
                Effect::Notify(message) => {
                    if let Err(e) = notifier.notify(&message) {
                        warn!("Notification '{}' not sent: {}", message, e);
                        sink.emit(&AppEvent::NotifyFailed);
                    }
                }
                Effect::MotionConfirmed(sensor) => {
                    sink.emit(&AppEvent::MotionConfirmed { sensor });
                }
            }
        }
        self.fsm.take_state_changed();
    }

    // ── Command handling ──────────────────────────────────────

    /// Apply an operator command against the current state.
    pub fn handle_command(
        &mut self,
        cmd: ControlCommand,
        sink: &mut impl EventSink,
    ) -> CommandOutcome {
        let Some(target) = cmd.target() else {
            return CommandOutcome::Status(self.status());
        };

        let prev = self.fsm.current_state();
        let accepted = self.fsm.request(target, &mut self.ctx);
        sink.emit(&AppEvent::CommandHandled {
            command: cmd,
            accepted,
        });
        if accepted {
            sink.emit(&AppEvent::StateChanged {
                from: prev,
                to: target,
            });
        }
        CommandOutcome::Transition {
            command: cmd,
            accepted,
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Current FSM state.
    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    /// Status as reported to the control protocol, at the current tick.
    pub fn status(&self) -> StatusReply {
        match self.fsm.current_state() {
            StateId::Off => StatusReply::Off,
            StateId::Armed => StatusReply::Armed,
            StateId::AlarmTriggered => StatusReply::Triggered,
            StateId::Arming => {
                StatusReply::ArmingIn(self.ctx.remaining_secs(self.ctx.config.arm_delay_ms))
            }
            StateId::MotionDetected => {
                StatusReply::MotionIn(self.ctx.remaining_secs(self.ctx.config.alarm_delay_ms))
            }
        }
    }

    /// Whole seconds until ARMED; `-1` when overdue or not arming.
    pub fn arming_remaining_secs(&self, now_ms: u32) -> i32 {
        if self.fsm.current_state() != StateId::Arming {
            return -1;
        }
        self.ctx
            .remaining_secs_at(self.ctx.config.arm_delay_ms, now_ms)
    }

    /// Whole seconds until the siren; `-1` when overdue or no motion pending.
    pub fn motion_remaining_secs(&self, now_ms: u32) -> i32 {
        if self.fsm.current_state() != StateId::MotionDetected {
            return -1;
        }
        self.ctx
            .remaining_secs_at(self.ctx.config.alarm_delay_ms, now_ms)
    }

    /// Whether a transition is waiting for its effects to be flushed.
    pub fn state_changed(&self) -> bool {
        self.fsm.state_changed()
    }

    pub fn sensors(&self) -> &SensorArray {
        &self.ctx.sensors
    }

    /// Total ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn config(&self) -> &AlarmConfig {
        &self.ctx.config
    }
}
