//! Concrete state handler functions and table builder.
//!
//! Each state is defined by two plain `fn` pointers: no closures, no
//! dynamic dispatch.
//!
//! ```text
//!  OFF ──[arm w/ countdown]──▶ ARMING ──[arm delay]──▶ ARMED
//!   │                            │                       ▲  │
//!   └────────[arm immediate]─────┴──[arm immediate]──────┘  │
//!                                                    [motion confirmed]
//!                                                           ▼
//!  ALARM-TRIGGERED ◀──────────[alarm delay]────────── MOTION-DETECTED
//!
//!  Any state but OFF ──[disarm]──▶ OFF
//! ```
//!
//! Every entry handler queues a persistence write and a siren level.
//! Only ARMED and ALARM-TRIGGERED poll the motion sensors.

use super::context::{Effect, FsmContext, level_at};
use super::{StateDescriptor, StateId};
use log::info;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0: Off
        StateDescriptor {
            id: StateId::Off,
            name: "Off",
            on_enter: Some(off_enter),
            on_update: idle_update,
        },
        // Index 1: Arming
        StateDescriptor {
            id: StateId::Arming,
            name: "Arming",
            on_enter: Some(arming_enter),
            on_update: arming_update,
        },
        // Index 2: Armed
        StateDescriptor {
            id: StateId::Armed,
            name: "Armed",
            on_enter: Some(armed_enter),
            on_update: armed_update,
        },
        // Index 3: MotionDetected
        StateDescriptor {
            id: StateId::MotionDetected,
            name: "MotionDetected",
            on_enter: Some(motion_enter),
            on_update: motion_update,
        },
        // Index 4: AlarmTriggered
        StateDescriptor {
            id: StateId::AlarmTriggered,
            name: "AlarmTriggered",
            on_enter: Some(alarm_enter),
            on_update: alarm_update,
        },
    ]
}

/// Queue the persistence write and siren level every entry shares.
fn enter_common(ctx: &mut FsmContext, state: StateId, siren: bool) {
    ctx.push(Effect::Persist(state.persisted_form()));
    ctx.push(Effect::Siren(siren));
}

fn idle_update(_ctx: &mut FsmContext) -> Option<StateId> {
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  OFF
// ═══════════════════════════════════════════════════════════════════════════

fn off_enter(ctx: &mut FsmContext) {
    enter_common(ctx, StateId::Off, false);
    ctx.sensors.reset_all();
    ctx.push(Effect::Notify("Allarme Spento".into()));
    info!("OFF: alarm disarmed");
}

// ═══════════════════════════════════════════════════════════════════════════
//  ARMING: countdown before the sensors are watched
// ═══════════════════════════════════════════════════════════════════════════

fn arming_enter(ctx: &mut FsmContext) {
    enter_common(ctx, StateId::Arming, false);
    ctx.timer_origin_ms = ctx.now_ms;
    let secs = ctx.config.arm_delay_secs();
    ctx.push(Effect::Notify(format!("Accensione allarme tra {secs} secondi")));
    info!("ARMING: armed in {}s", secs);
}

fn arming_update(ctx: &mut FsmContext) -> Option<StateId> {
    if ctx.timer_elapsed_ms() >= ctx.config.arm_delay_ms {
        return Some(StateId::Armed);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  ARMED: first confirmed motion starts the grace period
// ═══════════════════════════════════════════════════════════════════════════

fn armed_enter(ctx: &mut FsmContext) {
    enter_common(ctx, StateId::Armed, false);
    ctx.push(Effect::Notify("Allarme Acceso".into()));
    info!("ARMED: watching {} sensors", ctx.sensors.len());
}

fn armed_update(ctx: &mut FsmContext) -> Option<StateId> {
    let now = ctx.now_ms;
    let mut fired = None;
    for (i, sensor) in ctx.sensors.iter_mut().enumerate() {
        sensor.poll(level_at(&ctx.levels, i), now);
        if sensor.take_triggered() {
            fired = Some(sensor.name());
            break;
        }
    }

    let name = fired?;
    let secs = ctx.config.alarm_delay_secs();
    info!("ARMED: motion confirmed by {}", name);
    ctx.push(Effect::MotionConfirmed(name));
    ctx.push(Effect::Notify(format!(
        "{name} ha rilevato un movimento, attivazione allarme tra {secs} secondi"
    )));
    Some(StateId::MotionDetected)
}

// ═══════════════════════════════════════════════════════════════════════════
//  MOTION-DETECTED: grace period for the occupant to disarm
// ═══════════════════════════════════════════════════════════════════════════

fn motion_enter(ctx: &mut FsmContext) {
    enter_common(ctx, StateId::MotionDetected, false);
    ctx.timer_origin_ms = ctx.now_ms;
    info!(
        "MOTION: siren in {}s unless disarmed",
        ctx.config.alarm_delay_secs()
    );
}

fn motion_update(ctx: &mut FsmContext) -> Option<StateId> {
    if ctx.timer_elapsed_ms() >= ctx.config.alarm_delay_ms {
        return Some(StateId::AlarmTriggered);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  ALARM-TRIGGERED: siren on, keep reporting movement
// ═══════════════════════════════════════════════════════════════════════════

fn alarm_enter(ctx: &mut FsmContext) {
    enter_common(ctx, StateId::AlarmTriggered, true);
    ctx.push(Effect::Notify("ALLARME ATTIVATO".into()));
    info!("ALARM: siren sounding");
}

fn alarm_update(ctx: &mut FsmContext) -> Option<StateId> {
    let now = ctx.now_ms;
    for (i, sensor) in ctx.sensors.iter_mut().enumerate() {
        if sensor.cooling_down(now) {
            continue;
        }
        sensor.poll(level_at(&ctx.levels, i), now);
        if sensor.take_triggered() {
            let name = sensor.name();
            ctx.effects.push(Effect::MotionConfirmed(name));
            ctx.effects
                .push(Effect::Notify(format!("{name} continua a rilevare movimenti")));
        }
    }
    None
}
