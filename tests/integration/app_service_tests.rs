//! Integration tests for the full tick pipeline: sensors → FSM → effects,
//! with operator requests served between the tick and the flush.
//!
//! These run on the host (x86_64) against the mocks in `mock_hw`.

use crate::mock_hw::{MockStore, Rig};

use homealarm::app::events::AppEvent;
use homealarm::fsm::StateId;
use homealarm::sensors::motion::DebounceState;

const TICK: u32 = 50;

// ── Boot ──────────────────────────────────────────────────────

#[test]
fn boot_in_alarm_sounds_siren_before_any_command() {
    let rig = Rig::boot(MockStore::holding(StateId::AlarmTriggered));

    assert_eq!(rig.app.state(), StateId::AlarmTriggered);
    assert_eq!(rig.hw.siren_calls, vec![true]);
    assert!(rig.net.sent.is_empty());
    assert!(rig.bot.messages.iter().any(|m| m == "ALLARME ATTIVATO"));
}

#[test]
fn boot_with_nothing_stored_is_off() {
    let rig = Rig::boot(MockStore::default());
    assert_eq!(rig.app.state(), StateId::Off);
    assert_eq!(rig.hw.siren_calls, vec![false]);
}

#[test]
fn transient_states_restore_fail_safe() {
    let rig = Rig::boot(MockStore::holding(StateId::MotionDetected));
    assert_eq!(rig.app.state(), StateId::AlarmTriggered);

    let rig = Rig::boot(MockStore::holding(StateId::Arming));
    assert_eq!(rig.app.state(), StateId::Armed);
}

// ── Arming ────────────────────────────────────────────────────

#[test]
fn countdown_arm_reaches_armed_after_delay() {
    let mut rig = Rig::boot(MockStore::default());

    assert_eq!(rig.request(0, b"CODICE1").as_deref(), Some("OK_ACCENSIONE"));
    assert_eq!(rig.app.state(), StateId::Arming);
    assert_eq!(
        rig.bot.messages.last().map(String::as_str),
        Some("Accensione allarme tra 30 secondi")
    );
    // ARMING persists as ARMED.
    assert_eq!(rig.store.stored, Some(StateId::Armed));

    assert_eq!(rig.request(10_000, b"STATO").as_deref(), Some("ACC_20"));

    rig.run(10_050, 29_950, TICK);
    assert_eq!(rig.app.state(), StateId::Arming);

    rig.step(30_000);
    assert_eq!(rig.app.state(), StateId::Armed);
    assert_eq!(rig.bot.messages.last().map(String::as_str), Some("Allarme Acceso"));
    assert_eq!(rig.request(30_050, b"STATO").as_deref(), Some("ON"));
}

#[test]
fn immediate_arm_overrides_countdown() {
    let mut rig = Rig::boot(MockStore::default());
    rig.request(0, b"CODICE1");
    assert_eq!(rig.request(5_000, b"CODICE2").as_deref(), Some("OK_ACCESO"));
    assert_eq!(rig.app.state(), StateId::Armed);

    // A second countdown request from ARMED is refused.
    assert_eq!(rig.request(5_050, b"CODICE1").as_deref(), Some("NO_ACCENSIONE"));
    assert_eq!(rig.request(5_100, b"CODICE2").as_deref(), Some("NO_ACCESO"));
    assert_eq!(rig.app.state(), StateId::Armed);
}

#[test]
fn sensors_are_ignored_while_arming() {
    let mut rig = Rig::boot(MockStore::default());
    rig.request(0, b"CODICE1");
    rig.hw.set_motion("Sala", true);
    rig.run(50, 5_000, TICK);

    assert_eq!(rig.app.state(), StateId::Arming);
    assert!(
        rig.app
            .sensors()
            .iter()
            .all(|s| s.state() == DebounceState::Idle)
    );
}

// ── Motion and alarm ──────────────────────────────────────────

#[test]
fn confirmed_motion_escalates_to_alarm() {
    let mut rig = Rig::boot(MockStore::default());
    assert_eq!(rig.request(0, b"CODICE2").as_deref(), Some("OK_ACCESO"));

    rig.hw.set_motion("Sala", true);
    rig.step(1_000);
    assert_eq!(rig.app.state(), StateId::Armed, "one sample is not a detection");
    rig.step(1_100);
    assert_eq!(rig.app.state(), StateId::MotionDetected);

    let alert = rig.bot.messages.last().cloned().unwrap_or_default();
    assert!(alert.contains("Sala"), "got {alert:?}");
    assert!(alert.contains("15"), "got {alert:?}");
    assert_eq!(
        rig.sink
            .count(|e| *e == AppEvent::MotionConfirmed { sensor: "Sala" }),
        1
    );
    assert!(!rig.hw.siren_sounding());

    assert_eq!(rig.request(6_100, b"STATO").as_deref(), Some("MOV_10"));

    rig.run(6_150, 16_050, TICK);
    assert_eq!(rig.app.state(), StateId::MotionDetected);

    rig.step(16_100);
    assert_eq!(rig.app.state(), StateId::AlarmTriggered);
    assert!(rig.hw.siren_sounding());
    assert_eq!(rig.store.stored, Some(StateId::AlarmTriggered));
    assert_eq!(rig.request(16_150, b"STATO").as_deref(), Some("ALRM"));
}

#[test]
fn spike_shorter_than_confirm_window_is_ignored() {
    let mut rig = Rig::boot(MockStore::holding(StateId::Armed));
    rig.hw.set_motion("Cucina", true);
    rig.step(1_000);
    rig.hw.clear_motion();
    rig.run(1_050, 3_000, TICK);

    assert_eq!(rig.app.state(), StateId::Armed);
}

#[test]
fn disarm_during_grace_period_prevents_siren() {
    let mut rig = Rig::boot(MockStore::holding(StateId::Armed));
    rig.hw.set_motion("Corridoio", true);
    rig.run(1_000, 1_100, TICK);
    assert_eq!(rig.app.state(), StateId::MotionDetected);

    assert_eq!(rig.request(5_000, b"CODICE3").as_deref(), Some("OK_SPENTO"));
    rig.run(5_050, 20_000, TICK);

    assert_eq!(rig.app.state(), StateId::Off);
    assert!(!rig.hw.siren_calls.contains(&true));
}

fn repeats(rig: &Rig, name: &str) -> usize {
    let line = format!("{name} continua a rilevare movimenti");
    rig.bot.messages.iter().filter(|m| **m == line).count()
}

#[test]
fn alarm_repeats_report_while_motion_continues() {
    let mut rig = Rig::boot(MockStore::holding(StateId::AlarmTriggered));
    rig.hw.set_motion("Sala", true);

    rig.run(100, 200, TICK);
    assert_eq!(repeats(&rig, "Sala"), 1);

    // Quiet for the cool-down, then confirmed again.
    rig.run(250, 5_250, TICK);
    assert_eq!(repeats(&rig, "Sala"), 1);
    rig.step(5_300);
    assert_eq!(repeats(&rig, "Sala"), 2);

    rig.run(5_350, 20_000, TICK);
    assert_eq!(repeats(&rig, "Sala"), 4);
    assert_eq!(rig.app.state(), StateId::AlarmTriggered);
}

#[test]
fn motion_still_present_at_escalation_is_reported_at_once() {
    let mut rig = Rig::boot(MockStore::holding(StateId::Armed));
    rig.hw.set_motion("Scale", true);
    rig.run(1_000, 1_100, TICK);
    assert_eq!(rig.app.state(), StateId::MotionDetected);

    rig.run(1_150, 16_100, TICK);
    assert_eq!(rig.app.state(), StateId::AlarmTriggered);
    assert_eq!(repeats(&rig, "Scale"), 0);

    rig.run(16_150, 16_250, TICK);
    assert_eq!(repeats(&rig, "Scale"), 1);
}

// ── Disarm ────────────────────────────────────────────────────

#[test]
fn disarm_from_alarm_silences_and_resets() {
    let mut rig = Rig::boot(MockStore::holding(StateId::AlarmTriggered));
    rig.hw.set_motion("Sala", true);
    rig.run(100, 200, TICK);
    assert!(rig.app.sensors().iter().any(|s| s.cooling_down(250)));

    // Scale goes pending on the same tick the disarm is served.
    rig.hw.set_motion("Scale", true);
    assert_eq!(rig.request(300, b"CODICE3").as_deref(), Some("OK_SPENTO"));
    assert_eq!(rig.app.state(), StateId::Off);
    assert!(!rig.hw.siren_sounding());
    assert_eq!(rig.store.stored, Some(StateId::Off));
    assert!(
        rig.app
            .sensors()
            .iter()
            .all(|s| s.state() == DebounceState::Idle && !s.cooling_down(300))
    );
    assert_eq!(rig.bot.messages.last().map(String::as_str), Some("Allarme Spento"));
    assert_eq!(rig.request(350, b"STATO").as_deref(), Some("OFF"));
}

#[test]
fn disarm_when_off_is_refused() {
    let mut rig = Rig::boot(MockStore::default());
    let writes = rig.store.writes.len();
    assert_eq!(rig.request(0, b"CODICE3").as_deref(), Some("NO_SPENTO"));
    assert_eq!(rig.store.writes.len(), writes);
}

// ── Unknown requests and failures ─────────────────────────────

#[test]
fn unknown_request_gets_no_reply_and_changes_nothing() {
    let mut rig = Rig::boot(MockStore::holding(StateId::Armed));
    let writes = rig.store.writes.len();

    assert_eq!(rig.request(0, b"XYZ"), None);
    assert_eq!(rig.app.state(), StateId::Armed);
    assert_eq!(rig.store.writes.len(), writes);
}

#[test]
fn persist_failure_does_not_roll_back() {
    let mut rig = Rig::boot(MockStore::default());
    rig.store.fail_writes = true;

    assert_eq!(rig.request(0, b"CODICE2").as_deref(), Some("OK_ACCESO"));
    assert_eq!(rig.app.state(), StateId::Armed);
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, AppEvent::PersistFailed { state: StateId::Armed, .. })),
        1
    );
}

#[test]
fn undeliverable_notification_is_reported() {
    let mut rig = Rig::boot(MockStore::default());
    rig.bot.offline = true;

    rig.request(0, b"CODICE2");
    assert_eq!(rig.app.state(), StateId::Armed);
    assert!(rig.sink.count(|e| *e == AppEvent::NotifyFailed) >= 1);
}

#[test]
fn edge_flag_is_cleared_by_flush() {
    let mut rig = Rig::boot(MockStore::default());
    rig.request(0, b"CODICE2");
    assert!(!rig.app.state_changed());
    assert_eq!(rig.app.tick_count(), 1);
}
