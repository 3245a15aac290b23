//! Integration tests for the UDP control protocol as served by
//! `ControlServer` on top of a running `AppService`.

use crate::mock_hw::{MockStore, Rig, peer};

use homealarm::config::{AlarmConfig, CommandCodes, bounded};
use homealarm::fsm::StateId;

#[test]
fn drain_is_bounded_per_tick() {
    let mut rig = Rig::boot(MockStore::default());
    for _ in 0..150 {
        rig.net.push(peer(5000), b"STATO");
    }

    assert_eq!(rig.step(0), 100);
    assert_eq!(rig.net.inbox.len(), 50);
    assert_eq!(rig.net.sent.len(), 100);

    assert_eq!(rig.step(50), 50);
    assert!(rig.net.inbox.is_empty());
    assert_eq!(rig.net.sent.len(), 150);
}

#[test]
fn unknown_requests_count_against_the_bound() {
    let mut rig = Rig::boot(MockStore::default());
    for _ in 0..120 {
        rig.net.push(peer(5000), b"garbage");
    }
    assert_eq!(rig.step(0), 100);
    assert!(rig.net.sent.is_empty());
}

#[test]
fn requests_are_served_in_arrival_order_and_answered_to_sender() {
    let mut rig = Rig::boot(MockStore::default());
    let alice = peer(4001);
    let bob = peer(4002);
    rig.net.push(alice, b"CODICE2");
    rig.net.push(bob, b"CODICE1");
    rig.net.push(alice, b"STATO");

    rig.step(0);

    let sent: Vec<_> = rig
        .net
        .sent
        .iter()
        .map(|(to, b)| (*to, String::from_utf8_lossy(b).into_owned()))
        .collect();
    assert_eq!(
        sent,
        vec![
            (alice, "OK_ACCESO".to_string()),
            (bob, "NO_ACCENSIONE".to_string()),
            (alice, "ON".to_string()),
        ]
    );
    assert_eq!(rig.app.state(), StateId::Armed);
}

#[test]
fn trailing_nul_is_tolerated() {
    let mut rig = Rig::boot(MockStore::default());
    assert_eq!(rig.request(0, b"CODICE2\0").as_deref(), Some("OK_ACCESO"));
}

#[test]
fn matching_is_exact() {
    let mut rig = Rig::boot(MockStore::default());
    assert_eq!(rig.request(0, b"codice2"), None);
    assert_eq!(rig.request(50, b" CODICE2"), None);
    assert_eq!(rig.request(100, b"CODICE2\n"), None);
    assert_eq!(rig.request(150, b"STAT"), None);
    assert_eq!(rig.request(200, b""), None);
    assert_eq!(rig.app.state(), StateId::Off);
}

#[test]
fn oversized_datagram_is_ignored() {
    let mut rig = Rig::boot(MockStore::default());
    let mut big = b"STATO".to_vec();
    big.resize(300, b'X');
    assert_eq!(rig.request(0, &big), None);
}

#[test]
fn configured_codes_replace_defaults() {
    let config = AlarmConfig {
        codes: CommandCodes {
            arm_countdown: bounded("uno"),
            arm_immediate: bounded("due"),
            disarm: bounded("tre"),
        },
        ..Default::default()
    };
    let mut rig = Rig::boot_with(config, MockStore::default());

    assert_eq!(rig.request(0, b"CODICE2"), None);
    assert_eq!(rig.request(50, b"due").as_deref(), Some("OK_ACCESO"));
    assert_eq!(rig.request(100, b"tre").as_deref(), Some("OK_SPENTO"));
}
