//! Integration tests for link supervision: the control server only
//! listens while WiFi is associated.

use crate::mock_hw::{LogSink, MockTransport, MockWifi};

use homealarm::app::events::AppEvent;
use homealarm::app::link::{LinkState, LinkSupervisor};
use homealarm::app::ports::DatagramPort;
use homealarm::config::AlarmConfig;

fn supervisor() -> (LinkSupervisor, MockWifi, MockTransport, LogSink) {
    let config = AlarmConfig::default();
    let mut link = LinkSupervisor::new(&config);
    let mut wifi = MockWifi::default();
    link.start(0, &mut wifi);
    (link, wifi, MockTransport::default(), LogSink::new())
}

#[test]
fn association_opens_server_on_control_port() {
    let (mut link, mut wifi, mut net, mut sink) = supervisor();
    assert!(!link.poll(100, &mut wifi, &mut net, &mut sink));
    assert!(!net.is_open());

    wifi.link_up = true;
    assert!(link.poll(200, &mut wifi, &mut net, &mut sink));
    assert_eq!(net.opened_on, Some(4210));
    assert_eq!(sink.count(|e| *e == AppEvent::LinkUp), 1);
}

#[test]
fn association_timeout_goes_offline_then_retries() {
    let (mut link, mut wifi, mut net, mut sink) = supervisor();
    assert_eq!(wifi.begins, 1);

    link.poll(19_999, &mut wifi, &mut net, &mut sink);
    assert!(matches!(link.state(), LinkState::Connecting { .. }));

    link.poll(20_000, &mut wifi, &mut net, &mut sink);
    assert_eq!(link.state(), LinkState::Offline);
    assert_eq!(sink.count(|e| *e == AppEvent::LinkDown), 1);

    link.poll(20_050, &mut wifi, &mut net, &mut sink);
    assert_eq!(wifi.begins, 2);
    assert_eq!(link.state(), LinkState::Connecting { since_ms: 20_050 });
}

#[test]
fn lost_link_closes_server_and_reconnects() {
    let (mut link, mut wifi, mut net, mut sink) = supervisor();
    wifi.link_up = true;
    link.poll(100, &mut wifi, &mut net, &mut sink);
    assert!(net.is_open());

    wifi.link_up = false;
    assert!(!link.poll(5_000, &mut wifi, &mut net, &mut sink));
    assert!(!net.is_open());
    assert_eq!(wifi.disconnects, 1);
    assert_eq!(wifi.begins, 2);

    wifi.link_up = true;
    assert!(link.poll(6_000, &mut wifi, &mut net, &mut sink));
    assert_eq!(net.open_count, 2);
}

#[test]
fn bind_failure_keeps_link_offline() {
    let (mut link, mut wifi, mut net, mut sink) = supervisor();
    net.fail_open = true;
    wifi.link_up = true;

    assert!(!link.poll(100, &mut wifi, &mut net, &mut sink));
    assert_eq!(link.state(), LinkState::Offline);

    net.fail_open = false;
    assert!(link.poll(150, &mut wifi, &mut net, &mut sink));
}
