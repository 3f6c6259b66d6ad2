use core::fmt::Write as _;
use core::time::Duration;

use controller_core::config::ControllerConfig;
use controller_core::controller::RateUpdate;
use controller_core::debounce::Button;
use controller_core::lights::NoopLightDriver;
use controller_core::rate::Rate;
use controller_core::runtime::SignalRuntime;
use controller_core::status::{StatusFormatter, StatusSnapshot};
use heapless::String;

fn runtime() -> SignalRuntime<Duration, NoopLightDriver> {
    SignalRuntime::start(ControllerConfig::new(), NoopLightDriver::new(), Duration::ZERO)
}

fn report(snapshot: &StatusSnapshot) -> String<160> {
    let mut out = String::new();
    write!(out, "{}", StatusFormatter::new(snapshot)).unwrap();
    out
}

#[test]
fn invalid_rate_writes_leave_rate_unchanged() {
    let mut runtime = runtime();
    let inputs: [&[u8]; 5] = [b"0", b"10", b"abc", b"", b"\n"];
    for input in inputs {
        assert_eq!(
            runtime.configure_rate(input, Duration::ZERO),
            RateUpdate::Ignored {
                current: Rate::DEFAULT
            }
        );
    }
    assert_eq!(runtime.state().rate(), Rate::DEFAULT);
}

#[test]
fn valid_rate_write_shows_in_status() {
    let mut runtime = runtime();
    let update = runtime.configure_rate(b"5\n", Duration::ZERO);
    assert_eq!(update.effective().hz(), 5);

    let text = report(&runtime.snapshot());
    assert!(text.contains("Cycle Rate: 5 Hz\n"), "{text}");
}

#[test]
fn status_report_has_exactly_four_lines() {
    let runtime = runtime();
    let text = report(&runtime.snapshot());
    assert_eq!(
        text.as_str(),
        "Mode: normal\nCycle Rate: 1 Hz\nLights: red off, yellow off, green on\nPedestrian: not present\n"
    );
}

#[test]
fn pedestrian_present_tracks_request_and_crossing() {
    let mut runtime = runtime();
    assert!(!runtime.snapshot().pedestrian_present);

    runtime.on_edge(Button::Pedestrian, Duration::from_millis(100));
    assert!(runtime.snapshot().pedestrian_present);
    assert!(report(&runtime.snapshot()).ends_with("Pedestrian: present\n"));

    let mut crossing_seen = false;
    for _ in 0..16 {
        let deadline = runtime.next_deadline().unwrap();
        runtime.poll(deadline);
        let state = runtime.state();
        assert_eq!(
            runtime.snapshot().pedestrian_present,
            state.ped_requested() || state.ped_crossing()
        );
        crossing_seen |= state.ped_crossing();
    }
    assert!(crossing_seen);
    assert!(!runtime.snapshot().pedestrian_present);
}

#[test]
fn status_reads_are_idempotent() {
    let runtime = runtime();
    let first = runtime.snapshot();
    let second = runtime.snapshot();
    assert_eq!(first, second);
    assert_eq!(report(&first), report(&second));
}

#[test]
fn packed_snapshot_survives_publication() {
    let mut runtime = runtime();
    runtime.on_edge(Button::Pedestrian, Duration::ZERO);
    for _ in 0..4 {
        let deadline = runtime.next_deadline().unwrap();
        runtime.poll(deadline);
    }
    let snapshot = runtime.snapshot();
    assert_eq!(StatusSnapshot::unpack(snapshot.pack()), Some(snapshot));
}
