use core::time::Duration;

use controller_core::config::ControllerConfig;
use controller_core::controller::ToggleOutcome;
use controller_core::debounce::Button;
use controller_core::lights::{LightState, NoopLightDriver};
use controller_core::mode::Mode;
use controller_core::pedestrian::CallOutcome;
use controller_core::runtime::{EdgeOutcome, SignalRuntime};
use controller_core::telemetry::TelemetryEventKind;

fn runtime() -> SignalRuntime<Duration, NoopLightDriver> {
    SignalRuntime::start(ControllerConfig::new(), NoopLightDriver::new(), Duration::ZERO)
}

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

#[test]
fn bounce_within_window_advances_one_step() {
    let mut runtime = runtime();
    assert!(matches!(
        runtime.on_edge(Button::Toggle, ms(500)),
        EdgeOutcome::Toggle(ToggleOutcome::Switched(_))
    ));
    assert_eq!(runtime.on_edge(Button::Toggle, ms(510)), EdgeOutcome::Debounced);
    assert_eq!(runtime.state().mode(), Mode::FlashingRed);
    assert_eq!(
        runtime.telemetry().latest().map(|record| record.event),
        Some(TelemetryEventKind::EdgeRejected(Button::Toggle))
    );
}

#[test]
fn three_spaced_toggles_return_to_normal() {
    let mut runtime = runtime();
    let mut now = ms(0);
    let expected = [Mode::FlashingRed, Mode::FlashingYellow, Mode::Normal];

    for mode in expected {
        // Let a few ticks run so the reset is observable.
        for _ in 0..3 {
            let deadline = runtime.next_deadline().unwrap();
            runtime.poll(deadline);
            now = deadline;
        }
        assert!(runtime.state().cycle_count() > 0);

        now += ms(260);
        runtime.on_edge(Button::Toggle, now);
        assert_eq!(runtime.state().mode(), mode);
        assert_eq!(runtime.state().cycle_count(), 0);
    }
}

#[test]
fn flashing_red_blinks_on_odd_ticks() {
    let mut runtime = runtime();
    runtime.toggle(ms(0));

    for _ in 0..10 {
        let deadline = runtime.next_deadline().unwrap();
        let report = runtime.poll(deadline).unwrap();
        let lit = report.cycle_count % 2 == 1;
        assert_eq!(report.lights, LightState::new(lit, false, false));
    }
}

#[test]
fn flashing_yellow_blinks_on_odd_ticks() {
    let mut runtime = runtime();
    runtime.toggle(ms(0));
    runtime.toggle(ms(0));
    assert_eq!(runtime.state().mode(), Mode::FlashingYellow);

    for _ in 0..10 {
        let deadline = runtime.next_deadline().unwrap();
        let report = runtime.poll(deadline).unwrap();
        let lit = report.cycle_count % 2 == 1;
        assert_eq!(report.lights, LightState::new(false, lit, false));
    }
}

#[test]
fn buttons_debounce_independently() {
    let mut runtime = runtime();
    runtime.on_edge(Button::Toggle, ms(100));
    runtime.on_edge(Button::Toggle, ms(200));
    runtime.on_edge(Button::Toggle, ms(200));
    assert_eq!(runtime.state().mode(), Mode::FlashingRed);

    runtime.on_edge(Button::Toggle, ms(350));
    runtime.on_edge(Button::Toggle, ms(350));
    assert_eq!(runtime.state().mode(), Mode::FlashingYellow);

    assert_eq!(
        runtime.on_edge(Button::Pedestrian, ms(360)),
        EdgeOutcome::Call(CallOutcome::IgnoredMode(Mode::FlashingYellow))
    );
    assert_eq!(runtime.on_edge(Button::Pedestrian, ms(400)), EdgeOutcome::Debounced);
}
