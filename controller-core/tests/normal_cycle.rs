use core::time::Duration;

use controller_core::config::ControllerConfig;
use controller_core::controller::Controller;
use controller_core::lights::{LightChannel, LightDriver, LightState};
use controller_core::rate::Rate;
use controller_core::runtime::SignalRuntime;

#[derive(Default)]
struct Lamps {
    state: LightState,
    writes: usize,
}

impl LightDriver for Lamps {
    fn set(&mut self, channel: LightChannel, active: bool) {
        match channel {
            LightChannel::Red => self.state.red = active,
            LightChannel::Yellow => self.state.yellow = active,
            LightChannel::Green => self.state.green = active,
        }
        self.writes += 1;
    }
}

#[test]
fn first_six_positions_follow_green_yellow_red() {
    let mut controller = Controller::default();
    let mut seen = [controller.state().lights(); 6];
    for slot in seen.iter_mut().skip(1) {
        *slot = controller.tick().lights;
    }

    assert_eq!(
        seen,
        [
            LightState::GREEN,
            LightState::GREEN,
            LightState::GREEN,
            LightState::YELLOW,
            LightState::RED,
            LightState::RED,
        ]
    );

    let report = controller.tick();
    assert_eq!(report.lights, LightState::GREEN);
    assert_eq!(controller.state().cycle_count(), 6);
}

#[test]
fn exactly_one_lamp_without_pedestrians() {
    let mut controller = Controller::default();
    for _ in 0..120 {
        let report = controller.tick();
        assert_eq!(report.lights.lit_count(), 1, "tick {}", report.cycle_count);
        assert!(report.crossing.is_none());
    }
}

#[test]
fn runtime_drives_lamps_on_every_tick() {
    let mut runtime = SignalRuntime::<Duration, Lamps>::start(
        ControllerConfig::new(),
        Lamps::default(),
        Duration::ZERO,
    );
    assert_eq!(runtime.driver().state, LightState::GREEN);

    for second in 1..=4u64 {
        let report = runtime.poll(Duration::from_secs(second)).unwrap();
        assert_eq!(runtime.driver().state, report.lights);
    }
    assert_eq!(runtime.driver().state, LightState::RED);
    assert_eq!(runtime.driver().writes, 5 * 3);
}

#[test]
fn rate_change_waits_for_in_flight_period() {
    let mut runtime = SignalRuntime::<Duration, Lamps>::start(
        ControllerConfig::new(),
        Lamps::default(),
        Duration::ZERO,
    );
    runtime.set_rate(Rate::new(5).unwrap(), Duration::from_millis(100));

    assert_eq!(runtime.next_deadline(), Some(Duration::from_secs(1)));
    assert!(runtime.poll(Duration::from_millis(200)).is_none());

    runtime.poll(Duration::from_secs(1)).unwrap();
    assert_eq!(runtime.next_deadline(), Some(Duration::from_millis(1_200)));
}

#[test]
fn configured_initial_rate_sets_first_period() {
    let config = ControllerConfig::new().with_initial_rate(Rate::new(2).unwrap());
    let runtime =
        SignalRuntime::<Duration, Lamps>::start(config, Lamps::default(), Duration::from_secs(3));
    assert_eq!(runtime.next_deadline(), Some(Duration::from_millis(3_500)));
    assert_eq!(runtime.state().rate().hz(), 2);
}
