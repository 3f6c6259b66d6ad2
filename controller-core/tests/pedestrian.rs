use controller_core::config::{ControllerConfig, CrossingTogglePolicy};
use controller_core::controller::{
    Controller, CrossingDisposition, CrossingEvent, ModeSwitch, ToggleOutcome,
};
use controller_core::lights::LightState;
use controller_core::mode::Mode;
use controller_core::pedestrian::CallOutcome;

fn controller_with(policy: CrossingTogglePolicy) -> Controller {
    Controller::new(ControllerConfig::new().with_toggle_policy(policy))
}

/// Latches a call and ticks through the hand-off.
fn start_crossing(controller: &mut Controller) {
    assert_eq!(controller.on_call(), CallOutcome::Latched);
    for _ in 0..6 {
        if controller.tick().crossing == Some(CrossingEvent::Started) {
            return;
        }
    }
    panic!("crossing never started");
}

#[test]
fn call_during_green_waits_for_red() {
    let mut controller = Controller::default();
    assert_eq!(controller.on_call(), CallOutcome::Latched);
    assert!(controller.state().pedestrian_present());

    for expected in [LightState::GREEN, LightState::GREEN, LightState::YELLOW] {
        let report = controller.tick();
        assert_eq!(report.lights, expected);
        assert!(report.crossing.is_none());
        assert!(controller.state().ped_requested());
    }

    let hand_off = controller.tick();
    assert_eq!(hand_off.cycle_count, 4);
    assert_eq!(hand_off.lights, LightState::RED_YELLOW);
    assert_eq!(hand_off.crossing, Some(CrossingEvent::Started));
    assert!(controller.state().ped_crossing());
    assert!(!controller.state().ped_requested());
    assert_eq!(controller.state().ped_cycle_count(), 0);
}

#[test]
fn crossing_holds_red_yellow_then_resumes_green() {
    let mut controller = Controller::default();
    start_crossing(&mut controller);

    for elapsed in 1..=5u8 {
        let report = controller.tick();
        assert_eq!(report.lights, LightState::RED_YELLOW);
        assert_eq!(report.crossing, Some(CrossingEvent::Progress { elapsed }));
        assert_eq!(controller.state().ped_cycle_count(), elapsed);
        assert!(controller.state().pedestrian_present());
    }

    let done = controller.tick();
    assert_eq!(done.lights, LightState::GREEN);
    assert_eq!(done.crossing, Some(CrossingEvent::Complete));
    assert_eq!(done.cycle_count, 0);
    assert!(!controller.state().pedestrian_present());
    assert_eq!(controller.state().ped_cycle_count(), 0);

    let lights: [LightState; 6] = core::array::from_fn(|_| controller.tick().lights);
    assert_eq!(
        lights,
        [
            LightState::GREEN,
            LightState::GREEN,
            LightState::YELLOW,
            LightState::RED,
            LightState::RED,
            LightState::GREEN,
        ]
    );
}

#[test]
fn call_during_red_hands_off_on_next_red_tick() {
    let mut controller = Controller::default();
    for _ in 0..4 {
        controller.tick();
    }
    assert_eq!(controller.state().lights(), LightState::RED);

    controller.on_call();
    let report = controller.tick();
    assert_eq!(report.cycle_count, 5);
    assert_eq!(report.crossing, Some(CrossingEvent::Started));
    assert_eq!(report.lights, LightState::RED_YELLOW);
}

#[test]
fn duplicate_and_late_calls_change_nothing() {
    let mut controller = Controller::default();
    controller.on_call();
    let before = *controller.state();
    assert_eq!(controller.on_call(), CallOutcome::AlreadyRequested);
    assert_eq!(*controller.state(), before);

    let mut crossing = Controller::default();
    start_crossing(&mut crossing);
    let before = *crossing.state();
    assert_eq!(crossing.on_call(), CallOutcome::CrossingActive);
    assert_eq!(*crossing.state(), before);
}

#[test]
fn calls_ignored_in_flashing_modes() {
    let mut controller = Controller::default();
    controller.on_toggle();
    let before = *controller.state();
    assert_eq!(
        controller.on_call(),
        CallOutcome::IgnoredMode(Mode::FlashingRed)
    );
    assert_eq!(*controller.state(), before);

    controller.on_toggle();
    assert_eq!(
        controller.on_call(),
        CallOutcome::IgnoredMode(Mode::FlashingYellow)
    );
    assert!(!controller.state().pedestrian_present());
}

#[test]
fn abort_policy_cancels_crossing_on_toggle() {
    let mut controller = controller_with(CrossingTogglePolicy::Abort);
    start_crossing(&mut controller);
    controller.tick();

    assert_eq!(
        controller.on_toggle(),
        ToggleOutcome::Switched(ModeSwitch {
            from: Mode::Normal,
            to: Mode::FlashingRed,
            crossing: CrossingDisposition::Aborted,
        })
    );
    assert!(!controller.state().pedestrian_present());
    assert_eq!(controller.state().ped_cycle_count(), 0);

    controller.on_toggle();
    controller.on_toggle();
    assert_eq!(controller.state().mode(), Mode::Normal);
    for _ in 0..12 {
        assert_eq!(controller.tick().lights.lit_count(), 1);
    }
}

#[test]
fn abort_policy_drops_pending_request() {
    let mut controller = controller_with(CrossingTogglePolicy::Abort);
    controller.on_call();
    let outcome = controller.on_toggle();
    assert!(matches!(
        outcome,
        ToggleOutcome::Switched(ModeSwitch {
            crossing: CrossingDisposition::Aborted,
            ..
        })
    ));
    assert!(!controller.state().ped_requested());
}

#[test]
fn defer_policy_finishes_crossing_first() {
    let mut controller = controller_with(CrossingTogglePolicy::Defer);
    start_crossing(&mut controller);

    assert_eq!(
        controller.on_toggle(),
        ToggleOutcome::Deferred { pending: 1 }
    );
    assert_eq!(controller.state().mode(), Mode::Normal);
    assert_eq!(controller.deferred_toggles(), 1);

    for _ in 0..5 {
        assert_eq!(controller.tick().lights, LightState::RED_YELLOW);
    }
    let done = controller.tick();
    assert_eq!(done.crossing, Some(CrossingEvent::Complete));
    assert_eq!(
        done.deferred_switch,
        Some(ModeSwitch {
            from: Mode::Normal,
            to: Mode::FlashingRed,
            crossing: CrossingDisposition::Idle,
        })
    );
    assert_eq!(controller.state().mode(), Mode::FlashingRed);
    assert_eq!(controller.state().cycle_count(), 0);
    assert_eq!(controller.tick().lights, LightState::RED);
}

#[test]
fn preserve_policy_resumes_crossing_after_returning_to_normal() {
    let mut controller = controller_with(CrossingTogglePolicy::Preserve);
    start_crossing(&mut controller);
    controller.tick();
    controller.tick();
    assert_eq!(controller.state().ped_cycle_count(), 2);

    let outcome = controller.on_toggle();
    assert!(matches!(
        outcome,
        ToggleOutcome::Switched(ModeSwitch {
            crossing: CrossingDisposition::Preserved,
            ..
        })
    ));
    assert!(controller.state().pedestrian_present());
    assert_eq!(controller.tick().lights, LightState::RED);

    controller.on_toggle();
    controller.on_toggle();
    assert_eq!(controller.state().mode(), Mode::Normal);

    let resumed = controller.tick();
    assert_eq!(resumed.lights, LightState::RED_YELLOW);
    assert_eq!(resumed.crossing, Some(CrossingEvent::Progress { elapsed: 3 }));
}
