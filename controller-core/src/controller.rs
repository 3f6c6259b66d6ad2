//! Controller state aggregate and the mode state machine.
//!
//! [`Controller`] owns the single [`ControllerState`] value. Every mutation goes
//! through one of four entry points: [`Controller::tick`] from the tick
//! scheduler, [`Controller::on_toggle`] and [`Controller::on_call`] from the
//! debounced buttons, and the rate setters from the configuration surface.
//! Each entry point runs to completion and returns a typed report, so callers
//! can log what happened without peeking at intermediate state.

use crate::config::{ControllerConfig, CrossingTogglePolicy};
use crate::lights::{LightDriver, LightState};
use crate::mode::Mode;
use crate::pedestrian::{CallOutcome, CrossingStep, PedestrianState};
use crate::rate::Rate;
use crate::sequencer;
use crate::status::StatusSnapshot;

/// The controller's mutable state, observable through read-only accessors.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ControllerState {
    mode: Mode,
    cycle_count: u32,
    rate: Rate,
    lights: LightState,
    pedestrian: PedestrianState,
}

impl ControllerState {
    /// Start-up state: NORMAL, green lit, counters cleared.
    #[must_use]
    pub const fn new(rate: Rate) -> Self {
        Self {
            mode: Mode::Normal,
            cycle_count: 0,
            rate,
            lights: LightState::GREEN,
            pedestrian: PedestrianState::new(),
        }
    }

    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Ticks since the last mode change or crossing completion.
    #[must_use]
    pub const fn cycle_count(&self) -> u32 {
        self.cycle_count
    }

    /// Ticks elapsed within the active crossing (0 when none is active).
    #[must_use]
    pub const fn ped_cycle_count(&self) -> u8 {
        self.pedestrian.crossing_ticks()
    }

    #[must_use]
    pub const fn rate(&self) -> Rate {
        self.rate
    }

    /// Last computed output vector.
    #[must_use]
    pub const fn lights(&self) -> LightState {
        self.lights
    }

    #[must_use]
    pub const fn ped_requested(&self) -> bool {
        self.pedestrian.is_requested()
    }

    #[must_use]
    pub const fn ped_crossing(&self) -> bool {
        self.pedestrian.is_crossing()
    }

    /// A pedestrian is waiting or crossing.
    #[must_use]
    pub const fn pedestrian_present(&self) -> bool {
        self.pedestrian.is_present()
    }
}

/// Crossing activity observed during a tick.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CrossingEvent {
    /// The pending request was handed over on this red-phase tick.
    Started,
    /// Red and yellow held; `elapsed` crossing ticks have run.
    Progress { elapsed: u8 },
    /// The crossing ended and the cycle restarted from green.
    Complete,
}

/// Summary of one tick.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TickReport {
    pub mode: Mode,
    pub cycle_count: u32,
    pub lights: LightState,
    pub crossing: Option<CrossingEvent>,
    /// Mode change applied at the end of this tick (deferred toggles only).
    pub deferred_switch: Option<ModeSwitch>,
}

/// What a toggle did to pedestrian state.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CrossingDisposition {
    /// No request or crossing was pending.
    Idle,
    /// A pending request or crossing was cancelled.
    Aborted,
    /// Pedestrian state was kept for the next return to NORMAL.
    Preserved,
}

/// A completed mode transition.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ModeSwitch {
    pub from: Mode,
    pub to: Mode,
    pub crossing: CrossingDisposition,
}

/// Result of a toggle event.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ToggleOutcome {
    /// The mode advanced immediately.
    Switched(ModeSwitch),
    /// A crossing is running; the toggle is applied once it completes.
    Deferred { pending: u8 },
    /// The controller has shut down; the mode is frozen.
    Inactive,
}

/// Result of a rate write.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RateUpdate {
    Applied { from: Rate, to: Rate },
    /// Input was out of range or unparsable; the rate is unchanged.
    Ignored { current: Rate },
    /// The controller has shut down; the rate is frozen.
    Inactive { current: Rate },
}

impl RateUpdate {
    /// Rate in effect after the write.
    #[must_use]
    pub const fn effective(self) -> Rate {
        match self {
            RateUpdate::Applied { to, .. } => to,
            RateUpdate::Ignored { current } | RateUpdate::Inactive { current } => current,
        }
    }
}

/// Signal controller: mode state machine plus the NORMAL-mode delegates.
#[derive(Clone, Debug)]
pub struct Controller {
    state: ControllerState,
    config: ControllerConfig,
    deferred_toggles: u8,
    shut_down: bool,
}

impl Controller {
    #[must_use]
    pub const fn new(config: ControllerConfig) -> Self {
        Self {
            state: ControllerState::new(config.initial_rate),
            config,
            deferred_toggles: 0,
            shut_down: false,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &ControllerState {
        &self.state
    }

    #[must_use]
    pub const fn config(&self) -> &ControllerConfig {
        &self.config
    }

    #[must_use]
    pub const fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Toggles waiting for the active crossing to finish.
    #[must_use]
    pub const fn deferred_toggles(&self) -> u8 {
        self.deferred_toggles
    }

    /// Advances the cycle counter and recomputes the output vector.
    ///
    /// After shutdown this is a no-op that reports dark lamps.
    pub fn tick(&mut self) -> TickReport {
        if self.shut_down {
            return TickReport {
                mode: self.state.mode,
                cycle_count: self.state.cycle_count,
                lights: LightState::DARK,
                crossing: None,
                deferred_switch: None,
            };
        }

        self.state.cycle_count = self.state.cycle_count.wrapping_add(1);

        let (lights, crossing) = match self.state.mode.flashing_output(self.state.cycle_count) {
            Some(lights) => (lights, None),
            None => self.normal_outputs(),
        };
        self.state.lights = lights;

        let deferred_switch = if matches!(crossing, Some(CrossingEvent::Complete)) {
            self.apply_deferred_toggles()
        } else {
            None
        };

        TickReport {
            mode: self.state.mode,
            cycle_count: self.state.cycle_count,
            lights,
            crossing,
            deferred_switch,
        }
    }

    fn normal_outputs(&mut self) -> (LightState, Option<CrossingEvent>) {
        if self.state.pedestrian.is_crossing() {
            let step = self.state.pedestrian.tick(self.config.crossing_ticks);
            let event = match step {
                CrossingStep::Holding { elapsed } => CrossingEvent::Progress { elapsed },
                CrossingStep::Complete => {
                    self.state.cycle_count = 0;
                    CrossingEvent::Complete
                }
            };
            return (step.lights(), Some(event));
        }

        let step = sequencer::step(self.state.cycle_count, self.state.pedestrian.is_requested());
        if step.hand_off {
            self.state.pedestrian.begin_crossing();
            (step.lights, Some(CrossingEvent::Started))
        } else {
            (step.lights, None)
        }
    }

    fn apply_deferred_toggles(&mut self) -> Option<ModeSwitch> {
        let pending = core::mem::take(&mut self.deferred_toggles);
        if pending == 0 {
            return None;
        }

        let from = self.state.mode;
        let mut to = from;
        for _ in 0..pending % 3 {
            to = to.next();
        }

        self.state.mode = to;
        self.state.cycle_count = 0;
        Some(ModeSwitch {
            from,
            to,
            crossing: CrossingDisposition::Idle,
        })
    }

    /// Handles a debounced toggle-button event.
    pub fn on_toggle(&mut self) -> ToggleOutcome {
        if self.shut_down {
            return ToggleOutcome::Inactive;
        }

        let pedestrian = self.state.pedestrian;
        let crossing = match self.config.toggle_policy {
            CrossingTogglePolicy::Defer if pedestrian.is_crossing() => {
                self.deferred_toggles = self.deferred_toggles.saturating_add(1);
                return ToggleOutcome::Deferred {
                    pending: self.deferred_toggles,
                };
            }
            CrossingTogglePolicy::Abort | CrossingTogglePolicy::Defer => {
                if self.state.pedestrian.abort() {
                    CrossingDisposition::Aborted
                } else {
                    CrossingDisposition::Idle
                }
            }
            CrossingTogglePolicy::Preserve => {
                if pedestrian.is_present() {
                    CrossingDisposition::Preserved
                } else {
                    CrossingDisposition::Idle
                }
            }
        };

        let from = self.state.mode;
        let to = from.next();
        self.state.mode = to;
        self.state.cycle_count = 0;

        ToggleOutcome::Switched(ModeSwitch { from, to, crossing })
    }

    /// Handles a debounced pedestrian call-button event.
    pub fn on_call(&mut self) -> CallOutcome {
        if self.shut_down {
            return CallOutcome::Inactive;
        }
        self.state.pedestrian.on_call(self.state.mode)
    }

    /// Sets a validated rate; takes effect when the scheduler next re-arms.
    pub fn set_rate(&mut self, rate: Rate) -> RateUpdate {
        if self.shut_down {
            return RateUpdate::Inactive {
                current: self.state.rate,
            };
        }
        let from = self.state.rate;
        self.state.rate = rate;
        RateUpdate::Applied { from, to: rate }
    }

    /// Applies operator rate input, ignoring anything outside `1..=9`.
    pub fn configure_rate(&mut self, input: &[u8]) -> RateUpdate {
        match Rate::parse(input) {
            Some(rate) => self.set_rate(rate),
            None if self.shut_down => RateUpdate::Inactive {
                current: self.state.rate,
            },
            None => RateUpdate::Ignored {
                current: self.state.rate,
            },
        }
    }

    /// Point-in-time view for the status surface.
    #[must_use]
    pub const fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot::new(
            self.state.mode,
            self.state.rate,
            self.state.lights,
            self.state.pedestrian.is_present(),
        )
    }

    /// Forces every lamp dark and stops further ticks from changing state.
    ///
    /// The caller must have stopped the tick scheduler first.
    pub fn shutdown<D: LightDriver>(&mut self, driver: &mut D) {
        self.shut_down = true;
        self.state.lights = LightState::DARK;
        driver.darken();
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new(ControllerConfig::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lights::NoopLightDriver;

    fn tick_n(controller: &mut Controller, count: usize) -> TickReport {
        let mut last = None;
        for _ in 0..count {
            last = Some(controller.tick());
        }
        last.unwrap()
    }

    #[test]
    fn starts_green_in_normal() {
        let controller = Controller::default();
        let state = controller.state();
        assert_eq!(state.mode(), Mode::Normal);
        assert_eq!(state.lights(), LightState::GREEN);
        assert_eq!(state.cycle_count(), 0);
        assert_eq!(state.rate(), Rate::DEFAULT);
        assert!(!state.pedestrian_present());
    }

    #[test]
    fn toggle_resets_cycle_count() {
        let mut controller = Controller::default();
        tick_n(&mut controller, 4);
        let outcome = controller.on_toggle();
        assert_eq!(
            outcome,
            ToggleOutcome::Switched(ModeSwitch {
                from: Mode::Normal,
                to: Mode::FlashingRed,
                crossing: CrossingDisposition::Idle,
            })
        );
        assert_eq!(controller.state().cycle_count(), 0);

        let report = controller.tick();
        assert_eq!(report.lights, LightState::RED);
    }

    #[test]
    fn configure_rate_ignores_invalid_input() {
        let mut controller = Controller::default();
        assert_eq!(
            controller.configure_rate(b"0"),
            RateUpdate::Ignored {
                current: Rate::DEFAULT
            }
        );
        assert_eq!(
            controller.configure_rate(b"7\n").effective(),
            Rate::new(7).unwrap()
        );
        assert_eq!(controller.state().rate().hz(), 7);
    }

    #[test]
    fn shutdown_darkens_and_freezes() {
        let mut controller = Controller::default();
        tick_n(&mut controller, 2);
        controller.shutdown(&mut NoopLightDriver::new());
        assert_eq!(controller.state().lights(), LightState::DARK);

        let frozen = controller.state().cycle_count();
        let report = controller.tick();
        assert_eq!(report.lights, LightState::DARK);
        assert_eq!(controller.state().cycle_count(), frozen);
    }

    #[test]
    fn inputs_after_shutdown_change_nothing() {
        let mut controller = Controller::default();
        controller.shutdown(&mut NoopLightDriver::new());

        assert_eq!(controller.on_toggle(), ToggleOutcome::Inactive);
        assert_eq!(controller.on_call(), CallOutcome::Inactive);
        assert_eq!(
            controller.set_rate(Rate::new(7).unwrap()),
            RateUpdate::Inactive {
                current: Rate::DEFAULT
            }
        );
        assert_eq!(
            controller.configure_rate(b"3"),
            RateUpdate::Inactive {
                current: Rate::DEFAULT
            }
        );

        let state = controller.state();
        assert_eq!(state.mode(), Mode::Normal);
        assert_eq!(state.rate(), Rate::DEFAULT);
        assert!(!state.pedestrian_present());
        assert_eq!(state.lights(), LightState::DARK);
    }
}
