//! Pedestrian call latch and crossing sequence.
//!
//! A call is latched only while the signal runs its NORMAL cycle and nothing is
//! already pending. The sequencer hands the latched request over to a crossing
//! during the red phase; from then on [`PedestrianState::tick`] holds red and
//! yellow for the configured number of ticks before giving control back.

use crate::lights::LightState;
use crate::mode::Mode;

/// Result of a pedestrian call event.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CallOutcome {
    /// The request was latched and will be served at the next red phase.
    Latched,
    /// Calls are only accepted in NORMAL.
    IgnoredMode(Mode),
    /// A request is already waiting for the red phase.
    AlreadyRequested,
    /// A crossing is already in progress.
    CrossingActive,
    /// The controller has shut down.
    Inactive,
}

impl CallOutcome {
    /// Returns `true` when the call changed controller state.
    #[must_use]
    pub const fn is_latched(self) -> bool {
        matches!(self, CallOutcome::Latched)
    }
}

/// Progress reported for one tick of an active crossing.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CrossingStep {
    /// Red and yellow held; `elapsed` ticks of the crossing have now run.
    Holding { elapsed: u8 },
    /// Crossing finished; NORMAL resumes from green.
    Complete,
}

impl CrossingStep {
    /// Lamp vector shown for this step.
    #[must_use]
    pub const fn lights(self) -> LightState {
        match self {
            CrossingStep::Holding { .. } => LightState::RED_YELLOW,
            CrossingStep::Complete => LightState::GREEN,
        }
    }
}

/// Request latch and crossing counter.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct PedestrianState {
    requested: bool,
    crossing: bool,
    ticks: u8,
}

impl PedestrianState {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            requested: false,
            crossing: false,
            ticks: 0,
        }
    }

    /// A request is latched and waiting for the red phase.
    #[must_use]
    pub const fn is_requested(&self) -> bool {
        self.requested
    }

    /// A crossing is in progress.
    #[must_use]
    pub const fn is_crossing(&self) -> bool {
        self.crossing
    }

    /// Ticks elapsed within the active crossing.
    #[must_use]
    pub const fn crossing_ticks(&self) -> u8 {
        self.ticks
    }

    /// A pedestrian is waiting or crossing.
    #[must_use]
    pub const fn is_present(&self) -> bool {
        self.requested || self.crossing
    }

    /// Handles a debounced call-button event.
    pub fn on_call(&mut self, mode: Mode) -> CallOutcome {
        if mode != Mode::Normal {
            return CallOutcome::IgnoredMode(mode);
        }
        if self.crossing {
            return CallOutcome::CrossingActive;
        }
        if self.requested {
            return CallOutcome::AlreadyRequested;
        }

        self.requested = true;
        CallOutcome::Latched
    }

    /// Converts the latched request into an active crossing.
    pub fn begin_crossing(&mut self) {
        self.requested = false;
        self.crossing = true;
        self.ticks = 0;
    }

    /// Advances the active crossing by one tick.
    ///
    /// Must only be called while [`PedestrianState::is_crossing`] holds.
    pub fn tick(&mut self, crossing_ticks: u8) -> CrossingStep {
        if self.ticks < crossing_ticks {
            self.ticks += 1;
            CrossingStep::Holding {
                elapsed: self.ticks,
            }
        } else {
            self.clear();
            CrossingStep::Complete
        }
    }

    /// Drops any pending request and crossing; returns `true` if something was cleared.
    pub fn abort(&mut self) -> bool {
        let had_state = self.is_present();
        self.clear();
        had_state
    }

    fn clear(&mut self) {
        self.requested = false;
        self.crossing = false;
        self.ticks = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_latches_only_once_in_normal() {
        let mut state = PedestrianState::new();
        assert_eq!(state.on_call(Mode::Normal), CallOutcome::Latched);
        assert!(state.is_requested());
        assert_eq!(state.on_call(Mode::Normal), CallOutcome::AlreadyRequested);
    }

    #[test]
    fn call_ignored_outside_normal() {
        let mut state = PedestrianState::new();
        assert_eq!(
            state.on_call(Mode::FlashingRed),
            CallOutcome::IgnoredMode(Mode::FlashingRed)
        );
        assert_eq!(
            state.on_call(Mode::FlashingYellow),
            CallOutcome::IgnoredMode(Mode::FlashingYellow)
        );
        assert_eq!(state, PedestrianState::new());
    }

    #[test]
    fn call_ignored_while_crossing() {
        let mut state = PedestrianState::new();
        state.on_call(Mode::Normal);
        state.begin_crossing();
        let before = state;
        assert_eq!(state.on_call(Mode::Normal), CallOutcome::CrossingActive);
        assert_eq!(state, before);
    }

    #[test]
    fn crossing_holds_then_completes() {
        let mut state = PedestrianState::new();
        state.on_call(Mode::Normal);
        state.begin_crossing();
        assert!(!state.is_requested());
        assert!(state.is_crossing());

        for expected in 1..=5 {
            let step = state.tick(5);
            assert_eq!(step, CrossingStep::Holding { elapsed: expected });
            assert_eq!(step.lights(), LightState::RED_YELLOW);
        }

        let last = state.tick(5);
        assert_eq!(last, CrossingStep::Complete);
        assert_eq!(last.lights(), LightState::GREEN);
        assert_eq!(state, PedestrianState::new());
    }

    #[test]
    fn abort_reports_cleared_state() {
        let mut state = PedestrianState::new();
        assert!(!state.abort());
        state.on_call(Mode::Normal);
        assert!(state.abort());
        assert!(!state.is_present());
    }
}
