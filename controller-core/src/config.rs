//! Compile-time defaults and the runtime [`ControllerConfig`].
//!
//! Timing values are plain constants so both targets agree on them. The few
//! knobs a deployment may want to change are collected in [`ControllerConfig`],
//! which is built with `const fn`s and handed to the controller at start-up.

use core::time::Duration;

use crate::rate::Rate;

/// Number of ticks in one NORMAL-mode cycle (3 green, 1 yellow, 2 red).
pub const NORMAL_CYCLE_TICKS: u32 = 6;
/// First cycle position showing yellow.
pub const YELLOW_POSITION: u32 = 3;
/// First cycle position showing red; a pending crossing may start from here on.
pub const RED_POSITION: u32 = 4;
/// Ticks a pedestrian crossing holds red and yellow before resuming green.
pub const CROSSING_TICKS: u8 = 5;
/// Minimum spacing between two accepted presses of the same button.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(250);

/// What a mode toggle does to a pending request or an in-progress crossing.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum CrossingTogglePolicy {
    /// Leaving NORMAL cancels the request and any crossing in progress.
    #[default]
    Abort,
    /// A toggle arriving mid-crossing is held until the crossing completes.
    Defer,
    /// Toggle immediately and leave the pedestrian state untouched; it is
    /// resumed on the next return to NORMAL.
    Preserve,
}

impl CrossingTogglePolicy {
    /// Label used in logs and transcripts.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            CrossingTogglePolicy::Abort => "abort",
            CrossingTogglePolicy::Defer => "defer",
            CrossingTogglePolicy::Preserve => "preserve",
        }
    }

    /// Parses a label produced by [`CrossingTogglePolicy::label`], ignoring case.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        [Self::Abort, Self::Defer, Self::Preserve]
            .into_iter()
            .find(|policy| policy.label().eq_ignore_ascii_case(label))
    }
}

/// Runtime configuration for a controller instance.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ControllerConfig {
    pub initial_rate: Rate,
    pub debounce_window: Duration,
    pub crossing_ticks: u8,
    pub toggle_policy: CrossingTogglePolicy,
}

impl ControllerConfig {
    /// Defaults matching the deployed signal: 1 Hz, 250 ms debounce, 5-tick crossing.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            initial_rate: Rate::DEFAULT,
            debounce_window: DEBOUNCE_WINDOW,
            crossing_ticks: CROSSING_TICKS,
            toggle_policy: CrossingTogglePolicy::Abort,
        }
    }

    #[must_use]
    pub const fn with_initial_rate(mut self, rate: Rate) -> Self {
        self.initial_rate = rate;
        self
    }

    #[must_use]
    pub const fn with_debounce_window(mut self, window: Duration) -> Self {
        self.debounce_window = window;
        self
    }

    #[must_use]
    pub const fn with_toggle_policy(mut self, policy: CrossingTogglePolicy) -> Self {
        self.toggle_policy = policy;
        self
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_deployed_timings() {
        let config = ControllerConfig::new();
        assert_eq!(config.initial_rate.hz(), 1);
        assert_eq!(config.debounce_window, Duration::from_millis(250));
        assert_eq!(config.crossing_ticks, 5);
        assert_eq!(config.toggle_policy, CrossingTogglePolicy::Abort);
    }

    #[test]
    fn builders_override_fields() {
        const CONFIG: ControllerConfig = ControllerConfig::new()
            .with_toggle_policy(CrossingTogglePolicy::Defer)
            .with_debounce_window(Duration::from_millis(100));
        assert_eq!(CONFIG.toggle_policy, CrossingTogglePolicy::Defer);
        assert_eq!(CONFIG.debounce_window, Duration::from_millis(100));
    }

    #[test]
    fn policy_labels_parse_back() {
        assert_eq!(
            CrossingTogglePolicy::from_label("DEFER"),
            Some(CrossingTogglePolicy::Defer)
        );
        assert_eq!(CrossingTogglePolicy::from_label("later"), None);
    }
}
