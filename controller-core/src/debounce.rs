//! Per-button debouncing of raw rising edges.
//!
//! Each button keeps the timestamp of its last accepted edge. An edge is
//! accepted when no edge was accepted yet, or when at least the debounce
//! window has elapsed since the last accepted one. Rejected edges leave the
//! stored timestamp untouched.

use core::fmt;
use core::ops::Add;
use core::time::Duration;

use crate::config::DEBOUNCE_WINDOW;

/// Physical inputs wired to the controller.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Button {
    /// Operator button cycling the mode.
    Toggle,
    /// Pedestrian call button.
    Pedestrian,
}

impl Button {
    pub const ALL: [Button; 2] = [Button::Toggle, Button::Pedestrian];

    #[must_use]
    pub const fn as_index(self) -> usize {
        match self {
            Button::Toggle => 0,
            Button::Pedestrian => 1,
        }
    }

    /// Compact code used in telemetry discriminants.
    #[must_use]
    pub const fn to_raw(self) -> u8 {
        match self {
            Button::Toggle => 0,
            Button::Pedestrian => 1,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Button::Toggle => "toggle",
            Button::Pedestrian => "ped",
        }
    }

    /// Parses a button name as typed on the host console.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        if label.eq_ignore_ascii_case("toggle") || label.eq_ignore_ascii_case("btn0") {
            Some(Button::Toggle)
        } else if label.eq_ignore_ascii_case("ped")
            || label.eq_ignore_ascii_case("pedestrian")
            || label.eq_ignore_ascii_case("btn1")
        {
            Some(Button::Pedestrian)
        } else {
            None
        }
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Debounce filter for a single button.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Debouncer<I> {
    window: Duration,
    last_accepted: Option<I>,
}

impl<I> Debouncer<I>
where
    I: Copy + Ord + Add<Duration, Output = I>,
{
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: None,
        }
    }

    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    #[must_use]
    pub const fn last_accepted(&self) -> Option<I> {
        self.last_accepted
    }

    /// Returns `true` when the edge observed at `now` should be forwarded.
    pub fn accept(&mut self, now: I) -> bool {
        let ready = match self.last_accepted {
            None => true,
            Some(last) => now >= last + self.window,
        };
        if ready {
            self.last_accepted = Some(now);
        }
        ready
    }
}

impl<I> Default for Debouncer<I>
where
    I: Copy + Ord + Add<Duration, Output = I>,
{
    fn default() -> Self {
        Self::new(DEBOUNCE_WINDOW)
    }
}

/// Independent debouncers for both buttons.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ButtonDebouncers<I> {
    filters: [Debouncer<I>; 2],
}

impl<I> ButtonDebouncers<I>
where
    I: Copy + Ord + Add<Duration, Output = I>,
{
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self {
            filters: [Debouncer::new(window), Debouncer::new(window)],
        }
    }

    /// Filters an edge from `button`; the buttons never affect each other.
    pub fn accept(&mut self, button: Button, now: I) -> bool {
        self.filters[button.as_index()].accept(now)
    }

    #[must_use]
    pub fn get(&self, button: Button) -> &Debouncer<I> {
        &self.filters[button.as_index()]
    }
}
